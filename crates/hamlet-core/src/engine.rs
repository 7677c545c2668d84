//! Settlement engine - main entry point for running the simulation

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::*;
use crate::config::SimConfig;
use crate::error::{ConfigError, JobError, SettlementError};
use crate::generation::{generate_founders, spawn_enemy, BuildingCatalog};
use crate::systems::*;

/// Main simulation engine.
///
/// Production, behavior and movement run every frame; aging, reproduction
/// and population statistics run once per configured tick interval.
pub struct SettlementEngine {
    /// ECS world containing all entities
    pub world: World,
    pub config: SimConfig,
    catalog: BuildingCatalog,
    registry: SettlementRegistry,
    ledger: ResourceLedger,
    clock: SettlementClock,
    stats: PopulationStats,
    events: EventLog,
    rng: StdRng,

    /// Simulation time in seconds since start
    sim_time: f64,
    /// Seconds accumulated toward the next lifecycle tick
    tick_accumulator: f32,
    time_scale: f32,
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl SettlementEngine {
    /// Create an empty settlement using the built-in building catalog
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let catalog = BuildingCatalog::builtin()?;
        Self::with_catalog(config, catalog)
    }

    pub fn with_catalog(config: SimConfig, catalog: BuildingCatalog) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            world: World::new(),
            catalog,
            registry: SettlementRegistry::new(),
            ledger: ResourceLedger::with_resources(&config.economy.starting_resources),
            clock: SettlementClock::new(config.clock.starting_season),
            stats: PopulationStats::default(),
            events: EventLog::new(),
            rng: make_rng(config.seed),
            sim_time: 0.0,
            tick_accumulator: 0.0,
            time_scale: 1.0,
            config,
        })
    }

    /// Found the settlement: a town hall at the origin and `founders` villagers around it
    pub fn generate(&mut self, founders: u32) -> Vec<Entity> {
        if let Some(data) = self.catalog.get(BuildingType::TownHall).cloned() {
            let hall = Building::new(data.construction_time);
            let entity = self.world.spawn((data, hall, Position::new(0.0, 0.0)));
            self.registry.register_building(entity);
        }

        let villagers = generate_founders(
            &mut self.world,
            founders,
            Vec2::ZERO,
            &self.config,
            &mut self.rng,
        );
        for &v in &villagers {
            self.registry.register_villager(v);
        }
        self.stats = compute_population_stats(&self.world, &self.registry);
        log::info!("Settlement founded with {} villagers", villagers.len());
        villagers
    }

    /// Update the simulation by delta_seconds
    pub fn update(&mut self, delta_seconds: f32) {
        let dt = delta_seconds * self.time_scale;
        if !dt.is_finite() {
            log::warn!("Ignoring non-finite frame step {}", dt);
            return;
        }
        if dt <= 0.0 {
            return;
        }
        let max_frame = self.config.tick.max_frame_seconds;
        let dt = if dt > max_frame {
            log::warn!("Frame step {:.1}s clamped to {:.1}s", dt, max_frame);
            max_frame
        } else {
            dt
        };
        self.sim_time += dt as f64;

        // Calendar first so the meal sees this frame's food
        for event in self.clock.advance(dt, &self.config.clock) {
            let is_meal = matches!(event, SettlementEvent::MealTime { .. });
            self.events.push(event);
            if is_meal {
                handle_meal_time(
                    &mut self.world,
                    &self.registry,
                    &mut self.ledger,
                    &mut self.events,
                    &self.config.economy,
                    &mut self.rng,
                );
            }
        }

        // Continuous: construction and production
        construction_system(&mut self.world, &mut self.events, dt);
        production_system(
            &mut self.world,
            &mut self.ledger,
            &mut self.events,
            &self.config.production,
            dt,
        );

        // Behavior, then movement
        villager_ai_system(
            &mut self.world,
            &mut self.ledger,
            &self.config.behavior,
            &mut self.rng,
            dt,
        );
        enemy_ai_system(
            &mut self.world,
            &self.config.enemy,
            &self.config.behavior,
            &mut self.rng,
            dt,
        );
        movement_system(&mut self.world, dt);

        // Combat bookkeeping
        combat_timers_system(&mut self.world, dt);
        combat_death_system(
            &mut self.world,
            &mut self.registry,
            &mut self.events,
            self.config.lifecycle.corpse_grace_seconds,
        );

        // Discrete lifecycle ticks
        let interval = self.config.tick.interval_seconds;
        self.tick_accumulator += dt;
        let ticks = (self.tick_accumulator / interval).floor() as u32;
        self.tick_accumulator %= interval;
        for _ in 0..ticks {
            self.tick();
        }

        corpse_system(&mut self.world, dt);
    }

    /// One lifecycle tick: age, reproduce, recount
    fn tick(&mut self) {
        age_villagers(
            &mut self.world,
            &mut self.registry,
            &mut self.events,
            &self.config.lifecycle,
            self.config.tick.years_per_tick,
        );
        try_reproduce(
            &mut self.world,
            &mut self.registry,
            &mut self.events,
            &self.config,
            &mut self.rng,
        );
        self.stats = compute_population_stats(&self.world, &self.registry);
    }

    // ---- Commands ----

    pub fn assign_worker(&mut self, building: Entity, villager: Entity) -> Result<(), JobError> {
        let result = assign_worker(&mut self.world, building, villager);
        if let Err(e) = &result {
            log::warn!("Worker assignment rejected: {}", e);
        }
        result
    }

    pub fn remove_worker(&mut self, building: Entity, villager: Entity) -> bool {
        remove_worker(&mut self.world, building, villager)
    }

    pub fn place_building(
        &mut self,
        building_type: BuildingType,
        position: Vec2,
    ) -> Result<Entity, SettlementError> {
        let result = place_building(
            &mut self.world,
            &mut self.registry,
            &mut self.ledger,
            &mut self.events,
            &self.catalog,
            building_type,
            position,
        );
        if let Err(e) = &result {
            log::warn!("Placement rejected: {}", e);
        }
        result
    }

    /// Remove a building, releasing its workers first
    pub fn remove_building(&mut self, building: Entity) -> bool {
        remove_building(&mut self.world, &mut self.registry, building)
    }

    pub fn set_season(&mut self, season: Season) {
        if let Some(event) = self.clock.set_season(season) {
            self.events.push(event);
        }
    }

    pub fn force_season_change(&mut self) {
        let event = self.clock.force_season_change();
        self.events.push(event);
    }

    /// Debit a resource. False, with the ledger untouched, when short.
    pub fn spend_resource(&mut self, resource: ResourceKind, amount: f32) -> bool {
        let spent = self.ledger.spend(resource, amount);
        if !spent {
            log::warn!("Cannot spend {} {:?}", amount, resource);
        }
        spent
    }

    pub fn add_resource(&mut self, resource: ResourceKind, amount: f32) {
        self.ledger.add(resource, amount);
    }

    /// Order a villager to walk somewhere
    pub fn move_to(&mut self, villager: Entity, destination: Vec2) -> bool {
        command_move_to(&mut self.world, villager, destination)
    }

    pub fn stop(&mut self, villager: Entity) -> bool {
        command_stop(&mut self.world, villager)
    }

    /// Strike the entity's current target now, if it is in range and ready
    pub fn attack(&mut self, attacker: Entity) -> Option<DamageOutcome> {
        let outcome = attack(
            &mut self.world,
            attacker,
            self.config.behavior.shield_defense_bonus,
        );
        self.resolve_deaths();
        outcome
    }

    /// Apply an external hit (traps, collaborators doing hit detection)
    pub fn damage(&mut self, target: Entity, incoming: f32) -> Option<DamageOutcome> {
        let defense = self
            .world
            .get::<&CombatStats>(target)
            .map(|c| c.defense)
            .unwrap_or(0.0);
        let outcome = self
            .world
            .get::<&mut Vitals>(target)
            .ok()
            .map(|mut v| v.take_damage(incoming, defense));
        self.resolve_deaths();
        outcome
    }

    pub fn heal(&mut self, villager: Entity, amount: f32) -> bool {
        heal(&mut self.world, villager, amount)
    }

    pub fn spawn_enemy(&mut self, position: Vec2) -> Entity {
        let enemy = spawn_enemy(&mut self.world, position, &self.config, &mut self.rng);
        log::info!("Enemy {:?} appeared at ({:.1}, {:.1})", enemy, position.x, position.y);
        enemy
    }

    fn resolve_deaths(&mut self) {
        combat_death_system(
            &mut self.world,
            &mut self.registry,
            &mut self.events,
            self.config.lifecycle.corpse_grace_seconds,
        );
    }

    // ---- Queries ----

    pub fn villagers(&self) -> &[Entity] {
        self.registry.villagers()
    }

    pub fn buildings(&self) -> &[Entity] {
        self.registry.buildings()
    }

    pub fn unemployed_villagers(&self) -> Vec<Entity> {
        unemployed_villagers(&self.world, &self.registry)
    }

    /// Statistics as of the last lifecycle tick
    pub fn population_stats(&self) -> PopulationStats {
        self.stats
    }

    pub fn production_progress_percent(&self, building: Entity) -> Option<f32> {
        production_progress_percent(&self.world, building)
    }

    pub fn estimated_time_to_completion(&self, building: Entity) -> Option<f32> {
        estimated_time_to_completion(&self.world, building)
    }

    pub fn resource(&self, resource: ResourceKind) -> f32 {
        self.ledger.get(resource)
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn clock(&self) -> &SettlementClock {
        &self.clock
    }

    pub fn is_night(&self) -> bool {
        self.clock.is_night(&self.config.clock)
    }

    pub fn catalog(&self) -> &BuildingCatalog {
        &self.catalog
    }

    pub fn pending_events(&self) -> &[SettlementEvent] {
        self.events.pending()
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SettlementEvent> {
        self.events.drain()
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn enemy_count(&self) -> usize {
        self.world
            .query::<&Enemy>()
            .without::<&Corpse>()
            .iter()
            .count()
    }

    /// Save settlement state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), crate::persistence::SaveError> {
        crate::persistence::save_settlement(
            writer,
            &self.world,
            self.sim_time,
            self.time_scale,
            self.tick_accumulator,
            &self.registry,
            &self.ledger,
            &self.clock,
            &self.stats,
            &self.events,
        )
    }

    /// Load settlement state from a reader, replacing the current one
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), crate::persistence::SaveError> {
        let loaded = crate::persistence::load_settlement(reader)?;

        self.world = loaded.world;
        self.sim_time = loaded.sim_time;
        self.time_scale = loaded.time_scale;
        self.tick_accumulator = loaded.tick_accumulator;
        self.registry = loaded.registry;
        self.ledger = loaded.ledger;
        self.clock = loaded.clock;
        self.stats = loaded.stats;
        self.events = loaded.events;
        self.rng = make_rng(self.config.seed);

        log::info!(
            "Loaded settlement: {} villagers, {} buildings",
            self.registry.population(),
            self.registry.buildings().len()
        );
        Ok(())
    }
}
