//! Villager generation - founders at game start and the spawn path shared with births

use hecs::{Entity, EntityBuilder, World};
use rand::Rng;

use super::names::generate_name;
use crate::components::*;
use crate::config::SimConfig;

/// Everything that distinguishes one villager from another at creation time
#[derive(Debug, Clone)]
pub struct VillagerTraits {
    pub name: Name,
    pub gender: Gender,
    pub age: f32,
    pub life_expectancy: f32,
    pub skills: Skills,
    pub combat: CombatStats,
    pub appearance: Appearance,
    pub lineage: Lineage,
}

impl VillagerTraits {
    /// Random founder of the given age
    pub fn random(age: f32, config: &SimConfig, rng: &mut impl Rng) -> Self {
        let gender = Gender::random(rng);
        Self {
            name: generate_name(gender, rng),
            gender,
            age,
            life_expectancy: draw_life_expectancy(config, rng),
            skills: Skills::random(rng),
            combat: CombatStats::random(rng),
            appearance: Appearance::random(rng, config.lifecycle.appearance_variants),
            lineage: Lineage::default(),
        }
    }
}

/// Uniform draw from the configured life expectancy range
pub fn draw_life_expectancy(config: &SimConfig, rng: &mut impl Rng) -> f32 {
    let lc = &config.lifecycle;
    if lc.life_expectancy_max > lc.life_expectancy_min {
        rng.gen_range(lc.life_expectancy_min..=lc.life_expectancy_max)
    } else {
        lc.life_expectancy_min
    }
}

/// Random idle duration from the configured range
pub fn draw_idle_time(min: f32, max: f32, rng: &mut impl Rng) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

/// Spawn a villager with every component the systems expect.
/// The caller registers the returned handle.
pub fn spawn_villager(
    world: &mut World,
    traits: VillagerTraits,
    position: Vec2,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Entity {
    let lc = &config.lifecycle;
    let bc = &config.behavior;
    let idle = draw_idle_time(bc.idle_min, bc.idle_max, rng);

    let mut builder = EntityBuilder::new();
    builder
        .add(Villager)
        .add(traits.name)
        .add(traits.gender)
        .add(Lifecycle::new(
            traits.age,
            traits.life_expectancy,
            lc.young_threshold,
        ))
        .add(Vitals::new(lc.max_health, lc.invincibility_window))
        .add(traits.skills)
        .add(traits.combat)
        .add(Combatant::new(bc.attack_range, bc.attack_cooldown))
        .add(Employment::default())
        .add(Reproduction::ready(lc.reproduction_cooldown))
        .add(traits.lineage)
        .add(traits.appearance)
        .add(Nourishment::default())
        .add(Position::from(position))
        .add(Mobility::new(bc.walk_speed))
        .add(Brain::new(idle));
    world.spawn(builder.build())
}

/// Generate the founding population scattered around `center`.
///
/// Ages are spread across the working range so the settlement starts with
/// a few children and mostly adults.
pub fn generate_founders(
    world: &mut World,
    count: u32,
    center: Vec2,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let mut founders = Vec::with_capacity(count as usize);
    let young = config.lifecycle.young_threshold;
    let oldest = (config.lifecycle.life_expectancy_min - 10.0).max(young + 1.0);

    for i in 0..count {
        // Every fourth founder is a child
        let age = if i % 4 == 3 {
            rng.gen_range(0.0..young)
        } else {
            rng.gen_range(young..oldest)
        };
        let traits = VillagerTraits::random(age, config, rng);

        let radius = config.behavior.wander_radius;
        let offset = Vec2::new(
            rng.gen_range(-radius..=radius),
            rng.gen_range(-radius..=radius),
        );
        founders.push(spawn_villager(world, traits, center + offset, config, rng));
    }

    founders
}
