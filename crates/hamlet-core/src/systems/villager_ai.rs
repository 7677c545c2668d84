//! Villager behavior state machine.
//!
//! Everyday loop: Idle -> Wandering or MovingToWork -> Working. Threats
//! detected by the periodic scan push a villager into the combat overlay:
//! PrepareCombat -> Combat or Fleeing, and back to Idle once the threat is
//! gone.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{
    Brain, BuildingData, Corpse, Damageable, Employment, JobType, Lifecycle,
    ResourceKind, ResourceLedger, Vec2, Villager, VillagerState, Vitals,
};
use crate::config::BehaviorConfig;
use crate::generation::draw_idle_time;

use super::combat::{is_fighting_fit, nearest_enemy, position_of, strike};
use super::movement::{
    is_moving, random_point_near, start_movement, stop_movement, ARRIVAL_EPSILON,
};

/// What a villager will do this frame, decided on a read-only world
enum Intent {
    None,
    MoveTo(Vec2),
    Stop,
    Strike(Entity),
}

/// Snapshot of one villager taken before deciding
struct Perception {
    entity: Entity,
    point: Vec2,
    brain: Brain,
    young: bool,
    workplace: Option<(Entity, Vec2)>,
    combat_job: bool,
    health_fraction: f32,
    moving: bool,
}

fn perceive(world: &World, entity: Entity) -> Option<Perception> {
    let point = position_of(world, entity)?;
    let brain = *world.get::<&Brain>(entity).ok()?;
    let young = !world.get::<&Lifecycle>(entity).ok()?.is_mature();
    let building = world.get::<&Employment>(entity).ok().and_then(|e| e.building);
    let workplace = building.and_then(|b| position_of(world, b).map(|p| (b, p)));
    let combat_job = building
        .and_then(|b| world.get::<&BuildingData>(b).ok().and_then(|d| d.job_type))
        .map(|job: JobType| job.is_combat())
        .unwrap_or(false);
    let health_fraction = world
        .get::<&Vitals>(entity)
        .map(|v| v.health_fraction())
        .unwrap_or(0.0);

    Some(Perception {
        entity,
        point,
        brain,
        young,
        workplace,
        combat_job,
        health_fraction,
        moving: is_moving(world, entity),
    })
}

/// Run one frame of villager decisions
pub fn villager_ai_system(
    world: &mut World,
    ledger: &mut ResourceLedger,
    config: &BehaviorConfig,
    rng: &mut impl Rng,
    delta_seconds: f32,
) {
    let villagers: Vec<Entity> = world
        .query::<(&Villager, &Brain)>()
        .without::<&Corpse>()
        .iter()
        .map(|(e, _)| e)
        .collect();

    let mut decisions = Vec::with_capacity(villagers.len());
    for entity in villagers {
        let Some(mut p) = perceive(world, entity) else {
            continue;
        };
        if world.get::<&Lifecycle>(entity).map(|l| !l.is_alive()).unwrap_or(true) {
            continue;
        }
        scan_for_threats(world, &mut p, config, delta_seconds);
        let intent = decide(world, &mut p, ledger, config, rng, delta_seconds);
        decisions.push((p.entity, p.brain, intent));
    }

    for (entity, brain, intent) in decisions {
        let previous = world.get::<&Brain>(entity).map(|b| b.state).ok();
        if let Ok(mut b) = world.get::<&mut Brain>(entity) {
            *b = brain;
        }
        if previous != Some(brain.state) {
            log::debug!("Villager {:?} {:?} -> {:?}", entity, previous, brain.state);
        }
        match intent {
            Intent::None => {}
            Intent::MoveTo(destination) => {
                start_movement(world, entity, destination);
            }
            Intent::Stop => stop_movement(world, entity),
            Intent::Strike(target) => {
                strike(world, entity, target, config.shield_defense_bonus);
            }
        }
    }
}

/// Periodic nearest-enemy scan; also drops a threat that has died
fn scan_for_threats(world: &World, p: &mut Perception, config: &BehaviorConfig, delta_seconds: f32) {
    if let Some(threat) = p.brain.threat {
        if !is_fighting_fit(world, threat) {
            p.brain.threat = None;
        }
    }

    p.brain.scan_timer -= delta_seconds;
    if p.brain.scan_timer > 0.0 {
        return;
    }
    p.brain.scan_timer = config.scan_interval;
    p.brain.threat = nearest_enemy(world, p.point, config.detection_range);
}

fn reset_idle(brain: &mut Brain, config: &BehaviorConfig, rng: &mut impl Rng) {
    brain.state = VillagerState::Idle;
    brain.idle_timer = draw_idle_time(config.idle_min, config.idle_max, rng);
}

fn decide(
    world: &World,
    p: &mut Perception,
    ledger: &mut ResourceLedger,
    config: &BehaviorConfig,
    rng: &mut impl Rng,
    delta_seconds: f32,
) -> Intent {
    let threat = p.brain.threat.and_then(|t| position_of(world, t).map(|pos| (t, pos)));

    // A fresh threat interrupts everyday work
    if let Some((_, threat_pos)) = threat {
        if !p.brain.state.is_combat() {
            if p.young {
                p.brain.state = VillagerState::Fleeing;
                return Intent::MoveTo(flee_point(p.point, threat_pos, config.flee_distance));
            }
            p.brain.state = VillagerState::PrepareCombat;
        }
    }

    match p.brain.state {
        VillagerState::Idle => {
            if let Some((_, workplace)) = p.workplace {
                p.brain.state = VillagerState::MovingToWork;
                return Intent::MoveTo(workplace);
            }
            p.brain.idle_timer -= delta_seconds;
            if p.brain.idle_timer <= 0.0 {
                p.brain.state = VillagerState::Wandering;
                return Intent::MoveTo(random_point_near(p.point, config.wander_radius, rng));
            }
            Intent::None
        }
        VillagerState::Wandering => {
            if let Some((_, workplace)) = p.workplace {
                p.brain.state = VillagerState::MovingToWork;
                return Intent::MoveTo(workplace);
            }
            if !p.moving {
                reset_idle(&mut p.brain, config, rng);
            }
            Intent::None
        }
        VillagerState::MovingToWork => match p.workplace {
            None => {
                reset_idle(&mut p.brain, config, rng);
                Intent::Stop
            }
            Some((_, workplace)) => {
                if p.point.distance(&workplace) <= ARRIVAL_EPSILON {
                    p.brain.state = VillagerState::Working;
                    Intent::None
                } else if !p.moving {
                    Intent::MoveTo(workplace)
                } else {
                    Intent::None
                }
            }
        },
        VillagerState::Working => {
            if p.workplace.is_none() {
                reset_idle(&mut p.brain, config, rng);
            }
            Intent::None
        }
        VillagerState::PrepareCombat => {
            if threat.is_none() {
                reset_idle(&mut p.brain, config, rng);
                return Intent::Stop;
            }
            if p.health_fraction < config.flee_threshold {
                return start_fleeing(p, threat, config);
            }
            if p.combat_job || p.brain.has_shield {
                p.brain.state = VillagerState::Combat;
                return Intent::Stop;
            }
            if ledger.spend(ResourceKind::Shield, 1.0) {
                p.brain.has_shield = true;
                p.brain.state = VillagerState::Combat;
                log::debug!("Villager {:?} took a shield", p.entity);
                return Intent::Stop;
            }
            start_fleeing(p, threat, config)
        }
        VillagerState::Combat => {
            let Some((target, target_pos)) = threat else {
                reset_idle(&mut p.brain, config, rng);
                return Intent::Stop;
            };
            if p.health_fraction < config.flee_threshold {
                return start_fleeing(p, threat, config);
            }
            if p.point.distance(&target_pos) <= config.attack_range {
                Intent::Strike(target)
            } else {
                Intent::MoveTo(target_pos)
            }
        }
        VillagerState::Fleeing => {
            if threat.is_none() || !p.moving {
                reset_idle(&mut p.brain, config, rng);
                return Intent::Stop;
            }
            Intent::None
        }
    }
}

fn start_fleeing(p: &mut Perception, threat: Option<(Entity, Vec2)>, config: &BehaviorConfig) -> Intent {
    p.brain.state = VillagerState::Fleeing;
    match threat {
        Some((_, threat_pos)) => Intent::MoveTo(flee_point(p.point, threat_pos, config.flee_distance)),
        None => Intent::Stop,
    }
}

/// Point `distance` away from the threat, straight back from it
pub fn flee_point(from: Vec2, threat: Vec2, distance: f32) -> Vec2 {
    let away = (from - threat).normalize();
    // Standing on the threat: pick any direction
    let away = if away == Vec2::ZERO {
        Vec2::new(1.0, 0.0)
    } else {
        away
    };
    from + away * distance
}

/// Player order: walk to `destination`, then idle there
pub fn command_move_to(world: &mut World, villager: Entity, destination: Vec2) -> bool {
    if world.get::<&Corpse>(villager).is_ok() {
        return false;
    }
    if !start_movement(world, villager, destination) {
        return false;
    }
    if let Ok(mut brain) = world.get::<&mut Brain>(villager) {
        brain.state = VillagerState::Wandering;
    }
    true
}

/// Player order: stop where you are
pub fn command_stop(world: &mut World, villager: Entity) -> bool {
    if world.get::<&Brain>(villager).is_err() {
        return false;
    }
    stop_movement(world, villager);
    if let Ok(mut brain) = world.get::<&mut Brain>(villager) {
        brain.state = VillagerState::Idle;
    }
    true
}
