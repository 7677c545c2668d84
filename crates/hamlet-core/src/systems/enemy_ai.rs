//! Enemy behavior: Idle/Wandering around the spawn point, Chasing and
//! Attacking villagers, Searching where a target was last seen, and
//! Returning home when the chase strays past the pursuit leash.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{Corpse, Enemy, EnemyBrain, EnemyState, Vec2};
use crate::config::{BehaviorConfig, EnemyConfig};
use crate::generation::draw_idle_time;

use super::combat::{is_fighting_fit, nearest_villager, position_of, strike};
use super::movement::{
    is_moving, random_point_near, start_movement, stop_movement, ARRIVAL_EPSILON,
};

enum Intent {
    None,
    MoveTo(Vec2),
    Stop,
    Strike(Entity),
}

pub fn enemy_ai_system(
    world: &mut World,
    config: &EnemyConfig,
    behavior: &BehaviorConfig,
    rng: &mut impl Rng,
    delta_seconds: f32,
) {
    let enemies: Vec<(Entity, EnemyBrain)> = world
        .query::<(&Enemy, &EnemyBrain)>()
        .without::<&Corpse>()
        .iter()
        .map(|(e, (_, brain))| (e, *brain))
        .collect();

    let mut decisions = Vec::with_capacity(enemies.len());
    for (entity, mut brain) in enemies {
        let Some(point) = position_of(world, entity) else {
            continue;
        };
        let moving = is_moving(world, entity);
        let intent = decide(world, &mut brain, point, moving, config, rng, delta_seconds);
        decisions.push((entity, brain, intent));
    }

    for (entity, brain, intent) in decisions {
        let previous = world.get::<&EnemyBrain>(entity).map(|b| b.state).ok();
        if let Ok(mut b) = world.get::<&mut EnemyBrain>(entity) {
            *b = brain;
        }
        if previous != Some(brain.state) {
            log::debug!("Enemy {:?} {:?} -> {:?}", entity, previous, brain.state);
        }
        match intent {
            Intent::None => {}
            Intent::MoveTo(destination) => {
                start_movement(world, entity, destination);
            }
            Intent::Stop => stop_movement(world, entity),
            Intent::Strike(target) => {
                strike(world, entity, target, behavior.shield_defense_bonus);
            }
        }
    }
}

fn start_search(brain: &mut EnemyBrain, config: &EnemyConfig) {
    brain.state = EnemyState::Searching;
    brain.target = None;
    brain.state_timer = config.search_duration;
    brain.lost_for = 0.0;
}

fn start_return(brain: &mut EnemyBrain) -> Intent {
    brain.state = EnemyState::Returning;
    brain.target = None;
    brain.lost_for = 0.0;
    Intent::MoveTo(brain.spawn_point)
}

fn decide(
    world: &World,
    brain: &mut EnemyBrain,
    point: Vec2,
    moving: bool,
    config: &EnemyConfig,
    rng: &mut impl Rng,
    delta_seconds: f32,
) -> Intent {
    // Periodic scan, skipped while heading home so the leash holds
    brain.scan_timer -= delta_seconds;
    let mut spotted = None;
    if brain.scan_timer <= 0.0 {
        brain.scan_timer = config.scan_interval;
        if brain.state != EnemyState::Returning {
            spotted = nearest_villager(world, point, config.detection_range);
        }
    }

    match brain.state {
        EnemyState::Idle | EnemyState::Wandering => {
            if let Some(target) = spotted {
                brain.state = EnemyState::Chasing;
                brain.target = Some(target);
                brain.lost_for = 0.0;
                return Intent::None;
            }
            if brain.state == EnemyState::Wandering {
                if !moving {
                    brain.state = EnemyState::Idle;
                    brain.state_timer = draw_idle_time(config.idle_min, config.idle_max, rng);
                }
                return Intent::None;
            }
            brain.state_timer -= delta_seconds;
            if brain.state_timer <= 0.0 {
                brain.state = EnemyState::Wandering;
                return Intent::MoveTo(random_point_near(brain.spawn_point, config.wander_radius, rng));
            }
            Intent::None
        }
        EnemyState::Chasing | EnemyState::Attacking => {
            if point.distance(&brain.spawn_point) > config.pursuit_range {
                return start_return(brain);
            }
            let target = brain.target.filter(|&t| is_fighting_fit(world, t));
            let Some(target) = target else {
                start_search(brain, config);
                return Intent::Stop;
            };
            let Some(target_pos) = position_of(world, target) else {
                start_search(brain, config);
                return Intent::Stop;
            };

            let distance = point.distance(&target_pos);
            if distance > config.detection_range {
                // Out of sight: head for the last known position
                brain.lost_for += delta_seconds;
                if brain.lost_for >= config.lose_target_timeout {
                    start_search(brain, config);
                    return Intent::Stop;
                }
                brain.state = EnemyState::Chasing;
                return Intent::MoveTo(brain.last_seen);
            }

            brain.last_seen = target_pos;
            brain.lost_for = 0.0;
            if distance <= config.attack_range {
                let was_attacking = brain.state == EnemyState::Attacking;
                brain.state = EnemyState::Attacking;
                if was_attacking {
                    Intent::Strike(target)
                } else {
                    Intent::Stop
                }
            } else {
                brain.state = EnemyState::Chasing;
                Intent::MoveTo(target_pos)
            }
        }
        EnemyState::Searching => {
            if let Some(target) = spotted {
                brain.state = EnemyState::Chasing;
                brain.target = Some(target);
                brain.lost_for = 0.0;
                return Intent::None;
            }
            brain.state_timer -= delta_seconds;
            if brain.state_timer <= 0.0 {
                return start_return(brain);
            }
            if !moving {
                return Intent::MoveTo(random_point_near(brain.last_seen, config.wander_radius, rng));
            }
            Intent::None
        }
        EnemyState::Returning => {
            if point.distance(&brain.spawn_point) <= ARRIVAL_EPSILON {
                brain.state = EnemyState::Idle;
                brain.state_timer = draw_idle_time(config.idle_min, config.idle_max, rng);
                return Intent::None;
            }
            if !moving {
                return Intent::MoveTo(brain.spawn_point);
            }
            Intent::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{
        Brain, CombatStats, Combatant, Lifecycle, Mobility, Position, Villager, Vitals,
    };
    use crate::config::SimConfig;
    use crate::generation::spawn_enemy;
    use crate::systems::movement::movement_system;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn villager(world: &mut World, at: Vec2) -> Entity {
        world.spawn((
            Villager,
            Position::from(at),
            Mobility::new(0.0),
            Lifecycle::new(30.0, 60.0, 16.0),
            Vitals::new(100.0, 0.1),
            CombatStats::new(1.0, 0.0),
            Combatant::new(1.5, 1.0),
            Brain::new(100.0),
        ))
    }

    fn state(world: &World, e: Entity) -> EnemyState {
        world.get::<&EnemyBrain>(e).unwrap().state
    }

    fn step(world: &mut World, config: &SimConfig, rng: &mut StdRng, dt: f32) {
        enemy_ai_system(world, &config.enemy, &config.behavior, rng, dt);
        movement_system(world, dt);
    }

    #[test]
    fn test_chases_and_attacks_villager() {
        let mut world = World::new();
        let config = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let enemy = spawn_enemy(&mut world, Vec2::ZERO, &config, &mut rng);
        let v = villager(&mut world, Vec2::new(5.0, 0.0));

        step(&mut world, &config, &mut rng, 0.1);
        assert_eq!(state(&world, enemy), EnemyState::Chasing);

        for _ in 0..40 {
            step(&mut world, &config, &mut rng, 0.1);
        }
        assert_eq!(state(&world, enemy), EnemyState::Attacking);
        assert!(world.get::<&Vitals>(v).unwrap().health < 100.0);
    }

    #[test]
    fn test_leash_returns_to_spawn() {
        let mut world = World::new();
        let config = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let enemy = spawn_enemy(&mut world, Vec2::ZERO, &config, &mut rng);
        let v = villager(&mut world, Vec2::new(5.0, 0.0));

        step(&mut world, &config, &mut rng, 0.1);
        assert_eq!(state(&world, enemy), EnemyState::Chasing);

        // Drag the enemy past its pursuit range
        world.get::<&mut Position>(enemy).unwrap().point = Vec2::new(25.0, 0.0);
        world.get::<&mut Position>(v).unwrap().point = Vec2::new(26.0, 0.0);
        step(&mut world, &config, &mut rng, 0.1);
        assert_eq!(state(&world, enemy), EnemyState::Returning);
        assert_eq!(world.get::<&EnemyBrain>(enemy).unwrap().target, None);

        for _ in 0..200 {
            step(&mut world, &config, &mut rng, 0.1);
            if state(&world, enemy) == EnemyState::Idle {
                break;
            }
        }
        assert_eq!(state(&world, enemy), EnemyState::Idle);
    }

    #[test]
    fn test_lost_target_leads_to_search_then_return() {
        let mut world = World::new();
        let config = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let enemy = spawn_enemy(&mut world, Vec2::ZERO, &config, &mut rng);
        let v = villager(&mut world, Vec2::new(5.0, 0.0));

        step(&mut world, &config, &mut rng, 0.1);
        // Villager slips out of sight but stays inside the leash
        world.get::<&mut Position>(v).unwrap().point = Vec2::new(0.0, 15.0);

        let mut searched = false;
        for _ in 0..100 {
            step(&mut world, &config, &mut rng, 0.1);
            if state(&world, enemy) == EnemyState::Searching {
                searched = true;
                break;
            }
        }
        assert!(searched);

        // Move the villager far away so the search finds nothing
        world.get::<&mut Position>(v).unwrap().point = Vec2::new(500.0, 500.0);
        for _ in 0..60 {
            step(&mut world, &config, &mut rng, 0.1);
        }
        assert!(matches!(
            state(&world, enemy),
            EnemyState::Returning | EnemyState::Idle | EnemyState::Wandering
        ));
    }

    #[test]
    fn test_search_starts_exactly_at_lose_target_timeout() {
        let mut world = World::new();
        let mut config = SimConfig::default();
        config.enemy.lose_target_timeout = 2.0;
        let mut rng = StdRng::seed_from_u64(5);
        let enemy = spawn_enemy(&mut world, Vec2::ZERO, &config, &mut rng);
        let v = villager(&mut world, Vec2::new(5.0, 0.0));

        step(&mut world, &config, &mut rng, 0.1);
        assert_eq!(state(&world, enemy), EnemyState::Chasing);

        // 1.5s out of sight, then seen again: the timer resets
        world.get::<&mut Position>(v).unwrap().point = Vec2::new(0.0, 15.0);
        for _ in 0..3 {
            step(&mut world, &config, &mut rng, 0.5);
        }
        assert_eq!(state(&world, enemy), EnemyState::Chasing);
        world.get::<&mut Position>(v).unwrap().point = Vec2::new(0.0, 5.0);
        step(&mut world, &config, &mut rng, 0.5);
        assert_eq!(world.get::<&EnemyBrain>(enemy).unwrap().lost_for, 0.0);

        world.get::<&mut Position>(v).unwrap().point = Vec2::new(0.0, 15.0);
        for _ in 0..3 {
            step(&mut world, &config, &mut rng, 0.5);
            assert_eq!(state(&world, enemy), EnemyState::Chasing);
        }
        step(&mut world, &config, &mut rng, 0.5);
        assert_eq!(state(&world, enemy), EnemyState::Searching);
        assert_eq!(world.get::<&EnemyBrain>(enemy).unwrap().target, None);
    }

    #[test]
    fn test_dead_target_triggers_search() {
        let mut world = World::new();
        let config = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        let enemy = spawn_enemy(&mut world, Vec2::ZERO, &config, &mut rng);
        let v = villager(&mut world, Vec2::new(3.0, 0.0));

        step(&mut world, &config, &mut rng, 0.1);
        world.get::<&mut Vitals>(v).unwrap().health = 0.0;
        step(&mut world, &config, &mut rng, 0.1);
        assert_eq!(state(&world, enemy), EnemyState::Searching);
    }
}
