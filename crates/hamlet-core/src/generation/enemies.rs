//! Enemy spawning

use hecs::{Entity, World};
use rand::Rng;

use super::villagers::draw_idle_time;
use crate::components::{
    CombatStats, Combatant, Enemy, EnemyBrain, Mobility, Position, Vec2, Vitals,
};
use crate::config::SimConfig;

/// Spawn a hostile creature. Its spawn point anchors the pursuit leash.
pub fn spawn_enemy(world: &mut World, at: Vec2, config: &SimConfig, rng: &mut impl Rng) -> Entity {
    let ec = &config.enemy;
    let idle = draw_idle_time(ec.idle_min, ec.idle_max, rng);
    world.spawn((
        Enemy,
        Position::from(at),
        Mobility::new(ec.speed),
        Vitals::new(ec.max_health, config.lifecycle.invincibility_window),
        CombatStats::new(ec.strength, ec.defense),
        Combatant::new(ec.attack_range, ec.attack_cooldown),
        EnemyBrain::new(at, idle),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::EnemyState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_spawn_enemy_anchors_leash() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(1);
        let config = SimConfig::default();

        let enemy = spawn_enemy(&mut world, Vec2::new(30.0, 5.0), &config, &mut rng);
        let brain = *world.get::<&EnemyBrain>(enemy).unwrap();
        assert_eq!(brain.state, EnemyState::Idle);
        assert_eq!(brain.spawn_point, Vec2::new(30.0, 5.0));
        assert_eq!(
            world.get::<&Vitals>(enemy).unwrap().max_health,
            config.enemy.max_health
        );
    }
}
