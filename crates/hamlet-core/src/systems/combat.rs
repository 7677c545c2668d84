//! Combat - strikes, timers, target lookup and death resolution

use hecs::{Entity, World};

use crate::components::{
    Brain, CombatStats, Combatant, Corpse, DamageOutcome, Damageable, Enemy, EnemyBrain,
    Lifecycle, Movement, Position, Vec2, Villager, Vitals,
};

use super::events::{DeathCause, EventLog, SettlementEvent};
use super::lifecycle::die;
use super::registry::SettlementRegistry;

/// Count down invincibility windows and attack cooldowns
pub fn combat_timers_system(world: &mut World, delta_seconds: f32) {
    for (_, vitals) in world.query_mut::<&mut Vitals>() {
        vitals.tick(delta_seconds);
    }
    for (_, combatant) in world.query_mut::<&mut Combatant>() {
        combatant.tick(delta_seconds);
    }
}

/// Alive and not yet a corpse
pub fn is_fighting_fit(world: &World, entity: Entity) -> bool {
    if world.get::<&Corpse>(entity).is_ok() {
        return false;
    }
    let alive = world
        .get::<&Vitals>(entity)
        .map(|v| v.is_alive())
        .unwrap_or(false);
    let not_dead = world
        .get::<&Lifecycle>(entity)
        .map(|l| l.is_alive())
        .unwrap_or(true);
    alive && not_dead
}

pub fn position_of(world: &World, entity: Entity) -> Option<Vec2> {
    world.get::<&Position>(entity).ok().map(|p| p.point)
}

/// Nearest fit entity carrying marker `T` within `range` of `from`
fn nearest_with<T: hecs::Component>(world: &World, from: Vec2, range: f32) -> Option<Entity> {
    let range_sq = range * range;
    world
        .query::<(&T, &Position)>()
        .without::<&Corpse>()
        .iter()
        .filter(|(e, _)| is_fighting_fit(world, *e))
        .map(|(e, (_, pos))| (e, pos.point.distance_squared(&from)))
        .filter(|(_, d)| *d <= range_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(e, _)| e)
}

pub fn nearest_enemy(world: &World, from: Vec2, range: f32) -> Option<Entity> {
    nearest_with::<Enemy>(world, from, range)
}

pub fn nearest_villager(world: &World, from: Vec2, range: f32) -> Option<Entity> {
    nearest_with::<Villager>(world, from, range)
}

/// Effective defense, including a carried shield
fn defense_of(world: &World, entity: Entity, shield_bonus: f32) -> f32 {
    let base = world
        .get::<&CombatStats>(entity)
        .map(|c| c.defense)
        .unwrap_or(0.0);
    let shield = world
        .get::<&Brain>(entity)
        .map(|b| if b.has_shield { shield_bonus } else { 0.0 })
        .unwrap_or(0.0);
    base + shield
}

/// One melee swing. None when the attacker is not ready, out of range, or
/// either side is already down.
pub fn strike(world: &mut World, attacker: Entity, target: Entity, shield_bonus: f32) -> Option<DamageOutcome> {
    if attacker == target || !is_fighting_fit(world, attacker) || !is_fighting_fit(world, target) {
        return None;
    }
    let from = position_of(world, attacker)?;
    let to = position_of(world, target)?;
    let strength = world.get::<&CombatStats>(attacker).ok()?.strength;
    {
        let combatant = world.get::<&Combatant>(attacker).ok()?;
        if !combatant.ready() || from.distance(&to) > combatant.attack_range {
            return None;
        }
    }
    let defense = defense_of(world, target, shield_bonus);

    world.get::<&mut Combatant>(attacker).ok()?.trigger();
    let outcome = world
        .get::<&mut Vitals>(target)
        .ok()?
        .take_damage(strength, defense);
    log::debug!("{:?} struck {:?}: {:?}", attacker, target, outcome);
    Some(outcome)
}

/// Current target of a villager or enemy
pub fn current_target(world: &World, entity: Entity) -> Option<Entity> {
    if let Ok(brain) = world.get::<&Brain>(entity) {
        return brain.threat;
    }
    world.get::<&EnemyBrain>(entity).ok().and_then(|b| b.target)
}

/// Strike the entity's current target, if any
pub fn attack(world: &mut World, attacker: Entity, shield_bonus: f32) -> Option<DamageOutcome> {
    let target = current_target(world, attacker)?;
    strike(world, attacker, target, shield_bonus)
}

/// Turn everything at zero health into a corpse.
///
/// Villagers go through `die` so their job and partner links are released;
/// enemies just stop and emit `EnemyKilled`.
pub fn combat_death_system(
    world: &mut World,
    registry: &mut SettlementRegistry,
    events: &mut EventLog,
    corpse_grace_seconds: f32,
) {
    let fallen: Vec<(Entity, bool)> = world
        .query::<&Vitals>()
        .without::<&Corpse>()
        .iter()
        .filter(|(_, v)| !v.is_alive())
        .map(|(e, _)| (e, world.get::<&Villager>(e).is_ok()))
        .collect();

    for (entity, is_villager) in fallen {
        if is_villager {
            die(
                world,
                registry,
                events,
                entity,
                DeathCause::Combat,
                corpse_grace_seconds,
            );
        } else if world.get::<&Enemy>(entity).is_ok() {
            let _ = world.remove_one::<Movement>(entity);
            let _ = world.insert_one(
                entity,
                Corpse {
                    remaining: corpse_grace_seconds,
                },
            );
            log::info!("Enemy {:?} killed", entity);
            events.push(SettlementEvent::EnemyKilled { enemy: entity });
        }
    }
}
