//! Villager lifecycle - aging, life-stage transitions, reproduction and death.
//!
//! Runs once per registry tick, not every frame. Death goes through `die`
//! whatever the cause, so job links, partner links and the registry are
//! always cleaned up the same way.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{
    Appearance, CombatStats, Corpse, Damageable, Employment, Gender, LifeStage, Lifecycle,
    Lineage, Movement, Name, Position, Reproduction, Skills, Villager, Vitals,
};
use crate::config::{LifecycleConfig, SimConfig};
use crate::generation::{draw_life_expectancy, name_child, spawn_villager, VillagerTraits};

use super::events::{DeathCause, EventLog, SettlementEvent};
use super::production::unassign_villager;
use super::registry::SettlementRegistry;

/// Age every registered villager by `delta_years` and handle stage changes
pub fn age_villagers(
    world: &mut World,
    registry: &mut SettlementRegistry,
    events: &mut EventLog,
    config: &LifecycleConfig,
    delta_years: f32,
) {
    let mut transitions = Vec::new();

    for &villager in registry.villagers() {
        if let Ok(mut repro) = world.get::<&mut Reproduction>(villager) {
            repro.time_since_last_child += delta_years;
        }
        let Ok(mut life) = world.get::<&mut Lifecycle>(villager) else {
            continue;
        };
        if let Some((from, to)) = life.advance(delta_years, config.young_threshold) {
            transitions.push((villager, from, to));
        }
    }

    for (villager, from, to) in transitions {
        log::info!("Villager {:?} life stage {:?} -> {:?}", villager, from, to);
        events.push(SettlementEvent::LifeStageChanged { villager, from, to });

        if from == LifeStage::Mature {
            unassign_villager(world, villager);
        }
        if to == LifeStage::Dead {
            die(
                world,
                registry,
                events,
                villager,
                DeathCause::OldAge,
                config.corpse_grace_seconds,
            );
        }
    }
}

/// Kill a villager. Idempotent: returns false if already dead or unknown.
pub fn die(
    world: &mut World,
    registry: &mut SettlementRegistry,
    events: &mut EventLog,
    villager: Entity,
    cause: DeathCause,
    corpse_grace_seconds: f32,
) -> bool {
    {
        let Ok(mut life) = world.get::<&mut Lifecycle>(villager) else {
            return false;
        };
        if life.is_dead {
            return false;
        }
        life.is_dead = true;
    }

    unassign_villager(world, villager);
    clear_partner(world, villager);
    registry.unregister_villager(villager);

    let _ = world.remove_one::<Movement>(villager);
    let _ = world.insert_one(
        villager,
        Corpse {
            remaining: corpse_grace_seconds,
        },
    );

    let name = world
        .get::<&Name>(villager)
        .map(|n| n.full_name())
        .unwrap_or_default();
    log::info!("{} died ({:?})", name, cause);
    events.push(SettlementEvent::VillagerDied { villager, cause });
    true
}

/// Break the partner link on both sides
fn clear_partner(world: &mut World, villager: Entity) {
    let partner = match world.get::<&mut Reproduction>(villager) {
        Ok(mut repro) => repro.partner.take(),
        Err(_) => None,
    };
    if let Some(partner) = partner {
        if let Ok(mut other) = world.get::<&mut Reproduction>(partner) {
            if other.partner == Some(villager) {
                other.partner = None;
            }
        }
    }
}

/// Restore health of a living villager. Never revives the dead.
pub fn heal(world: &mut World, villager: Entity, amount: f32) -> bool {
    let alive = world
        .get::<&Lifecycle>(villager)
        .map(|l| l.is_alive())
        .unwrap_or(false);
    if !alive {
        return false;
    }
    match world.get::<&mut Vitals>(villager) {
        Ok(mut vitals) => {
            vitals.heal(amount);
            true
        }
        Err(_) => false,
    }
}

/// Alive, mature and past the reproduction cooldown
fn can_reproduce(world: &World, villager: Entity, cooldown: f32) -> bool {
    let mature = world
        .get::<&Lifecycle>(villager)
        .map(|l| l.is_mature())
        .unwrap_or(false);
    let rested = world
        .get::<&Reproduction>(villager)
        .map(|r| r.off_cooldown(cooldown))
        .unwrap_or(false);
    mature && rested
}

fn gender_of(world: &World, villager: Entity) -> Option<Gender> {
    world.get::<&Gender>(villager).ok().map(|g| *g)
}

/// First eligible candidate in registry order: opposite gender, ready, and
/// not partnered with anyone else.
fn find_partner(
    world: &World,
    registry: &SettlementRegistry,
    seeker: Entity,
    cooldown: f32,
) -> Option<Entity> {
    let wanted = gender_of(world, seeker)?.opposite();
    registry.villagers().iter().copied().find(|&candidate| {
        candidate != seeker
            && gender_of(world, candidate) == Some(wanted)
            && can_reproduce(world, candidate, cooldown)
            && world
                .get::<&Reproduction>(candidate)
                .map(|r| r.partner.is_none() || r.partner == Some(seeker))
                .unwrap_or(false)
    })
}

fn link_partners(world: &mut World, a: Entity, b: Entity) {
    if let Ok(mut repro) = world.get::<&mut Reproduction>(a) {
        repro.partner = Some(b);
    }
    if let Ok(mut repro) = world.get::<&mut Reproduction>(b) {
        repro.partner = Some(a);
    }
}

/// Give every ready couple a child.
///
/// Only the mother creates the child, so a pair produces at most one child
/// per cooldown window even though both partners are eligible in the same
/// tick. Returns the newborns.
pub fn try_reproduce(
    world: &mut World,
    registry: &mut SettlementRegistry,
    events: &mut EventLog,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let cooldown = config.lifecycle.reproduction_cooldown;
    let mothers: Vec<Entity> = registry
        .villagers()
        .iter()
        .copied()
        .filter(|&v| gender_of(world, v) == Some(Gender::Female))
        .collect();

    let mut born = Vec::new();
    for mother in mothers {
        if !can_reproduce(world, mother, cooldown) {
            continue;
        }

        let current = world.get::<&Reproduction>(mother).ok().and_then(|r| r.partner);
        let father = match current {
            Some(partner) if registry.contains_villager(partner) => {
                if !can_reproduce(world, partner, cooldown) {
                    continue;
                }
                partner
            }
            _ => {
                let Some(found) = find_partner(world, registry, mother, cooldown) else {
                    continue;
                };
                link_partners(world, mother, found);
                log::debug!("Villagers {:?} and {:?} paired", mother, found);
                found
            }
        };

        if let Some(child) = create_child(world, registry, events, config, mother, father, rng) {
            born.push(child);
        }
    }
    born
}

/// Child traits from two parents, or None if either parent is missing data
pub fn inherit_traits(
    world: &World,
    mother: Entity,
    father: Entity,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Option<VillagerTraits> {
    let lc = &config.lifecycle;
    let (m_skills, f_skills) = (
        *world.get::<&Skills>(mother).ok()?,
        *world.get::<&Skills>(father).ok()?,
    );
    let (m_combat, f_combat) = (
        *world.get::<&CombatStats>(mother).ok()?,
        *world.get::<&CombatStats>(father).ok()?,
    );
    let (m_look, f_look) = (
        *world.get::<&Appearance>(mother).ok()?,
        *world.get::<&Appearance>(father).ok()?,
    );
    let family = world
        .get::<&Name>(father)
        .map(|n| n.family.clone())
        .unwrap_or_default();

    let gender = Gender::random(rng);
    Some(VillagerTraits {
        name: name_child(gender, &family, rng),
        gender,
        age: 0.0,
        life_expectancy: draw_life_expectancy(config, rng),
        skills: Skills::inherit(&m_skills, &f_skills, lc.skill_jitter, lc.min_inherited_skill, rng),
        combat: CombatStats::inherit(&m_combat, &f_combat),
        appearance: Appearance::inherit(
            &m_look,
            &f_look,
            lc.appearance_inherit_chance,
            lc.appearance_variants,
            rng,
        ),
        lineage: Lineage {
            mother: Some(mother),
            father: Some(father),
        },
    })
}

fn create_child(
    world: &mut World,
    registry: &mut SettlementRegistry,
    events: &mut EventLog,
    config: &SimConfig,
    mother: Entity,
    father: Entity,
    rng: &mut impl Rng,
) -> Option<Entity> {
    let traits = inherit_traits(world, mother, father, config, rng)?;
    let position = world
        .get::<&Position>(mother)
        .map(|p| p.point)
        .unwrap_or_default();
    let name = traits.name.full_name();

    let child = spawn_villager(world, traits, position, config, rng);
    registry.register_birth(child);

    for parent in [mother, father] {
        if let Ok(mut repro) = world.get::<&mut Reproduction>(parent) {
            repro.time_since_last_child = 0.0;
            repro.children += 1;
        }
    }

    log::info!("{} was born", name);
    events.push(SettlementEvent::VillagerBorn {
        child,
        mother,
        father,
    });
    Some(child)
}

/// Count down corpses and despawn them when their grace period ends
pub fn corpse_system(world: &mut World, delta_seconds: f32) -> Vec<Entity> {
    let mut expired = Vec::new();
    for (entity, corpse) in world.query_mut::<&mut Corpse>() {
        corpse.remaining -= delta_seconds;
        if corpse.remaining <= 0.0 {
            expired.push(entity);
        }
    }
    for &entity in &expired {
        let _ = world.despawn(entity);
    }
    expired
}

/// Alive, mature villagers without a job, in registry order
pub fn unemployed_villagers(world: &World, registry: &SettlementRegistry) -> Vec<Entity> {
    registry
        .villagers()
        .iter()
        .copied()
        .filter(|&v| {
            let mature = world
                .get::<&Lifecycle>(v)
                .map(|l| l.is_mature())
                .unwrap_or(false);
            let idle = world
                .get::<&Employment>(v)
                .map(|e| e.building.is_none())
                .unwrap_or(false);
            mature && idle && world.get::<&Villager>(v).is_ok()
        })
        .collect()
}
