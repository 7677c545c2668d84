//! Save/Load functionality for persisting settlement state
//!
//! Uses bincode for efficient binary serialization of the entire settlement.
//! Components are serialized individually then reconstructed on load. Every
//! entity is respawned under its original handle, so job, partner, lineage and
//! registry references stay valid across a save/load cycle.

use hecs::{Entity, EntityBuilder, World};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::components::*;
use crate::systems::{EventLog, PopulationStats, SettlementClock, SettlementRegistry};

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the settlement
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    /// Simulation time in seconds
    pub sim_time: f64,
    pub time_scale: f32,
    /// Seconds accumulated toward the next lifecycle tick
    pub tick_accumulator: f32,
    pub registry: SettlementRegistry,
    pub ledger: ResourceLedger,
    pub clock: SettlementClock,
    pub stats: PopulationStats,
    /// Events not yet drained by collaborators
    pub events: EventLog,
    pub entities: Vec<SerializableEntity>,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize)]
pub struct SerializableEntity {
    #[serde(with = "entity_bits")]
    pub handle: Entity,

    // Shared
    pub position: Option<Position>,
    pub mobility: Option<Mobility>,
    pub movement: Option<Movement>,
    pub vitals: Option<Vitals>,
    pub combat_stats: Option<CombatStats>,
    pub combatant: Option<Combatant>,
    pub corpse: Option<Corpse>,

    // Villager
    pub villager: Option<Villager>,
    pub name: Option<Name>,
    pub gender: Option<Gender>,
    pub lifecycle: Option<Lifecycle>,
    pub skills: Option<Skills>,
    pub employment: Option<Employment>,
    pub reproduction: Option<Reproduction>,
    pub lineage: Option<Lineage>,
    pub appearance: Option<Appearance>,
    pub nourishment: Option<Nourishment>,
    pub brain: Option<Brain>,

    // Building
    pub building_data: Option<BuildingData>,
    pub building: Option<Building>,

    // Enemy
    pub enemy: Option<Enemy>,
    pub enemy_brain: Option<EnemyBrain>,
}

fn copied<T: hecs::Component + Clone>(entity_ref: &hecs::EntityRef<'_>) -> Option<T> {
    entity_ref.get::<&T>().map(|c| (*c).clone())
}

/// Extract all entities from a world into serializable form
fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    world
        .iter()
        .map(|e| SerializableEntity {
            handle: e.entity(),
            position: copied(&e),
            mobility: copied(&e),
            movement: copied(&e),
            vitals: copied(&e),
            combat_stats: copied(&e),
            combatant: copied(&e),
            corpse: copied(&e),
            villager: copied(&e),
            name: copied(&e),
            gender: copied(&e),
            lifecycle: copied(&e),
            skills: copied(&e),
            employment: copied(&e),
            reproduction: copied(&e),
            lineage: copied(&e),
            appearance: copied(&e),
            nourishment: copied(&e),
            brain: copied(&e),
            building_data: copied(&e),
            building: copied(&e),
            enemy: copied(&e),
            enemy_brain: copied(&e),
        })
        .collect()
}

/// Add a component to the builder if it was saved
fn add_opt<T: hecs::Component>(builder: &mut EntityBuilder, component: Option<T>) {
    if let Some(c) = component {
        builder.add(c);
    }
}

/// Respawn an entity under its saved handle with all its components
fn spawn_entity(world: &mut World, se: SerializableEntity) {
    let mut builder = EntityBuilder::new();
    add_opt(&mut builder, se.position);
    add_opt(&mut builder, se.mobility);
    add_opt(&mut builder, se.movement);
    add_opt(&mut builder, se.vitals);
    add_opt(&mut builder, se.combat_stats);
    add_opt(&mut builder, se.combatant);
    add_opt(&mut builder, se.corpse);
    add_opt(&mut builder, se.villager);
    add_opt(&mut builder, se.name);
    add_opt(&mut builder, se.gender);
    add_opt(&mut builder, se.lifecycle);
    add_opt(&mut builder, se.skills);
    add_opt(&mut builder, se.employment);
    add_opt(&mut builder, se.reproduction);
    add_opt(&mut builder, se.lineage);
    add_opt(&mut builder, se.appearance);
    add_opt(&mut builder, se.nourishment);
    add_opt(&mut builder, se.brain);
    add_opt(&mut builder, se.building_data);
    add_opt(&mut builder, se.building);
    add_opt(&mut builder, se.enemy);
    add_opt(&mut builder, se.enemy_brain);
    world.spawn_at(se.handle, builder.build());
}

/// Save the complete settlement to a writer
#[allow(clippy::too_many_arguments)]
pub fn save_settlement<W: Write>(
    writer: W,
    world: &World,
    sim_time: f64,
    time_scale: f32,
    tick_accumulator: f32,
    registry: &SettlementRegistry,
    ledger: &ResourceLedger,
    clock: &SettlementClock,
    stats: &PopulationStats,
    events: &EventLog,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        sim_time,
        time_scale,
        tick_accumulator,
        registry: registry.clone(),
        ledger: ledger.clone(),
        clock: clock.clone(),
        stats: *stats,
        events: events.clone(),
        entities: serialize_entities(world),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a settlement from a reader
pub fn load_settlement<R: Read>(reader: R) -> Result<LoadedSettlement, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    for se in save_data.entities {
        spawn_entity(&mut world, se);
    }

    Ok(LoadedSettlement {
        world,
        sim_time: save_data.sim_time,
        time_scale: save_data.time_scale,
        tick_accumulator: save_data.tick_accumulator,
        registry: save_data.registry,
        ledger: save_data.ledger,
        clock: save_data.clock,
        stats: save_data.stats,
        events: save_data.events,
    })
}

/// Result of loading a settlement
pub struct LoadedSettlement {
    pub world: World,
    pub sim_time: f64,
    pub time_scale: f32,
    pub tick_accumulator: f32,
    pub registry: SettlementRegistry,
    pub ledger: ResourceLedger,
    pub clock: SettlementClock,
    pub stats: PopulationStats,
    pub events: EventLog,
}

/// Errors that can occur during save/load
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}
