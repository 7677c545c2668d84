//! Error types for player commands and configuration loading.
//!
//! Simulation steps never fail; only inbound commands and I/O do.

use hecs::Entity;

use crate::components::BuildingType;

/// Why a worker assignment was refused
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobError {
    #[error("building {0:?} does not exist")]
    NoSuchBuilding(Entity),

    #[error("villager {0:?} does not exist or is dead")]
    NoSuchVillager(Entity),

    #[error("villager {0:?} is not of working age")]
    NotMature(Entity),

    #[error("building {building:?} is full ({max_workers} workers)")]
    BuildingFull { building: Entity, max_workers: u32 },

    #[error("building {0:?} does not employ workers")]
    NoJobs(Entity),
}

/// Failures of settlement-level commands
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettlementError {
    #[error("no catalog entry for {0:?}")]
    UnknownBuilding(BuildingType),

    #[error("cannot afford construction of {0:?}")]
    CannotAfford(BuildingType),

    #[error(transparent)]
    Job(#[from] JobError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}
