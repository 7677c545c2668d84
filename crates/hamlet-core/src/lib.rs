//! Hamlet Core - Village Settlement Simulation Engine
//!
//! An ECS-based simulation of a small medieval settlement: villagers are
//! born, grow up, take jobs, eat, pair up, fight off raiders and grow old.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Villagers, buildings, enemies
//! - **Components**: Pure data attached to entities (Position, Lifecycle, Building, etc.)
//! - **Systems**: Logic that queries and updates components
//!
//! Per-frame systems (clock, production, behavior, movement, combat) run on
//! every `update`; aging, reproduction and population statistics run on a
//! fixed lifecycle tick.
//!
//! # Example
//!
//! ```rust,no_run
//! use hamlet_core::prelude::*;
//!
//! let mut engine = SettlementEngine::new(SimConfig::default()).unwrap();
//!
//! // Found the settlement with twelve villagers
//! engine.generate(12);
//!
//! // Run simulation
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//!     for event in engine.drain_events() {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod persistence;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::engine::SettlementEngine;
    pub use crate::error::{ConfigError, JobError, SettlementError};
    pub use crate::systems::{DeathCause, PopulationStats, Season, SettlementEvent};
}
