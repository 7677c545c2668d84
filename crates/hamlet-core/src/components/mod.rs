//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod behavior;
mod building;
mod combat;
mod common;
mod economy;
mod villager;

pub use behavior::*;
pub use building::*;
pub use combat::*;
pub use common::*;
pub use economy::*;
pub use villager::*;
