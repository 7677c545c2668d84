//! Systems - logic that operates on components

mod clock;
mod combat;
mod enemy_ai;
mod events;
mod lifecycle;
mod meals;
mod movement;
mod production;
mod registry;
mod stats;
mod villager_ai;

pub use clock::*;
pub use combat::*;
pub use enemy_ai::*;
pub use events::*;
pub use lifecycle::*;
pub use meals::*;
pub use movement::*;
pub use production::*;
pub use registry::*;
pub use stats::*;
pub use villager_ai::*;
