//! Generation - procedural creation of villagers and enemies, plus the building catalog

mod catalog;
mod enemies;
mod names;
mod villagers;

pub use catalog::*;
pub use enemies::*;
pub use names::*;
pub use villagers::*;
