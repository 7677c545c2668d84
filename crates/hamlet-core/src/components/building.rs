//! Building components: static BuildingData and live Building state.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::common::entity_vec;
use super::economy::{CraftingRecipe, ResourceAmount, ResourceKind};
use super::villager::JobType;

/// Progress needed to finish one production cycle or a construction
pub const PROGRESS_COMPLETE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    TownHall,
    Fishery,
    LumberCamp,
    Quarry,
    Mine,
    Smithy,
    Armory,
    Watchtower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductionType {
    /// Workers turn time into a raw resource
    Gathering,
    /// Workers turn recipe inputs into an output
    Crafting,
    /// Workers are stationed here but nothing is produced
    Garrison,
}

/// Static definition of a building kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingData {
    pub name: String,
    pub building_type: BuildingType,
    pub construction_cost: Vec<ResourceAmount>,
    /// Seconds from placement to completion
    pub construction_time: f32,
    pub job_type: Option<JobType>,
    pub max_workers: u32,
    pub production_type: ProductionType,
    /// Output of a gathering cycle
    pub produced_resource: Option<ResourceKind>,
    pub production_amount: f32,
    /// Progress points per second for a worker with multiplier 1.0 (gathering)
    pub base_rate: f32,
    pub recipe: Option<CraftingRecipe>,
}

impl BuildingData {
    /// Rate used for the worker-weighted speed sum
    pub fn work_rate(&self) -> f32 {
        match self.production_type {
            ProductionType::Gathering => self.base_rate,
            ProductionType::Crafting => self.recipe.as_ref().map(|r| r.rate).unwrap_or(0.0),
            ProductionType::Garrison => 0.0,
        }
    }
}

/// Live state of a placed building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    /// 0..=100; the building works once this reaches 100
    pub construction_progress: f32,
    /// Current cycle completion in [0, 100)
    pub production_progress: f32,
    /// Assigned villagers, never more than `BuildingData::max_workers`
    #[serde(with = "entity_vec")]
    pub workers: Vec<Entity>,
    /// Set while a crafting cycle is frozen for lack of inputs
    pub waiting_for_resources: bool,
    /// Progress points per second as of the last production update
    pub current_speed: f32,
}

impl Building {
    pub fn new(construction_time: f32) -> Self {
        Self {
            construction_progress: if construction_time <= 0.0 {
                PROGRESS_COMPLETE
            } else {
                0.0
            },
            production_progress: 0.0,
            workers: Vec::new(),
            waiting_for_resources: false,
            current_speed: 0.0,
        }
    }

    pub fn is_constructed(&self) -> bool {
        self.construction_progress >= PROGRESS_COMPLETE
    }

    pub fn has_worker(&self, villager: Entity) -> bool {
        self.workers.contains(&villager)
    }

    pub fn is_full(&self, max_workers: u32) -> bool {
        self.workers.len() >= max_workers as usize
    }

    /// Seconds until the current cycle completes at the current speed.
    /// Infinite when nobody is working.
    pub fn estimated_time_to_completion(&self) -> f32 {
        if self.current_speed <= 0.0 {
            return f32::INFINITY;
        }
        (PROGRESS_COMPLETE - self.production_progress).max(0.0) / self.current_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_construction_time_is_built_immediately() {
        assert!(Building::new(0.0).is_constructed());
        assert!(!Building::new(10.0).is_constructed());
    }

    #[test]
    fn test_eta_is_infinite_without_speed() {
        let mut building = Building::new(0.0);
        assert!(building.estimated_time_to_completion().is_infinite());

        building.current_speed = 20.0;
        building.production_progress = 60.0;
        assert!((building.estimated_time_to_completion() - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_worker_capacity() {
        let mut world = hecs::World::new();
        let mut building = Building::new(0.0);
        assert!(!building.is_full(1));
        building.workers.push(world.spawn((1u8,)));
        assert!(building.is_full(1));
    }
}
