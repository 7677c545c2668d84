//! Population statistics, recomputed from scratch every lifecycle tick.

use hecs::World;
use serde::{Deserialize, Serialize};

use crate::components::{Employment, Gender, LifeStage, Lifecycle};

use super::registry::SettlementRegistry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub total: u32,
    pub young: u32,
    pub mature: u32,
    pub male: u32,
    pub female: u32,
    pub births: u32,
    pub deaths: u32,
    pub average_age: f32,
    /// Mature villagers without a job
    pub available_workers: u32,
}

/// Full O(n) recount over the registry
pub fn compute_population_stats(world: &World, registry: &SettlementRegistry) -> PopulationStats {
    let mut stats = PopulationStats {
        births: registry.births,
        deaths: registry.deaths,
        ..Default::default()
    };
    let mut age_sum = 0.0;

    for &villager in registry.villagers() {
        let Ok(life) = world.get::<&Lifecycle>(villager) else {
            continue;
        };
        if !life.is_alive() {
            continue;
        }

        stats.total += 1;
        age_sum += life.age;

        match life.stage {
            LifeStage::Young => stats.young += 1,
            LifeStage::Mature => {
                stats.mature += 1;
                let employed = world
                    .get::<&Employment>(villager)
                    .map(|e| e.building.is_some())
                    .unwrap_or(false);
                if !employed {
                    stats.available_workers += 1;
                }
            }
            LifeStage::Dead => {}
        }

        match world.get::<&Gender>(villager).map(|g| *g) {
            Ok(Gender::Male) => stats.male += 1,
            Ok(Gender::Female) => stats.female += 1,
            Err(_) => {}
        }
    }

    if stats.total > 0 {
        stats.average_age = age_sum / stats.total as f32;
    }
    stats
}
