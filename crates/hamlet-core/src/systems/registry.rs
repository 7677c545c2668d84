//! Settlement registry - the authoritative sets of live villagers and buildings.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::components::entity_vec;

/// Live villager and building handles plus birth/death counters.
///
/// Every insert and removal is idempotent: registering twice keeps one
/// entry, removing an absent handle changes nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementRegistry {
    #[serde(with = "entity_vec")]
    villagers: Vec<Entity>,
    #[serde(with = "entity_vec")]
    buildings: Vec<Entity>,
    pub births: u32,
    pub deaths: u32,
}

impl SettlementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a founding villager. Returns false if already present.
    pub fn register_villager(&mut self, villager: Entity) -> bool {
        if self.villagers.contains(&villager) {
            return false;
        }
        self.villagers.push(villager);
        true
    }

    /// Add a newborn and count the birth
    pub fn register_birth(&mut self, child: Entity) -> bool {
        let added = self.register_villager(child);
        if added {
            self.births += 1;
        }
        added
    }

    /// Remove a dead villager and count the death
    pub fn unregister_villager(&mut self, villager: Entity) -> bool {
        let before = self.villagers.len();
        self.villagers.retain(|v| *v != villager);
        let removed = self.villagers.len() != before;
        if removed {
            self.deaths += 1;
        }
        removed
    }

    pub fn register_building(&mut self, building: Entity) -> bool {
        if self.buildings.contains(&building) {
            return false;
        }
        self.buildings.push(building);
        true
    }

    pub fn unregister_building(&mut self, building: Entity) -> bool {
        let before = self.buildings.len();
        self.buildings.retain(|b| *b != building);
        self.buildings.len() != before
    }

    pub fn villagers(&self) -> &[Entity] {
        &self.villagers
    }

    pub fn buildings(&self) -> &[Entity] {
        &self.buildings
    }

    pub fn contains_villager(&self, villager: Entity) -> bool {
        self.villagers.contains(&villager)
    }

    pub fn contains_building(&self, building: Entity) -> bool {
        self.buildings.contains(&building)
    }

    pub fn population(&self) -> usize {
        self.villagers.len()
    }
}
