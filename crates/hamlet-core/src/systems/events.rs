//! Settlement events - notifications from the core to its collaborators.
//!
//! Systems push events while they run; the UI, audio or a save-game journal
//! drains them after each frame with `SettlementEngine::drain_events`.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::components::{entity_bits, BuildingType, LifeStage, ResourceKind};

use super::clock::Season;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    OldAge,
    Combat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettlementEvent {
    NewDay {
        day: u32,
    },
    MealTime {
        day: u32,
    },
    SeasonChanged {
        from: Season,
        to: Season,
    },
    MealServed {
        fed: u32,
        hungry: u32,
    },
    LifeStageChanged {
        #[serde(with = "entity_bits")]
        villager: Entity,
        from: LifeStage,
        to: LifeStage,
    },
    VillagerBorn {
        #[serde(with = "entity_bits")]
        child: Entity,
        #[serde(with = "entity_bits")]
        mother: Entity,
        #[serde(with = "entity_bits")]
        father: Entity,
    },
    VillagerDied {
        #[serde(with = "entity_bits")]
        villager: Entity,
        cause: DeathCause,
    },
    ProductionCompleted {
        #[serde(with = "entity_bits")]
        building: Entity,
        resource: ResourceKind,
        amount: f32,
    },
    BuildingConstructed {
        #[serde(with = "entity_bits")]
        building: Entity,
        building_type: BuildingType,
    },
    EnemyKilled {
        #[serde(with = "entity_bits")]
        enemy: Entity,
    },
}

/// Pending events, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<SettlementEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SettlementEvent) {
        self.events.push(event);
    }

    pub fn pending(&self) -> &[SettlementEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<SettlementEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_log() {
        let mut log = EventLog::new();
        log.push(SettlementEvent::NewDay { day: 1 });
        log.push(SettlementEvent::MealTime { day: 1 });
        assert_eq!(log.len(), 2);

        let drained = log.drain();
        assert_eq!(drained[0], SettlementEvent::NewDay { day: 1 });
        assert!(log.is_empty());
    }

    #[test]
    fn test_events_serialize_to_json() {
        let mut world = hecs::World::new();
        let villager = world.spawn((1u8,));
        let event = SettlementEvent::VillagerDied {
            villager,
            cause: DeathCause::OldAge,
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: SettlementEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
