//! Behavior components: villager and enemy AI state.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::common::{entity_opt, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VillagerState {
    Idle,
    Wandering,
    MovingToWork,
    Working,
    PrepareCombat,
    Combat,
    Fleeing,
}

impl VillagerState {
    pub fn is_combat(&self) -> bool {
        matches!(
            self,
            VillagerState::PrepareCombat | VillagerState::Combat | VillagerState::Fleeing
        )
    }
}

/// Villager decision state
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Brain {
    pub state: VillagerState,
    /// Seconds left before an idle villager starts wandering
    pub idle_timer: f32,
    /// Seconds until the next threat scan
    pub scan_timer: f32,
    #[serde(with = "entity_opt")]
    pub threat: Option<Entity>,
    pub has_shield: bool,
}

impl Brain {
    pub fn new(idle_timer: f32) -> Self {
        Self {
            state: VillagerState::Idle,
            idle_timer,
            scan_timer: 0.0,
            threat: None,
            has_shield: false,
        }
    }
}

/// Marker component identifying a hostile creature
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Enemy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    Idle,
    Wandering,
    Searching,
    Chasing,
    Attacking,
    Returning,
}

/// Enemy decision state, leashed to its spawn point
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnemyBrain {
    pub state: EnemyState,
    pub spawn_point: Vec2,
    #[serde(with = "entity_opt")]
    pub target: Option<Entity>,
    pub last_seen: Vec2,
    /// Idle or search countdown, depending on state
    pub state_timer: f32,
    pub scan_timer: f32,
    /// Seconds the current target has been out of sight
    pub lost_for: f32,
}

impl EnemyBrain {
    pub fn new(spawn_point: Vec2, idle_timer: f32) -> Self {
        Self {
            state: EnemyState::Idle,
            spawn_point,
            target: None,
            last_seen: spawn_point,
            state_timer: idle_timer,
            scan_timer: 0.0,
            lost_for: 0.0,
        }
    }
}
