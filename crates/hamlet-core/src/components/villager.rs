//! Villager components: Villager, Lifecycle, Skills, Employment, Reproduction, etc.

use hecs::Entity;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::common::entity_opt;

/// Marker component identifying an entity as a villager
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Villager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn random(rng: &mut impl Rng) -> Self {
        if rng.gen_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

/// Coarse age category gating jobs and reproduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifeStage {
    Young,
    Mature,
    Dead,
}

impl LifeStage {
    /// Life stage is a pure function of age and the individual's life expectancy
    pub fn from_age(age: f32, young_threshold: f32, life_expectancy: f32) -> Self {
        if age >= life_expectancy {
            LifeStage::Dead
        } else if age >= young_threshold {
            LifeStage::Mature
        } else {
            LifeStage::Young
        }
    }
}

/// Age and life-stage bookkeeping
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Lifecycle {
    /// Age in years
    pub age: f32,
    /// Age at which this villager dies of old age, drawn at birth
    pub life_expectancy: f32,
    pub stage: LifeStage,
    /// Set once by `die`; guards against double death
    pub is_dead: bool,
}

impl Lifecycle {
    pub fn new(age: f32, life_expectancy: f32, young_threshold: f32) -> Self {
        Self {
            age,
            life_expectancy,
            stage: LifeStage::from_age(age, young_threshold, life_expectancy),
            is_dead: false,
        }
    }

    /// Add `delta_years` and recompute the stage.
    /// Returns `(from, to)` when the stage changed.
    pub fn advance(
        &mut self,
        delta_years: f32,
        young_threshold: f32,
    ) -> Option<(LifeStage, LifeStage)> {
        if self.is_dead {
            return None;
        }
        self.age += delta_years;
        let next = LifeStage::from_age(self.age, young_threshold, self.life_expectancy);
        if next != self.stage {
            let previous = self.stage;
            self.stage = next;
            Some((previous, next))
        } else {
            None
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    pub fn is_mature(&self) -> bool {
        !self.is_dead && self.stage == LifeStage::Mature
    }
}

/// Jobs a building can accept workers for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    Fisher,
    Woodcutter,
    Miner,
    Blacksmith,
    Guard,
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::Fisher,
        JobType::Woodcutter,
        JobType::Miner,
        JobType::Blacksmith,
        JobType::Guard,
    ];

    /// Combat jobs engage threats directly instead of looking for a shield
    pub fn is_combat(&self) -> bool {
        matches!(self, JobType::Guard)
    }
}

/// Per-job proficiency. 1.0 is an average worker; values grow with work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Skills {
    pub fishing: f32,
    pub woodcutting: f32,
    pub mining: f32,
    pub smithing: f32,
    pub guarding: f32,
}

impl Default for Skills {
    fn default() -> Self {
        Self {
            fishing: 1.0,
            woodcutting: 1.0,
            mining: 1.0,
            smithing: 1.0,
            guarding: 1.0,
        }
    }
}

impl Skills {
    /// Generate random starting skills around 1.0
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            fishing: rng.gen_range(0.6..1.4),
            woodcutting: rng.gen_range(0.6..1.4),
            mining: rng.gen_range(0.6..1.4),
            smithing: rng.gen_range(0.6..1.4),
            guarding: rng.gen_range(0.6..1.4),
        }
    }

    pub fn get(&self, job: JobType) -> f32 {
        match job {
            JobType::Fisher => self.fishing,
            JobType::Woodcutter => self.woodcutting,
            JobType::Miner => self.mining,
            JobType::Blacksmith => self.smithing,
            JobType::Guard => self.guarding,
        }
    }

    pub fn get_mut(&mut self, job: JobType) -> &mut f32 {
        match job {
            JobType::Fisher => &mut self.fishing,
            JobType::Woodcutter => &mut self.woodcutting,
            JobType::Miner => &mut self.mining,
            JobType::Blacksmith => &mut self.smithing,
            JobType::Guard => &mut self.guarding,
        }
    }

    /// Raise a skill by `amount`, never past `cap`
    pub fn improve(&mut self, job: JobType, amount: f32, cap: f32) {
        let value = self.get_mut(job);
        *value = (*value + amount).min(cap);
    }

    /// Child skills: parental mean with multiplicative jitter, floored per skill
    pub fn inherit(a: &Skills, b: &Skills, jitter: f32, floor: f32, rng: &mut impl Rng) -> Self {
        let mut child = Skills::default();
        for job in JobType::ALL {
            let mean = (a.get(job) + b.get(job)) / 2.0;
            let factor = if jitter > 0.0 {
                rng.gen_range(1.0 - jitter..=1.0 + jitter)
            } else {
                1.0
            };
            *child.get_mut(job) = (mean * factor).max(floor);
        }
        child
    }
}

/// Melee attributes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CombatStats {
    pub strength: f32,
    pub defense: f32,
}

impl CombatStats {
    pub fn new(strength: f32, defense: f32) -> Self {
        Self { strength, defense }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            strength: rng.gen_range(4.0..8.0),
            defense: rng.gen_range(0.0..2.0),
        }
    }

    pub fn inherit(a: &CombatStats, b: &CombatStats) -> Self {
        Self {
            strength: (a.strength + b.strength) / 2.0,
            defense: (a.defense + b.defense) / 2.0,
        }
    }
}

/// Job link - one side of the villager/building bidirectional reference
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Employment {
    #[serde(with = "entity_opt")]
    pub building: Option<Entity>,
}

/// Reproduction state
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Reproduction {
    #[serde(with = "entity_opt")]
    pub partner: Option<Entity>,
    /// Years since this villager last had a child
    pub time_since_last_child: f32,
    pub children: u32,
}

impl Reproduction {
    /// Starting villagers begin past their cooldown
    pub fn ready(cooldown: f32) -> Self {
        Self {
            partner: None,
            time_since_last_child: cooldown,
            children: 0,
        }
    }

    pub fn off_cooldown(&self, cooldown: f32) -> bool {
        self.time_since_last_child >= cooldown
    }
}

/// Parents of a villager. Weak links, only read when the child is created.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Lineage {
    #[serde(with = "entity_opt")]
    pub mother: Option<Entity>,
    #[serde(with = "entity_opt")]
    pub father: Option<Entity>,
}

/// Inheritable look, rendered by the presentation layer
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appearance {
    pub variant: u8,
}

impl Appearance {
    pub fn random(rng: &mut impl Rng, variants: u8) -> Self {
        Self {
            variant: rng.gen_range(0..variants.max(1)),
        }
    }

    /// With probability `inherit_chance` copy a uniformly chosen parent, otherwise mutate
    pub fn inherit(
        a: &Appearance,
        b: &Appearance,
        inherit_chance: f64,
        variants: u8,
        rng: &mut impl Rng,
    ) -> Self {
        if rng.gen_bool(inherit_chance.clamp(0.0, 1.0)) {
            if rng.gen_bool(0.5) {
                *a
            } else {
                *b
            }
        } else {
            Self::random(rng, variants)
        }
    }
}

/// Result of the last meal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Nourishment {
    pub fed: bool,
    /// Consecutive meals missed
    pub hungry_days: u32,
}

impl Default for Nourishment {
    fn default() -> Self {
        Self {
            fed: true,
            hungry_days: 0,
        }
    }
}
