//! Simulation tuning - every knob the engine reads, with defaults.
//!
//! A `SimConfig` is built once and handed to `SettlementEngine::new`. JSON
//! files may specify any subset of fields; the rest fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::{ResourceAmount, ResourceKind};
use crate::error::ConfigError;
use crate::systems::Season;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
    pub tick: TickConfig,
    pub lifecycle: LifecycleConfig,
    pub production: ProductionConfig,
    pub clock: ClockConfig,
    pub economy: EconomyConfig,
    pub behavior: BehaviorConfig,
    pub enemy: EnemyConfig,
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values that would stall the scheduler or leave a random draw
    /// with an empty range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tick;
        require(positive(t.interval_seconds), "tick.interval_seconds must be positive")?;
        require(non_negative(t.years_per_tick), "tick.years_per_tick must be non-negative")?;
        require(positive(t.max_frame_seconds), "tick.max_frame_seconds must be positive")?;

        let c = &self.clock;
        require(positive(c.day_length_seconds), "clock.day_length_seconds must be positive")?;
        require(
            (0.0..1.0).contains(&c.meal_time_of_day),
            "clock.meal_time_of_day must be in [0, 1)",
        )?;
        require(
            (0.0..=1.0).contains(&c.dawn) && (0.0..=1.0).contains(&c.dusk),
            "clock.dawn and clock.dusk must be in [0, 1]",
        )?;

        let lc = &self.lifecycle;
        require(positive(lc.young_threshold), "lifecycle.young_threshold must be positive")?;
        require(
            positive(lc.life_expectancy_min) && positive(lc.life_expectancy_max),
            "lifecycle.life_expectancy_min and life_expectancy_max must be positive",
        )?;
        require(
            lc.life_expectancy_min <= lc.life_expectancy_max,
            "lifecycle.life_expectancy_min exceeds life_expectancy_max",
        )?;
        require(
            lc.young_threshold < lc.life_expectancy_min,
            "lifecycle.young_threshold must be below life_expectancy_min",
        )?;
        require(
            non_negative(lc.reproduction_cooldown),
            "lifecycle.reproduction_cooldown must be non-negative",
        )?;
        require(
            (0.0..=1.0).contains(&lc.skill_jitter),
            "lifecycle.skill_jitter must be in [0, 1]",
        )?;
        require(
            non_negative(lc.min_inherited_skill),
            "lifecycle.min_inherited_skill must be non-negative",
        )?;
        require(
            (0.0..=1.0).contains(&lc.appearance_inherit_chance),
            "lifecycle.appearance_inherit_chance must be in [0, 1]",
        )?;
        require(
            non_negative(lc.corpse_grace_seconds) && non_negative(lc.invincibility_window),
            "lifecycle timers must be non-negative",
        )?;
        require(positive(lc.max_health), "lifecycle.max_health must be positive")?;

        let p = &self.production;
        require(
            non_negative(p.skill_gain_per_cycle) && non_negative(p.skill_cap),
            "production rates must be non-negative",
        )?;

        let e = &self.economy;
        require(
            non_negative(e.food_per_villager)
                && non_negative(e.fed_morale_gain)
                && non_negative(e.hungry_morale_loss),
            "economy rates must be non-negative",
        )?;

        let b = &self.behavior;
        require(
            [
                b.walk_speed,
                b.idle_min,
                b.idle_max,
                b.wander_radius,
                b.scan_interval,
                b.detection_range,
                b.flee_threshold,
                b.flee_distance,
                b.attack_range,
                b.attack_cooldown,
                b.shield_defense_bonus,
            ]
            .into_iter()
            .all(non_negative),
            "behavior values must be finite and non-negative",
        )?;

        let en = &self.enemy;
        require(positive(en.max_health), "enemy.max_health must be positive")?;
        require(
            [
                en.strength,
                en.defense,
                en.speed,
                en.detection_range,
                en.pursuit_range,
                en.lose_target_timeout,
                en.search_duration,
                en.attack_range,
                en.attack_cooldown,
                en.idle_min,
                en.idle_max,
                en.wander_radius,
                en.scan_interval,
            ]
            .into_iter()
            .all(non_negative),
            "enemy values must be finite and non-negative",
        )?;

        require(
            b.idle_min <= b.idle_max && en.idle_min <= en.idle_max,
            "idle_min exceeds idle_max",
        )
    }
}

fn require(ok: bool, message: &'static str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message))
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

/// Lifecycle tick pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Seconds of sim time between lifecycle ticks
    pub interval_seconds: f32,
    /// Years every villager ages per tick
    pub years_per_tick: f32,
    /// Longest sim step a single `update` may take; longer frames are clamped
    pub max_frame_seconds: f32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 1.0,
            years_per_tick: 0.1,
            max_frame_seconds: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub young_threshold: f32,
    pub life_expectancy_min: f32,
    pub life_expectancy_max: f32,
    /// Years between children for each parent
    pub reproduction_cooldown: f32,
    /// Multiplicative jitter applied to inherited skills (0.1 = ±10%)
    pub skill_jitter: f32,
    pub min_inherited_skill: f32,
    pub appearance_inherit_chance: f64,
    pub appearance_variants: u8,
    /// Seconds a body stays in the world after death
    pub corpse_grace_seconds: f32,
    pub max_health: f32,
    pub invincibility_window: f32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            young_threshold: 16.0,
            life_expectancy_min: 50.0,
            life_expectancy_max: 70.0,
            reproduction_cooldown: 3.0,
            skill_jitter: 0.1,
            min_inherited_skill: 0.5,
            appearance_inherit_chance: 0.8,
            appearance_variants: 8,
            corpse_grace_seconds: 2.0,
            max_health: 100.0,
            invincibility_window: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// Flat skill increase for every worker when a cycle completes
    pub skill_gain_per_cycle: f32,
    pub skill_cap: f32,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            skill_gain_per_cycle: 0.05,
            skill_cap: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub day_length_seconds: f32,
    /// Fraction of the day at which the meal is served
    pub meal_time_of_day: f32,
    pub days_per_season: u32,
    pub dawn: f32,
    pub dusk: f32,
    pub starting_season: Season,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            day_length_seconds: 120.0,
            meal_time_of_day: 0.5,
            days_per_season: 10,
            dawn: 0.25,
            dusk: 0.75,
            starting_season: Season::Spring,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub meal_resource: ResourceKind,
    /// Units of the meal resource each villager eats per day
    pub food_per_villager: f32,
    pub fed_morale_gain: f32,
    pub hungry_morale_loss: f32,
    pub starting_resources: Vec<ResourceAmount>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            meal_resource: ResourceKind::Fish,
            food_per_villager: 1.0,
            fed_morale_gain: 5.0,
            hungry_morale_loss: 10.0,
            starting_resources: vec![
                ResourceAmount::new(ResourceKind::Fish, 20.0),
                ResourceAmount::new(ResourceKind::Wood, 60.0),
                ResourceAmount::new(ResourceKind::Stone, 20.0),
            ],
        }
    }
}

/// Villager behavior tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub walk_speed: f32,
    pub idle_min: f32,
    pub idle_max: f32,
    pub wander_radius: f32,
    /// Seconds between threat scans
    pub scan_interval: f32,
    pub detection_range: f32,
    /// Health fraction under which a villager runs
    pub flee_threshold: f32,
    pub flee_distance: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    /// Extra defense while carrying a shield
    pub shield_defense_bonus: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            walk_speed: 1.5,
            idle_min: 2.0,
            idle_max: 6.0,
            wander_radius: 8.0,
            scan_interval: 0.5,
            detection_range: 10.0,
            flee_threshold: 0.3,
            flee_distance: 12.0,
            attack_range: 1.5,
            attack_cooldown: 1.0,
            shield_defense_bonus: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub max_health: f32,
    pub strength: f32,
    pub defense: f32,
    pub speed: f32,
    pub detection_range: f32,
    /// Max distance from spawn before giving up a chase
    pub pursuit_range: f32,
    /// Seconds a target may stay out of sight before the enemy searches
    pub lose_target_timeout: f32,
    pub search_duration: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub idle_min: f32,
    pub idle_max: f32,
    pub wander_radius: f32,
    pub scan_interval: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            max_health: 60.0,
            strength: 8.0,
            defense: 1.0,
            speed: 1.8,
            detection_range: 9.0,
            pursuit_range: 20.0,
            lose_target_timeout: 3.0,
            search_duration: 5.0,
            attack_range: 1.2,
            attack_cooldown: 1.2,
            idle_min: 2.0,
            idle_max: 5.0,
            wander_radius: 6.0,
            scan_interval: 0.5,
        }
    }
}
