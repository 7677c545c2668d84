//! Combat components: Vitals (the Damageable data component) and Combatant.

use serde::{Deserialize, Serialize};

/// Result of one incoming hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Target was invincible or already dead
    Ignored,
    /// Health reduced by the contained amount
    Hit(f32),
    /// This hit took health to zero
    Killed,
}

/// Capability for anything that can be hurt
pub trait Damageable {
    /// Apply `max(0, incoming - defense)` unless inside the invincibility window
    fn take_damage(&mut self, incoming: f32, defense: f32) -> DamageOutcome;
    /// Restore health. Never revives.
    fn heal(&mut self, amount: f32);
    fn is_alive(&self) -> bool;
    /// Health as a fraction of max, 0..=1
    fn health_fraction(&self) -> f32;
}

/// Health, morale and the post-hit invincibility timer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    pub max_health: f32,
    /// 0..=max_morale, 100 is a content villager
    pub morale: f32,
    pub max_morale: f32,
    /// Seconds of invincibility left
    pub invincible_for: f32,
    /// Window granted after each landed hit
    pub invincibility_window: f32,
}

impl Vitals {
    pub fn new(max_health: f32, invincibility_window: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            morale: 100.0,
            max_morale: 100.0,
            invincible_for: 0.0,
            invincibility_window,
        }
    }

    /// Count down the invincibility window
    pub fn tick(&mut self, delta_seconds: f32) {
        self.invincible_for = (self.invincible_for - delta_seconds).max(0.0);
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_for > 0.0
    }

    pub fn adjust_morale(&mut self, delta: f32) {
        self.morale = (self.morale + delta).clamp(0.0, self.max_morale);
    }
}

impl Damageable for Vitals {
    fn take_damage(&mut self, incoming: f32, defense: f32) -> DamageOutcome {
        if !self.is_alive() || self.is_invincible() {
            return DamageOutcome::Ignored;
        }
        let damage = (incoming - defense).max(0.0);
        self.health = (self.health - damage).max(0.0);
        self.invincible_for = self.invincibility_window;
        if self.health <= 0.0 {
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hit(damage)
        }
    }

    fn heal(&mut self, amount: f32) {
        if !self.is_alive() || amount <= 0.0 {
            return;
        }
        self.health = (self.health + amount).min(self.max_health);
    }

    fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }
}

/// Capability for entities that can strike others
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Combatant {
    pub attack_range: f32,
    /// Seconds between strikes
    pub attack_cooldown: f32,
    pub cooldown_remaining: f32,
}

impl Combatant {
    pub fn new(attack_range: f32, attack_cooldown: f32) -> Self {
        Self {
            attack_range,
            attack_cooldown,
            cooldown_remaining: 0.0,
        }
    }

    pub fn tick(&mut self, delta_seconds: f32) {
        self.cooldown_remaining = (self.cooldown_remaining - delta_seconds).max(0.0);
    }

    pub fn ready(&self) -> bool {
        self.cooldown_remaining <= 0.0
    }

    pub fn trigger(&mut self) {
        self.cooldown_remaining = self.attack_cooldown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defense_reduces_damage() {
        let mut vitals = Vitals::new(100.0, 0.1);
        assert_eq!(vitals.take_damage(10.0, 3.0), DamageOutcome::Hit(7.0));
        assert_eq!(vitals.health, 93.0);
    }

    #[test]
    fn test_defense_never_heals() {
        let mut vitals = Vitals::new(100.0, 0.0);
        assert_eq!(vitals.take_damage(2.0, 5.0), DamageOutcome::Hit(0.0));
        assert_eq!(vitals.health, 100.0);
    }

    #[test]
    fn test_invincibility_window_ignores_overlapping_hits() {
        let mut vitals = Vitals::new(100.0, 0.1);
        vitals.take_damage(10.0, 0.0);
        assert_eq!(vitals.take_damage(10.0, 0.0), DamageOutcome::Ignored);
        assert_eq!(vitals.health, 90.0);

        vitals.tick(0.05);
        assert_eq!(vitals.take_damage(10.0, 0.0), DamageOutcome::Ignored);

        vitals.tick(0.06);
        assert_eq!(vitals.take_damage(10.0, 0.0), DamageOutcome::Hit(10.0));
        assert_eq!(vitals.health, 80.0);
    }

    #[test]
    fn test_killing_blow_and_no_revive() {
        let mut vitals = Vitals::new(10.0, 0.0);
        assert_eq!(vitals.take_damage(50.0, 0.0), DamageOutcome::Killed);
        assert!(!vitals.is_alive());

        vitals.heal(5.0);
        assert_eq!(vitals.health, 0.0);
        assert_eq!(vitals.take_damage(5.0, 0.0), DamageOutcome::Ignored);
    }

    #[test]
    fn test_heal_is_capped() {
        let mut vitals = Vitals::new(50.0, 0.0);
        vitals.take_damage(20.0, 0.0);
        vitals.heal(100.0);
        assert_eq!(vitals.health, 50.0);
        assert_eq!(vitals.health_fraction(), 1.0);
    }

    #[test]
    fn test_combatant_cooldown() {
        let mut c = Combatant::new(1.5, 1.0);
        assert!(c.ready());
        c.trigger();
        assert!(!c.ready());
        c.tick(1.0);
        assert!(c.ready());
    }
}
