//! Common components used across multiple entity types.

use hecs::Entity;
use serde::{Deserialize, Serialize};

/// 2D position vector on the village ground plane
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// Spatial position component - where an entity stands in the village
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub point: Vec2,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            point: Vec2::new(x, y),
        }
    }
}

impl From<Vec2> for Position {
    fn from(point: Vec2) -> Self {
        Self { point }
    }
}

/// Capability marker for entities that can move on their own
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Mobility {
    /// Walking speed in units per second
    pub speed: f32,
}

impl Mobility {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }
}

/// Movement component - present only while entity is moving.
///
/// Movement is a direct-line seek toward `destination`; the component is
/// removed on arrival, which is how behavior systems detect arrival.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Movement {
    pub destination: Vec2,
    /// Units per second, copied from `Mobility` when the move starts
    pub speed: f32,
}

impl Movement {
    pub fn new(destination: Vec2, speed: f32) -> Self {
        Self { destination, speed }
    }
}

/// Name component for entities that have names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Name {
    pub given: String,
    pub family: String,
}

impl Name {
    pub fn new(given: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            given: given.into(),
            family: family.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.given, self.family)
    }
}

/// Serde adapter for a plain `Entity` handle
pub mod entity_bits {
    use hecs::Entity;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(entity: &Entity, s: S) -> Result<S::Ok, S::Error> {
        entity.to_bits().get().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Entity, D::Error> {
        let bits = u64::deserialize(d)?;
        Entity::from_bits(bits).ok_or_else(|| D::Error::custom("invalid entity handle"))
    }
}

/// Serde adapter for `Option<Entity>` back-references.
///
/// Handles are stored as their raw bits; persistence respawns entities with
/// the same handles so the references stay valid after a load.
pub mod entity_opt {
    use hecs::Entity;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(entity: &Option<Entity>, s: S) -> Result<S::Ok, S::Error> {
        entity.map(|e| e.to_bits().get()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Entity>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.and_then(Entity::from_bits))
    }
}

/// Serde adapter for `Vec<Entity>` handle lists
pub mod entity_vec {
    use hecs::Entity;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(entities: &[Entity], s: S) -> Result<S::Ok, S::Error> {
        let bits: Vec<u64> = entities.iter().map(|e| e.to_bits().get()).collect();
        bits.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Entity>, D::Error> {
        Ok(Vec::<u64>::deserialize(d)?
            .into_iter()
            .filter_map(Entity::from_bits)
            .collect())
    }
}

/// Component for a dead body awaiting removal from the world
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Corpse {
    /// Seconds until the entity is despawned
    pub remaining: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);

        let sum = a + b;
        assert_eq!(sum.x, 5.0);
        assert_eq!(sum.y, 8.0);

        let diff = b - a;
        assert_eq!(diff.x, 3.0);
        assert!((diff.length() - 5.0).abs() < 0.001);

        let scaled = a * 2.0;
        assert_eq!(scaled.y, 4.0);
    }

    #[test]
    fn test_vec2_normalize() {
        let n = Vec2::new(3.0, 4.0).normalize();
        assert!((n.length() - 1.0).abs() < 0.001);
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_name() {
        let name = Name::new("Ada", "Miller");
        assert_eq!(name.full_name(), "Ada Miller");
    }

    #[test]
    fn test_entity_refs_survive_serialization() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            #[serde(with = "entity_opt")]
            one: Option<Entity>,
            #[serde(with = "entity_vec")]
            many: Vec<Entity>,
        }

        let mut world = hecs::World::new();
        let a = world.spawn((1u8,));
        let b = world.spawn((2u8,));

        let holder = Holder {
            one: Some(a),
            many: vec![a, b],
        };
        let bytes = bincode::serialize(&holder).unwrap();
        let back: Holder = bincode::deserialize(&bytes).unwrap();

        assert_eq!(back.one, Some(a));
        assert_eq!(back.many, vec![a, b]);
    }
}
