//! Movement system - updates positions for entities with a Movement component

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{Corpse, Mobility, Movement, Position, Vec2};

/// Distance under which an entity counts as arrived
pub const ARRIVAL_EPSILON: f32 = 0.1;

/// Uniform point in the square of half-width `radius` around `center`
pub fn random_point_near(center: Vec2, radius: f32, rng: &mut impl Rng) -> Vec2 {
    if !radius.is_finite() || radius <= 0.0 {
        return center;
    }
    center + Vec2::new(rng.gen_range(-radius..=radius), rng.gen_range(-radius..=radius))
}

/// Move entities toward their destinations, removing Movement on arrival
pub fn movement_system(world: &mut World, delta_seconds: f32) {
    // Reusable buffer - sized for typical use
    let mut updates: Vec<(Entity, Vec2, bool)> = Vec::with_capacity(64);

    // Collect updates (can't mutate while iterating)
    for (entity, (pos, movement)) in world
        .query::<(&Position, &Movement)>()
        .without::<&Corpse>()
        .iter()
    {
        let (next, arrived) = step_toward(pos.point, movement, delta_seconds);
        updates.push((entity, next, arrived));
    }

    for (entity, next, arrived) in updates {
        if let Ok(mut pos) = world.get::<&mut Position>(entity) {
            pos.point = next;
        }
        if arrived {
            let _ = world.remove_one::<Movement>(entity);
        }
    }
}

/// Returns the new point and whether the destination was reached this frame
fn step_toward(current: Vec2, movement: &Movement, delta_seconds: f32) -> (Vec2, bool) {
    let diff = movement.destination - current;
    let distance = diff.length();
    let step = movement.speed * delta_seconds;

    if distance < ARRIVAL_EPSILON || step >= distance {
        (movement.destination, true)
    } else {
        (current + diff.normalize() * step, false)
    }
}

/// Send an entity toward `destination` at its own walking speed.
/// Returns false if the entity cannot move.
pub fn start_movement(world: &mut World, entity: Entity, destination: Vec2) -> bool {
    let speed = match world.get::<&Mobility>(entity) {
        Ok(mobility) => mobility.speed,
        Err(_) => return false,
    };
    world
        .insert_one(entity, Movement::new(destination, speed))
        .is_ok()
}

/// Halt any movement in progress
pub fn stop_movement(world: &mut World, entity: Entity) {
    let _ = world.remove_one::<Movement>(entity);
}

pub fn is_moving(world: &World, entity: Entity) -> bool {
    world.get::<&Movement>(entity).is_ok()
}
