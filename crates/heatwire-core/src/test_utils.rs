//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::entity::{Entity, EntityId};
use crate::field::TemperatureField;
use crate::vec2::Vec2;
use crate::world::{WorldConfig, WorldState};

pub const TEST_SEED: u64 = 42;

// ===========================================================================
// Entity ids used by the standard layout
// ===========================================================================

pub fn sensor_id() -> EntityId {
    EntityId(0)
}
pub fn farm_id() -> EntityId {
    EntityId(1)
}
pub fn controller_id() -> EntityId {
    EntityId(2)
}

/// Sensor 0 at (5, 5) radius 20, farm 1 at (4, 5), controller 2 at (4, 4).
pub fn standard_entities() -> Vec<Entity> {
    vec![
        Entity::sensor(0, Vec2::new(5.0, 5.0), 20.0),
        Entity::farm(1, Vec2::new(4.0, 5.0)),
        Entity::controller(2, Vec2::new(4.0, 4.0)),
    ]
}

// ===========================================================================
// Worlds
// ===========================================================================

/// Default 10x10 grid at resolution 10 (100x100 field), all-zero field, no
/// entities, tick 0, a spawn due immediately.
pub fn basic_world() -> WorldState {
    WorldState::new(WorldConfig::default(), TEST_SEED).expect("default config is valid")
}

/// `basic_world` with a uniform field of `value`.
pub fn uniform_world(value: f64) -> WorldState {
    let config = WorldConfig::default();
    basic_world().with_temperature(TemperatureField::uniform(config.field_width(), config.field_height(), value))
}

/// The standard layout on a uniform 21-degree field: nothing loses.
pub fn comfortable_world() -> WorldState {
    layout_world(21.0)
}

/// The standard layout on a uniform field of `value`.
pub fn layout_world(value: f64) -> WorldState {
    uniform_world(value)
        .with_entities(standard_entities())
        .expect("standard entities have unique ids")
}
