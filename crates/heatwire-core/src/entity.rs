//! Entities placed on the coarse grid: sensors, farms and controllers.
//!
//! The registry is part of [`WorldState`](crate::world::WorldState). It is
//! never mutated in place: operations that add or drop entities return a new
//! registry so the previous snapshot stays intact.

use serde::{Deserialize, Serialize};

use crate::vec2::Vec2;

/// Identifies an entity. Ids are unique across all entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Sensor,
    Farm,
    Controller,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Sensor => "sensor",
            EntityKind::Farm => "farm",
            EntityKind::Controller => "controller",
        };
        f.write_str(name)
    }
}

/// Per-kind payload. Only sensors use `radius` (in fine field cells).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Position on the coarse grid.
    pub pos: Vec2,
    #[serde(default)]
    pub data: EntityData,
}

impl Entity {
    pub fn sensor(id: u32, pos: Vec2, radius: f64) -> Self {
        Self {
            id: EntityId(id),
            kind: EntityKind::Sensor,
            pos,
            data: EntityData {
                radius: Some(radius),
            },
        }
    }

    pub fn farm(id: u32, pos: Vec2) -> Self {
        Self {
            id: EntityId(id),
            kind: EntityKind::Farm,
            pos,
            data: EntityData::default(),
        }
    }

    pub fn controller(id: u32, pos: Vec2) -> Self {
        Self {
            id: EntityId(id),
            kind: EntityKind::Controller,
            pos,
            data: EntityData::default(),
        }
    }
}

/// Errors raised while assembling world state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error("duplicate entity id {0}")]
    DuplicateEntityId(EntityId),
    #[error("grid must have non-zero rows, columns and resolution (got {rows}x{columns} @ {resolution})")]
    EmptyGrid {
        rows: usize,
        columns: usize,
        resolution: usize,
    },
    #[error("target fps must be positive (got {0})")]
    InvalidFps(f64),
}

/// Fixed-shape list of entities with lookups by `(id, kind)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Entity>", into = "Vec<Entity>")]
pub struct EntityRegistry {
    entities: Vec<Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting duplicate ids.
    pub fn from_entities(entities: Vec<Entity>) -> Result<Self, WorldError> {
        let mut registry = Self::new();
        for entity in entities {
            registry = registry.with_entity(entity)?;
        }
        Ok(registry)
    }

    /// A new registry with `entity` appended.
    pub fn with_entity(&self, entity: Entity) -> Result<Self, WorldError> {
        if self.entities.iter().any(|e| e.id == entity.id) {
            return Err(WorldError::DuplicateEntityId(entity.id));
        }
        let mut entities = self.entities.clone();
        entities.push(entity);
        Ok(Self { entities })
    }

    /// Look up an entity by id and kind. An id bound to a different kind
    /// does not match.
    pub fn find(&self, id: EntityId, kind: EntityKind) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id && e.kind == kind)
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Is any entity standing on grid cell `pos`?
    pub fn occupies(&self, pos: Vec2) -> bool {
        self.entities.iter().any(|e| e.pos.approx_eq(pos))
    }

    /// One past the largest id in use.
    pub fn next_id(&self) -> EntityId {
        EntityId(self.entities.iter().map(|e| e.id.0 + 1).max().unwrap_or(0))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl TryFrom<Vec<Entity>> for EntityRegistry {
    type Error = WorldError;

    fn try_from(entities: Vec<Entity>) -> Result<Self, Self::Error> {
        Self::from_entities(entities)
    }
}

impl From<EntityRegistry> for Vec<Entity> {
    fn from(registry: EntityRegistry) -> Self {
        registry.entities
    }
}
