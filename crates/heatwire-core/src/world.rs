//! World state: the single snapshot threaded through the pipeline.
//!
//! A `WorldState` is built once at level setup. Every pipeline step takes
//! the previous snapshot by reference and returns a new one, so a snapshot
//! never changes after it has been produced.

use std::hash::Hasher;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKind, EntityRegistry, WorldError};
use crate::field::TemperatureField;
use crate::hash::SnapshotHasher;
use crate::heat::{HeatPoint, HeatSource};
use crate::rng::SimRng;
use crate::vec2::Vec2;

/// Static level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Ticks per second the driver aims for.
    pub target_fps: f64,
    pub rows: usize,
    pub columns: usize,
    /// Fine field cells per coarse grid cell, per axis.
    pub resolution: usize,
    /// Score that wins the level.
    pub target_score: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            target_fps: 12.0,
            rows: 10,
            columns: 10,
            resolution: 10,
            target_score: 200.0,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.rows == 0 || self.columns == 0 || self.resolution == 0 {
            return Err(WorldError::EmptyGrid {
                rows: self.rows,
                columns: self.columns,
                resolution: self.resolution,
            });
        }
        if !(self.target_fps > 0.0) {
            return Err(WorldError::InvalidFps(self.target_fps));
        }
        Ok(())
    }

    pub fn field_width(&self) -> usize {
        self.columns * self.resolution
    }

    pub fn field_height(&self) -> usize {
        self.rows * self.resolution
    }

    /// Fine field extent `(width, height)`; also the simulation bounding box.
    pub fn field_dimensions(&self) -> Vec2 {
        Vec2::new(self.field_width() as f64, self.field_height() as f64)
    }

    /// Coarse grid extent `(columns, rows)`.
    pub fn grid_dimensions(&self) -> Vec2 {
        Vec2::new(self.columns as f64, self.rows as f64)
    }
}

/// One tick's worth of simulation truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub config: WorldConfig,
    pub entities: EntityRegistry,
    /// Field cells travelled per tick.
    pub wind: Vec2,
    /// Accumulated wind drift; shifts the noise sampling window.
    pub sim_offset: Vec2,
    pub heat_points: Vec<HeatPoint>,
    /// Tick at which the next random heat point spawns.
    pub next_heat_point: u64,
    pub temp: TemperatureField,
    pub coins: f64,
    pub score: f64,
    /// Tick counter.
    pub time: u64,
    pub is_game_over: bool,
    pub game_finished: bool,
    pub rng: SimRng,
}

impl WorldState {
    /// A fresh world with an all-zero field and no entities.
    pub fn new(config: WorldConfig, seed: u64) -> Result<Self, WorldError> {
        config.validate()?;
        Ok(Self {
            config,
            entities: EntityRegistry::new(),
            wind: Vec2::ZERO,
            sim_offset: Vec2::ZERO,
            heat_points: Vec::new(),
            next_heat_point: 0,
            temp: TemperatureField::uniform(config.field_width(), config.field_height(), 0.0),
            coins: 0.0,
            score: 0.0,
            time: 0,
            is_game_over: false,
            game_finished: false,
            rng: SimRng::new(seed),
        })
    }

    pub fn with_entities(self, entities: Vec<Entity>) -> Result<Self, WorldError> {
        Ok(Self {
            entities: EntityRegistry::from_entities(entities)?,
            ..self
        })
    }

    pub fn with_wind(self, wind: Vec2) -> Self {
        Self { wind, ..self }
    }

    pub fn with_heat_points(self, heat_points: Vec<HeatPoint>) -> Self {
        Self {
            heat_points,
            ..self
        }
    }

    pub fn with_temperature(self, temp: TemperatureField) -> Self {
        Self { temp, ..self }
    }

    pub fn with_coins(self, coins: f64) -> Self {
        Self { coins, ..self }
    }

    pub fn farm_count(&self) -> usize {
        self.entities.count(EntityKind::Farm)
    }

    /// Controller heat pins currently in place.
    pub fn active_controller_count(&self) -> usize {
        self.heat_points
            .iter()
            .filter(|p| p.source == HeatSource::Controller)
            .count()
    }

    /// Deterministic hash of the snapshot, for desync and replay checks.
    pub fn state_hash(&self) -> u64 {
        let mut h = SnapshotHasher::new();
        h.write_u64(self.time);
        h.write_f64(self.coins);
        h.write_f64(self.score);
        h.write_vec2(self.wind);
        h.write_vec2(self.sim_offset);
        h.write_u64(self.next_heat_point);
        h.write_u64(self.rng.state());
        h.write_bool(self.is_game_over);
        h.write_bool(self.game_finished);
        for e in self.entities.iter() {
            h.write_u32(e.id.0);
            h.write_u8(e.kind as u8);
            h.write_vec2(e.pos);
        }
        for p in &self.heat_points {
            h.write_vec2(p.pos);
            h.write_vec2(p.vel);
            h.write_f64(p.strength);
            h.write_u8(p.source as u8);
        }
        for (_, _, v) in self.temp.cells() {
            h.write_f64(v);
        }
        h.finish()
    }
}
