//! Full recompute of the temperature field.
//!
//! Every tick each fine cell is sampled from scratch: a noise value mapped
//! into the base band, then the heat points of the incoming snapshot laid
//! over it. Nothing from the previous field is reused.

use serde::{Deserialize, Serialize};

use crate::field::TemperatureField;
use crate::heat::{HeatParams, HeatPoint, TemperatureBand, sample_temperature};
use crate::noise::NoiseField;
use crate::pipeline::{Simulation, StepContext};
use crate::vec2::Vec2;
use crate::world::WorldState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureConfig {
    /// Band the noise is mapped into before heat points apply.
    pub base_band: TemperatureBand,
    /// Per-axis scale from field coordinates to noise coordinates.
    pub sample_scale: Vec2,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            base_band: TemperatureBand::new(18.0, 26.0),
            sample_scale: Vec2::splat(1.0),
        }
    }
}

/// Recomputes `WorldState::temp` from noise and heat points.
#[derive(Debug, Clone)]
pub struct TemperatureStep {
    noise: NoiseField,
    config: TemperatureConfig,
    params: HeatParams,
}

impl TemperatureStep {
    pub fn new(noise: NoiseField, config: TemperatureConfig, params: HeatParams) -> Self {
        Self {
            noise,
            config,
            params,
        }
    }

    pub fn config(&self) -> &TemperatureConfig {
        &self.config
    }

    /// Noise-only temperature at a field coordinate.
    pub fn base_value(&self, coord: Vec2, sim_offset: Vec2) -> f64 {
        let p = (coord - sim_offset).scale(self.config.sample_scale);
        self.config.base_band.at(self.noise.sample01(p.x, p.y))
    }

    fn cell_value(&self, x: usize, y: usize, sim_offset: Vec2, heat_points: &[HeatPoint]) -> f64 {
        let coord = Vec2::new(x as f64, y as f64);
        let base = self.base_value(coord, sim_offset);
        sample_temperature(coord, base, heat_points, &self.params)
    }

    /// Sample every cell of a `width x height` field.
    pub fn compute(&self, width: usize, height: usize, sim_offset: Vec2, heat_points: &[HeatPoint]) -> TemperatureField {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let mut field = TemperatureField::uniform(width, height, 0.0);
            field
                .cells_mut()
                .par_chunks_mut(width.max(1))
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, cell) in row.iter_mut().enumerate() {
                        *cell = self.cell_value(x, y, sim_offset, heat_points);
                    }
                });
            field
        }

        #[cfg(not(feature = "parallel"))]
        {
            TemperatureField::from_fn(width, height, |x, y| self.cell_value(x, y, sim_offset, heat_points))
        }
    }
}

impl Simulation for TemperatureStep {
    fn name(&self) -> &str {
        "temperature"
    }

    fn apply(&self, prev: &WorldState, _ctx: &mut StepContext) -> WorldState {
        let temp = self.compute(
            prev.config.field_width(),
            prev.config.field_height(),
            prev.sim_offset,
            &prev.heat_points,
        );
        WorldState { temp, ..prev.clone() }
    }
}
