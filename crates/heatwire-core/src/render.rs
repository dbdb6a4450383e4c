//! Helpers for a presentation layer: a temperature colour ramp and the
//! cosmetic water texture. Nothing here feeds back into the simulation.

use serde::{Deserialize, Serialize};

use crate::field::TemperatureField;
use crate::math::lerp;
use crate::noise::NoiseField;
use crate::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// One control point of a [`ColorRamp`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub at: f64,
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Piecewise-linear colour per channel over stops sorted by `at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRamp {
    stops: Vec<ColorStop>,
}

impl Default for ColorRamp {
    /// Blue at 16 degrees, green at 21, red at 26.
    fn default() -> Self {
        Self::new(vec![
            ColorStop { at: 16.0, r: 0.0, g: 0.0, b: 255.0 },
            ColorStop { at: 21.0, r: 0.0, g: 255.0, b: 0.0 },
            ColorStop { at: 26.0, r: 255.0, g: 0.0, b: 0.0 },
        ])
    }
}

impl ColorRamp {
    /// Stops are sorted by position on construction.
    pub fn new(mut stops: Vec<ColorStop>) -> Self {
        stops.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { stops }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn color(&self, value: f64) -> Rgb {
        let channel = |pick: fn(&ColorStop) -> f64| {
            let points: Vec<(f64, f64)> = self.stops.iter().map(|s| (s.at, pick(s))).collect();
            lerp(value, &points).round().clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: channel(|s| s.r),
            g: channel(|s| s.g),
            b: channel(|s| s.b),
        }
    }

    /// Colour every cell of a field, row-major.
    pub fn paint(&self, field: &TemperatureField) -> Vec<Rgb> {
        field.cells().map(|(_, _, v)| self.color(v)).collect()
    }
}

/// Water heights for a `width x height` overlay, row-major, in `[0, 1]`.
///
/// Noise is sampled through the same wind offset as the temperature field
/// and shaped with `1 - h^2`, so calm water dominates.
pub fn water_texture(noise: &NoiseField, width: usize, height: usize, sim_offset: Vec2, sample_scale: Vec2) -> Vec<f64> {
    let mut heights = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let p = (Vec2::new(x as f64, y as f64) - sim_offset).scale(sample_scale);
            let h = noise.sample01(p.x, p.y);
            heights.push(1.0 - h * h);
        }
    }
    heights
}
