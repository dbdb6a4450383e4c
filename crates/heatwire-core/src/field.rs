//! The fine-grid temperature field.
//!
//! Entities live on a coarse `rows x columns` grid; the field is sampled on
//! a grid `resolution` times finer in each direction. Cell `(x, y)` covers
//! field coordinates `[x, x+1) x [y, y+1)` and belongs to coarse cell
//! `floor((x, y) / resolution)`.

use serde::{Deserialize, Serialize};

use crate::vec2::Vec2;

/// Row-major grid of temperatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureField {
    width: usize,
    height: usize,
    cells: Vec<f64>,
}

impl TemperatureField {
    /// A `width x height` field holding `value` everywhere.
    pub fn uniform(width: usize, height: usize, value: f64) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }

    /// Build a field by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major cell storage, for filling a field in place.
    pub fn cells_mut(&mut self) -> &mut [f64] {
        &mut self.cells
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x])
    }

    /// A copy of this field with one cell replaced.
    pub fn with_cell(&self, x: usize, y: usize, value: f64) -> Self {
        let mut next = self.clone();
        if x < self.width && y < self.height {
            next.cells[y * self.width + x] = value;
        }
        next
    }

    /// `(x, y, value)` for every cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i % width, i / width, v))
    }

    /// Maximum over every cell whose squared distance to `center` is
    /// strictly below `radius^2`. `None` when no cell qualifies.
    pub fn max_within(&self, center: Vec2, radius: f64) -> Option<f64> {
        let r2 = radius * radius;
        self.cells()
            .filter(|&(x, y, _)| (center - Vec2::new(x as f64, y as f64)).sqr_length() < r2)
            .map(|(_, _, v)| v)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
    }

    /// Every value in the block of fine cells covering coarse cell
    /// `grid_pos`.
    pub fn block(&self, grid_pos: Vec2, resolution: usize) -> impl Iterator<Item = f64> + '_ {
        let x0 = grid_pos.x.max(0.0) as usize * resolution;
        let y0 = grid_pos.y.max(0.0) as usize * resolution;
        let x1 = (x0 + resolution).min(self.width);
        let y1 = (y0 + resolution).min(self.height);
        (y0.min(y1)..y1).flat_map(move |y| (x0.min(x1)..x1).map(move |x| self.cells[y * self.width + x]))
    }
}

/// Coarse grid cell containing a fine-field position.
pub fn grid_cell(fine_pos: Vec2, resolution: usize) -> Vec2 {
    (fine_pos / resolution as f64).floor()
}

/// Fine-field position at the centre of a coarse grid cell.
pub fn cell_center(grid_pos: Vec2, resolution: usize) -> Vec2 {
    (grid_pos + Vec2::splat(0.5)) * resolution as f64
}
