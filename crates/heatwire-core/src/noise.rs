//! Seeded 2D Perlin noise for the base temperature field and the cosmetic
//! water texture.
//!
//! The permutation table is shuffled from a [`SimRng`], so two fields built
//! from the same seed sample identically.

use crate::rng::SimRng;

const GRADIENTS: [(f64, f64); 12] = [
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (0.0, 1.0),
    (0.0, -1.0),
];

/// Coherent gradient noise over the plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseField {
    seed: u64,
    perm: Vec<u8>,
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        let mut rng = SimRng::new(seed);
        let mut table: Vec<u8> = (0..=255u8).collect();
        // Fisher-Yates.
        for i in (1..table.len()).rev() {
            let j = rng.index(i + 1);
            table.swap(i, j);
        }
        let mut perm = Vec::with_capacity(512);
        perm.extend_from_slice(&table);
        perm.extend_from_slice(&table);
        Self { seed, perm }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Raw noise value, roughly in `[-1, 1]`. Zero on integer lattice points.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let xf = x.floor();
        let yf = y.floor();
        let dx = x - xf;
        let dy = y - yf;
        let xi = (xf as i64 & 255) as usize;
        let yi = (yf as i64 & 255) as usize;

        let n00 = self.corner(xi, yi, dx, dy);
        let n10 = self.corner(xi + 1, yi, dx - 1.0, dy);
        let n01 = self.corner(xi, yi + 1, dx, dy - 1.0);
        let n11 = self.corner(xi + 1, yi + 1, dx - 1.0, dy - 1.0);

        let u = fade(dx);
        let v = fade(dy);
        let bottom = n00 + (n10 - n00) * u;
        let top = n01 + (n11 - n01) * u;
        bottom + (top - bottom) * v
    }

    /// Noise remapped to `[0, 1]`.
    pub fn sample01(&self, x: f64, y: f64) -> f64 {
        ((self.sample(x, y) + 1.0) / 2.0).clamp(0.0, 1.0)
    }

    fn corner(&self, xi: usize, yi: usize, dx: f64, dy: f64) -> f64 {
        let hash = self.perm[xi + self.perm[yi] as usize] as usize;
        let (gx, gy) = GRADIENTS[hash % GRADIENTS.len()];
        gx * dx + gy * dy
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}
