//! Deterministic PRNG threaded through world state (heat spawns, farm
//! placement, noise seeding).
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, excellent
//! statistical properties, and trivially serializable for snapshots.

/// SplitMix64 pseudo-random number generator.
///
/// The generator lives inside `WorldState`, so a tick is reproducible from
/// the snapshot that entered it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform draw in `[0, 1)` built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform draw in `[lo, hi)`.
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }

    /// Exponential inter-arrival time `-ln(U) / rate`.
    ///
    /// `U` is drawn from `(0, 1]` so the logarithm stays finite.
    pub fn exponential(&mut self, rate: f64) -> f64 {
        let u = 1.0 - self.next_f64();
        -u.ln() / rate
    }

    /// Get the internal state (for hashing/serialization).
    pub fn state(&self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        // Extremely unlikely to match.
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn unit_draws_stay_in_range() {
        let mut rng = SimRng::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn range_respects_bounds() {
        let mut rng = SimRng::new(99);
        for _ in 0..1_000 {
            let v = rng.range(-3.0, 5.0);
            assert!((-3.0..5.0).contains(&v));
        }
    }

    #[test]
    fn index_covers_all_slots() {
        let mut rng = SimRng::new(5);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[rng.index(4)] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn exponential_mean_is_inverse_rate() {
        let mut rng = SimRng::new(12345);
        let trials = 20_000;
        let rate = 0.01;
        let total: f64 = (0..trials).map(|_| rng.exponential(rate)).sum();
        let mean = total / trials as f64;
        // Expect ~100 (very generous tolerance).
        assert!((90.0..110.0).contains(&mean), "expected ~100, got {mean}");
    }

    #[test]
    fn exponential_is_finite_and_non_negative() {
        let mut rng = SimRng::new(3);
        for _ in 0..1_000 {
            let v = rng.exponential(1.0 / 360.0);
            assert!(v.is_finite() && v >= 0.0);
        }
    }

    #[test]
    fn serialization_round_trip() {
        let mut rng = SimRng::new(42);
        // Advance state.
        for _ in 0..50 {
            rng.next_u64();
        }

        let json = serde_json::to_string(&rng).unwrap();
        let restored: SimRng = serde_json::from_str(&json).unwrap();
        assert_eq!(rng, restored);

        // Both continue the same sequence.
        let mut rng2 = restored;
        for _ in 0..10 {
            assert_eq!(rng.next_u64(), rng2.next_u64());
        }
    }
}
