//! Snapshot hashing for replay and desync checks.
//!
//! [`SnapshotHasher`] is 64-bit FNV-1a behind the [`std::hash::Hasher`]
//! interface, with typed writers for the float data a snapshot is made of.
//! Floats are fed by bit pattern: `0.0` and `-0.0` hash differently, and a
//! NaN hashes like any other value.

use std::hash::Hasher;

use crate::vec2::Vec2;

const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHasher {
    state: u64,
}

impl Default for SnapshotHasher {
    fn default() -> Self {
        Self { state: OFFSET_BASIS }
    }
}

impl SnapshotHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    pub fn write_vec2(&mut self, v: Vec2) {
        self.write_f64(v.x);
        self.write_f64(v.y);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }
}

impl Hasher for SnapshotHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state = (self.state ^ u64::from(b)).wrapping_mul(PRIME);
        }
    }

    /// Little-endian on every platform, so hashes compare across machines.
    fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    fn finish(&self) -> u64 {
        self.state
    }
}
