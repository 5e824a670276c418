//! Deterministic PRNG for in-simulation jitter.
//!
//! The world owns one generator. Every random draw happens inside the tick
//! pipeline in unit-list order, so a seed fully determines a game.

// Conversions truncate the 64-bit state
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

/// Xorshift64 generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        // Ensure non-zero state
        let state = if seed == 0 { 0x5555_5555_5555_5555 } else { seed };
        Self { state }
    }

    /// Generate next random u64.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate random u32 in [0, max).
    pub fn next_u32(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % u64::from(max)) as u32
    }

    /// Generate random f32 in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        // 24 bits fill the f32 mantissa exactly, so the result stays below 1.0
        ((self.next_u64() >> 40) as f32) / ((1u64 << 24) as f32)
    }

    /// Generate random f32 in [min, max).
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(0)
    }
}
