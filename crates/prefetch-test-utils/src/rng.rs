//! Deterministic PRNG for reproducible timing jitter.

use std::time::Duration;

/// Minimal xorshift64 PRNG.
///
/// Use a fixed seed so interleavings are identical across runs.
pub struct Xorshift64(u64);

impl Xorshift64 {
    /// Create a generator. A zero seed is replaced, xorshift would stay at zero.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Returns `f64` in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Returns `u64` in `[min, max)`, or `min` when the range is empty.
    pub fn range_u64(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + ((max - min) as f64 * self.next_f64()) as u64
    }

    /// Random delay in `[0, max_micros)` microseconds.
    pub fn jitter(&mut self, max_micros: u64) -> Duration {
        Duration::from_micros(self.range_u64(0, max_micros))
    }
}
