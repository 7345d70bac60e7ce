//! Seedable random source for the mock services
//!
//! Damage detection, part pricing variance, labor hours, fraud jitter and photo
//! quality checks all draw from a [`RandomSource`] so that tests can inject a
//! fixed sequence or a fixed seed and get reproducible output.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// A source of uniformly distributed values in `[0, 1)`
///
/// Only [`RandomSource::next_f64`] must be implemented; every other draw is
/// derived from it so that alternative sources stay consistent.
pub trait RandomSource: Send {
    /// Next value in `[0, 1)`
    fn next_f64(&mut self) -> f64;

    /// Uniform value in `[min, max)`
    fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Uniform integer in `[min, max]`
    fn range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        let offset = (self.next_f64() * span).floor() as i64;
        min + offset.min(max - min)
    }

    /// Returns true with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform decimal in `[min, max]` rounded to `dp` places
    fn decimal_between(&mut self, min: Decimal, max: Decimal, dp: u32) -> Decimal {
        let t = Decimal::from_f64(self.next_f64()).unwrap_or(Decimal::ZERO);
        (min + (max - min) * t).round_dp(dp)
    }

    /// Picks an index into a collection of `len` elements
    fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.range_i64(0, len as i64 - 1) as usize
    }
}

/// Production random source backed by [`StdRng`]
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy-backed otherwise
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of values, cycling when exhausted
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    position: usize,
}

impl SequenceRandom {
    /// Values are clamped into `[0, 1)`. An empty list behaves like `constant(0.0)`.
    pub fn new(values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.clamp(0.0, 0.999_999_999))
            .collect();
        Self { values, position: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}
