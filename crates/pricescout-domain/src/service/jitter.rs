//! Random multiplicative jitter applied to every estimate

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lower bound of the jitter multiplier (inclusive)
pub const JITTER_MIN: f64 = 0.95;

/// Upper bound of the jitter multiplier (exclusive)
pub const JITTER_MAX: f64 = 1.05;

/// Source of the per-call noise multiplier
pub trait JitterSource {
    fn sample(&mut self) -> f64;
}

/// Uniform noise over [0.95, 1.05)
#[derive(Debug, Clone)]
pub struct UniformJitter {
    rng: StdRng,
}

impl UniformJitter {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for UniformJitter {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl JitterSource for UniformJitter {
    fn sample(&mut self) -> f64 {
        self.rng.gen_range(JITTER_MIN..JITTER_MAX)
    }
}

/// Constant multiplier, 1.0 disables noise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedJitter(pub f64);

impl Default for FixedJitter {
    fn default() -> Self {
        Self(1.0)
    }
}

impl JitterSource for FixedJitter {
    fn sample(&mut self) -> f64 {
        self.0
    }
}
