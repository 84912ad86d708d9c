//! The velocity filter.

use serde::{Deserialize, Serialize};

/// Stateless closed-interval predicate on speed.
///
/// Speeds exactly equal to either bound are accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VelocityFilter {
    /// Lower bound, m/s
    pub min_mps: f64,
    /// Upper bound, m/s
    pub max_mps: f64,
}

impl VelocityFilter {
    /// Creates a new filter over `[min_mps, max_mps]`. Bounds are validated
    /// by the configuration layer.
    pub fn new(min_mps: f64, max_mps: f64) -> Self {
        Self { min_mps, max_mps }
    }

    /// True when the speed is inside the acceptable interval.
    #[inline]
    pub fn accept(&self, speed_mps: f64) -> bool {
        speed_mps >= self.min_mps && speed_mps <= self.max_mps
    }

    /// True when a BSM carrying this speed should be suppressed.
    #[inline]
    pub fn suppress(&self, speed_mps: f64) -> bool {
        !self.accept(speed_mps)
    }
}
