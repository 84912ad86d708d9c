//! The per-message BSM record.

use roadveil_geo::Point;
use std::fmt;

/// Fields accumulated while processing one BSM, kept for diagnostics.
///
/// The `id` is always the original value from the wire, even when the
/// emitted copy was redacted.
#[derive(Debug, Clone, Default)]
pub struct Bsm {
    /// Vehicle identifier as received
    pub id: Option<String>,
    /// Geoposition, once both coordinates have been seen
    pub position: Option<Point>,
    /// Speed in meters per second
    pub speed_mps: Option<f64>,
}

impl Bsm {
    /// Returns true once every required field has been observed.
    pub fn is_complete(&self) -> bool {
        self.id.is_some() && self.position.is_some() && self.speed_mps.is_some()
    }
}

impl fmt::Display for Bsm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bsm(id: {}", self.id.as_deref().unwrap_or("?"))?;
        match self.position {
            Some(p) => write!(f, ", position: {p}")?,
            None => write!(f, ", position: ?")?,
        }
        match self.speed_mps {
            Some(v) => write!(f, ", speed: {v} m/s)"),
            None => write!(f, ", speed: ?)"),
        }
    }
}
