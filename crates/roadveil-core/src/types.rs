//! Core vocabulary for the roadveil privacy filter.
//!
//! [`Verdict`] is the terminal outcome of processing one BSM; its lowercase
//! string forms are stable and consumed by downstream observability.
//! [`WayType`] is the closed road-classification set carried by every map
//! edge and referenced by the geofence test.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Terminal outcome of processing a single BSM.
///
/// `Speed` and `Geoposition` are suppression causes, not errors: the message
/// was understood and deliberately withheld. `Parse`, `Missing`, and `Other`
/// indicate the message could not be judged. Output is produced only for
/// `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The BSM passed every active filter; a redacted copy is available
    Success,
    /// Suppressed: speed outside the configured interval
    Speed,
    /// Suppressed: position outside the geofence
    Geoposition,
    /// The input was not well-formed JSON
    Parse,
    /// Well-formed JSON lacking a required field
    Missing,
    /// A required field had an unexpected type or an out-of-range value
    Other,
}

impl Verdict {
    /// Stable string form consumed by logs and downstream tooling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Success => "success",
            Verdict::Speed => "speed",
            Verdict::Geoposition => "geoposition",
            Verdict::Parse => "parse",
            Verdict::Missing => "missing",
            Verdict::Other => "other",
        }
    }

    /// Returns true if a redacted copy of the message may be consumed.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }

    /// Returns true for the deliberate suppression causes.
    #[inline]
    pub fn is_suppression(&self) -> bool {
        matches!(self, Verdict::Speed | Verdict::Geoposition)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Road classification carried by a map edge.
///
/// The set is closed over the way types the map loader accepts; records with
/// any other tag are skipped at load time. Each type carries a default
/// corridor width used when the map record does not specify one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WayType {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Unclassified,
    Residential,
    Service,
    MotorwayLink,
    TrunkLink,
    PrimaryLink,
    SecondaryLink,
    TertiaryLink,
    LivingStreet,
}

/// Error returned when a way-type tag is not in the closed set.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown way type: {0}")]
pub struct UnknownWayType(pub String);

impl WayType {
    /// Every member of the closed set, for "admit all" defaults.
    pub const ALL: [WayType; 14] = [
        WayType::Motorway,
        WayType::Trunk,
        WayType::Primary,
        WayType::Secondary,
        WayType::Tertiary,
        WayType::Unclassified,
        WayType::Residential,
        WayType::Service,
        WayType::MotorwayLink,
        WayType::TrunkLink,
        WayType::PrimaryLink,
        WayType::SecondaryLink,
        WayType::TertiaryLink,
        WayType::LivingStreet,
    ];

    /// Default edge width in meters, used when a map record omits one.
    pub fn default_width_m(&self) -> f64 {
        match self {
            WayType::Motorway => 18.0,
            WayType::Trunk => 16.0,
            WayType::Primary => 12.0,
            WayType::Secondary => 10.0,
            WayType::Tertiary => 8.0,
            WayType::Unclassified => 6.5,
            WayType::Residential => 6.0,
            WayType::Service => 4.0,
            WayType::MotorwayLink
            | WayType::TrunkLink
            | WayType::PrimaryLink
            | WayType::SecondaryLink
            | WayType::TertiaryLink => 7.0,
            WayType::LivingStreet => 5.5,
        }
    }

    /// The tag form used in map files.
    pub fn as_str(&self) -> &'static str {
        match self {
            WayType::Motorway => "motorway",
            WayType::Trunk => "trunk",
            WayType::Primary => "primary",
            WayType::Secondary => "secondary",
            WayType::Tertiary => "tertiary",
            WayType::Unclassified => "unclassified",
            WayType::Residential => "residential",
            WayType::Service => "service",
            WayType::MotorwayLink => "motorway_link",
            WayType::TrunkLink => "trunk_link",
            WayType::PrimaryLink => "primary_link",
            WayType::SecondaryLink => "secondary_link",
            WayType::TertiaryLink => "tertiary_link",
            WayType::LivingStreet => "living_street",
        }
    }
}

impl FromStr for WayType {
    type Err = UnknownWayType;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "motorway" => Ok(WayType::Motorway),
            "trunk" => Ok(WayType::Trunk),
            "primary" => Ok(WayType::Primary),
            "secondary" => Ok(WayType::Secondary),
            "tertiary" => Ok(WayType::Tertiary),
            "unclassified" => Ok(WayType::Unclassified),
            "residential" => Ok(WayType::Residential),
            "service" => Ok(WayType::Service),
            "motorway_link" => Ok(WayType::MotorwayLink),
            "trunk_link" => Ok(WayType::TrunkLink),
            "primary_link" => Ok(WayType::PrimaryLink),
            "secondary_link" => Ok(WayType::SecondaryLink),
            "tertiary_link" => Ok(WayType::TertiaryLink),
            "living_street" => Ok(WayType::LivingStreet),
            other => Err(UnknownWayType(other.to_string())),
        }
    }
}

impl fmt::Display for WayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
