//! Configuration for the roadveil privacy filter.
//!
//! The on-disk format is a flat `key = value` property map; [`PrivacyConfig`]
//! is its strongly-typed counterpart, parsed and validated once at startup.
//! Handlers consume only the typed form.
//!
//! # Examples
//!
//! ```
//! use roadveil_core::config::{parse_properties, PrivacyConfig};
//!
//! let map = parse_properties(
//!     "privacy.filter.velocity = ON\n\
//!      privacy.filter.velocity.min = 2.5\n\
//!      privacy.filter.velocity.max = 30.0\n",
//! );
//! let config = PrivacyConfig::from_map(&map).unwrap();
//! assert!(config.velocity_filter);
//! assert_eq!(config.velocity_min_mps, 2.5);
//! ```

use crate::error::ConfigError;
use crate::types::WayType;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::warn;

/// The flat string-to-string configuration map consumed at construction.
pub type PropertyMap = HashMap<String, String>;

/// Default lower velocity bound, meters per second (5 mph).
pub const DEFAULT_VELOCITY_MIN_MPS: f64 = 2.2352;
/// Default upper velocity bound, meters per second (80 mph).
pub const DEFAULT_VELOCITY_MAX_MPS: f64 = 35.7632;
/// Default uniform pad applied to every edge corridor, meters.
pub const DEFAULT_BOX_EXTENSION_M: f64 = 5.0;
/// Default vehicle-ID replacement value.
pub const DEFAULT_ID_REPLACEMENT: &str = "00000000";

/// Reads a property file into a [`PropertyMap`].
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_properties<P: AsRef<Path>>(path: P) -> Result<PropertyMap, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::load_failed(path.display().to_string(), e.to_string()))?;
    Ok(parse_properties(&contents))
}

/// Parses property text into a [`PropertyMap`].
///
/// Lines are `key = value`; `#` comments and blank lines are ignored. Lines
/// without a separator are skipped with a warning.
pub fn parse_properties(text: &str) -> PropertyMap {
    let mut map = PropertyMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                map.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => warn!("Ignoring property line without separator: {line}"),
        }
    }
    map
}

/// How the vehicle-ID redactor selects IDs to replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdRedactionPolicy {
    /// ID redaction is not configured
    Off,
    /// Every vehicle ID is replaced
    All,
    /// Only IDs in the set are replaced
    Inclusion(HashSet<String>),
}

impl IdRedactionPolicy {
    /// Returns true if this policy activates the ID-redaction feature bit.
    pub fn is_active(&self) -> bool {
        !matches!(self, IdRedactionPolicy::Off)
    }
}

/// The strongly-typed privacy configuration, parsed once from the flat map.
#[derive(Debug, Clone)]
pub struct PrivacyConfig {
    /// Whether the velocity filter starts active
    pub velocity_filter: bool,
    /// Lower bound of the acceptable speed interval, m/s
    pub velocity_min_mps: f64,
    /// Upper bound of the acceptable speed interval, m/s
    pub velocity_max_mps: f64,
    /// Whether the geofence filter starts active
    pub geofence_filter: bool,
    /// Uniform pad applied to every edge corridor, meters
    pub box_extension_m: f64,
    /// Way types whose corridors count as inside the geofence
    pub admissible_way_types: HashSet<WayType>,
    /// ID redaction policy
    pub id_redaction: IdRedactionPolicy,
    /// Replacement value emitted for redacted IDs
    pub id_replacement: String,
    /// Reserved size-redaction bit; defined but carries no behavior
    pub size_redaction: bool,
    /// Part II member names to strip; non-empty activates the feature bit
    pub part_ii_fields: Vec<String>,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            velocity_filter: false,
            velocity_min_mps: DEFAULT_VELOCITY_MIN_MPS,
            velocity_max_mps: DEFAULT_VELOCITY_MAX_MPS,
            geofence_filter: false,
            box_extension_m: DEFAULT_BOX_EXTENSION_M,
            admissible_way_types: WayType::ALL.into_iter().collect(),
            id_redaction: IdRedactionPolicy::Off,
            id_replacement: DEFAULT_ID_REPLACEMENT.to_string(),
            size_redaction: false,
            part_ii_fields: Vec::new(),
        }
    }
}

impl PrivacyConfig {
    /// Parses and validates a [`PropertyMap`] into a typed configuration.
    ///
    /// Unrecognized keys are ignored; recognized keys with uninterpretable
    /// values are errors.
    ///
    /// # Errors
    ///
    /// Returns an error when a value cannot be parsed, the velocity interval
    /// is inverted or non-finite, the box extension is negative, or a
    /// configured way type is not in the closed set.
    pub fn from_map(map: &PropertyMap) -> Result<Self, ConfigError> {
        let mut config = Self {
            velocity_filter: parse_flag(map, "privacy.filter.velocity", false)?,
            velocity_min_mps: parse_float(
                map,
                "privacy.filter.velocity.min",
                DEFAULT_VELOCITY_MIN_MPS,
            )?,
            velocity_max_mps: parse_float(
                map,
                "privacy.filter.velocity.max",
                DEFAULT_VELOCITY_MAX_MPS,
            )?,
            geofence_filter: parse_flag(map, "privacy.filter.geofence", false)?,
            box_extension_m: parse_float(
                map,
                "privacy.filter.geofence.extension",
                DEFAULT_BOX_EXTENSION_M,
            )?,
            ..Self::default()
        };

        if config.velocity_min_mps > config.velocity_max_mps {
            return Err(ConfigError::invalid_value(
                "privacy.filter.velocity.min",
                format!(
                    "interval is inverted: {} > {}",
                    config.velocity_min_mps, config.velocity_max_mps
                ),
            ));
        }
        if config.box_extension_m < 0.0 {
            return Err(ConfigError::invalid_value(
                "privacy.filter.geofence.extension",
                "extension must be non-negative",
            ));
        }

        if let Some(value) = map.get("privacy.filter.geofence.waytypes") {
            let mut admissible = HashSet::new();
            for tag in split_list(value) {
                let way_type = tag.parse::<WayType>().map_err(|e| {
                    ConfigError::invalid_value("privacy.filter.geofence.waytypes", e.to_string())
                })?;
                admissible.insert(way_type);
            }
            if admissible.is_empty() {
                return Err(ConfigError::invalid_value(
                    "privacy.filter.geofence.waytypes",
                    "admissible set must not be empty",
                ));
            }
            config.admissible_way_types = admissible;
        }

        config.id_redaction = match map.get("privacy.redaction.id").map(String::as_str) {
            None => IdRedactionPolicy::Off,
            Some(value) if value.eq_ignore_ascii_case("off") => IdRedactionPolicy::Off,
            Some(value) if value.eq_ignore_ascii_case("on") => IdRedactionPolicy::All,
            Some(value) => {
                let ids: HashSet<String> = split_list(value).map(str::to_string).collect();
                if ids.is_empty() {
                    return Err(ConfigError::invalid_value(
                        "privacy.redaction.id",
                        "expected ON, OFF, or a comma-separated id list",
                    ));
                }
                IdRedactionPolicy::Inclusion(ids)
            }
        };
        if let Some(value) = map.get("privacy.redaction.id.value") {
            config.id_replacement = value.clone();
        }

        config.size_redaction = parse_flag(map, "privacy.redaction.size", false)?;

        if let Some(value) = map.get("privacy.redaction.partII") {
            config.part_ii_fields = split_list(value).map(str::to_string).collect();
        }

        Ok(config)
    }

    /// Whether an edge of the given way type participates in the geofence.
    #[inline]
    pub fn is_admissible(&self, way_type: WayType) -> bool {
        self.admissible_way_types.contains(&way_type)
    }
}

fn parse_flag(map: &PropertyMap, key: &str, default: bool) -> Result<bool, ConfigError> {
    match map.get(key) {
        None => Ok(default),
        Some(value) if value.eq_ignore_ascii_case("on") || value.eq_ignore_ascii_case("true") => {
            Ok(true)
        }
        Some(value) if value.eq_ignore_ascii_case("off") || value.eq_ignore_ascii_case("false") => {
            Ok(false)
        }
        Some(value) => Err(ConfigError::invalid_value(
            key,
            format!("expected ON or OFF, got '{value}'"),
        )),
    }
}

fn parse_float(map: &PropertyMap, key: &str, default: f64) -> Result<f64, ConfigError> {
    match map.get(key) {
        None => Ok(default),
        Some(value) => {
            let parsed: f64 = value
                .parse()
                .map_err(|_| ConfigError::invalid_value(key, format!("'{value}' is not a number")))?;
            if !parsed.is_finite() {
                return Err(ConfigError::invalid_value(key, "value must be finite"));
            }
            Ok(parsed)
        }
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
