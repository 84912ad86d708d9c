//! The per-message BSM processing pipeline.
//!
//! [`BsmHandler::process`] judges one JSON-encoded BSM and either suppresses
//! it or prepares a redacted copy. Verdict checks run in a fixed order that
//! mirrors the order fields arrive in a conventionally laid-out BSM: parse
//! failures first, then structural anomalies, then the speed test, then the
//! geofence test, with missing-field detection last. Redaction and
//! re-serialization happen only on the success path, so no partial output is
//! ever observable for a suppressed message.
//!
//! A handler is reusable: every call to `process` starts from a fresh
//! document and resets the verdict, the diagnostic record, and the output
//! buffer. Handlers are not safe for concurrent use, but independent handler
//! instances may run on distinct threads sharing one quadtree.

use crate::bsm::Bsm;
use crate::id_redactor::IdRedactor;
use crate::part_ii;
use crate::velocity::VelocityFilter;
use roadveil_core::config::PrivacyConfig;
use roadveil_core::types::{Verdict, WayType};
use roadveil_geo::{Point, Quadtree};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Privacy features a handler can apply, one bit each.
///
/// `SizeRedact` is reserved: the bit is defined and configurable but carries
/// no behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Feature {
    VelocityFilter = 0x001,
    GeofenceFilter = 0x002,
    IdRedact = 0x004,
    SizeRedact = 0x010,
    PartIiRedact = 0x100,
}

impl Feature {
    /// The bit this feature occupies in the activation mask.
    #[inline]
    pub fn bit(self) -> u32 {
        self as u32
    }
}

/// Processes individual BSMs against the configured privacy rules.
pub struct BsmHandler {
    activated: u32,
    quad: Arc<Quadtree>,
    velocity: VelocityFilter,
    id_redactor: IdRedactor,
    part_ii_fields: Vec<String>,
    admissible_way_types: HashSet<WayType>,
    box_extension_m: f64,
    bsm: Bsm,
    verdict: Verdict,
    json: String,
    finalized: bool,
}

impl BsmHandler {
    /// Creates a handler over a shared quadtree and a validated
    /// configuration. Feature bits start out reflecting the configuration
    /// and can be toggled per handler afterwards.
    pub fn new(quad: Arc<Quadtree>, config: &PrivacyConfig) -> Self {
        let mut activated = 0u32;
        if config.velocity_filter {
            activated |= Feature::VelocityFilter.bit();
        }
        if config.geofence_filter {
            activated |= Feature::GeofenceFilter.bit();
        }
        if config.id_redaction.is_active() {
            activated |= Feature::IdRedact.bit();
        }
        if config.size_redaction {
            activated |= Feature::SizeRedact.bit();
        }
        if !config.part_ii_fields.is_empty() {
            activated |= Feature::PartIiRedact.bit();
        }

        Self {
            activated,
            quad,
            velocity: VelocityFilter::new(config.velocity_min_mps, config.velocity_max_mps),
            id_redactor: IdRedactor::from_config(config),
            part_ii_fields: config.part_ii_fields.clone(),
            admissible_way_types: config.admissible_way_types.clone(),
            box_extension_m: config.box_extension_m,
            bsm: Bsm::default(),
            verdict: Verdict::Success,
            json: String::new(),
            finalized: false,
        }
    }

    /// Processes one BSM presented as a single-line JSON string.
    ///
    /// On any verdict other than [`Verdict::Success`] no output exists;
    /// [`get_json`](Self::get_json) returns `None`.
    pub fn process(&mut self, raw: &str) -> Verdict {
        self.reset();

        let mut doc: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                debug!("BSM failed to parse: {e}");
                return self.conclude(Verdict::Parse);
            }
        };

        // Field extraction. Required members resolve depth-first within the
        // coreData subtree when one exists, so `id` members inside partII
        // entries are never mistaken for the vehicle ID.
        let (latitude, longitude) = {
            let scope = scope_of(&doc);

            self.bsm.id = match find_member(scope, "id") {
                Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
                Some(Value::String(_)) | None => None,
                Some(_) => return self.conclude(Verdict::Other),
            };

            self.bsm.speed_mps = match numeric_member(scope, "speed") {
                Ok(speed) => speed,
                Err(verdict) => return self.conclude(verdict),
            };

            let latitude = match numeric_member(scope, "latitude") {
                Ok(latitude) => latitude,
                Err(verdict) => return self.conclude(verdict),
            };
            let longitude = match numeric_member(scope, "longitude") {
                Ok(longitude) => longitude,
                Err(verdict) => return self.conclude(verdict),
            };
            (latitude, longitude)
        };

        if let (Some(lat), Some(lon)) = (latitude, longitude) {
            let position = Point::new(lat, lon);
            if !position.is_valid() {
                return self.conclude(Verdict::Other);
            }
            self.bsm.position = Some(position);
        }

        // Suppression causes, in arrival order for a conventional BSM.
        if self.is_active(Feature::VelocityFilter) {
            if let Some(speed) = self.bsm.speed_mps {
                if self.velocity.suppress(speed) {
                    return self.conclude(Verdict::Speed);
                }
            }
        }
        if self.is_active(Feature::GeofenceFilter) {
            if let Some(position) = self.bsm.position {
                if !self.is_within_geofence(position) {
                    return self.conclude(Verdict::Geoposition);
                }
            }
        }

        // End of input: everything required must have been seen.
        if self.bsm.id.is_none()
            || self.bsm.speed_mps.is_none()
            || latitude.is_none()
            || longitude.is_none()
        {
            return self.conclude(Verdict::Missing);
        }

        self.apply_redactions(&mut doc);

        match serde_json::to_string(&doc) {
            Ok(json) => {
                self.json = json;
                self.finalized = true;
                self.conclude(Verdict::Success)
            }
            Err(e) => {
                debug!("Failed to serialize redacted BSM: {e}");
                self.conclude(Verdict::Other)
            }
        }
    }

    /// The redacted single-line JSON for the most recent message.
    ///
    /// `None` unless the most recent verdict was [`Verdict::Success`].
    pub fn get_json(&self) -> Option<&str> {
        (self.finalized && self.verdict.is_success()).then_some(self.json.as_str())
    }

    /// Diagnostic record of the most recent message, with the original
    /// (pre-redaction) vehicle ID.
    pub fn get_bsm(&self) -> &Bsm {
        &self.bsm
    }

    /// The verdict of the most recent `process` call.
    pub fn get_result(&self) -> Verdict {
        self.verdict
    }

    /// Sets a feature bit; returns the new mask.
    pub fn activate(&mut self, feature: Feature) -> u32 {
        self.activated |= feature.bit();
        self.activated
    }

    /// Clears a feature bit; returns the new mask.
    pub fn deactivate(&mut self, feature: Feature) -> u32 {
        self.activated &= !feature.bit();
        self.activated
    }

    /// Whether a feature bit is set.
    #[inline]
    pub fn is_active(&self, feature: Feature) -> bool {
        self.activated & feature.bit() != 0
    }

    /// The full activation mask.
    pub fn activation_mask(&self) -> u32 {
        self.activated
    }

    /// The uniform corridor pad, in meters.
    pub fn box_extension_m(&self) -> f64 {
        self.box_extension_m
    }

    /// Whether the point lies inside any admissible road corridor.
    pub fn is_within_geofence(&self, position: Point) -> bool {
        self.quad.query(position).iter().any(|edge| {
            self.admissible_way_types.contains(&edge.way_type)
                && edge.corridor_contains(position, self.box_extension_m)
        })
    }

    fn reset(&mut self) {
        self.bsm = Bsm::default();
        self.verdict = Verdict::Success;
        self.json.clear();
        self.finalized = false;
    }

    fn conclude(&mut self, verdict: Verdict) -> Verdict {
        self.verdict = verdict;
        if !verdict.is_success() {
            debug!(verdict = %verdict, bsm = %self.bsm, "BSM withheld");
        }
        verdict
    }

    fn apply_redactions(&mut self, doc: &mut Value) {
        if self.is_active(Feature::IdRedact) {
            let matched = self
                .bsm
                .id
                .as_deref()
                .and_then(|id| self.id_redactor.redact(id))
                .map(str::to_string);
            if let Some(replacement) = matched {
                // Mirror the scoping used during extraction.
                if scoped_to_core_data(doc) {
                    if let Some(core) = find_member_mut(doc, "coreData") {
                        replace_first_member(core, "id", &replacement);
                    }
                } else {
                    replace_first_member(doc, "id", &replacement);
                }
            }
        }

        if self.is_active(Feature::PartIiRedact) {
            if let Some(part_ii) = find_member_mut(doc, "partII") {
                for member in &self.part_ii_fields {
                    part_ii::remove_all_members(part_ii, member);
                }
            }
        }
    }
}

/// True when required members resolve within a coreData subtree: the first
/// `coreData` member exists and is an object. Extraction and redaction must
/// agree on this decision, so it lives in exactly one place.
fn scoped_to_core_data(doc: &Value) -> bool {
    matches!(find_member(doc, "coreData"), Some(core) if core.is_object())
}

/// The subtree required members resolve against.
fn scope_of(doc: &Value) -> &Value {
    if scoped_to_core_data(doc) {
        if let Some(core) = find_member(doc, "coreData") {
            return core;
        }
    }
    doc
}

/// Depth-first, document-order search for the first member named `name`.
fn find_member<'v>(value: &'v Value, name: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == name {
                    return Some(child);
                }
                if let Some(found) = find_member(child, name) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(|item| find_member(item, name)),
        _ => None,
    }
}

/// Mutable counterpart of [`find_member`], same traversal order.
fn find_member_mut<'v>(value: &'v mut Value, name: &str) -> Option<&'v mut Value> {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == name {
                    return Some(child);
                }
                // Immutable probe first; recursing mutably everywhere would
                // hold overlapping borrows.
                if find_member(child, name).is_some() {
                    return find_member_mut(child, name);
                }
            }
            None
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                if find_member(item, name).is_some() {
                    return find_member_mut(item, name);
                }
            }
            None
        }
        _ => None,
    }
}

/// Replaces the value of the first member named `name` with a string.
fn replace_first_member(value: &mut Value, name: &str, replacement: &str) -> bool {
    match find_member_mut(value, name) {
        Some(member) => {
            *member = Value::String(replacement.to_string());
            true
        }
        None => false,
    }
}

fn numeric_member(scope: &Value, name: &str) -> Result<Option<f64>, Verdict> {
    match find_member(scope, name) {
        None => Ok(None),
        Some(Value::Number(number)) => number.as_f64().map(Some).ok_or(Verdict::Other),
        Some(_) => Err(Verdict::Other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadveil_core::config::parse_properties;
    use roadveil_geo::BBox;

    fn empty_quad() -> Arc<Quadtree> {
        let envelope = BBox::from_corners(Point::new(35.0, -85.0), Point::new(36.0, -84.0));
        Arc::new(Quadtree::new(envelope, 5.0))
    }

    fn handler_with(properties: &str) -> BsmHandler {
        let config = PrivacyConfig::from_map(&parse_properties(properties)).unwrap();
        BsmHandler::new(empty_quad(), &config)
    }

    #[test]
    fn test_activation_from_config() {
        let handler = handler_with(
            "privacy.filter.velocity = ON\n\
             privacy.redaction.id = ON\n",
        );
        assert!(handler.is_active(Feature::VelocityFilter));
        assert!(handler.is_active(Feature::IdRedact));
        assert!(!handler.is_active(Feature::GeofenceFilter));
        assert!(!handler.is_active(Feature::PartIiRedact));
        assert!(!handler.is_active(Feature::SizeRedact));
    }

    #[test]
    fn test_activation_toggles() {
        let mut handler = handler_with("");
        assert_eq!(handler.activation_mask(), 0);
        handler.activate(Feature::GeofenceFilter);
        assert!(handler.is_active(Feature::GeofenceFilter));
        handler.deactivate(Feature::GeofenceFilter);
        assert_eq!(handler.activation_mask(), 0);
    }

    #[test]
    fn test_feature_bits_are_distinct() {
        let bits = [
            Feature::VelocityFilter.bit(),
            Feature::GeofenceFilter.bit(),
            Feature::IdRedact.bit(),
            Feature::SizeRedact.bit(),
            Feature::PartIiRedact.bit(),
        ];
        for (i, a) in bits.iter().enumerate() {
            for b in &bits[i + 1..] {
                assert_eq!(a & b, 0);
            }
        }
    }

    #[test]
    fn test_malformed_json_is_parse() {
        let mut handler = handler_with("");
        assert_eq!(handler.process(r#"{"id": "A"#), Verdict::Parse);
        assert!(handler.get_json().is_none());
    }

    #[test]
    fn test_missing_fields() {
        let mut handler = handler_with("");
        let verdict = handler.process(r#"{"id":"A","latitude":35.5,"longitude":-84.5}"#);
        assert_eq!(verdict, Verdict::Missing);
        assert!(handler.get_json().is_none());
    }

    #[test]
    fn test_empty_id_is_missing() {
        let mut handler = handler_with("");
        let verdict =
            handler.process(r#"{"id":"","latitude":35.5,"longitude":-84.5,"speed":10}"#);
        assert_eq!(verdict, Verdict::Missing);
    }

    #[test]
    fn test_wrong_type_is_other() {
        let mut handler = handler_with("");
        let verdict =
            handler.process(r#"{"id":"A","latitude":true,"longitude":-84.5,"speed":10}"#);
        assert_eq!(verdict, Verdict::Other);
    }

    #[test]
    fn test_string_typed_numeric_field_is_other() {
        let mut handler = handler_with("");
        let verdict =
            handler.process(r#"{"id":"A","latitude":35.5,"longitude":-84.5,"speed":"10"}"#);
        assert_eq!(verdict, Verdict::Other);
    }

    #[test]
    fn test_out_of_range_coordinates_are_other() {
        let mut handler = handler_with("");
        let verdict =
            handler.process(r#"{"id":"A","latitude":95.0,"longitude":-84.5,"speed":10}"#);
        assert_eq!(verdict, Verdict::Other);
    }

    #[test]
    fn test_core_data_scoping_ignores_part_ii_ids() {
        let mut handler = handler_with("privacy.redaction.id = ON\n");
        let raw = r#"{"coreData":{"id":"BEA10000","latitude":35.5,"longitude":-84.5,"speed":10},"partII":[{"id":"VehicleSafetyExtensions","value":1}]}"#;
        assert_eq!(handler.process(raw), Verdict::Success);
        let json = handler.get_json().unwrap();
        assert!(json.contains(r#""id":"00000000""#));
        assert!(json.contains(r#""id":"VehicleSafetyExtensions""#));
        assert_eq!(handler.get_bsm().id.as_deref(), Some("BEA10000"));
    }

    #[test]
    fn test_non_object_core_data_falls_back_to_document_scope() {
        let mut handler = handler_with("privacy.redaction.id = ON\n");
        let raw =
            r#"{"coreData":null,"id":"BEA10000","latitude":35.5,"longitude":-84.5,"speed":10}"#;
        assert_eq!(handler.process(raw), Verdict::Success);
        let json = handler.get_json().unwrap();
        assert!(json.contains(r#""id":"00000000""#));
        assert!(!json.contains("BEA10000"));
        assert_eq!(handler.get_bsm().id.as_deref(), Some("BEA10000"));
    }

    #[test]
    fn test_numbers_and_key_order_round_trip() {
        let mut handler = handler_with("");
        let raw = r#"{"id":"A","latitude":35.50000010,"longitude":-84.5,"speed":10.010,"extra":{"z":1,"a":2}}"#;
        assert_eq!(handler.process(raw), Verdict::Success);
        assert_eq!(handler.get_json(), Some(raw));
    }

    #[test]
    fn test_reset_between_messages() {
        let mut handler = handler_with("");
        assert_eq!(handler.process("not json"), Verdict::Parse);
        let ok = r#"{"id":"A","latitude":35.5,"longitude":-84.5,"speed":10}"#;
        assert_eq!(handler.process(ok), Verdict::Success);
        assert_eq!(handler.get_json(), Some(ok));
        assert_eq!(handler.get_result(), Verdict::Success);
    }

    #[test]
    fn test_find_member_document_order() {
        let doc: Value =
            serde_json::from_str(r#"{"outer":{"id":"nested"},"id":"top"}"#).unwrap();
        let found = find_member(&doc, "id").unwrap();
        assert_eq!(found, &Value::String("nested".to_string()));
    }

    #[test]
    fn test_replace_first_member_matches_find_order() {
        let mut doc: Value =
            serde_json::from_str(r#"{"outer":{"id":"nested"},"id":"top"}"#).unwrap();
        assert!(replace_first_member(&mut doc, "id", "X"));
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"outer":{"id":"X"},"id":"top"}"#
        );
    }
}
