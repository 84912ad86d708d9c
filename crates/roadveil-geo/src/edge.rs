//! The road-segment model.
//!
//! An [`Edge`] is one directed road segment from the map file. Its geofence
//! *corridor* is the set of points within `width_m / 2 + box_extension_m`
//! meters of the segment; the extension is a global configuration constant
//! that pads every edge uniformly, hiding precise lane positions and keeping
//! corridors continuous across junctions.

use crate::geometry::{distance_point_to_segment, segment_corridor_bbox, BBox, Point};
use roadveil_core::types::WayType;
use serde::{Deserialize, Serialize};

/// A road edge with classification and geofence width.
///
/// Immutable after map load; shared read-only by every handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Identifier from the map file
    pub id: u64,
    /// First endpoint
    pub a: Point,
    /// Second endpoint
    pub b: Point,
    /// Road classification
    pub way_type: WayType,
    /// Edge width in meters
    pub width_m: f64,
}

impl Edge {
    /// Creates a new edge. The endpoints must differ and the width must be
    /// positive; the map loader enforces both.
    pub fn new(id: u64, a: Point, b: Point, way_type: WayType, width_m: f64) -> Self {
        debug_assert!(a != b);
        debug_assert!(width_m > 0.0);
        Self {
            id,
            a,
            b,
            way_type,
            width_m,
        }
    }

    /// Corridor half-width in meters under the given uniform extension.
    #[inline]
    pub fn corridor_half_width_m(&self, box_extension_m: f64) -> f64 {
        self.width_m / 2.0 + box_extension_m
    }

    /// Axis-aligned box strictly containing the corridor.
    pub fn corridor_bbox(&self, box_extension_m: f64) -> BBox {
        segment_corridor_bbox(self.a, self.b, self.corridor_half_width_m(box_extension_m))
    }

    /// Perpendicular distance in meters from a point to this segment.
    #[inline]
    pub fn distance_to(&self, p: Point) -> f64 {
        distance_point_to_segment(p, self.a, self.b)
    }

    /// Exact corridor containment test; the boundary is inside.
    #[inline]
    pub fn corridor_contains(&self, p: Point, box_extension_m: f64) -> bool {
        self.distance_to(p) <= self.corridor_half_width_m(box_extension_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_edge() -> Edge {
        Edge::new(
            1,
            Point::new(35.000, -84.000),
            Point::new(35.001, -84.000),
            WayType::Residential,
            10.0,
        )
    }

    #[test]
    fn test_corridor_half_width() {
        let edge = test_edge();
        assert_eq!(edge.corridor_half_width_m(5.0), 10.0);
        assert_eq!(edge.corridor_half_width_m(0.0), 5.0);
    }

    #[test]
    fn test_corridor_contains_near_point() {
        let edge = test_edge();
        // ~1 m west of the segment midpoint.
        let p = Point::new(35.0005, -84.00001);
        assert!(edge.corridor_contains(p, 5.0));
    }

    #[test]
    fn test_corridor_excludes_far_point() {
        let edge = test_edge();
        let p = Point::new(36.0, -84.0);
        assert!(!edge.corridor_contains(p, 5.0));
    }

    #[test]
    fn test_corridor_bbox_contains_endpoints() {
        let edge = test_edge();
        let bbox = edge.corridor_bbox(5.0);
        assert!(bbox.contains(edge.a));
        assert!(bbox.contains(edge.b));
    }
}
