//! Geometry primitives over WGS-84 latitude/longitude coordinates.
//!
//! Distances use an equirectangular projection centered on the query point,
//! which is accurate to well under a meter at road-corridor scale (segments
//! shorter than a few kilometers). All distances are in meters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS-84 geoposition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Latitude in decimal degrees, [-90, 90]
    pub lat: f64,
    /// Longitude in decimal degrees, [-180, 180]
    pub lon: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns true if both coordinates are finite and within WGS-84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lat, self.lon)
    }
}

/// An axis-aligned bounding box with inclusive borders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// South-west corner
    pub sw: Point,
    /// North-east corner
    pub ne: Point,
}

impl BBox {
    /// Creates a bounding box from its south-west and north-east corners.
    pub fn new(sw: Point, ne: Point) -> Self {
        debug_assert!(sw.lat <= ne.lat && sw.lon <= ne.lon);
        Self { sw, ne }
    }

    /// The smallest box containing both points, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            sw: Point::new(a.lat.min(b.lat), a.lon.min(b.lon)),
            ne: Point::new(a.lat.max(b.lat), a.lon.max(b.lon)),
        }
    }

    /// Inclusive containment test.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.lat >= self.sw.lat && p.lat <= self.ne.lat && p.lon >= self.sw.lon && p.lon <= self.ne.lon
    }

    /// Closed-interval intersection test.
    #[inline]
    pub fn intersects(&self, other: &BBox) -> bool {
        !(other.ne.lat < self.sw.lat
            || other.sw.lat > self.ne.lat
            || other.ne.lon < self.sw.lon
            || other.sw.lon > self.ne.lon)
    }

    /// Center of the box.
    pub fn mid(&self) -> Point {
        Point::new(
            (self.sw.lat + self.ne.lat) / 2.0,
            (self.sw.lon + self.ne.lon) / 2.0,
        )
    }

    /// The shorter side of the box, in degrees.
    pub fn min_side_deg(&self) -> f64 {
        (self.ne.lat - self.sw.lat).min(self.ne.lon - self.sw.lon)
    }

    /// Grows the box by at least `pad_m` meters on every side.
    pub fn expanded(&self, pad_m: f64) -> BBox {
        let dlat = meters_to_lat_deg(pad_m);
        let cos_lat = widest_cos_lat(self.sw.lat, self.ne.lat);
        let dlon = meters_to_lon_deg(pad_m, cos_lat);
        BBox {
            sw: Point::new(self.sw.lat - dlat, self.sw.lon - dlon),
            ne: Point::new(self.ne.lat + dlat, self.ne.lon + dlon),
        }
    }

    /// Extends the box to cover another.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            sw: Point::new(self.sw.lat.min(other.sw.lat), self.sw.lon.min(other.sw.lon)),
            ne: Point::new(self.ne.lat.max(other.ne.lat), self.ne.lon.max(other.ne.lon)),
        }
    }
}

/// Perpendicular distance in meters from `p` to the segment `ab`, clamped to
/// the endpoints.
pub fn distance_point_to_segment(p: Point, a: Point, b: Point) -> f64 {
    // Local tangent plane centered on the query point.
    let cos_lat = p.lat.to_radians().cos().max(1e-12);
    let ax = (a.lon - p.lon).to_radians() * cos_lat * EARTH_RADIUS_M;
    let ay = (a.lat - p.lat).to_radians() * EARTH_RADIUS_M;
    let bx = (b.lon - p.lon).to_radians() * cos_lat * EARTH_RADIUS_M;
    let by = (b.lat - p.lat).to_radians() * EARTH_RADIUS_M;

    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (ax * ax + ay * ay).sqrt();
    }

    // Project the origin (the query point) onto ab, clamped to [0, 1].
    let t = (-(ax * dx + ay * dy) / len_sq).clamp(0.0, 1.0);
    let nx = ax + t * dx;
    let ny = ay + t * dy;
    (nx * nx + ny * ny).sqrt()
}

/// Axis-aligned box that strictly contains every point within `pad_m` meters
/// of the segment `ab`.
pub fn segment_corridor_bbox(a: Point, b: Point, pad_m: f64) -> BBox {
    BBox::from_corners(a, b).expanded(pad_m)
}

fn meters_to_lat_deg(meters: f64) -> f64 {
    (meters / EARTH_RADIUS_M).to_degrees()
}

fn meters_to_lon_deg(meters: f64, cos_lat: f64) -> f64 {
    (meters / (EARTH_RADIUS_M * cos_lat.max(1e-12))).to_degrees()
}

// Longitude degrees shrink toward the poles; pad with the smaller cosine so
// the box never under-covers.
fn widest_cos_lat(lat_a: f64, lat_b: f64) -> f64 {
    lat_a
        .to_radians()
        .cos()
        .min(lat_b.to_radians().cos())
        .max(1e-12)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_validity() {
        assert!(Point::new(35.0, -84.0).is_valid());
        assert!(!Point::new(91.0, 0.0).is_valid());
        assert!(!Point::new(0.0, 181.0).is_valid());
        assert!(!Point::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_bbox_contains_inclusive() {
        let bbox = BBox::from_corners(Point::new(35.0, -84.0), Point::new(36.0, -83.0));
        assert!(bbox.contains(Point::new(35.5, -83.5)));
        assert!(bbox.contains(Point::new(35.0, -84.0)));
        assert!(bbox.contains(Point::new(36.0, -83.0)));
        assert!(!bbox.contains(Point::new(34.999, -83.5)));
    }

    #[test]
    fn test_bbox_intersects() {
        let a = BBox::from_corners(Point::new(35.0, -84.0), Point::new(36.0, -83.0));
        let b = BBox::from_corners(Point::new(35.5, -83.5), Point::new(36.5, -82.5));
        let c = BBox::from_corners(Point::new(40.0, -84.0), Point::new(41.0, -83.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));

        // Touching borders intersect.
        let d = BBox::from_corners(Point::new(36.0, -84.0), Point::new(37.0, -83.0));
        assert!(a.intersects(&d));
    }

    #[test]
    fn test_distance_perpendicular() {
        // Meridian segment; query point 0.001 degrees of longitude away
        // at lat 35, which is about 111.32 km/deg * cos(35) * 0.001.
        let a = Point::new(35.000, -84.000);
        let b = Point::new(35.010, -84.000);
        let p = Point::new(35.005, -84.001);
        let dist = distance_point_to_segment(p, a, b);
        let expected = 0.001_f64.to_radians() * EARTH_RADIUS_M * 35.005_f64.to_radians().cos();
        assert!((dist - expected).abs() < 0.1, "dist = {dist}");
    }

    #[test]
    fn test_distance_clamps_to_endpoint() {
        let a = Point::new(35.000, -84.000);
        let b = Point::new(35.010, -84.000);
        // Due south of `a`: nearest point on the segment is `a` itself.
        let p = Point::new(34.990, -84.000);
        let dist = distance_point_to_segment(p, a, b);
        let expected = 0.010_f64.to_radians() * EARTH_RADIUS_M;
        assert!((dist - expected).abs() < 0.5, "dist = {dist}");
    }

    #[test]
    fn test_distance_degenerate_segment() {
        let a = Point::new(35.0, -84.0);
        let p = Point::new(35.0, -84.001);
        let dist = distance_point_to_segment(p, a, a);
        assert!(dist > 0.0);
    }

    #[test]
    fn test_corridor_bbox_covers_pad() {
        let a = Point::new(35.000, -84.000);
        let b = Point::new(35.001, -84.000);
        let bbox = segment_corridor_bbox(a, b, 10.0);
        // Any point within 10 m of the segment must be inside the box.
        let near = Point::new(35.0005, -84.00009); // ~8 m west of the segment
        assert!(distance_point_to_segment(near, a, b) < 10.0);
        assert!(bbox.contains(near));
    }

    #[test]
    fn test_expanded_grows_all_sides() {
        let bbox = BBox::from_corners(Point::new(35.0, -84.0), Point::new(35.0, -84.0));
        let grown = bbox.expanded(100.0);
        assert!(grown.sw.lat < 35.0 && grown.ne.lat > 35.0);
        assert!(grown.sw.lon < -84.0 && grown.ne.lon > -84.0);
    }
}
