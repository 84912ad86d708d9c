//! Geospatial foundation for the roadveil privacy filter.
//!
//! Provides the geometry primitives ([`Point`], [`BBox`]), the road-segment
//! model ([`Edge`], loaded by [`map::RoadMap`]), and the [`Quadtree`] spatial
//! index that backs the geofence containment test.
//!
//! The quadtree and its edges are built once from the map file and shared
//! read-only across handlers for the lifetime of the process.

pub mod edge;
pub mod geometry;
pub mod map;
pub mod quadtree;

pub use edge::Edge;
pub use geometry::{distance_point_to_segment, BBox, Point};
pub use map::RoadMap;
pub use quadtree::Quadtree;
