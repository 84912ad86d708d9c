//! Quadtree spatial index over road-segment corridors.
//!
//! The tree subdivides the map envelope recursively and holds each edge in
//! *every* leaf whose box intersects the edge's corridor box. Duplicating
//! edges across siblings keeps the point query a single root-to-leaf descent:
//! a point lies in exactly one leaf, and that leaf already holds every
//! candidate edge, so a query can never return duplicates. Storing an edge in
//! only one child would break query completeness.
//!
//! Built once at startup from the map file and read-only afterwards; handlers
//! share it behind an `Arc` without synchronization.

use crate::edge::Edge;
use crate::geometry::{BBox, Point};
use std::sync::Arc;

/// Leaf capacity before a node splits.
const MAX_LEAF: usize = 32;
/// Maximum subdivision depth.
const MAX_DEPTH: u32 = 20;
/// Nodes with a side at or below this stop splitting (degrees).
const MIN_NODE_SIDE_DEG: f64 = 1.0e-4;

/// Point-queryable index of road edges.
#[derive(Debug)]
pub struct Quadtree {
    root: Node,
    pad_m: f64,
    len: usize,
}

#[derive(Debug)]
struct Node {
    bbox: BBox,
    depth: u32,
    edges: Vec<Arc<Edge>>,
    children: Option<Box<[Node; 4]>>,
}

impl Quadtree {
    /// Creates an empty index covering `envelope`.
    ///
    /// `box_extension_m` is the uniform corridor pad; it is fixed at
    /// construction so that every insert and the downstream containment test
    /// agree on corridor size.
    pub fn new(envelope: BBox, box_extension_m: f64) -> Self {
        Self {
            root: Node {
                bbox: envelope,
                depth: 0,
                edges: Vec::new(),
                children: None,
            },
            pad_m: box_extension_m,
            len: 0,
        }
    }

    /// Inserts an edge into every leaf its corridor box intersects.
    ///
    /// Edges whose corridor lies entirely outside the envelope are dropped;
    /// no queryable point could ever match them.
    pub fn insert(&mut self, edge: Arc<Edge>) {
        let corridor = edge.corridor_bbox(self.pad_m);
        if !self.root.bbox.intersects(&corridor) {
            return;
        }
        self.root.insert(edge, &corridor, self.pad_m);
        self.len += 1;
    }

    /// Returns the candidate edges for a point: every edge whose corridor box
    /// may contain it. The caller applies the exact corridor distance test.
    pub fn query(&self, p: Point) -> &[Arc<Edge>] {
        if !self.root.bbox.contains(p) {
            return &[];
        }
        let mut node = &self.root;
        while let Some(children) = &node.children {
            node = &children[node.quadrant_of(p)];
        }
        &node.edges
    }

    /// Number of edges inserted.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no edges were inserted.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The envelope this index covers.
    pub fn envelope(&self) -> BBox {
        self.root.bbox
    }

    /// The uniform corridor pad this index was built with, in meters.
    pub fn box_extension_m(&self) -> f64 {
        self.pad_m
    }
}

impl Node {
    fn insert(&mut self, edge: Arc<Edge>, corridor: &BBox, pad_m: f64) {
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                if child.bbox.intersects(corridor) {
                    child.insert(edge.clone(), corridor, pad_m);
                }
            }
            return;
        }

        self.edges.push(edge);

        if self.edges.len() > MAX_LEAF
            && self.depth < MAX_DEPTH
            && self.bbox.min_side_deg() > MIN_NODE_SIDE_DEG
        {
            self.split(pad_m);
        }
    }

    /// Partitions this leaf into four quadrants and redistributes its edges
    /// into every child whose box intersects the edge's corridor box.
    fn split(&mut self, pad_m: f64) {
        let mid = self.bbox.mid();
        let sw = self.bbox.sw;
        let ne = self.bbox.ne;
        let depth = self.depth + 1;

        let child = |bbox: BBox| Node {
            bbox,
            depth,
            edges: Vec::new(),
            children: None,
        };

        // NW, NE, SW, SE; canonical order by (lat, lon).
        let children = Box::new([
            child(BBox::new(Point::new(mid.lat, sw.lon), Point::new(ne.lat, mid.lon))),
            child(BBox::new(mid, ne)),
            child(BBox::new(sw, mid)),
            child(BBox::new(Point::new(sw.lat, mid.lon), Point::new(mid.lat, ne.lon))),
        ]);
        self.children = Some(children);

        let edges = std::mem::take(&mut self.edges);
        for edge in edges {
            let corridor = edge.corridor_bbox(pad_m);
            self.insert(edge, &corridor, pad_m);
        }
    }

    /// Index of the unique child leaf for a point. Points on the midlines
    /// resolve north/east, so the descent is deterministic.
    fn quadrant_of(&self, p: Point) -> usize {
        let mid = self.bbox.mid();
        match (p.lat >= mid.lat, p.lon >= mid.lon) {
            (true, false) => 0,  // NW
            (true, true) => 1,   // NE
            (false, false) => 2, // SW
            (false, true) => 3,  // SE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadveil_core::types::WayType;

    const EXTENSION_M: f64 = 5.0;

    fn envelope() -> BBox {
        BBox::from_corners(Point::new(35.0, -85.0), Point::new(36.0, -84.0))
    }

    fn edge(id: u64, lat: f64, lon: f64) -> Arc<Edge> {
        Arc::new(Edge::new(
            id,
            Point::new(lat, lon),
            Point::new(lat + 0.001, lon),
            WayType::Residential,
            10.0,
        ))
    }

    #[test]
    fn test_empty_tree_query() {
        let tree = Quadtree::new(envelope(), EXTENSION_M);
        assert!(tree.is_empty());
        assert!(tree.query(Point::new(35.5, -84.5)).is_empty());
    }

    #[test]
    fn test_single_edge_query() {
        let mut tree = Quadtree::new(envelope(), EXTENSION_M);
        tree.insert(edge(1, 35.5, -84.5));
        let hits = tree.query(Point::new(35.5005, -84.5));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn test_point_outside_envelope() {
        let mut tree = Quadtree::new(envelope(), EXTENSION_M);
        tree.insert(edge(1, 35.5, -84.5));
        assert!(tree.query(Point::new(40.0, -84.5)).is_empty());
    }

    #[test]
    fn test_split_preserves_completeness() {
        let mut tree = Quadtree::new(envelope(), EXTENSION_M);

        // Enough edges on a grid to force several splits.
        let mut edges = Vec::new();
        let mut id = 0;
        for i in 0..12 {
            for j in 0..12 {
                id += 1;
                let e = edge(id, 35.05 + 0.08 * i as f64, -84.95 + 0.08 * j as f64);
                edges.push(e.clone());
                tree.insert(e);
            }
        }
        assert_eq!(tree.len(), edges.len());

        // Every point whose corridor-containing edge exists must see that
        // edge among its candidates.
        for e in &edges {
            let probe = Point::new(e.a.lat + 0.0005, e.a.lon + 0.00001);
            assert!(e.corridor_contains(probe, EXTENSION_M));
            let hits = tree.query(probe);
            assert!(
                hits.iter().any(|h| h.id == e.id),
                "edge {} missing from candidates at {probe}",
                e.id
            );
        }
    }

    #[test]
    fn test_query_never_returns_duplicates() {
        let mut tree = Quadtree::new(envelope(), EXTENSION_M);
        for i in 0..100 {
            tree.insert(edge(i, 35.4 + 0.0001 * i as f64, -84.5));
        }
        let hits = tree.query(Point::new(35.405, -84.5));
        let mut ids: Vec<u64> = hits.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), hits.len());
    }

    #[test]
    fn test_edge_outside_envelope_dropped() {
        let mut tree = Quadtree::new(envelope(), EXTENSION_M);
        tree.insert(edge(1, 50.0, -84.5));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_edge_straddling_midline_lives_in_both_children() {
        let mut tree = Quadtree::new(envelope(), EXTENSION_M);
        // An edge crossing the lat midline of the envelope.
        let crossing = Arc::new(Edge::new(
            999,
            Point::new(35.4995, -84.5),
            Point::new(35.5005, -84.5),
            WayType::Residential,
            10.0,
        ));
        tree.insert(crossing);
        // Force a split around it.
        for i in 0..40 {
            tree.insert(edge(i, 35.49 + 0.0005 * i as f64, -84.5));
        }
        // Probes on either side of the midline must both see the edge.
        for probe in [Point::new(35.4996, -84.5), Point::new(35.5004, -84.5)] {
            assert!(
                tree.query(probe).iter().any(|e| e.id == 999),
                "edge missing at {probe}"
            );
        }
    }
}
