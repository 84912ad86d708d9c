//! Road-segment map loading.
//!
//! The map file is line-oriented; each edge record is
//!
//! ```text
//! edge,<id>,<lat_a>;<lon_a>:<lat_b>;<lon_b>,way_type=<tag>[:width=<meters>]
//! ```
//!
//! `#` comments and blank lines are skipped. Records with unknown way types
//! or malformed fields are skipped with a warning rather than failing the
//! load; a file that yields no usable edges at all is an error.

use crate::edge::Edge;
use crate::geometry::{BBox, Point};
use crate::quadtree::Quadtree;
use roadveil_core::error::MapError;
use roadveil_core::types::WayType;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// The loaded road map: the edge set and its bounding envelope.
#[derive(Debug)]
pub struct RoadMap {
    edges: Vec<Arc<Edge>>,
    envelope: BBox,
    max_width_m: f64,
}

impl RoadMap {
    /// Loads a road map from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains no usable
    /// edge records.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MapError::load_failed(path.display().to_string(), e.to_string()))?;
        let map = Self::parse(&contents)
            .ok_or_else(|| MapError::NoUsableRecords {
                path: path.display().to_string(),
            })?;
        info!(
            edges = map.edges.len(),
            "Loaded road map from {}",
            path.display()
        );
        Ok(map)
    }

    /// Parses map text. Returns `None` when no record is usable.
    pub fn parse(text: &str) -> Option<Self> {
        let mut edges: Vec<Arc<Edge>> = Vec::new();
        let mut envelope: Option<BBox> = None;
        let mut max_width_m: f64 = 0.0;
        let mut skipped = 0usize;

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_edge_record(index + 1, line) {
                Ok(edge) => {
                    let segment_box = BBox::from_corners(edge.a, edge.b);
                    envelope = Some(match envelope {
                        Some(e) => e.union(&segment_box),
                        None => segment_box,
                    });
                    max_width_m = max_width_m.max(edge.width_m);
                    edges.push(Arc::new(edge));
                }
                Err(e) => {
                    warn!("Skipping map record: {e}");
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            warn!(skipped, "Some map records were not usable");
        }

        Some(Self {
            edges,
            envelope: envelope?,
            max_width_m,
        })
    }

    /// The loaded edges.
    pub fn edges(&self) -> &[Arc<Edge>] {
        &self.edges
    }

    /// Bounding box of all edge endpoints.
    pub fn envelope(&self) -> BBox {
        self.envelope
    }

    /// Builds the quadtree index over this map.
    ///
    /// The envelope is padded by the widest corridor so that every queryable
    /// point near an edge falls inside the tree.
    pub fn build_index(&self, box_extension_m: f64) -> Quadtree {
        let pad = self.max_width_m / 2.0 + box_extension_m;
        let mut tree = Quadtree::new(self.envelope.expanded(pad), box_extension_m);
        for edge in &self.edges {
            tree.insert(edge.clone());
        }
        tree
    }
}

fn parse_edge_record(line_no: usize, line: &str) -> Result<Edge, MapError> {
    let mut fields = line.splitn(4, ',');
    let kind = fields.next().unwrap_or_default();
    if kind != "edge" {
        return Err(MapError::invalid_record(
            line_no,
            format!("unsupported record kind '{kind}'"),
        ));
    }

    let id: u64 = fields
        .next()
        .ok_or_else(|| MapError::invalid_record(line_no, "missing id"))?
        .trim()
        .parse()
        .map_err(|_| MapError::invalid_record(line_no, "id is not an integer"))?;

    let geometry = fields
        .next()
        .ok_or_else(|| MapError::invalid_record(line_no, "missing geometry"))?;
    let (a, b) = parse_geometry(line_no, geometry)?;

    let attributes = fields
        .next()
        .ok_or_else(|| MapError::invalid_record(line_no, "missing attributes"))?;
    let (way_type, width_m) = parse_attributes(line_no, attributes)?;

    Ok(Edge::new(
        id,
        a,
        b,
        way_type,
        width_m.unwrap_or_else(|| way_type.default_width_m()),
    ))
}

fn parse_geometry(line_no: usize, text: &str) -> Result<(Point, Point), MapError> {
    let (first, second) = text
        .split_once(':')
        .ok_or_else(|| MapError::invalid_record(line_no, "geometry must hold two waypoints"))?;
    let a = parse_waypoint(line_no, first)?;
    let b = parse_waypoint(line_no, second)?;
    if a == b {
        return Err(MapError::invalid_record(line_no, "degenerate segment"));
    }
    Ok((a, b))
}

fn parse_waypoint(line_no: usize, text: &str) -> Result<Point, MapError> {
    let (lat, lon) = text
        .split_once(';')
        .ok_or_else(|| MapError::invalid_record(line_no, "waypoint must be lat;lon"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| MapError::invalid_record(line_no, "latitude is not a number"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| MapError::invalid_record(line_no, "longitude is not a number"))?;
    let point = Point::new(lat, lon);
    if !point.is_valid() {
        return Err(MapError::invalid_record(line_no, "coordinates out of range"));
    }
    Ok(point)
}

fn parse_attributes(line_no: usize, text: &str) -> Result<(WayType, Option<f64>), MapError> {
    let mut way_type = None;
    let mut width = None;

    for attribute in text.split(':') {
        let (key, value) = attribute
            .split_once('=')
            .ok_or_else(|| MapError::invalid_record(line_no, "attribute must be key=value"))?;
        match key.trim() {
            "way_type" => {
                way_type = Some(value.trim().parse::<WayType>().map_err(|e| {
                    MapError::invalid_record(line_no, e.to_string())
                })?);
            }
            "width" => {
                let parsed: f64 = value
                    .trim()
                    .parse()
                    .map_err(|_| MapError::invalid_record(line_no, "width is not a number"))?;
                if !(parsed.is_finite() && parsed > 0.0) {
                    return Err(MapError::invalid_record(line_no, "width must be positive"));
                }
                width = Some(parsed);
            }
            other => {
                return Err(MapError::invalid_record(
                    line_no,
                    format!("unknown attribute '{other}'"),
                ));
            }
        }
    }

    let way_type =
        way_type.ok_or_else(|| MapError::invalid_record(line_no, "missing way_type"))?;
    Ok((way_type, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# test map
edge,1,35.000;-84.000:35.001;-84.000,way_type=residential:width=10.0
edge,2,35.002;-84.000:35.003;-84.001,way_type=service
";

    #[test]
    fn test_parse_sample_map() {
        let map = RoadMap::parse(SAMPLE).unwrap();
        assert_eq!(map.edges().len(), 2);

        let first = &map.edges()[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.way_type, WayType::Residential);
        assert_eq!(first.width_m, 10.0);

        // Width defaulted from the way type.
        let second = &map.edges()[1];
        assert_eq!(second.width_m, WayType::Service.default_width_m());
    }

    #[test]
    fn test_envelope_covers_endpoints() {
        let map = RoadMap::parse(SAMPLE).unwrap();
        let envelope = map.envelope();
        for edge in map.edges() {
            assert!(envelope.contains(edge.a));
            assert!(envelope.contains(edge.b));
        }
    }

    #[test]
    fn test_bad_records_skipped() {
        let text = "\
edge,1,35.000;-84.000:35.001;-84.000,way_type=residential
edge,not-a-number,35.0;-84.0:35.1;-84.1,way_type=service
edge,3,35.0;-84.0:35.1;-84.1,way_type=footway
node,4,35.0;-84.0
edge,5,95.0;-84.0:35.1;-84.1,way_type=service
edge,6,35.0;-84.0:35.0;-84.0,way_type=service
";
        let map = RoadMap::parse(text).unwrap();
        assert_eq!(map.edges().len(), 1);
        assert_eq!(map.edges()[0].id, 1);
    }

    #[test]
    fn test_empty_map_is_unusable() {
        assert!(RoadMap::parse("# nothing here\n").is_none());
    }

    #[test]
    fn test_build_index_answers_queries() {
        let map = RoadMap::parse(SAMPLE).unwrap();
        let tree = map.build_index(5.0);
        assert_eq!(tree.len(), 2);
        let hits = tree.query(Point::new(35.0005, -84.00001));
        assert!(hits.iter().any(|e| e.id == 1));
    }
}
