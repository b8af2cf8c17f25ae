//! Graph document format and validation.
//!
//! The document is an OSM-derived JSON export:
//!
//! ```json
//! {
//!   "nodes": [{ "id": 1, "lat": -31.38, "lon": -57.96 }],
//!   "edges": [{ "from": 1, "to": 2, "length": 84.2, "maxspeed": "45" }]
//! }
//! ```

use super::speed::{parse_maxspeed, MaxSpeed, DEFAULT_SPEED_KMH};
use super::{Edge, Node, NodeId, Projection, StreetGraph};
use crate::model::{Coordinate, CoordinateError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum GraphLoadError {
    #[error("Failed to read graph file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed graph document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Graph has no nodes")]
    Empty,

    #[error("Duplicate node id {0}")]
    DuplicateNode(NodeId),

    #[error("Node {id} has an invalid coordinate: {source}")]
    InvalidCoordinate {
        id: NodeId,
        #[source]
        source: CoordinateError,
    },

    #[error("Edge {from} -> {to} references unknown node {missing}")]
    UnknownNode {
        from: NodeId,
        to: NodeId,
        missing: NodeId,
    },

    #[error("Edge {from} -> {to} has invalid length {length}")]
    InvalidLength { from: NodeId, to: NodeId, length: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub lat: f64,
    #[serde(alias = "lng")]
    pub lon: f64,
}

impl NodeRecord {
    pub fn new(id: NodeId, lat: f64, lon: f64) -> Self {
        Self { id, lat, lon }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(alias = "u")]
    pub from: NodeId,
    #[serde(alias = "v")]
    pub to: NodeId,
    /// Segment length in meters.
    pub length: f64,
    #[serde(default)]
    pub maxspeed: Option<MaxSpeed>,
}

impl EdgeRecord {
    pub fn new(from: NodeId, to: NodeId, length: f64, maxspeed: Option<MaxSpeed>) -> Self {
        Self {
            from,
            to,
            length,
            maxspeed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphLoadOptions {
    /// Speed substituted for missing or unusable `maxspeed` tags.
    pub default_speed_kmh: f64,
}

impl Default for GraphLoadOptions {
    fn default() -> Self {
        Self {
            default_speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl StreetGraph {
    /// Reads and validates the graph document at `path`.
    pub fn load(path: impl AsRef<Path>, options: &GraphLoadOptions) -> Result<Self, GraphLoadError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| GraphLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: GraphDocument = serde_json::from_str(&raw)?;
        let graph = Self::from_document(doc, options)?;
        info!(
            path = %path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Street graph loaded"
        );
        Ok(graph)
    }

    /// Builds a graph from an in-memory document.
    pub fn from_document(doc: GraphDocument, options: &GraphLoadOptions) -> Result<Self, GraphLoadError> {
        if doc.nodes.is_empty() {
            return Err(GraphLoadError::Empty);
        }

        let mut coordinates = Vec::with_capacity(doc.nodes.len());
        for record in &doc.nodes {
            let coordinate = Coordinate::new(record.lat, record.lon)
                .map_err(|source| GraphLoadError::InvalidCoordinate { id: record.id, source })?;
            coordinates.push((record.id, coordinate));
        }

        let mean_lat = coordinates.iter().map(|(_, c)| c.lat).sum::<f64>() / coordinates.len() as f64;
        let projection = Projection {
            cos_lat0: mean_lat.to_radians().cos(),
        };

        let mut nodes = HashMap::with_capacity(coordinates.len());
        for (id, coordinate) in coordinates {
            let (x, y) = projection.project(coordinate);
            let node = Node { id, coordinate, x, y };
            if nodes.insert(id, node).is_some() {
                return Err(GraphLoadError::DuplicateNode(id));
            }
        }

        let mut adjacency: HashMap<NodeId, Vec<Edge>> = HashMap::new();
        let mut max_speed_kmh: f64 = 0.0;
        let mut calibration: f64 = 1.0;
        let edge_count = doc.edges.len();

        for record in doc.edges {
            let (from, to) = (record.from, record.to);
            let (Some(a), Some(b)) = (nodes.get(&from), nodes.get(&to)) else {
                let missing = if nodes.contains_key(&from) { to } else { from };
                return Err(GraphLoadError::UnknownNode { from, to, missing });
            };
            if !record.length.is_finite() || record.length < 0.0 {
                return Err(GraphLoadError::InvalidLength {
                    from,
                    to,
                    length: record.length,
                });
            }

            let straight = (a.x - b.x).hypot(a.y - b.y);
            if straight > f64::EPSILON {
                calibration = calibration.min(record.length / straight);
            }

            let speed_kmh = parse_maxspeed(record.maxspeed.as_ref(), options.default_speed_kmh);
            max_speed_kmh = max_speed_kmh.max(speed_kmh);
            adjacency.entry(from).or_default().push(Edge {
                from,
                to,
                length_m: record.length,
                speed_kmh,
                weight: record.length / speed_kmh,
            });
        }

        debug!(mean_lat, calibration, max_speed_kmh, "Graph projection calibrated");

        Ok(Self {
            nodes,
            adjacency,
            edge_count,
            max_speed_kmh,
            calibration,
            projection,
        })
    }
}
