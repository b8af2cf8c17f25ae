//! # Street Graph
//!
//! The road network of the delivery area: intersections as [`Node`]s, directed road
//! segments as [`Edge`]s weighted by estimated traversal time (`length / speed`).
//!
//! A [`StreetGraph`] is built once at startup (see [`StreetGraph::load`]) and is immutable
//! afterwards. It is shared behind an `Arc` by every component that routes, and concurrent
//! readers need no synchronization.
//!
//! Geographic coordinates are projected to a local plane in meters (equirectangular
//! projection around the mean latitude of the graph). The projected positions feed the
//! routing heuristic and the nearest-node lookup.

mod loader;
pub mod speed;

pub use loader::{EdgeRecord, GraphDocument, GraphLoadError, GraphLoadOptions, NodeRecord};
pub use speed::{parse_maxspeed, MaxSpeed, SpeedValue, DEFAULT_SPEED_KMH};

use crate::model::Coordinate;
use std::collections::HashMap;
use thiserror::Error;

/// Node identifier (OSM ids are 64-bit).
pub type NodeId = u64;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("Graph has no nodes")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub coordinate: Coordinate,
    /// Projected easting in meters.
    pub x: f64,
    /// Projected northing in meters.
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub length_m: f64,
    pub speed_kmh: f64,
    /// Traversal cost, `length_m / speed_kmh`.
    pub weight: f64,
}

/// Equirectangular projection centred on a reference latitude.
#[derive(Debug, Clone, Copy)]
struct Projection {
    cos_lat0: f64,
}

impl Projection {
    fn project(&self, c: Coordinate) -> (f64, f64) {
        let x = EARTH_RADIUS_M * c.lng.to_radians() * self.cos_lat0;
        let y = EARTH_RADIUS_M * c.lat.to_radians();
        (x, y)
    }
}

#[derive(Debug)]
pub struct StreetGraph {
    nodes: HashMap<NodeId, Node>,
    adjacency: HashMap<NodeId, Vec<Edge>>,
    edge_count: usize,
    max_speed_kmh: f64,
    /// Lower bound of `length / straight-line distance` over all edges, capped at 1.
    calibration: f64,
    projection: Projection,
}

impl StreetGraph {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn max_speed_kmh(&self) -> f64 {
        self.max_speed_kmh
    }

    /// Outgoing edges of `node`, in load order.
    pub fn neighbors(&self, node: NodeId) -> &[Edge] {
        self.adjacency.get(&node).map_or(&[], Vec::as_slice)
    }

    /// The first-loaded edge from `a` to `b`, if any.
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.neighbors(a).iter().find(|e| e.to == b)
    }

    /// The node closest to the given position; ties go to the smaller id.
    pub fn nearest_node(&self, lat: f64, lng: f64) -> Result<NodeId, GraphError> {
        let (qx, qy) = self.projection.project(Coordinate { lat, lng });
        self.nodes
            .values()
            .map(|n| ((n.x - qx).powi(2) + (n.y - qy).powi(2), n.id))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
            .ok_or(GraphError::Empty)
    }

    /// Straight-line distance between two nodes in projected meters.
    pub fn straight_line_m(&self, a: NodeId, b: NodeId) -> Option<f64> {
        let (a, b) = (self.nodes.get(&a)?, self.nodes.get(&b)?);
        Some((a.x - b.x).hypot(a.y - b.y))
    }

    /// Lower bound on the cost of any path from `a` to `b`.
    ///
    /// Never overestimates, and `h(u) <= weight(u, v) + h(v)` holds for every edge, so A*
    /// with this estimate returns least-cost paths.
    pub fn heuristic(&self, a: NodeId, b: NodeId) -> f64 {
        if self.max_speed_kmh <= 0.0 {
            return 0.0;
        }
        self.straight_line_m(a, b)
            .map_or(0.0, |d| d * self.calibration / self.max_speed_kmh)
    }
}
