use super::RouteBudget;
use crate::graph::{Edge, GraphError, NodeId, StreetGraph};
use crate::model::{Coordinate, RouteOutcome, RoutePlan};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

/// Expansions between two budget checks.
const BUDGET_CHECK_INTERVAL: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    #[default]
    AStar,
    Dijkstra,
}

/// How the average speed behind the time estimate is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedAveraging {
    /// Plain mean of the speed limits of the traversed edges.
    #[default]
    Arithmetic,
    /// Each edge counts in proportion to its length; the time is the sum of the per-edge
    /// traversal times.
    LengthWeighted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingOptions {
    #[serde(default)]
    pub strategy: SearchStrategy,
    #[serde(default)]
    pub speed_averaging: SpeedAveraging,
}

/// Heap priority with a total order over `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Priority(f64);

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Per-call search state of one node.
#[derive(Debug, Clone, Copy)]
struct SearchEntry {
    cost: f64,
    /// Predecessor and the index of the edge taken from it.
    via: Option<(NodeId, usize)>,
}

/// Computes routes over a shared, immutable street graph.
///
/// The estimator is cheap to clone and `route` touches nothing but the graph and its own
/// local state, so any number of searches may run in parallel (typically on
/// `tokio::task::spawn_blocking`).
#[derive(Debug, Clone)]
pub struct RouteEstimator {
    graph: Arc<StreetGraph>,
    options: RoutingOptions,
}

impl RouteEstimator {
    pub fn new(graph: Arc<StreetGraph>, options: RoutingOptions) -> Self {
        Self { graph, options }
    }

    pub fn graph(&self) -> &Arc<StreetGraph> {
        &self.graph
    }

    pub fn options(&self) -> RoutingOptions {
        self.options
    }

    /// Least-cost route from `origin` to `destination`.
    pub fn route(&self, origin: NodeId, destination: NodeId, budget: &RouteBudget) -> RoutePlan {
        if origin == destination {
            return RoutePlan::stay(origin, RouteOutcome::Trivial);
        }
        if !self.graph.contains(origin) || !self.graph.contains(destination) {
            debug!(origin, destination, "Route endpoint not in graph");
            return RoutePlan::stay(origin, RouteOutcome::Unreachable);
        }

        match self.search(origin, destination, budget) {
            Ok(Some(edges)) => self.measure(origin, &edges),
            Ok(None) => {
                debug!(origin, destination, "No route");
                RoutePlan::stay(origin, RouteOutcome::Unreachable)
            }
            Err(expanded) => {
                debug!(origin, destination, expanded, "Route search out of budget");
                RoutePlan::stay(origin, RouteOutcome::TimedOut)
            }
        }
    }

    /// Snaps both positions to their nearest nodes and routes between them.
    pub fn route_between(
        &self,
        from: Coordinate,
        to: Coordinate,
        budget: &RouteBudget,
    ) -> Result<RoutePlan, GraphError> {
        let origin = self.graph.nearest_node(from.lat, from.lng)?;
        let destination = self.graph.nearest_node(to.lat, to.lng)?;
        Ok(self.route(origin, destination, budget))
    }

    fn estimate(&self, node: NodeId, destination: NodeId) -> f64 {
        match self.options.strategy {
            SearchStrategy::AStar => self.graph.heuristic(node, destination),
            SearchStrategy::Dijkstra => 0.0,
        }
    }

    /// Returns the edges of the best path, `None` when the destination is unreachable,
    /// or the number of expansions done when the budget ran out.
    fn search(
        &self,
        origin: NodeId,
        destination: NodeId,
        budget: &RouteBudget,
    ) -> Result<Option<Vec<&Edge>>, usize> {
        let mut state: HashMap<NodeId, SearchEntry> = HashMap::new();
        let mut heap: BinaryHeap<Reverse<(Priority, NodeId)>> = BinaryHeap::new();

        state.insert(origin, SearchEntry { cost: 0.0, via: None });
        heap.push(Reverse((Priority(self.estimate(origin, destination)), origin)));

        let mut expanded = 0usize;
        while let Some(Reverse((Priority(priority), node))) = heap.pop() {
            let cost = state[&node].cost;
            // Stale entry: the node was reached more cheaply after this push.
            if priority > cost + self.estimate(node, destination) {
                continue;
            }
            if node == destination {
                trace!(expanded, cost, "Destination settled");
                return Ok(Some(self.unwind(&state, destination)));
            }

            expanded += 1;
            if expanded % BUDGET_CHECK_INTERVAL == 0 && budget.is_exhausted() {
                return Err(expanded);
            }

            for (index, edge) in self.graph.neighbors(node).iter().enumerate() {
                let next_cost = cost + edge.weight;
                let improved = match state.entry(edge.to) {
                    Entry::Occupied(mut slot) if next_cost < slot.get().cost => {
                        slot.insert(SearchEntry {
                            cost: next_cost,
                            via: Some((node, index)),
                        });
                        true
                    }
                    Entry::Occupied(_) => false,
                    Entry::Vacant(slot) => {
                        slot.insert(SearchEntry {
                            cost: next_cost,
                            via: Some((node, index)),
                        });
                        true
                    }
                };
                if improved {
                    let priority = next_cost + self.estimate(edge.to, destination);
                    heap.push(Reverse((Priority(priority), edge.to)));
                }
            }
        }
        Ok(None)
    }

    fn unwind(&self, state: &HashMap<NodeId, SearchEntry>, destination: NodeId) -> Vec<&Edge> {
        let mut edges = Vec::new();
        let mut current = destination;
        while let Some((previous, index)) = state.get(&current).and_then(|s| s.via) {
            edges.push(&self.graph.neighbors(previous)[index]);
            current = previous;
        }
        edges.reverse();
        edges
    }

    fn measure(&self, origin: NodeId, edges: &[&Edge]) -> RoutePlan {
        let mut path = Vec::with_capacity(edges.len() + 1);
        path.push(origin);
        path.extend(edges.iter().map(|e| e.to));

        let distance_km = edges.iter().map(|e| e.length_m).sum::<f64>() / 1000.0;
        let time_min = match self.options.speed_averaging {
            SpeedAveraging::Arithmetic => {
                let mean = edges.iter().map(|e| e.speed_kmh).sum::<f64>() / edges.len() as f64;
                distance_km / mean * 60.0
            }
            SpeedAveraging::LengthWeighted => edges
                .iter()
                .map(|e| e.length_m / 1000.0 / e.speed_kmh * 60.0)
                .sum(),
        };

        RoutePlan {
            path,
            distance_km,
            time_min,
            outcome: RouteOutcome::Found,
        }
    }
}
