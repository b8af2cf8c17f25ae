//! # Routing
//!
//! Shortest paths over the [`StreetGraph`](crate::graph::StreetGraph) and the distance and
//! travel-time figures derived from them.
//!
//! - [`RouteEstimator`] runs A* (or plain Dijkstra) for one origin/destination pair.
//! - [`RouteBudget`] bounds a search with a deadline and/or a cancellation token.
//!
//! Routing never fails loudly: an unreachable destination or an exhausted budget yields
//! the fail-soft [`RoutePlan::stay`](crate::model::RoutePlan::stay) plan, tagged with the
//! reason.

mod budget;
mod estimator;

pub use budget::RouteBudget;
pub use estimator::{RouteEstimator, RoutingOptions, SearchStrategy, SpeedAveraging};
