use crate::graph::NodeId;
use serde::{Deserialize, Serialize};

/// Why a [`RoutePlan`] looks the way it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOutcome {
    /// A path between two distinct nodes was found.
    Found,
    /// Origin and destination are the same node.
    Trivial,
    /// The destination cannot be reached from the origin.
    Unreachable,
    /// The search ran out of budget (deadline or cancellation).
    TimedOut,
}

/// Result of a route computation.
///
/// `path` always starts at the origin. When the outcome is [`RouteOutcome::Found`] it also
/// ends at the destination and every consecutive pair is joined by a real edge; in every
/// other case it is exactly `[origin]` with zero distance and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub path: Vec<NodeId>,
    pub distance_km: f64,
    pub time_min: f64,
    pub outcome: RouteOutcome,
}

impl RoutePlan {
    /// The fail-soft plan: stay at `origin`.
    pub fn stay(origin: NodeId, outcome: RouteOutcome) -> Self {
        Self {
            path: vec![origin],
            distance_km: 0.0,
            time_min: 0.0,
            outcome,
        }
    }

    pub fn origin(&self) -> Option<NodeId> {
        self.path.first().copied()
    }

    pub fn destination(&self) -> Option<NodeId> {
        self.path.last().copied()
    }

    /// True when the plan carries usable distance/time figures.
    pub fn is_usable(&self) -> bool {
        matches!(self.outcome, RouteOutcome::Found | RouteOutcome::Trivial)
    }
}
