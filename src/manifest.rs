//! # Batch Manifests
//!
//! When a courier's batch fills up, the courier is sent a manifest: the stops in
//! delivery order, the chained route store → stop 1 → stop 2 → …, and a short caption.
//! Rendering and sending are done by a [`ManifestSink`]; the batch is flushed only after
//! the sink reports success.

use crate::graph::NodeId;
use crate::model::{Courier, CourierId, CustomerId, Order, RoutePlan};
use crate::routing::{RouteBudget, RouteEstimator};
use crate::zone::ZoneLabel;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestStop {
    pub customer: CustomerId,
    pub destination: String,
    pub zone: Option<ZoneLabel>,
    /// Distance from the store, when the order could be routed.
    pub distance_km: Option<f64>,
    pub eta_min: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    pub courier: CourierId,
    pub courier_name: String,
    pub contact: String,
    pub stops: Vec<ManifestStop>,
    /// One leg per routed stop, each starting where the previous one ended.
    pub legs: Vec<RoutePlan>,
    pub total_distance_km: f64,
    pub total_time_min: f64,
    pub caption: String,
}

impl Manifest {
    /// Builds the manifest for `orders`, which must already be in delivery order.
    ///
    /// Orders without a usable route are listed as stops but get no leg.
    pub fn build(
        courier: &Courier,
        orders: &[Order],
        estimator: &RouteEstimator,
        start: NodeId,
        budget: &RouteBudget,
    ) -> Self {
        let mut legs = Vec::new();
        let mut here = start;
        for destination in orders
            .iter()
            .filter_map(|o| o.route.as_ref().filter(|r| r.is_usable()))
            .filter_map(RoutePlan::destination)
        {
            legs.push(estimator.route(here, destination, budget));
            here = destination;
        }

        let stops: Vec<ManifestStop> = orders
            .iter()
            .map(|o| ManifestStop {
                customer: o.customer.clone(),
                destination: o.destination_label(),
                zone: o.zone,
                distance_km: o.distance_km(),
                eta_min: o.eta_min(),
            })
            .collect();

        let total_distance_km = legs.iter().map(|l| l.distance_km).sum();
        let total_time_min = legs.iter().map(|l| l.time_min).sum();
        let caption = caption(&courier.name, &stops, total_distance_km, total_time_min);

        Self {
            courier: courier.id.clone(),
            courier_name: courier.name.clone(),
            contact: courier.contact.clone(),
            stops,
            legs,
            total_distance_km,
            total_time_min,
            caption,
        }
    }
}

fn caption(name: &str, stops: &[ManifestStop], km: f64, min: f64) -> String {
    let mut text = format!(
        "Batch for {name}: {} stops, {km:.2} km, ~{} min",
        stops.len(),
        min.ceil()
    );
    for (n, stop) in stops.iter().enumerate() {
        let _ = write!(text, "\n{}. {} - {}", n + 1, stop.customer, stop.destination);
        if let Some(zone) = stop.zone {
            let _ = write!(text, " [{zone}]");
        }
        if let (Some(km), Some(eta)) = (stop.distance_km, stop.eta_min) {
            let _ = write!(text, " {km:.2} km, {} min", eta.ceil());
        }
    }
    text
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SinkError {
    #[error("Manifest delivery failed: {0}")]
    Delivery(String),
}

/// Where manifests go (a chat integration, a print queue, …).
#[async_trait]
pub trait ManifestSink: Send + Sync {
    async fn dispatch(&self, manifest: &Manifest) -> Result<(), SinkError>;
}

/// Logs each manifest's caption.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl ManifestSink for TracingSink {
    async fn dispatch(&self, manifest: &Manifest) -> Result<(), SinkError> {
        info!(
            courier = %manifest.courier,
            stops = manifest.stops.len(),
            distance_km = manifest.total_distance_km,
            "Manifest dispatched\n{}",
            manifest.caption
        );
        Ok(())
    }
}

/// Keeps every manifest in memory; can be switched to fail on demand.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<Manifest>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every dispatch fails and nothing is recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<Manifest> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ManifestSink for RecordingSink {
    async fn dispatch(&self, manifest: &Manifest) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Delivery("recording sink set to fail".to_string()));
        }
        self.sent.lock().await.push(manifest.clone());
        Ok(())
    }
}
