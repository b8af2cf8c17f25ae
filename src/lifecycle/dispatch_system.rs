use crate::assignment::{AssignOutcome, AssignmentError, CourierAssigner};
use crate::clients::CourierClient;
use crate::courier_actor::{self, CourierContext};
use crate::error::DispatchError;
use crate::graph::{NodeId, StreetGraph};
use crate::lifecycle::DispatchConfig;
use crate::manifest::{Manifest, ManifestSink, SinkError};
use crate::model::{
    BatchLoad, Coordinate, Courier, CourierCreate, CourierId, CourierUpdate, CustomerId, DeliveryOutcome, Order,
    OrderDraft, RoutePlan,
};
use crate::routing::{RouteBudget, RouteEstimator};
use crate::zone::{ZoneClassifier, ZoneLabel};
use actor_framework::ActorClient;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// What happened to a dispatch request.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchStatus {
    /// Every manifest went out. `batches` holds one entry per flushed batch, each in
    /// delivery order.
    Sent {
        courier: CourierId,
        batches: Vec<Vec<CustomerId>>,
    },
    /// The sink refused a manifest. That batch is untouched and stays FULL; `sent` lists
    /// the batches flushed before the refusal.
    Failed {
        courier: CourierId,
        sent: Vec<Vec<CustomerId>>,
        error: SinkError,
    },
    /// The batch was empty, nothing was sent.
    Idle { courier: CourierId },
}

/// Outcome of [`DispatchSystem::place_order`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementReport {
    pub customer: CustomerId,
    pub zone: Option<ZoneLabel>,
    /// `None` when the order only had a free-text address.
    pub route: Option<RoutePlan>,
    pub outcome: AssignOutcome,
    /// Set when this order filled a batch.
    pub dispatch: Option<DispatchStatus>,
}

/// The runtime orchestrator of the dispatch core.
///
/// `DispatchSystem` is responsible for:
/// - **Lifecycle Management**: starting one actor per configured courier and stopping
///   them all again
/// - **Dependency Wiring**: the shared street graph, the route estimator, the zone
///   classifier, the assigner and the manifest sink
/// - **The placement pipeline**: validate → route → classify → assign → dispatch
///
/// # Example
///
/// ```ignore
/// let graph = Arc::new(StreetGraph::load(&config.graph.path, &config.graph_options())?);
/// let system = DispatchSystem::start(&config, graph, Arc::new(TracingSink)).await?;
///
/// let report = system.place_order(draft).await?;
/// system.mark_delivered(&courier, &customer).await?;
///
/// system.shutdown().await?;
/// ```
pub struct DispatchSystem {
    assigner: CourierAssigner,
    estimator: RouteEstimator,
    zones: ZoneClassifier,
    /// Graph node closest to the store; every manifest starts here.
    store_node: NodeId,
    route_timeout: Duration,
    sink: Arc<dyn ManifestSink>,
    /// Held for the whole peek, send and flush of one courier's dispatch.
    dispatch_turns: HashMap<CourierId, Mutex<()>>,
    /// Cancelled on shutdown to cut in-flight route searches short.
    cancel: CancellationToken,
    handles: Vec<(CourierId, JoinHandle<()>)>,
}

impl DispatchSystem {
    /// Spawns and registers one courier actor per roster entry and wires the pipeline.
    pub async fn start(
        config: &DispatchConfig,
        graph: Arc<StreetGraph>,
        sink: Arc<dyn ManifestSink>,
    ) -> Result<Self, DispatchError> {
        config.validate()?;
        let store_node = graph.nearest_node(config.store.lat, config.store.lng)?;
        let context = CourierContext {
            strict_invariants: config.assignment.strict_invariants,
        };

        let mut couriers = Vec::with_capacity(config.couriers.len());
        let mut handles = Vec::with_capacity(config.couriers.len());
        for entry in &config.couriers {
            let (actor, generic_client) = courier_actor::new(config.assignment.channel_buffer);
            handles.push((entry.id.clone(), tokio::spawn(actor.run(context))));

            let client = CourierClient::new(generic_client);
            client
                .register(CourierCreate {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    contact: entry.contact.clone(),
                    capacity: config.assignment.capacity,
                })
                .await?;
            couriers.push((entry.id.clone(), client));
        }

        let dispatch_turns: HashMap<_, _> = couriers.iter().map(|(id, _)| (id.clone(), Mutex::new(()))).collect();
        let assigner = CourierAssigner::new(couriers, config.picker(), config.assignment.strict_invariants);
        info!(
            couriers = handles.len(),
            capacity = config.assignment.capacity,
            policy = assigner.policy(),
            store_node,
            "Dispatch system started"
        );

        Ok(Self {
            assigner,
            estimator: RouteEstimator::new(graph, config.routing_options()),
            zones: ZoneClassifier::new(config.store),
            store_node,
            route_timeout: config.route_timeout(),
            sink,
            dispatch_turns,
            cancel: CancellationToken::new(),
            handles,
        })
    }

    fn route_budget(&self) -> RouteBudget {
        RouteBudget::with_timeout(self.route_timeout).cancelled_by(self.cancel.child_token())
    }

    /// Courier ids in roster order.
    pub fn couriers(&self) -> Vec<CourierId> {
        self.assigner.roster()
    }

    /// Route between two positions, computed on the blocking pool within the configured
    /// timeout.
    pub async fn compute_route(&self, from: Coordinate, to: Coordinate) -> Result<RoutePlan, DispatchError> {
        let estimator = self.estimator.clone();
        let budget = self.route_budget();
        let plan = tokio::task::spawn_blocking(move || estimator.route_between(from, to, &budget))
            .await
            .map_err(|e| DispatchError::Task(e.to_string()))??;
        Ok(plan)
    }

    pub fn classify_zone(&self, point: Coordinate) -> ZoneLabel {
        self.zones.classify(point)
    }

    pub async fn assign_order(&self, order: Order) -> Result<AssignOutcome, DispatchError> {
        Ok(self.assigner.assign(order).await?)
    }

    pub async fn flush_batch(&self, courier: &CourierId) -> Result<Vec<Order>, DispatchError> {
        Ok(self.assigner.flush(courier).await?)
    }

    pub async fn peek_batch(&self, courier: &CourierId) -> Result<Vec<Order>, DispatchError> {
        Ok(self.assigner.peek_batch(courier).await?)
    }

    pub async fn mark_delivered(
        &self,
        courier: &CourierId,
        customer: &CustomerId,
    ) -> Result<DeliveryOutcome, DispatchError> {
        Ok(self.assigner.deliver(courier, customer).await?)
    }

    pub async fn pending_for(&self, courier: &CourierId) -> Result<Vec<Order>, DispatchError> {
        Ok(self.assigner.pending(courier).await?)
    }

    pub async fn in_transit_for(&self, courier: &CourierId) -> Result<Vec<Order>, DispatchError> {
        Ok(self.assigner.in_transit(courier).await?)
    }

    pub async fn delivered_for(&self, courier: &CourierId) -> Result<Vec<Order>, DispatchError> {
        Ok(self.assigner.delivered(courier).await?)
    }

    pub async fn rate_order(&self, courier: &CourierId, customer: &CustomerId, rating: u8) -> Result<(), DispatchError> {
        Ok(self.assigner.rate(courier, customer, rating).await?)
    }

    /// Changes a courier's name or contact. Manifests built afterwards carry the new values.
    pub async fn update_courier(&self, courier: &CourierId, update: CourierUpdate) -> Result<Courier, DispatchError> {
        let updated = self.assigner.update_contact(courier, update).await?;
        info!(%courier, name = %updated.name, contact = %updated.contact, "Courier updated");
        Ok(updated)
    }

    pub async fn courier_load(&self, courier: &CourierId) -> Result<BatchLoad, DispatchError> {
        Ok(self.assigner.load(courier).await?)
    }

    /// Runs the full placement pipeline for one order.
    ///
    /// Routing problems never fail the placement: the order goes ahead without distance
    /// and ETA. A manifest that cannot be sent leaves the batch FULL for a later
    /// [`dispatch_batch`](Self::dispatch_batch).
    #[instrument(skip(self, draft), fields(customer = %draft.customer))]
    pub async fn place_order(&self, draft: OrderDraft) -> Result<PlacementReport, DispatchError> {
        let mut order = draft.validate()?;

        if let Some(location) = order.location {
            let plan = self.compute_route(self.zones.store(), location).await?;
            if !plan.is_usable() {
                warn!(outcome = ?plan.outcome, "No route to customer, continuing without ETA");
            }
            order.route = Some(plan);
            order.zone = Some(self.classify_zone(location));
        } else {
            debug!("Address only, routing skipped");
        }

        let customer = order.customer.clone();
        let zone = order.zone;
        let route = order.route.clone();
        let outcome = self.assign_order(order).await?;

        let dispatch = match &outcome {
            AssignOutcome::Batched { courier, full: true } => Some(self.dispatch_batch(courier).await?),
            _ => None,
        };

        Ok(PlacementReport {
            customer,
            zone,
            route,
            outcome,
            dispatch,
        })
    }

    /// Sends the courier's batch and flushes it once the sink accepted the manifest.
    ///
    /// Dispatches of the same courier run one at a time. The flush only goes through when
    /// the batch still lists the manifest's stops; a batch that changed meanwhile (an order
    /// delivered straight from it) is sent again as it now stands. When a flush refills the
    /// batch to FULL from overflow, that batch is sent as well.
    #[instrument(skip(self))]
    pub async fn dispatch_batch(&self, courier: &CourierId) -> Result<DispatchStatus, DispatchError> {
        let turn = self
            .dispatch_turns
            .get(courier)
            .ok_or_else(|| AssignmentError::UnknownCourier(courier.clone()))?;
        let _turn = turn.lock().await;

        let mut sent: Vec<Vec<CustomerId>> = Vec::new();
        loop {
            let orders = self.assigner.peek_batch(courier).await?;
            if orders.is_empty() {
                break;
            }
            let stops: Vec<CustomerId> = orders.iter().map(|o| o.customer.clone()).collect();
            let manifest = self.build_manifest(courier, orders).await?;

            if let Err(error) = self.sink.dispatch(&manifest).await {
                warn!(%error, "Manifest not delivered, batch kept");
                return Ok(DispatchStatus::Failed {
                    courier: courier.clone(),
                    sent,
                    error,
                });
            }

            match self.assigner.flush_if(courier, stops).await? {
                Some(flushed) => {
                    sent.push(flushed.into_iter().map(|o| o.customer).collect());
                    if !self.assigner.load(courier).await?.is_full() {
                        break;
                    }
                    debug!("Batch refilled to full, sending the next manifest");
                }
                None => debug!("Batch changed while its manifest was out, sending it again"),
            }
        }

        if sent.is_empty() {
            Ok(DispatchStatus::Idle {
                courier: courier.clone(),
            })
        } else {
            Ok(DispatchStatus::Sent {
                courier: courier.clone(),
                batches: sent,
            })
        }
    }

    async fn build_manifest(&self, courier: &CourierId, orders: Vec<Order>) -> Result<Manifest, DispatchError> {
        let profile = self
            .assigner
            .client(courier)?
            .get(courier.clone())
            .await
            .map_err(AssignmentError::from)?
            .ok_or_else(|| AssignmentError::UnknownCourier(courier.clone()))?;

        let estimator = self.estimator.clone();
        let start = self.store_node;
        let budget = self.route_budget();
        tokio::task::spawn_blocking(move || Manifest::build(&profile, &orders, &estimator, start, &budget))
            .await
            .map_err(|e| DispatchError::Task(e.to_string()))
    }

    /// Gracefully shuts down the system.
    ///
    /// Cancels in-flight route searches, drops every courier client (which closes the
    /// actors' channels) and waits for each actor task. Returns an error naming the first
    /// courier whose actor panicked.
    pub async fn shutdown(self) -> Result<(), DispatchError> {
        info!("Shutting down dispatch system...");
        self.cancel.cancel();
        drop(self.assigner);

        let mut failure = None;
        for (courier, handle) in self.handles {
            if let Err(e) = handle.await {
                error!(%courier, error = %e, "Courier actor failed");
                failure.get_or_insert(DispatchError::ActorFailed {
                    courier: courier.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        match failure {
            Some(e) => Err(e),
            None => {
                info!("Dispatch system shutdown complete.");
                Ok(())
            }
        }
    }
}
