//! # Courier Assignment
//!
//! [`CourierAssigner`] fronts the fixed roster of courier actors. It picks a courier for
//! each new order, guards against a customer being queued twice, and forwards the batch
//! lifecycle operations (flush, deliver, …) to the right courier.
//!
//! Per-courier state changes are serialized by the courier actors themselves. Assignment
//! additionally needs a consistent view *across* couriers (the duplicate check and the
//! load-based choice), so assignments pass one at a time through an internal gate.

pub mod policy;

pub use policy::{CourierLoad, CourierPicker, LoadBalance, ZonePinned};

use crate::clients::CourierClient;
use crate::courier_actor::CourierError;
use crate::invariant;
use crate::model::{BatchLoad, Courier, CourierId, CourierUpdate, CustomerId, DeliveryOutcome, Order, Placement};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("Unknown courier: {0}")]
    UnknownCourier(CourierId),

    #[error(transparent)]
    Courier(#[from] CourierError),
}

/// Result of [`CourierAssigner::assign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    /// Added to the courier's batch; `full` is true when this order filled it.
    Batched { courier: CourierId, full: bool },
    /// The chosen courier's batch was full; the order waits in its overflow queue.
    Overflowed { courier: CourierId },
    /// The customer already had a pending order; nothing changed.
    AlreadyAssigned { courier: CourierId, full: bool },
    /// No valid courier could be chosen (lenient invariant handling).
    Rejected,
}

impl AssignOutcome {
    /// True only when this assignment turned the batch FULL.
    pub fn is_full(&self) -> bool {
        match self {
            AssignOutcome::Batched { full, .. } | AssignOutcome::AlreadyAssigned { full, .. } => *full,
            AssignOutcome::Overflowed { .. } | AssignOutcome::Rejected => false,
        }
    }

    pub fn courier(&self) -> Option<&CourierId> {
        match self {
            AssignOutcome::Batched { courier, .. }
            | AssignOutcome::Overflowed { courier }
            | AssignOutcome::AlreadyAssigned { courier, .. } => Some(courier),
            AssignOutcome::Rejected => None,
        }
    }
}

pub struct CourierAssigner {
    /// Roster order matters: it is the tie-break for every policy.
    couriers: Vec<(CourierId, CourierClient)>,
    picker: Box<dyn CourierPicker>,
    gate: Mutex<()>,
    strict_invariants: bool,
}

impl CourierAssigner {
    pub fn new(
        couriers: Vec<(CourierId, CourierClient)>,
        picker: Box<dyn CourierPicker>,
        strict_invariants: bool,
    ) -> Self {
        Self {
            couriers,
            picker,
            gate: Mutex::new(()),
            strict_invariants,
        }
    }

    /// Courier ids in roster order.
    pub fn roster(&self) -> Vec<CourierId> {
        self.couriers.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn policy(&self) -> &'static str {
        self.picker.name()
    }

    pub fn client(&self, id: &CourierId) -> Result<&CourierClient, AssignmentError> {
        self.couriers
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, client)| client)
            .ok_or_else(|| AssignmentError::UnknownCourier(id.clone()))
    }

    /// Places an order on a courier.
    ///
    /// A customer that is already pending on any courier is left where it is.
    #[instrument(skip(self, order), fields(customer = %order.customer))]
    pub async fn assign(&self, order: Order) -> Result<AssignOutcome, AssignmentError> {
        let _gate = self.gate.lock().await;

        for (id, client) in &self.couriers {
            if client.holds(id, &order.customer).await? {
                let full = client.load(id).await?.is_full();
                debug!(courier = %id, "Customer already pending");
                return Ok(AssignOutcome::AlreadyAssigned {
                    courier: id.clone(),
                    full,
                });
            }
        }

        let loads = self.loads().await?;
        let Some(chosen) = self.picker.pick_courier(&order, &loads) else {
            invariant::violated(self.strict_invariants, "no courier configured for order");
            return Ok(AssignOutcome::Rejected);
        };
        let Ok(client) = self.client(&chosen) else {
            invariant::violated(
                self.strict_invariants,
                &format!("picked courier {chosen} is not on the roster"),
            );
            return Ok(AssignOutcome::Rejected);
        };

        let outcome = match client.assign(&chosen, order).await? {
            Placement::Batched { full } => AssignOutcome::Batched {
                courier: chosen,
                full,
            },
            Placement::Overflowed => AssignOutcome::Overflowed { courier: chosen },
            Placement::AlreadyHeld { full } => AssignOutcome::AlreadyAssigned {
                courier: chosen,
                full,
            },
        };
        info!(?outcome, "Order assigned");
        Ok(outcome)
    }

    /// Current load of every courier, in roster order.
    pub async fn loads(&self) -> Result<Vec<CourierLoad>, AssignmentError> {
        let mut loads = Vec::with_capacity(self.couriers.len());
        for (id, client) in &self.couriers {
            loads.push(CourierLoad {
                id: id.clone(),
                load: client.load(id).await?,
            });
        }
        Ok(loads)
    }

    pub async fn load(&self, id: &CourierId) -> Result<BatchLoad, AssignmentError> {
        Ok(self.client(id)?.load(id).await?)
    }

    pub async fn flush(&self, id: &CourierId) -> Result<Vec<Order>, AssignmentError> {
        Ok(self.client(id)?.flush(id).await?)
    }

    pub async fn flush_if(
        &self,
        id: &CourierId,
        expected: Vec<CustomerId>,
    ) -> Result<Option<Vec<Order>>, AssignmentError> {
        Ok(self.client(id)?.flush_if(id, expected).await?)
    }

    pub async fn update_contact(&self, id: &CourierId, update: CourierUpdate) -> Result<Courier, AssignmentError> {
        Ok(self.client(id)?.update_contact(id, update).await?)
    }

    pub async fn peek_batch(&self, id: &CourierId) -> Result<Vec<Order>, AssignmentError> {
        Ok(self.client(id)?.peek_batch(id).await?)
    }

    pub async fn pending(&self, id: &CourierId) -> Result<Vec<Order>, AssignmentError> {
        Ok(self.client(id)?.pending(id).await?)
    }

    pub async fn in_transit(&self, id: &CourierId) -> Result<Vec<Order>, AssignmentError> {
        Ok(self.client(id)?.in_transit(id).await?)
    }

    pub async fn delivered(&self, id: &CourierId) -> Result<Vec<Order>, AssignmentError> {
        Ok(self.client(id)?.delivered(id).await?)
    }

    pub async fn deliver(&self, id: &CourierId, customer: &CustomerId) -> Result<DeliveryOutcome, AssignmentError> {
        Ok(self.client(id)?.deliver(id, customer).await?)
    }

    pub async fn rate(&self, id: &CourierId, customer: &CustomerId, rating: u8) -> Result<(), AssignmentError> {
        Ok(self.client(id)?.rate(id, customer, rating).await?)
    }
}
