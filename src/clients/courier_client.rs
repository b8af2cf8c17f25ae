//! # Courier Client
//!
//! Provides a high‑level API for interacting with a `Courier` actor.
//! It wraps a `ResourceClient<Courier>` and turns each [`CourierAction`] round trip into a
//! typed method.
use crate::courier_actor::{CourierAction, CourierActionResult, CourierError};
use crate::model::{BatchLoad, Courier, CourierCreate, CourierId, CourierUpdate, CustomerId, DeliveryOutcome, Order, Placement};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with a Courier actor.
#[derive(Clone)]
pub struct CourierClient {
    inner: ResourceClient<Courier>,
}

#[async_trait]
impl ActorClient<Courier> for CourierClient {
    type Error = CourierError;

    fn inner(&self) -> &ResourceClient<Courier> {
        &self.inner
    }

    /// Business-rule failures come back as the courier's own error; everything else is a
    /// communication problem.
    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::EntityError(inner) => match inner.downcast::<CourierError>() {
                Ok(courier_error) => *courier_error,
                Err(other) => CourierError::ActorCommunicationError(other.to_string()),
            },
            other => CourierError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl CourierClient {
    pub fn new(inner: ResourceClient<Courier>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn register(&self, params: CourierCreate) -> Result<CourierId, CourierError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn update_contact(&self, id: &CourierId, update: CourierUpdate) -> Result<Courier, CourierError> {
        debug!("Sending request");
        self.inner.update(id.clone(), update).await.map_err(Self::map_error)
    }

    async fn act(&self, id: &CourierId, action: CourierAction) -> Result<CourierActionResult, CourierError> {
        self.inner
            .perform_action(id.clone(), action)
            .await
            .map_err(Self::map_error)
    }

    /// Whether the customer has a pending order (batch or overflow) on this courier.
    #[instrument(skip(self))]
    pub async fn holds(&self, id: &CourierId, customer: &CustomerId) -> Result<bool, CourierError> {
        match self.act(id, CourierAction::Holds(customer.clone())).await? {
            CourierActionResult::Holds(held) => Ok(held),
            _ => unreachable!("Holds action must return Holds result"),
        }
    }

    #[instrument(skip(self, order), fields(customer = %order.customer))]
    pub async fn assign(&self, id: &CourierId, order: Order) -> Result<Placement, CourierError> {
        debug!("Assigning order");
        match self.act(id, CourierAction::Assign(Box::new(order))).await? {
            CourierActionResult::Assign(placement) => Ok(placement),
            _ => unreachable!("Assign action must return Assign result"),
        }
    }

    /// The active batch in presentation order, unchanged.
    #[instrument(skip(self))]
    pub async fn peek_batch(&self, id: &CourierId) -> Result<Vec<Order>, CourierError> {
        match self.act(id, CourierAction::Peek).await? {
            CourierActionResult::Peek(orders) => Ok(orders),
            _ => unreachable!("Peek action must return Peek result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn flush(&self, id: &CourierId) -> Result<Vec<Order>, CourierError> {
        match self.act(id, CourierAction::Flush).await? {
            CourierActionResult::Flush(orders) => Ok(orders),
            _ => unreachable!("Flush action must return Flush result"),
        }
    }

    /// Flushes only if the batch still lists `expected`; `None` when it changed.
    #[instrument(skip(self))]
    pub async fn flush_if(&self, id: &CourierId, expected: Vec<CustomerId>) -> Result<Option<Vec<Order>>, CourierError> {
        match self.act(id, CourierAction::FlushIf(expected)).await? {
            CourierActionResult::FlushIf(orders) => Ok(orders),
            _ => unreachable!("FlushIf action must return FlushIf result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn pending(&self, id: &CourierId) -> Result<Vec<Order>, CourierError> {
        match self.act(id, CourierAction::Pending).await? {
            CourierActionResult::Pending(orders) => Ok(orders),
            _ => unreachable!("Pending action must return Pending result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn in_transit(&self, id: &CourierId) -> Result<Vec<Order>, CourierError> {
        match self.act(id, CourierAction::InTransit).await? {
            CourierActionResult::InTransit(orders) => Ok(orders),
            _ => unreachable!("InTransit action must return InTransit result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn delivered(&self, id: &CourierId) -> Result<Vec<Order>, CourierError> {
        match self.act(id, CourierAction::Delivered).await? {
            CourierActionResult::Delivered(orders) => Ok(orders),
            _ => unreachable!("Delivered action must return Delivered result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn deliver(&self, id: &CourierId, customer: &CustomerId) -> Result<DeliveryOutcome, CourierError> {
        match self.act(id, CourierAction::Deliver(customer.clone())).await? {
            CourierActionResult::Deliver(outcome) => Ok(outcome),
            _ => unreachable!("Deliver action must return Deliver result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn rate(&self, id: &CourierId, customer: &CustomerId, rating: u8) -> Result<(), CourierError> {
        let action = CourierAction::Rate {
            customer: customer.clone(),
            rating,
        };
        match self.act(id, action).await? {
            CourierActionResult::Rate(()) => Ok(()),
            _ => unreachable!("Rate action must return Rate result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn load(&self, id: &CourierId) -> Result<BatchLoad, CourierError> {
        match self.act(id, CourierAction::Load).await? {
            CourierActionResult::Load(load) => Ok(load),
            _ => unreachable!("Load action must return Load result"),
        }
    }
}
