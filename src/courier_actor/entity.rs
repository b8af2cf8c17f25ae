//! [`ActorEntity`] implementation for [`Courier`].
//!
//! The batch rules themselves live on [`Courier`]; this impl maps actions onto them and
//! applies the invariant policy from the [`CourierContext`].

use super::actions::{CourierAction, CourierActionResult};
use super::error::CourierError;
use super::CourierContext;
use crate::invariant;
use crate::model::{Courier, CourierCreate, CourierId, CourierUpdate, DeliveryOutcome};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use tracing::{debug, info, warn};

#[async_trait]
impl ActorEntity for Courier {
    type Id = CourierId;
    type Create = CourierCreate;
    type Update = CourierUpdate;
    type Action = CourierAction;
    type ActionResult = CourierActionResult;
    type Context = CourierContext;
    type Error = CourierError;

    fn from_create_params(id: CourierId, params: CourierCreate) -> Result<Self, Self::Error> {
        if params.capacity == 0 {
            return Err(CourierError::InvalidCapacity);
        }
        Ok(Courier::new(id, params.name, params.contact, params.capacity))
    }

    async fn on_update(
        &mut self,
        update: CourierUpdate,
        _ctx: &CourierContext,
    ) -> Result<(), Self::Error> {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(contact) = update.contact {
            self.contact = contact;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: CourierAction,
        ctx: &CourierContext,
    ) -> Result<CourierActionResult, Self::Error> {
        match action {
            CourierAction::Holds(customer) => Ok(CourierActionResult::Holds(self.holds(&customer))),
            CourierAction::Assign(order) => {
                let customer = order.customer.clone();
                let placement = self.assign(*order);
                debug!(courier = %self.id, %customer, ?placement, size = self.batch().len(), "Assigned");
                Ok(CourierActionResult::Assign(placement))
            }
            CourierAction::Peek => Ok(CourierActionResult::Peek(self.peek())),
            CourierAction::Flush => {
                let sent = self.flush();
                info!(courier = %self.id, sent = sent.len(), size = self.batch().len(), "Batch flushed");
                Ok(CourierActionResult::Flush(sent))
            }
            CourierAction::FlushIf(expected) => {
                let sent = self.flush_if(&expected);
                match &sent {
                    Some(sent) => {
                        info!(courier = %self.id, sent = sent.len(), size = self.batch().len(), "Batch flushed")
                    }
                    None => warn!(courier = %self.id, expected = expected.len(), "Batch changed since its manifest was built, not flushed"),
                }
                Ok(CourierActionResult::FlushIf(sent))
            }
            CourierAction::Pending => Ok(CourierActionResult::Pending(self.pending())),
            CourierAction::InTransit => Ok(CourierActionResult::InTransit(self.in_transit().to_vec())),
            CourierAction::Delivered => Ok(CourierActionResult::Delivered(self.delivered().to_vec())),
            CourierAction::Deliver(customer) => {
                let outcome = self.deliver(&customer);
                match outcome {
                    DeliveryOutcome::Delivered => info!(courier = %self.id, %customer, "Delivered"),
                    DeliveryOutcome::AlreadyDelivered => debug!(courier = %self.id, %customer, "Already delivered"),
                    DeliveryOutcome::Unknown => invariant::violated(
                        ctx.strict_invariants,
                        &format!("courier {} has no order for {customer}", self.id),
                    ),
                }
                Ok(CourierActionResult::Deliver(outcome))
            }
            CourierAction::Rate { customer, rating } => {
                if !(1..=5).contains(&rating) {
                    return Err(CourierError::RatingOutOfRange(rating));
                }
                if let Some(order) = self.delivered_order_mut(&customer) {
                    order.rating = Some(rating);
                    info!(courier = %self.id, %customer, rating, "Rated");
                    return Ok(CourierActionResult::Rate(()));
                }
                if self.holds(&customer) || self.in_transit().iter().any(|o| o.customer == customer) {
                    Err(CourierError::NotDelivered(customer))
                } else {
                    Err(CourierError::UnknownOrder(customer))
                }
            }
            CourierAction::Load => Ok(CourierActionResult::Load(self.load())),
        }
    }
}
