//! Custom actions for the Courier actor.
//!
//! Everything beyond create/get/update goes through these actions, so each one runs on
//! the courier's own task and never interleaves with another mutation of that courier.

use crate::model::{BatchLoad, CustomerId, DeliveryOutcome, Order, Placement};

#[derive(Debug, Clone)]
pub enum CourierAction {
    /// Is the customer pending (batch or overflow) on this courier?
    Holds(CustomerId),
    /// Places an order in the batch or overflow queue.
    Assign(Box<Order>),
    /// Presentation-ordered copy of the active batch.
    Peek,
    /// Hands the batch over and refills it from overflow.
    Flush,
    /// Flushes only if the batch still lists exactly these stops, in presentation order.
    FlushIf(Vec<CustomerId>),
    Pending,
    InTransit,
    Delivered,
    Deliver(CustomerId),
    /// Rates a delivered order (1-5).
    Rate { customer: CustomerId, rating: u8 },
    Load,
}

/// Results from CourierActions - variants match 1:1 with CourierAction
#[derive(Debug, Clone)]
pub enum CourierActionResult {
    Holds(bool),
    Assign(Placement),
    Peek(Vec<Order>),
    Flush(Vec<Order>),
    /// `None` when the batch changed and nothing was flushed.
    FlushIf(Option<Vec<Order>>),
    Pending(Vec<Order>),
    InTransit(Vec<Order>),
    Delivered(Vec<Order>),
    Deliver(DeliveryOutcome),
    Rate(()),
    Load(BatchLoad),
}
