//! A courier and the orders they are responsible for.
//!
//! # Actor Framework
//! [`Courier`] implements the [`ActorEntity`](actor_framework::ActorEntity) trait,
//! allowing it to be managed by a [`ResourceActor`](actor_framework::ResourceActor).
//! Each courier gets its own actor, so all of the compound read-then-write operations
//! below run on a single writer.
//!
//! See [`courier_actor`](crate::courier_actor) for details on:
//! - Creation parameters ([`CourierCreate`])
//! - Update parameters ([`CourierUpdate`])
//! - Custom actions ([`CourierAction`](crate::courier_actor::CourierAction))

use crate::model::{sort_by_distance, CustomerId, Order};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;

/// Default batch capacity.
pub const DEFAULT_CAPACITY: usize = 7;

/// Type-safe identifier for couriers, taken from the roster configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourierId(pub String);

impl From<&str> for CourierId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for CourierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed-capacity group of orders dispatched together.
///
/// OPEN while `len() < capacity`, FULL at `len() == capacity`. A batch never grows past
/// its capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    capacity: usize,
    orders: Vec<Order>,
}

impl Batch {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            orders: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.orders.len() >= self.capacity
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Appends an order to an OPEN batch and reports whether it is FULL afterwards.
    /// A FULL batch hands the order back.
    pub fn push(&mut self, order: Order) -> Result<bool, Order> {
        if self.is_full() {
            return Err(order);
        }
        self.orders.push(order);
        Ok(self.is_full())
    }

    fn contains(&self, customer: &CustomerId) -> bool {
        self.orders.iter().any(|o| &o.customer == customer)
    }

    fn take(&mut self) -> Vec<Order> {
        std::mem::take(&mut self.orders)
    }
}

/// Where an order ended up on the courier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Appended to the active batch; `full` tells whether the batch just filled up.
    Batched { full: bool },
    /// The batch was full, the order waits in the overflow queue.
    Overflowed,
    /// The customer already has a pending order on this courier; nothing changed.
    AlreadyHeld { full: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    AlreadyDelivered,
    /// The courier has never seen this customer.
    Unknown,
}

/// Counts of a courier's collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchLoad {
    pub active: usize,
    pub overflow: usize,
    pub in_transit: usize,
    pub delivered: usize,
    pub capacity: usize,
}

impl BatchLoad {
    pub fn is_full(&self) -> bool {
        self.active >= self.capacity
    }
}

#[derive(Debug, Clone)]
pub struct Courier {
    pub id: CourierId,
    pub name: String,
    /// Channel used to reach the courier (chat number, handle, …).
    pub contact: String,
    batch: Batch,
    overflow: VecDeque<Order>,
    in_transit: Vec<Order>,
    delivered: Vec<Order>,
}

/// Payload for registering a courier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierCreate {
    pub id: CourierId,
    pub name: String,
    pub contact: String,
    pub capacity: usize,
}

// DTOs for Courier updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierUpdate {
    pub name: Option<String>,
    pub contact: Option<String>,
}

impl Courier {
    pub fn new(id: CourierId, name: impl Into<String>, contact: impl Into<String>, capacity: usize) -> Self {
        Self {
            id,
            name: name.into(),
            contact: contact.into(),
            batch: Batch::new(capacity),
            overflow: VecDeque::new(),
            in_transit: Vec::new(),
            delivered: Vec::new(),
        }
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// True while the customer has an order in the active batch or overflow queue.
    pub fn holds(&self, customer: &CustomerId) -> bool {
        self.batch.contains(customer) || self.overflow.iter().any(|o| &o.customer == customer)
    }

    /// Puts an order on this courier: into the batch while it is OPEN, else into overflow.
    pub fn assign(&mut self, mut order: Order) -> Placement {
        if self.holds(&order.customer) {
            return Placement::AlreadyHeld {
                full: self.batch.is_full(),
            };
        }
        order.assigned_to = Some(self.id.clone());
        match self.batch.push(order) {
            Ok(full) => Placement::Batched { full },
            Err(order) => {
                self.overflow.push_back(order);
                Placement::Overflowed
            }
        }
    }

    /// The active batch in presentation order, without touching it.
    pub fn peek(&self) -> Vec<Order> {
        let mut orders = self.batch.orders().to_vec();
        sort_by_distance(&mut orders);
        orders
    }

    /// Hands the active batch over to the courier and refills it from overflow.
    ///
    /// The returned orders are in presentation order and now sit in the in-transit list.
    /// The refill takes the oldest overflow entries first, keeping their insertion order.
    pub fn flush(&mut self) -> Vec<Order> {
        let mut sent = self.batch.take();
        sort_by_distance(&mut sent);
        self.in_transit.extend(sent.iter().cloned());

        while !self.batch.is_full() {
            let Some(next) = self.overflow.pop_front() else {
                break;
            };
            // Cannot fail: the batch was just checked to be OPEN.
            let _ = self.batch.push(next);
        }
        sent
    }

    /// Flushes only when the batch, in presentation order, is exactly `expected`.
    ///
    /// `expected` is the stop list of a manifest built from an earlier [`peek`](Self::peek).
    /// Returns `None` and leaves everything in place when the batch changed since then.
    pub fn flush_if(&mut self, expected: &[CustomerId]) -> Option<Vec<Order>> {
        let current = self.peek();
        if current.len() != expected.len() || current.iter().zip(expected).any(|(o, c)| &o.customer != c) {
            return None;
        }
        Some(self.flush())
    }

    /// Orders not yet handed over: active batch first, then overflow in FIFO order.
    pub fn pending(&self) -> Vec<Order> {
        self.batch
            .orders()
            .iter()
            .chain(self.overflow.iter())
            .cloned()
            .collect()
    }

    pub fn in_transit(&self) -> &[Order] {
        &self.in_transit
    }

    pub fn delivered(&self) -> &[Order] {
        &self.delivered
    }

    /// Moves the customer's order into the delivered history.
    ///
    /// An order can be delivered straight from the active batch. The oldest overflow entry
    /// then takes its slot, so a FULL batch stays FULL while overflow lasts and reopens
    /// once it is empty. Either way the batch no longer matches a manifest built before
    /// the delivery, and [`flush_if`](Self::flush_if) refuses to hand it over.
    pub fn deliver(&mut self, customer: &CustomerId) -> DeliveryOutcome {
        let taken = if let Some(pos) = self.in_transit.iter().position(|o| &o.customer == customer) {
            Some(self.in_transit.remove(pos))
        } else if let Some(pos) = self.batch.orders.iter().position(|o| &o.customer == customer) {
            let order = self.batch.orders.remove(pos);
            // Overflow is only non-empty while the batch is FULL.
            if let Some(next) = self.overflow.pop_front() {
                self.batch.orders.push(next);
            }
            Some(order)
        } else if let Some(pos) = self.overflow.iter().position(|o| &o.customer == customer) {
            self.overflow.remove(pos)
        } else {
            None
        };

        match taken {
            Some(mut order) => {
                order.delivered = true;
                self.delivered.push(order);
                DeliveryOutcome::Delivered
            }
            None if self.delivered.iter().any(|o| &o.customer == customer) => {
                DeliveryOutcome::AlreadyDelivered
            }
            None => DeliveryOutcome::Unknown,
        }
    }

    /// Most recent delivered order of the customer.
    pub fn delivered_order_mut(&mut self, customer: &CustomerId) -> Option<&mut Order> {
        self.delivered.iter_mut().rev().find(|o| &o.customer == customer)
    }

    pub fn load(&self) -> BatchLoad {
        BatchLoad {
            active: self.batch.len(),
            overflow: self.overflow.len(),
            in_transit: self.in_transit.len(),
            delivered: self.delivered.len(),
            capacity: self.batch.capacity(),
        }
    }
}
