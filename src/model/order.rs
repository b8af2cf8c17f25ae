//! Orders as they enter the dispatch core.
//!
//! Collaborators hand over an [`OrderDraft`] (deserialized from JSON or built in code);
//! [`OrderDraft::validate`] turns it into an [`Order`], the only shape the core accepts.

use crate::model::{Coordinate, CourierId, RoutePlan};
use crate::zone::ZoneLabel;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use thiserror::Error;

/// Identifies the customer an order belongs to (the chat contact, e.g. a phone number).
///
/// A customer has at most one pending order at a time, so this doubles as the order key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl From<&str> for CustomerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CustomerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One product line of an order. Prices are in minor currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: u64,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Free-text preparation note ("no onions"); empty for a plain unit.
    #[serde(default)]
    pub note: String,
}

fn one() -> u32 {
    1
}

impl LineItem {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, unit_price: u64, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
            note: String::new(),
        }
    }

    pub fn line_total(&self) -> Option<u64> {
        self.unit_price.checked_mul(u64::from(self.quantity))
    }
}

/// Errors raised while validating an [`OrderDraft`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrderValidationError {
    #[error("Customer identifier is empty")]
    EmptyCustomer,

    #[error("Order has no line items")]
    NoItems,

    #[error("Line item {product_id} has zero quantity")]
    ZeroQuantity { product_id: String },

    #[error("Order total overflows")]
    TotalOverflow,

    #[error("Declared total {declared} does not match computed total {computed}")]
    TotalMismatch { declared: u64, computed: u64 },

    #[error("Order has neither a delivery coordinate nor an address")]
    MissingLocation,
}

/// Unvalidated order payload from the conversational layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Total announced by the collaborator, if any. Must equal the sum of line totals.
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub location: Option<Coordinate>,
    #[serde(default)]
    pub address: Option<String>,
}

impl OrderDraft {
    pub fn new(customer: impl Into<String>, items: Vec<LineItem>) -> Self {
        Self {
            customer: customer.into(),
            items,
            total: None,
            location: None,
            address: None,
        }
    }

    pub fn at(mut self, location: Coordinate) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Checks the draft and builds the [`Order`] the core works with.
    pub fn validate(self) -> Result<Order, OrderValidationError> {
        let customer = self.customer.trim();
        if customer.is_empty() {
            return Err(OrderValidationError::EmptyCustomer);
        }
        if self.items.is_empty() {
            return Err(OrderValidationError::NoItems);
        }

        let mut computed: u64 = 0;
        for item in &self.items {
            if item.quantity == 0 {
                return Err(OrderValidationError::ZeroQuantity {
                    product_id: item.product_id.clone(),
                });
            }
            computed = item
                .line_total()
                .and_then(|line| computed.checked_add(line))
                .ok_or(OrderValidationError::TotalOverflow)?;
        }
        if let Some(declared) = self.total {
            if declared != computed {
                return Err(OrderValidationError::TotalMismatch { declared, computed });
            }
        }

        let address = self
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        if self.location.is_none() && address.is_none() {
            return Err(OrderValidationError::MissingLocation);
        }

        Ok(Order {
            customer: CustomerId(customer.to_string()),
            items: self.items,
            total: computed,
            location: self.location,
            address,
            route: None,
            zone: None,
            assigned_to: None,
            delivered: false,
            rating: None,
        })
    }
}

/// A validated order.
///
/// Routing and zoning fill `route` and `zone`; assignment stamps `assigned_to`. After
/// that the order only moves between a courier's collections and is never dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub customer: CustomerId,
    pub items: Vec<LineItem>,
    pub total: u64,
    pub location: Option<Coordinate>,
    pub address: Option<String>,
    pub route: Option<RoutePlan>,
    pub zone: Option<ZoneLabel>,
    pub assigned_to: Option<CourierId>,
    pub delivered: bool,
    pub rating: Option<u8>,
}

impl Order {
    /// Distance from the store, if a usable route was computed.
    pub fn distance_km(&self) -> Option<f64> {
        self.route
            .as_ref()
            .filter(|plan| plan.is_usable())
            .map(|plan| plan.distance_km)
    }

    pub fn eta_min(&self) -> Option<f64> {
        self.route
            .as_ref()
            .filter(|plan| plan.is_usable())
            .map(|plan| plan.time_min)
    }

    /// Where the courier should go, as text.
    pub fn destination_label(&self) -> String {
        match (&self.address, &self.location) {
            (Some(address), _) => address.clone(),
            (None, Some(location)) => location.to_string(),
            (None, None) => "unknown".to_string(),
        }
    }
}

/// Sorts orders by distance from the store, nearest first; orders without a route go
/// last. The sort is stable, so equal distances keep their batch order.
///
/// Unreachable and timed-out plans carry a distance of 0 but count as having no route,
/// so they sort last rather than ahead of a customer at the store's own node.
pub fn sort_by_distance(orders: &mut [Order]) {
    orders.sort_by(|a, b| match (a.distance_km(), b.distance_km()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
