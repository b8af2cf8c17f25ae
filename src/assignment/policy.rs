//! Courier selection strategies.
//!
//! Two policies have been used for the same operation over the life of the service, so
//! both are available behind [`CourierPicker`] and configuration chooses one.

use crate::model::{BatchLoad, CourierId, Order};
use crate::zone::ZoneLabel;
use std::collections::HashMap;
use std::fmt::Debug;

/// A courier as seen by a picker: roster position is the slice index.
#[derive(Debug, Clone, PartialEq)]
pub struct CourierLoad {
    pub id: CourierId,
    pub load: BatchLoad,
}

pub trait CourierPicker: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Chooses the courier for `order`. `couriers` is in roster order.
    ///
    /// Returns `None` when no courier can be chosen at all. The returned id is not
    /// guaranteed to be in `couriers`; the caller checks.
    fn pick_courier(&self, order: &Order, couriers: &[CourierLoad]) -> Option<CourierId>;
}

/// Fewest orders in an OPEN batch wins, ties by roster order. When every batch is FULL,
/// the shortest overflow queue wins, again ties by roster order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadBalance;

impl CourierPicker for LoadBalance {
    fn name(&self) -> &'static str {
        "load_balance"
    }

    fn pick_courier(&self, _order: &Order, couriers: &[CourierLoad]) -> Option<CourierId> {
        // min_by_key keeps the first of equal elements, which is the roster order tie-break.
        couriers
            .iter()
            .filter(|c| !c.load.is_full())
            .min_by_key(|c| c.load.active)
            .or_else(|| couriers.iter().min_by_key(|c| c.load.overflow))
            .map(|c| c.id.clone())
    }
}

/// Each zone is served by one courier. Orders without a zone, or in a zone nobody
/// serves, go to the courier of the default zone.
#[derive(Debug, Clone)]
pub struct ZonePinned {
    zones: HashMap<ZoneLabel, CourierId>,
    default_zone: ZoneLabel,
}

impl ZonePinned {
    pub fn new(zones: HashMap<ZoneLabel, CourierId>, default_zone: ZoneLabel) -> Self {
        Self { zones, default_zone }
    }
}

impl CourierPicker for ZonePinned {
    fn name(&self) -> &'static str {
        "zone_pinned"
    }

    fn pick_courier(&self, order: &Order, _couriers: &[CourierLoad]) -> Option<CourierId> {
        order
            .zone
            .and_then(|zone| self.zones.get(&zone))
            .or_else(|| self.zones.get(&self.default_zone))
            .cloned()
    }
}
