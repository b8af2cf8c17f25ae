mod common;

use common::{config, draft_at, draft_with_address, grid, grid_point};
use courier_dispatch::assignment::{AssignOutcome, AssignmentError};
use courier_dispatch::courier_actor::CourierError;
use courier_dispatch::lifecycle::{DispatchStatus, DispatchSystem};
use async_trait::async_trait;
use courier_dispatch::manifest::{Manifest, ManifestSink, RecordingSink, SinkError};
use courier_dispatch::model::{CourierId, CourierUpdate, CustomerId, DeliveryOutcome, LineItem, OrderDraft, OrderValidationError, RouteOutcome};
use courier_dispatch::zone::ZoneLabel;
use courier_dispatch::DispatchError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn start(capacity: usize, extra: &str) -> (DispatchSystem, RecordingSink) {
    let sink = RecordingSink::new();
    let system = DispatchSystem::start(&config(capacity, extra), grid(5), Arc::new(sink.clone()))
        .await
        .expect("Failed to start dispatch system");
    (system, sink)
}

/// Records manifests like [`RecordingSink`], but only after a delay.
struct SlowSink {
    inner: RecordingSink,
    delay: Duration,
}

#[async_trait]
impl ManifestSink for SlowSink {
    async fn dispatch(&self, manifest: &Manifest) -> Result<(), SinkError> {
        tokio::time::sleep(self.delay).await;
        self.inner.dispatch(manifest).await
    }
}

/// Accepts only as many manifests as `remaining` allows.
struct LimitedSink {
    inner: RecordingSink,
    remaining: AtomicUsize,
}

#[async_trait]
impl ManifestSink for LimitedSink {
    async fn dispatch(&self, manifest: &Manifest) -> Result<(), SinkError> {
        let taken = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
        if taken.is_err() {
            return Err(SinkError::Delivery("sink out of capacity".to_string()));
        }
        self.inner.dispatch(manifest).await
    }
}

async fn start_slow(capacity: usize, extra: &str, delay: Duration) -> (DispatchSystem, RecordingSink) {
    let sink = RecordingSink::new();
    let slow = SlowSink {
        inner: sink.clone(),
        delay,
    };
    let system = DispatchSystem::start(&config(capacity, extra), grid(5), Arc::new(slow))
        .await
        .expect("Failed to start dispatch system");
    (system, sink)
}

const ALL_TO_ANA: &str = r#"
    policy = "zone_pinned"
    default_zone = "SE"
    zones = { NW = "ana", NE = "ana", SW = "ana", SE = "ana" }
"#;

/// Stop lists of the manifests sent for one courier, in sending order.
async fn manifest_stops(sink: &RecordingSink, courier: &CourierId) -> Vec<Vec<CustomerId>> {
    sink.sent()
        .await
        .iter()
        .filter(|m| &m.courier == courier)
        .map(|m| m.stops.iter().map(|s| s.customer.clone()).collect())
        .collect()
}

fn ana() -> CourierId {
    "ana".into()
}

fn bruno() -> CourierId {
    "bruno".into()
}

fn customers(ids: &[&str]) -> Vec<CustomerId> {
    ids.iter().map(|&id| CustomerId::from(id)).collect()
}

/// Full placement pipeline: routing, zoning, load balancing, manifest and flush.
#[tokio::test]
async fn test_place_orders_until_batch_dispatches() {
    let (system, sink) = start(2, "").await;
    assert_eq!(system.couriers(), vec![ana(), bruno()]);

    // Two blocks east of the store.
    let first = system.place_order(draft_at("c1", 2, 4)).await.unwrap();
    assert_eq!(first.outcome, AssignOutcome::Batched { courier: ana(), full: false });
    assert_eq!(first.zone, Some(ZoneLabel::SouthEast));
    let route = first.route.expect("routed");
    assert_eq!(route.outcome, RouteOutcome::Found);
    assert!((route.distance_km - 0.24).abs() < 1e-9);
    assert!(route.time_min > 0.0);
    assert!(first.dispatch.is_none());

    let second = system.place_order(draft_at("c2", 4, 2)).await.unwrap();
    assert_eq!(second.outcome, AssignOutcome::Batched { courier: bruno(), full: false });
    assert_eq!(second.zone, Some(ZoneLabel::NorthWest));

    // Ties go to the first courier of the roster.
    let third = system.place_order(draft_at("c3", 3, 2)).await.unwrap();
    assert_eq!(third.outcome, AssignOutcome::Batched { courier: ana(), full: true });
    assert_eq!(
        third.dispatch,
        Some(DispatchStatus::Sent {
            courier: ana(),
            batches: vec![customers(&["c3", "c1"])],
        })
    );

    let sent = sink.sent().await;
    assert_eq!(sent.len(), 1);
    let manifest = &sent[0];
    assert_eq!(manifest.courier, ana());
    assert_eq!(manifest.stops.len(), 2);
    assert_eq!(manifest.stops[0].customer, CustomerId::from("c3"));
    assert_eq!(manifest.legs.len(), 2);
    // store → c3 is one block, c3 → c1 three more.
    assert!((manifest.total_distance_km - 0.48).abs() < 1e-9);
    assert!(manifest.caption.starts_with("Batch for Ana: 2 stops, 0.48 km"));

    let load = system.courier_load(&ana()).await.unwrap();
    assert_eq!((load.active, load.overflow, load.in_transit), (0, 0, 2));
    assert_eq!(system.pending_for(&bruno()).await.unwrap().len(), 1);

    system.shutdown().await.expect("Shutdown failed");
}

#[tokio::test]
async fn test_delivery_and_rating() {
    let (system, _sink) = start(2, "").await;
    system.place_order(draft_at("c1", 2, 4)).await.unwrap();
    system.place_order(draft_at("c2", 4, 2)).await.unwrap();
    system.place_order(draft_at("c3", 3, 2)).await.unwrap();

    let c1 = CustomerId::from("c1");
    assert_eq!(system.mark_delivered(&ana(), &c1).await.unwrap(), DeliveryOutcome::Delivered);
    assert_eq!(
        system.mark_delivered(&ana(), &c1).await.unwrap(),
        DeliveryOutcome::AlreadyDelivered
    );

    let delivered = system.delivered_for(&ana()).await.unwrap();
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].delivered);
    assert_eq!(delivered[0].assigned_to, Some(ana()));
    assert_eq!(system.in_transit_for(&ana()).await.unwrap().len(), 1);

    system.rate_order(&ana(), &c1, 5).await.unwrap();
    assert_eq!(system.delivered_for(&ana()).await.unwrap()[0].rating, Some(5));

    let err = system.rate_order(&ana(), &c1, 6).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Assignment(AssignmentError::Courier(CourierError::RatingOutOfRange(6)))
    ));
    let err = system.rate_order(&ana(), &"c3".into(), 4).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Assignment(AssignmentError::Courier(CourierError::NotDelivered(_)))
    ));

    // c2 is still in bruno's open batch and can be delivered from there.
    assert_eq!(
        system.mark_delivered(&bruno(), &"c2".into()).await.unwrap(),
        DeliveryOutcome::Delivered
    );
    assert!(system.pending_for(&bruno()).await.unwrap().is_empty());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_dispatch_keeps_batch_full_until_retry() {
    let (system, sink) = start(1, "").await;
    sink.set_failing(true);

    let report = system.place_order(draft_at("c1", 0, 2)).await.unwrap();
    assert_eq!(report.outcome, AssignOutcome::Batched { courier: ana(), full: true });
    assert_eq!(
        report.dispatch,
        Some(DispatchStatus::Failed {
            courier: ana(),
            sent: vec![],
            error: SinkError::Delivery("recording sink set to fail".to_string()),
        })
    );
    assert!(system.courier_load(&ana()).await.unwrap().is_full());
    assert_eq!(system.peek_batch(&ana()).await.unwrap().len(), 1);
    assert!(system.in_transit_for(&ana()).await.unwrap().is_empty());

    sink.set_failing(false);
    let retry = system.dispatch_batch(&ana()).await.unwrap();
    assert_eq!(
        retry,
        DispatchStatus::Sent {
            courier: ana(),
            batches: vec![customers(&["c1"])],
        }
    );
    assert_eq!(sink.sent().await.len(), 1);
    assert_eq!(system.in_transit_for(&ana()).await.unwrap().len(), 1);

    assert_eq!(
        system.dispatch_batch(&ana()).await.unwrap(),
        DispatchStatus::Idle { courier: ana() }
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_address_only_order_is_assigned_without_route() {
    let (system, sink) = start(1, "").await;

    let report = system
        .place_order(draft_with_address("c9", "  Uruguay 1020, Salto "))
        .await
        .unwrap();
    assert!(report.route.is_none());
    assert!(report.zone.is_none());
    assert!(matches!(report.dispatch, Some(DispatchStatus::Sent { .. })));

    let manifest = &sink.sent().await[0];
    assert!(manifest.legs.is_empty());
    assert_eq!(manifest.stops[0].destination, "Uruguay 1020, Salto");
    assert_eq!(manifest.stops[0].distance_km, None);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_repeat_customer_is_not_requeued() {
    let (system, _sink) = start(3, "").await;

    system.place_order(draft_at("c1", 1, 1)).await.unwrap();
    let again = system.place_order(draft_at("c1", 1, 1)).await.unwrap();
    assert_eq!(again.outcome, AssignOutcome::AlreadyAssigned { courier: ana(), full: false });

    assert_eq!(system.pending_for(&ana()).await.unwrap().len(), 1);
    assert!(system.pending_for(&bruno()).await.unwrap().is_empty());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_drafts_are_rejected() {
    let (system, _sink) = start(2, "").await;

    let blank = OrderDraft::new("   ", vec![LineItem::new("p", "Pizza", 500, 1)]).with_address("Artigas 5");
    assert!(matches!(
        system.place_order(blank).await,
        Err(DispatchError::Validation(OrderValidationError::EmptyCustomer))
    ));

    let wrong_total = draft_at("c1", 1, 1).with_total(1);
    assert!(matches!(
        system.place_order(wrong_total).await,
        Err(DispatchError::Validation(OrderValidationError::TotalMismatch {
            declared: 1,
            computed: 420
        }))
    ));

    let nowhere = OrderDraft::new("c2", vec![LineItem::new("p", "Pizza", 500, 1)]);
    assert!(matches!(
        system.place_order(nowhere).await,
        Err(DispatchError::Validation(OrderValidationError::MissingLocation))
    ));

    assert!(system.pending_for(&ana()).await.unwrap().is_empty());
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_zone_pinned_policy() {
    let extra = r#"
        policy = "zone_pinned"
        default_zone = "SE"
        zones = { NW = "ana", NE = "ana", SW = "bruno", SE = "bruno" }
    "#;
    let (system, _sink) = start(5, extra).await;

    let north_east = system.place_order(draft_at("c1", 4, 4)).await.unwrap();
    assert_eq!(north_east.zone, Some(ZoneLabel::NorthEast));
    assert_eq!(north_east.outcome.courier(), Some(&ana()));

    let south_west = system.place_order(draft_at("c2", 0, 0)).await.unwrap();
    assert_eq!(south_west.zone, Some(ZoneLabel::SouthWest));
    assert_eq!(south_west.outcome.courier(), Some(&bruno()));

    // No zone: falls back to the default zone's courier, however loaded it is.
    let unzoned = system.place_order(draft_with_address("c3", "Larrañaga 77")).await.unwrap();
    assert_eq!(unzoned.outcome.courier(), Some(&bruno()));
    assert_eq!(system.pending_for(&bruno()).await.unwrap().len(), 2);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_route_and_zone_queries() {
    let (system, _sink) = start(2, "").await;

    let plan = system
        .compute_route(grid_point(0, 0), grid_point(0, 3))
        .await
        .unwrap();
    assert_eq!(plan.outcome, RouteOutcome::Found);
    assert_eq!(plan.path.len(), 4);
    assert!((plan.distance_km - 0.36).abs() < 1e-9);

    let stay = system.compute_route(grid_point(1, 1), grid_point(1, 1)).await.unwrap();
    assert_eq!(stay.outcome, RouteOutcome::Trivial);
    assert_eq!(stay.distance_km, 0.0);

    // The store itself is on both axes and falls to the south-west.
    assert_eq!(system.classify_zone(grid_point(2, 2)), ZoneLabel::SouthWest);
    assert_eq!(system.classify_zone(grid_point(3, 3)), ZoneLabel::NorthEast);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_courier_lookup() {
    let (system, _sink) = start(2, "").await;

    let err = system.pending_for(&"zoe".into()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Assignment(AssignmentError::UnknownCourier(id)) if id == CourierId::from("zoe")));
    let err = system.dispatch_batch(&"zoe".into()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Assignment(AssignmentError::UnknownCourier(_))));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_dispatches_send_each_batch_once() {
    let (system, sink) = start_slow(1, "", Duration::from_millis(50)).await;
    sink.set_failing(true);

    let c1 = system.place_order(draft_at("c1", 2, 4)).await.unwrap();
    assert_eq!(c1.outcome, AssignOutcome::Batched { courier: ana(), full: true });
    let c2 = system.place_order(draft_at("c2", 4, 2)).await.unwrap();
    assert_eq!(c2.outcome.courier(), Some(&bruno()));
    let c3 = system.place_order(draft_at("c3", 3, 2)).await.unwrap();
    assert_eq!(c3.outcome, AssignOutcome::Overflowed { courier: ana() });

    sink.set_failing(false);
    let (ana_a, ana_b) = (ana(), ana());
    let (first, second) = tokio::join!(system.dispatch_batch(&ana_a), system.dispatch_batch(&ana_b));
    let mut statuses = vec![first.unwrap(), second.unwrap()];
    statuses.sort_by_key(|status| matches!(status, DispatchStatus::Idle { .. }));
    assert_eq!(
        statuses,
        vec![
            DispatchStatus::Sent {
                courier: ana(),
                batches: vec![customers(&["c1"]), customers(&["c3"])],
            },
            DispatchStatus::Idle { courier: ana() },
        ]
    );

    let sent = manifest_stops(&sink, &ana()).await;
    assert_eq!(sent, vec![customers(&["c1"]), customers(&["c3"])]);
    let in_transit = system.in_transit_for(&ana()).await.unwrap();
    assert_eq!(in_transit.len(), 2);
    for order in &in_transit {
        assert!(sent.iter().flatten().any(|c| c == &order.customer));
    }

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_refilled_full_batch_is_dispatched_too() {
    let (system, sink) = start(1, ALL_TO_ANA).await;
    sink.set_failing(true);

    let first = system.place_order(draft_with_address("c1", "Artigas 10")).await.unwrap();
    assert!(matches!(first.dispatch, Some(DispatchStatus::Failed { .. })));
    for customer in ["c2", "c3"] {
        let report = system.place_order(draft_with_address(customer, "Artigas 10")).await.unwrap();
        assert_eq!(report.outcome, AssignOutcome::Overflowed { courier: ana() });
        assert!(report.dispatch.is_none());
    }

    sink.set_failing(false);
    let retry = system.dispatch_batch(&ana()).await.unwrap();
    let every_batch = vec![customers(&["c1"]), customers(&["c2"]), customers(&["c3"])];
    assert_eq!(
        retry,
        DispatchStatus::Sent {
            courier: ana(),
            batches: every_batch.clone(),
        }
    );
    assert_eq!(manifest_stops(&sink, &ana()).await, every_batch);

    let load = system.courier_load(&ana()).await.unwrap();
    assert_eq!((load.active, load.overflow, load.in_transit), (0, 0, 3));

    // The batch is OPEN again, so the next order fills it and goes out on its own.
    let next = system.place_order(draft_with_address("c4", "Artigas 10")).await.unwrap();
    assert_eq!(
        next.dispatch,
        Some(DispatchStatus::Sent {
            courier: ana(),
            batches: vec![customers(&["c4"])],
        })
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failure_after_a_refill_reports_what_was_sent() {
    let sink = RecordingSink::new();
    let limited = LimitedSink {
        inner: sink.clone(),
        remaining: AtomicUsize::new(0),
    };
    let limited = Arc::new(limited);
    let system = DispatchSystem::start(&config(1, ALL_TO_ANA), grid(5), limited.clone())
        .await
        .unwrap();

    for customer in ["c1", "c2", "c3"] {
        system.place_order(draft_with_address(customer, "Artigas 10")).await.unwrap();
    }

    // Room for two manifests: c1 and the refilled c2 go out, c3 is refused.
    limited.remaining.store(2, Ordering::SeqCst);
    assert_eq!(
        system.dispatch_batch(&ana()).await.unwrap(),
        DispatchStatus::Failed {
            courier: ana(),
            sent: vec![customers(&["c1"]), customers(&["c2"])],
            error: SinkError::Delivery("sink out of capacity".to_string()),
        }
    );
    assert_eq!(manifest_stops(&sink, &ana()).await.len(), 2);
    let load = system.courier_load(&ana()).await.unwrap();
    assert!(load.is_full());
    assert_eq!((load.active, load.in_transit), (1, 2));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_delivery_during_dispatch_resends_changed_batch() {
    let (system, sink) = start_slow(1, ALL_TO_ANA, Duration::from_millis(200)).await;
    sink.set_failing(true);
    system.place_order(draft_with_address("c1", "Artigas 10")).await.unwrap();
    system.place_order(draft_with_address("c2", "Artigas 10")).await.unwrap();
    sink.set_failing(false);

    let deliver_meanwhile = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        system.mark_delivered(&ana(), &"c1".into()).await
    };
    let ana_id = ana();
    let (status, delivered) = tokio::join!(system.dispatch_batch(&ana_id), deliver_meanwhile);
    assert_eq!(delivered.unwrap(), DeliveryOutcome::Delivered);

    // c1's manifest went out, but the batch then held c2, so it was sent again.
    assert_eq!(
        status.unwrap(),
        DispatchStatus::Sent {
            courier: ana(),
            batches: vec![customers(&["c2"])],
        }
    );
    assert_eq!(manifest_stops(&sink, &ana()).await, vec![customers(&["c1"]), customers(&["c2"])]);
    let in_transit = system.in_transit_for(&ana()).await.unwrap();
    assert_eq!(in_transit.len(), 1);
    assert_eq!(in_transit[0].customer, CustomerId::from("c2"));
    assert_eq!(system.delivered_for(&ana()).await.unwrap()[0].customer, CustomerId::from("c1"));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_updated_contact_appears_on_later_manifests() {
    let (system, sink) = start(1, ALL_TO_ANA).await;

    let update = CourierUpdate {
        contact: Some("+598 99 123 456".to_string()),
        ..Default::default()
    };
    let updated = system.update_courier(&ana(), update).await.unwrap();
    assert_eq!(updated.name, "Ana");
    assert_eq!(updated.contact, "+598 99 123 456");

    system.place_order(draft_with_address("c1", "Artigas 10")).await.unwrap();
    let manifest = &sink.sent().await[0];
    assert_eq!(manifest.courier_name, "Ana");
    assert_eq!(manifest.contact, "+598 99 123 456");

    let err = system
        .update_courier(&"zoe".into(), CourierUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Assignment(AssignmentError::UnknownCourier(_))));

    system.shutdown().await.unwrap();
}
