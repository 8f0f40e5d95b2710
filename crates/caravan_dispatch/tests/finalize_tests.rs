mod test_utils;

use std::sync::Arc;

use jiff::civil::date;

use caravan_core::{DispatchError, model::RunStatus};
use caravan_dispatch::{Finalizer, ResourceAssigner, RunBuilder};
use caravan_providers::{CrowFliesOptimizer, NoopNotifier};
use caravan_store::{DispatchStore, MemoryStore};

use test_utils::{
    EmptyOptimizer, FailingOptimizer, SelectiveOptimizer, confirmed_order, driver, square_zone,
    store, vehicle,
};

fn bound_run(
    store: &Arc<MemoryStore>,
    d: jiff::civil::Date,
    registration: &str,
    order_count: usize,
) -> caravan_core::model::DeliveryRun {
    let zone = square_zone(registration, 0.0, 0.0, 0.1, 2);
    store.insert_zone(zone.clone());

    let mut order_ids = Vec::new();
    for i in 0..order_count {
        let order = confirmed_order(store, d, 0.05, 0.01 + 0.01 * i as f64, 5.0);
        order_ids.push(order.id);
    }

    let run = RunBuilder::new(store.clone())
        .create_run(zone.id, d, &order_ids)
        .unwrap();

    let ada = driver(store, registration);
    let van = vehicle(store, registration, Some(500.0));
    ResourceAssigner::new(store.clone())
        .assign_driver_and_vehicle(run.id, ada.id, van.id)
        .unwrap()
}

#[tokio::test]
async fn finalize_applies_sequence_timings_and_geometry() {
    let store = store();
    let d = date(2026, 3, 2);
    let run = bound_run(&store, d, "VAN-1", 3);

    let finalizer = Finalizer::new(store.clone(), CrowFliesOptimizer::default(), NoopNotifier);
    let outcome = finalizer.finalize_run(run.id, None).await.unwrap();

    assert_eq!(outcome.order_count, 3);
    assert!(outcome.notified);

    let sealed = store.run(run.id).unwrap();
    assert!(!sealed.is_draft);
    assert_eq!(sealed.status, RunStatus::Planned);
    assert!(sealed.total_distance_meters.unwrap() > 0.0);
    assert!(!sealed.route_geometry.as_deref().unwrap_or("").is_empty());

    let mut sequences: Vec<u32> = store
        .run_orders(run.id)
        .iter()
        .map(|order| order.sequence_in_run.unwrap())
        .collect();
    sequences.sort_unstable();
    assert_eq!(sequences, vec![1, 2, 3]);

    let departure = d
        .at(8, 0, 0, 0)
        .to_zoned(jiff::tz::TimeZone::UTC)
        .unwrap()
        .timestamp();
    assert!(store
        .run_orders(run.id)
        .iter()
        .all(|order| order.estimated_arrival.unwrap() > departure));
}

#[tokio::test]
async fn empty_provider_solution_leaves_the_run_draft() {
    let store = store();
    let d = date(2026, 3, 2);
    let run = bound_run(&store, d, "VAN-1", 2);

    let finalizer = Finalizer::new(store.clone(), EmptyOptimizer, NoopNotifier);
    let result = finalizer.finalize_run(run.id, None).await;

    assert!(matches!(result, Err(DispatchError::EmptySolution)));
    let untouched = store.run(run.id).unwrap();
    assert!(untouched.is_draft);
    assert!(untouched.route_geometry.is_none());
}

#[tokio::test]
async fn provider_failure_is_surfaced_and_nothing_is_written() {
    let store = store();
    let d = date(2026, 3, 2);
    let run = bound_run(&store, d, "VAN-1", 2);

    let finalizer = Finalizer::new(store.clone(), FailingOptimizer, NoopNotifier);
    let result = finalizer.finalize_run(run.id, None).await;

    assert!(matches!(result, Err(DispatchError::Provider(_))));
    assert!(store.run(run.id).unwrap().is_draft);
    assert!(store
        .run_orders(run.id)
        .iter()
        .all(|order| order.sequence_in_run.is_none()));
}

#[tokio::test]
async fn unbound_runs_cannot_be_finalized() {
    let store = store();
    let d = date(2026, 3, 2);
    let zone = square_zone("Downtown", 0.0, 0.0, 0.1, 2);
    store.insert_zone(zone.clone());

    let order = confirmed_order(&store, d, 0.05, 0.05, 1.0);
    let run = RunBuilder::new(store.clone())
        .create_run(zone.id, d, &[order.id])
        .unwrap();

    let finalizer = Finalizer::new(store.clone(), CrowFliesOptimizer::default(), NoopNotifier);
    let result = finalizer.finalize_run(run.id, None).await;
    assert!(matches!(result, Err(DispatchError::CannotFinalize { .. })));
}

#[tokio::test]
async fn finalizing_twice_reports_already_finalized() {
    let store = store();
    let d = date(2026, 3, 2);
    let run = bound_run(&store, d, "VAN-1", 1);

    let finalizer = Finalizer::new(store.clone(), CrowFliesOptimizer::default(), NoopNotifier);
    finalizer.finalize_run(run.id, None).await.unwrap();

    let result = finalizer.finalize_run(run.id, None).await;
    assert!(matches!(result, Err(DispatchError::AlreadyFinalized(_))));
}

#[tokio::test]
async fn missing_start_location_blocks_finalization() {
    let store = store();
    let d = date(2026, 3, 2);
    let run = bound_run(&store, d, "VAN-1", 1);

    // Strip the start location after binding.
    let mut van = store.vehicle(run.vehicle_id.unwrap()).unwrap();
    van.start_location = None;
    store.insert_vehicle(van);

    let finalizer = Finalizer::new(store.clone(), CrowFliesOptimizer::default(), NoopNotifier);
    let result = finalizer.finalize_run(run.id, None).await;
    assert!(matches!(result, Err(DispatchError::CannotFinalize { .. })));

    // A fallback start rescues it.
    let outcome = finalizer
        .finalize_run(run.id, Some(caravan_core::GeoPoint::new(0.05, 0.05)))
        .await
        .unwrap();
    assert_eq!(outcome.order_count, 1);
}

#[tokio::test]
async fn missed_delivery_window_never_blocks_finalization() {
    let store = store();
    let d = date(2026, 3, 2);
    let run = bound_run(&store, d, "VAN-1", 1);

    // A window that closed long before the morning departure.
    let mut order = store.run_orders(run.id).pop().unwrap();
    order.delivery_window = Some(caravan_core::model::TimeWindow::new(
        None,
        Some(jiff::Timestamp::UNIX_EPOCH),
    ));
    store.insert_order(order);

    let finalizer = Finalizer::new(store.clone(), CrowFliesOptimizer::default(), NoopNotifier);
    let outcome = finalizer.finalize_run(run.id, None).await.unwrap();

    // Logged as a warning only; the route itself stands.
    assert_eq!(outcome.order_count, 1);
    assert!(!store.run(run.id).unwrap().is_draft);
}

#[tokio::test]
async fn finalize_all_isolates_per_run_failures() {
    let store = store();
    let d = date(2026, 3, 2);
    let healthy = bound_run(&store, d, "VAN-1", 2);
    let doomed = bound_run(&store, d, "VAN-2", 2);

    let optimizer = SelectiveOptimizer {
        fail_for: String::from("VAN-2"),
        inner: CrowFliesOptimizer::default(),
    };
    let finalizer = Finalizer::new(store.clone(), optimizer, NoopNotifier);
    let report = finalizer.finalize_all_runs(d, None).await.unwrap();

    assert_eq!(report.total_runs, 2);
    assert_eq!(report.finalized, 1);
    assert_eq!(report.total_orders, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].run_id, doomed.id);

    assert!(!store.run(healthy.id).unwrap().is_draft);
    assert!(store.run(doomed.id).unwrap().is_draft);
}
