mod test_utils;

use jiff::civil::date;

use caravan_core::{DispatchError, model::DriverStatus};
use caravan_dispatch::{ResourceAssigner, RunAssignment, RunBuilder};
use caravan_store::DispatchStore;

use test_utils::{confirmed_order, driver, square_zone, store, vehicle};

#[test]
fn successful_binding_makes_the_run_finalizable() {
    let store = store();
    let d = date(2026, 3, 2);
    let zone = square_zone("Downtown", 0.0, 0.0, 0.1, 2);
    store.insert_zone(zone.clone());

    let order = confirmed_order(&store, d, 0.05, 0.05, 10.0);
    let run = RunBuilder::new(store.clone())
        .create_run(zone.id, d, &[order.id])
        .unwrap();
    assert!(!run.can_finalize);

    let ada = driver(&store, "Ada");
    let van = vehicle(&store, "VAN-1", Some(500.0));

    let bound = ResourceAssigner::new(store.clone())
        .assign_driver_and_vehicle(run.id, ada.id, van.id)
        .unwrap();

    assert_eq!(bound.driver_id, Some(ada.id));
    assert_eq!(bound.vehicle_id, Some(van.id));
    assert!(bound.can_finalize);
    assert!(bound.is_draft, "binding does not finalize the run");
}

#[test]
fn double_booking_a_resource_on_the_same_date_conflicts() {
    let store = store();
    let d = date(2026, 3, 2);
    let zone = square_zone("Downtown", 0.0, 0.0, 0.1, 2);
    store.insert_zone(zone.clone());

    let a = confirmed_order(&store, d, 0.05, 0.05, 1.0);
    let b = confirmed_order(&store, d, 0.05, 0.06, 1.0);

    let builder = RunBuilder::new(store.clone());
    let first = builder.create_run(zone.id, d, &[a.id]).unwrap();
    let second = builder.create_run(zone.id, d, &[b.id]).unwrap();

    let ada = driver(&store, "Ada");
    let grace = driver(&store, "Grace");
    let van = vehicle(&store, "VAN-1", None);
    let truck = vehicle(&store, "TRK-1", None);

    let assigner = ResourceAssigner::new(store.clone());
    assigner
        .assign_driver_and_vehicle(first.id, ada.id, van.id)
        .unwrap();

    // Same driver, different run, same date.
    let result = assigner.assign_driver_and_vehicle(second.id, ada.id, truck.id);
    assert!(matches!(result, Err(DispatchError::ResourceConflict(_))));

    // Same vehicle as well.
    let result = assigner.assign_driver_and_vehicle(second.id, grace.id, van.id);
    assert!(matches!(result, Err(DispatchError::ResourceConflict(_))));

    // A failed binding leaves the second run untouched.
    let untouched = store.run(second.id).unwrap();
    assert!(untouched.driver_id.is_none());
    assert!(!untouched.can_finalize);
}

#[test]
fn rebinding_the_same_run_is_not_a_conflict() {
    let store = store();
    let d = date(2026, 3, 2);
    let zone = square_zone("Downtown", 0.0, 0.0, 0.1, 2);
    store.insert_zone(zone.clone());

    let order = confirmed_order(&store, d, 0.05, 0.05, 1.0);
    let run = RunBuilder::new(store.clone())
        .create_run(zone.id, d, &[order.id])
        .unwrap();

    let ada = driver(&store, "Ada");
    let grace = driver(&store, "Grace");
    let van = vehicle(&store, "VAN-1", None);

    let assigner = ResourceAssigner::new(store.clone());
    assigner
        .assign_driver_and_vehicle(run.id, ada.id, van.id)
        .unwrap();

    // Swapping the driver on the same run keeps the vehicle binding valid.
    let rebound = assigner
        .assign_driver_and_vehicle(run.id, grace.id, van.id)
        .unwrap();
    assert_eq!(rebound.driver_id, Some(grace.id));
}

#[test]
fn unavailable_driver_and_inactive_vehicle_are_rejected() {
    let store = store();
    let d = date(2026, 3, 2);
    let zone = square_zone("Downtown", 0.0, 0.0, 0.1, 2);
    store.insert_zone(zone.clone());

    let order = confirmed_order(&store, d, 0.05, 0.05, 1.0);
    let run = RunBuilder::new(store.clone())
        .create_run(zone.id, d, &[order.id])
        .unwrap();

    let mut off_duty = driver(&store, "Ada");
    off_duty.status = DriverStatus::OffDuty;
    store.insert_driver(off_duty.clone());

    let mut mothballed = vehicle(&store, "VAN-1", None);
    mothballed.active = false;
    store.insert_vehicle(mothballed.clone());

    let working = driver(&store, "Grace");
    let van = vehicle(&store, "VAN-2", None);

    let assigner = ResourceAssigner::new(store.clone());
    assert!(matches!(
        assigner.assign_driver_and_vehicle(run.id, off_duty.id, van.id),
        Err(DispatchError::DriverUnavailable(_))
    ));
    assert!(matches!(
        assigner.assign_driver_and_vehicle(run.id, working.id, mothballed.id),
        Err(DispatchError::VehicleInactive(_))
    ));
}

#[test]
fn binding_fails_when_the_vehicle_cannot_carry_the_run() {
    let store = store();
    let d = date(2026, 3, 2);
    let zone = square_zone("Downtown", 0.0, 0.0, 0.1, 2);
    store.insert_zone(zone.clone());

    let heavy = confirmed_order(&store, d, 0.05, 0.05, 900.0);
    let run = RunBuilder::new(store.clone())
        .create_run(zone.id, d, &[heavy.id])
        .unwrap();

    let ada = driver(&store, "Ada");
    let small = vehicle(&store, "VAN-1", Some(100.0));

    let result = ResourceAssigner::new(store.clone())
        .assign_driver_and_vehicle(run.id, ada.id, small.id);
    assert!(matches!(result, Err(DispatchError::CapacityExceeded(_))));
    assert!(store.run(run.id).unwrap().vehicle_id.is_none());
}

#[test]
fn bulk_assignment_reports_partial_success() {
    let store = store();
    let d = date(2026, 3, 2);
    let zone = square_zone("Downtown", 0.0, 0.0, 0.1, 2);
    store.insert_zone(zone.clone());

    let a = confirmed_order(&store, d, 0.05, 0.05, 1.0);
    let b = confirmed_order(&store, d, 0.05, 0.06, 1.0);

    let builder = RunBuilder::new(store.clone());
    let first = builder.create_run(zone.id, d, &[a.id]).unwrap();
    let second = builder.create_run(zone.id, d, &[b.id]).unwrap();

    let ada = driver(&store, "Ada");
    let van = vehicle(&store, "VAN-1", None);
    let truck = vehicle(&store, "TRK-1", None);

    // Second entry reuses the already-bound driver and must fail alone.
    let report = ResourceAssigner::new(store.clone()).bulk_assign_drivers(&[
        RunAssignment {
            run_id: first.id,
            driver_id: ada.id,
            vehicle_id: van.id,
        },
        RunAssignment {
            run_id: second.id,
            driver_id: ada.id,
            vehicle_id: truck.id,
        },
    ]);

    assert_eq!(report.assigned, 1);
    assert_eq!(report.failed, 1);
    assert!(report.outcomes[0].success);
    assert!(!report.outcomes[1].success);
    assert!(report.outcomes[1].error.is_some());

    assert!(store.run(first.id).unwrap().can_finalize);
    assert!(!store.run(second.id).unwrap().can_finalize);
}
