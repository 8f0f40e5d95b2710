use std::sync::Arc;

use geo_types::polygon;
use jiff::Zoned;
use tracing::{Level, info};

use caravan_core::{
    GeoPoint,
    model::{Driver, Order, OrderStatus, Vehicle, Zone},
};
use caravan_dispatch::{
    Finalizer, ResourceAssigner, RunAssignment, RunBuilder, ZoneAssigner, ZoneBalancer,
};
use caravan_providers::{CrowFliesOptimizer, NoopNotifier, VroomClient};
use caravan_store::{DispatchStore, MemoryStore};

/// End-to-end dispatch demo against an in-memory store: zone assignment,
/// draft runs, balancing, resource binding, finalization.
#[tokio::main]
async fn main() {
    dotenvy::from_filename("./.env.local").ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let store = Arc::new(MemoryStore::new());
    let today = Zoned::now().date();
    seed(&store, today);

    let report = ZoneAssigner::new(store.clone())
        .assign_orders_to_zones(today, None)
        .unwrap();
    info!(
        assigned = report.assigned,
        out_of_bounds = report.out_of_bounds.len(),
        "orders assigned to zones"
    );

    let balance = ZoneBalancer::new(store.clone());
    for zone in &balance.check_zone_balance(today).unwrap().zones {
        info!(
            zone = %zone.zone_name,
            orders = zone.order_count,
            per_driver = format!("{:.1}", zone.orders_per_driver),
            status = ?zone.status,
            "zone load"
        );
    }
    let rebalance = balance.rebalance_all_zones(today).unwrap();
    if !rebalance.is_noop() {
        info!(moves = rebalance.moves.len(), "rebalanced overloaded zones");
    }

    let runs = RunBuilder::new(store.clone())
        .create_draft_runs_for_date(today)
        .unwrap();
    for run in &runs.runs {
        info!(run = %run.run_number, orders = run.order_count, "draft run created");
    }

    // Pair runs with the fleet in order; a real deployment would drive this
    // from a planning UI.
    let drivers: Vec<Driver> = ["Elena", "Marcus", "Sofia"]
        .iter()
        .map(|name| {
            let driver = Driver::new(*name);
            store.insert_driver(driver.clone());
            driver
        })
        .collect();
    let vehicles: Vec<Vehicle> = ["1-ABC-123", "1-DEF-456", "1-GHI-789"]
        .iter()
        .map(|registration| {
            let mut vehicle = Vehicle::new(*registration);
            vehicle.weight_capacity_kg = Some(800.0);
            vehicle.volume_capacity_m3 = Some(8.0);
            // Depot in Anderlecht.
            vehicle.start_location = Some(GeoPoint::new(50.8335, 4.3145));
            store.insert_vehicle(vehicle.clone());
            vehicle
        })
        .collect();

    let assignments: Vec<RunAssignment> = runs
        .runs
        .iter()
        .zip(drivers.iter().zip(vehicles.iter()))
        .map(|(run, (driver, vehicle))| RunAssignment {
            run_id: run.run_id,
            driver_id: driver.id,
            vehicle_id: vehicle.id,
        })
        .collect();
    let bound = ResourceAssigner::new(store.clone()).bulk_assign_drivers(&assignments);
    info!(assigned = bound.assigned, failed = bound.failed, "resources bound");

    let report = match VroomClient::from_env() {
        Ok(vroom) => {
            info!("using external optimization provider");
            Finalizer::new(store.clone(), vroom, NoopNotifier)
                .finalize_all_runs(today, None)
                .await
                .unwrap()
        }
        Err(_) => {
            info!("no provider configured, using crow-flies estimates");
            Finalizer::new(store.clone(), CrowFliesOptimizer::default(), NoopNotifier)
                .finalize_all_runs(today, None)
                .await
                .unwrap()
        }
    };
    info!(
        finalized = report.finalized,
        orders = report.total_orders,
        failures = report.failures.len(),
        "finalization complete"
    );

    for run in store.runs_for_date(today) {
        info!(
            run = %run.run_number,
            draft = run.is_draft,
            distance_km = format!("{:.1}", run.total_distance_meters.unwrap_or(0.0) / 1000.0),
            "final state"
        );
    }
}

/// Two Brussels delivery zones and a day of confirmed orders.
fn seed(store: &MemoryStore, today: jiff::civil::Date) {
    let center = Zone::new(
        "Brussels Center",
        polygon![
            (x: 4.33, y: 50.83),
            (x: 4.39, y: 50.83),
            (x: 4.39, y: 50.88),
            (x: 4.33, y: 50.88),
            (x: 4.33, y: 50.83),
        ],
        2,
    );
    let south = Zone::new(
        "Brussels South",
        polygon![
            (x: 4.30, y: 50.78),
            (x: 4.38, y: 50.78),
            (x: 4.38, y: 50.83),
            (x: 4.30, y: 50.83),
            (x: 4.30, y: 50.78),
        ],
        1,
    );
    store.insert_zone(center);
    store.insert_zone(south);

    let stops = [
        (50.8466, 4.3528, 12.0),
        (50.8503, 4.3517, 4.5),
        (50.8550, 4.3753, 8.0),
        (50.8427, 4.3677, 20.0),
        (50.8366, 4.3447, 2.5),
        (50.8110, 4.3310, 15.0),
        (50.8055, 4.3402, 6.0),
        (50.7989, 4.3156, 9.5),
        (50.8201, 4.3489, 3.0),
        (50.8144, 4.3250, 11.0),
    ];
    for (lat, lng, weight_kg) in stops {
        let mut order = Order::new(today, weight_kg, 1);
        order.location = Some(GeoPoint::new(lat, lng));
        order.status = OrderStatus::Confirmed;
        store.insert_order(order);
    }
}
