#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use geo_types::polygon;
use jiff::{Timestamp, civil::Date};

use caravan_core::{
    GeoPoint,
    model::{Driver, Order, OrderStatus, Vehicle, Zone},
};
use caravan_providers::{
    OptimizationRequest, OptimizationSolution, OptimizerError, RouteOptimizer,
};
use caravan_store::{DispatchStore, MemoryStore};

static CREATED_AT_SEQ: AtomicI64 = AtomicI64::new(0);

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Axis-aligned square zone with `size` degrees per side, lower-left corner
/// at (lng, lat).
pub fn square_zone(name: &str, lng: f64, lat: f64, size: f64, drivers: u32) -> Zone {
    let polygon = polygon![
        (x: lng, y: lat),
        (x: lng + size, y: lat),
        (x: lng + size, y: lat + size),
        (x: lng, y: lat + size),
        (x: lng, y: lat),
    ];
    Zone::new(name, polygon, drivers)
}

/// Confirmed, geocoded order with a strictly increasing `created_at` so
/// oldest-first selections are deterministic.
pub fn confirmed_order(
    store: &MemoryStore,
    date: Date,
    lat: f64,
    lng: f64,
    weight_kg: f64,
) -> Order {
    let mut order = Order::new(date, weight_kg, 1);
    order.location = Some(GeoPoint::new(lat, lng));
    order.status = OrderStatus::Confirmed;
    order.created_at =
        Timestamp::UNIX_EPOCH + jiff::SignedDuration::from_secs(CREATED_AT_SEQ.fetch_add(1, Ordering::SeqCst));
    store.insert_order(order.clone());
    order
}

pub fn driver(store: &MemoryStore, name: &str) -> Driver {
    let driver = Driver::new(name);
    store.insert_driver(driver.clone());
    driver
}

pub fn vehicle(store: &MemoryStore, registration: &str, weight_capacity_kg: Option<f64>) -> Vehicle {
    let mut vehicle = Vehicle::new(registration);
    vehicle.weight_capacity_kg = weight_capacity_kg;
    vehicle.start_location = Some(GeoPoint::new(0.05, 0.05));
    store.insert_vehicle(vehicle.clone());
    vehicle
}

/// Provider stub that always reports a failure.
pub struct FailingOptimizer;

impl RouteOptimizer for FailingOptimizer {
    async fn optimize(
        &self,
        _request: &OptimizationRequest,
    ) -> Result<OptimizationSolution, OptimizerError> {
        Err(OptimizerError::Other(String::from("solver unreachable")))
    }
}

/// Provider stub that returns a solution with zero routes.
pub struct EmptyOptimizer;

impl RouteOptimizer for EmptyOptimizer {
    async fn optimize(
        &self,
        _request: &OptimizationRequest,
    ) -> Result<OptimizationSolution, OptimizerError> {
        Ok(OptimizationSolution {
            routes: Vec::new(),
            unassigned: Vec::new(),
        })
    }
}

/// Fails for one vehicle registration, delegates everything else to the
/// crow-flies optimizer.
pub struct SelectiveOptimizer {
    pub fail_for: String,
    pub inner: caravan_providers::CrowFliesOptimizer,
}

impl RouteOptimizer for SelectiveOptimizer {
    async fn optimize(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizationSolution, OptimizerError> {
        if request.vehicle.external_id == self.fail_for {
            return Err(OptimizerError::Other(String::from("simulated outage")));
        }
        self.inner.optimize(request).await
    }
}
