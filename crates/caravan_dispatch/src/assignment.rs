use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use caravan_core::{
    DispatchError, DispatchResult,
    id::{DriverId, RunId, VehicleId},
    model::DeliveryRun,
};
use caravan_store::DispatchStore;

use crate::{capacity::check_vehicle_capacity, run_builder::ensure_draft};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunAssignment {
    pub run_id: RunId,
    pub driver_id: DriverId,
    pub vehicle_id: VehicleId,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOutcome {
    pub run_id: RunId,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkAssignReport {
    pub assigned: usize,
    pub failed: usize,
    pub outcomes: Vec<AssignmentOutcome>,
}

/// Binds drivers and vehicles to draft runs, one active binding per
/// resource per date.
pub struct ResourceAssigner<S> {
    store: Arc<S>,
}

impl<S: DispatchStore> ResourceAssigner<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// On success the run carries both resources and becomes finalizable.
    /// The per-date uniqueness check runs inside the store's binding
    /// transaction; rebinding the same run to the same resources succeeds.
    pub fn assign_driver_and_vehicle(
        &self,
        run_id: RunId,
        driver_id: DriverId,
        vehicle_id: VehicleId,
    ) -> DispatchResult<DeliveryRun> {
        let run = self.store.run(run_id)?;
        ensure_draft(&run)?;

        let driver = self.store.driver(driver_id)?;
        if !driver.is_available() {
            return Err(DispatchError::DriverUnavailable(driver_id));
        }

        let vehicle = self.store.vehicle(vehicle_id)?;
        if !vehicle.active {
            return Err(DispatchError::VehicleInactive(vehicle_id));
        }

        // The vehicle must fit what the run already holds.
        let current_orders = self.store.run_orders(run_id);
        check_vehicle_capacity(&vehicle, &current_orders, &[])?;

        self.store.bind_run_resources(run_id, driver_id, vehicle_id)?;

        info!(run = %run.run_number, driver = %driver.name, vehicle = %vehicle.registration,
            "driver and vehicle assigned");
        self.store.run(run_id)
    }

    /// Applies each assignment independently; one failure never aborts the
    /// batch. Partial success is expected and reported.
    pub fn bulk_assign_drivers(&self, assignments: &[RunAssignment]) -> BulkAssignReport {
        let mut outcomes = Vec::with_capacity(assignments.len());
        let mut assigned = 0;

        for assignment in assignments {
            match self.assign_driver_and_vehicle(
                assignment.run_id,
                assignment.driver_id,
                assignment.vehicle_id,
            ) {
                Ok(_) => {
                    assigned += 1;
                    outcomes.push(AssignmentOutcome {
                        run_id: assignment.run_id,
                        success: true,
                        error: None,
                    });
                }
                Err(error) => {
                    warn!(run = %assignment.run_id, %error, "assignment failed");
                    outcomes.push(AssignmentOutcome {
                        run_id: assignment.run_id,
                        success: false,
                        error: Some(error.to_string()),
                    });
                }
            }
        }

        BulkAssignReport {
            assigned,
            failed: outcomes.len() - assigned,
            outcomes,
        }
    }
}
