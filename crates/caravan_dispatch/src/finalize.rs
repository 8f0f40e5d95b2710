use std::sync::Arc;

use jiff::civil::Date;
use serde::Serialize;
use tracing::{info, warn};

use caravan_core::{
    DispatchError, DispatchResult, GeoPoint,
    constants::{ROUTE_DEPARTURE_HOUR, STOP_SERVICE_DURATION},
    id::RunId,
    model::{DeliveryRun, Order, Vehicle},
};
use caravan_providers::{
    NotificationDispatch, OptimizationRequest, OptimizationStop, OptimizationVehicle,
    RouteOptimizer, StepKind,
};
use caravan_store::{DispatchStore, RunSolutionUpdate, StopUpdate};

#[derive(Debug, Clone, Serialize)]
pub struct FinalizeOutcome {
    pub run_id: RunId,
    pub run_number: String,
    pub order_count: usize,
    /// Whether customer notification was triggered; delivery itself is an
    /// external concern and its failures never undo finalization.
    pub notified: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunFailure {
    pub run_id: RunId,
    pub run_number: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalizeAllReport {
    pub total_runs: usize,
    pub finalized: usize,
    pub total_orders: usize,
    pub failures: Vec<RunFailure>,
}

/// Seals draft runs: sends the run to the optimization provider and applies
/// the returned sequence and timings in one transaction.
pub struct Finalizer<S, O, N> {
    store: Arc<S>,
    optimizer: O,
    notifier: N,
}

impl<S, O, N> Finalizer<S, O, N>
where
    S: DispatchStore,
    O: RouteOptimizer,
    N: NotificationDispatch,
{
    pub fn new(store: Arc<S>, optimizer: O, notifier: N) -> Self {
        Self {
            store,
            optimizer,
            notifier,
        }
    }

    /// Draft -> planned. The run must be finalizable (driver and vehicle
    /// bound). If the provider returns zero routes the run stays draft.
    pub async fn finalize_run(
        &self,
        run_id: RunId,
        fallback_start: Option<GeoPoint>,
    ) -> DispatchResult<FinalizeOutcome> {
        let run = self.store.run(run_id)?;
        if !run.is_draft {
            return Err(DispatchError::AlreadyFinalized(run_id));
        }
        if !run.can_finalize {
            return Err(DispatchError::CannotFinalize {
                run: run_id,
                reason: String::from("driver and vehicle must be assigned first"),
            });
        }

        let vehicle_id = run.vehicle_id.ok_or(DispatchError::CannotFinalize {
            run: run_id,
            reason: String::from("run has no vehicle"),
        })?;
        let vehicle = self.store.vehicle(vehicle_id)?;

        let orders = self.store.run_orders(run_id);
        if orders.is_empty() {
            return Err(DispatchError::CannotFinalize {
                run: run_id,
                reason: String::from("run has no orders"),
            });
        }

        let start = vehicle.start_location.or(fallback_start).ok_or_else(|| {
            DispatchError::CannotFinalize {
                run: run_id,
                reason: String::from("no start location for vehicle"),
            }
        })?;

        let request = build_request(&run, &vehicle, start, &orders)?;

        let solution = self
            .optimizer
            .optimize(&request)
            .await
            .map_err(|error| DispatchError::Provider(error.to_string()))?;

        let Some(route) = solution.routes.first() else {
            return Err(DispatchError::EmptySolution);
        };

        if !solution.unassigned.is_empty() {
            warn!(run = %run.run_number, unplaced = solution.unassigned.len(),
                "provider could not place every stop");
        }

        let stops: Vec<StopUpdate> = route
            .steps
            .iter()
            .filter(|step| step.kind == StepKind::Service)
            .filter_map(|step| step.order_id.map(|order_id| (order_id, step.arrival)))
            .enumerate()
            .map(|(index, (order_id, arrival))| StopUpdate {
                order_id,
                sequence: index as u32 + 1,
                estimated_arrival: arrival,
            })
            .collect();

        // A missed window is worth flagging but never undoes a valid route;
        // the provider already had the window as a soft constraint.
        for stop in &stops {
            let misses_window = orders
                .iter()
                .find(|order| order.id == stop.order_id)
                .and_then(|order| order.delivery_window)
                .is_some_and(|window| !window.is_satisfied(stop.estimated_arrival));
            if misses_window {
                warn!(order = %stop.order_id, arrival = %stop.estimated_arrival,
                    "estimated arrival misses the delivery window");
            }
        }

        self.store.apply_run_solution(
            run_id,
            RunSolutionUpdate {
                route_geometry: route.geometry.clone(),
                total_distance_meters: route.distance_meters,
                total_duration: route.duration,
                stops: stops.clone(),
            },
        )?;

        let notified = self.notify_orders(run_id).await;

        info!(run = %run.run_number, orders = stops.len(), "run finalized");
        Ok(FinalizeOutcome {
            run_id,
            run_number: run.run_number,
            order_count: stops.len(),
            notified,
        })
    }

    /// Finalizes every eligible draft run for the date, sequentially and
    /// independently: one failing run is recorded and the rest proceed.
    pub async fn finalize_all_runs(
        &self,
        date: Date,
        fallback_start: Option<GeoPoint>,
    ) -> DispatchResult<FinalizeAllReport> {
        let eligible: Vec<DeliveryRun> = self
            .store
            .runs_for_date(date)
            .into_iter()
            .filter(|run| run.is_draft && run.can_finalize)
            .collect();

        let mut finalized = 0;
        let mut total_orders = 0;
        let mut failures = Vec::new();

        for run in &eligible {
            match self.finalize_run(run.id, fallback_start).await {
                Ok(outcome) => {
                    finalized += 1;
                    total_orders += outcome.order_count;
                }
                Err(error) => {
                    warn!(run = %run.run_number, %error, "finalization failed");
                    failures.push(RunFailure {
                        run_id: run.id,
                        run_number: run.run_number.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        info!(%date, total = eligible.len(), finalized, "bulk finalization complete");
        Ok(FinalizeAllReport {
            total_runs: eligible.len(),
            finalized,
            total_orders,
            failures,
        })
    }

    /// Fire-and-forget: failures are logged and swallowed. Returns whether
    /// notification was triggered at all.
    async fn notify_orders(&self, run_id: RunId) -> bool {
        let orders = self.store.run_orders(run_id);
        for order in &orders {
            if let Err(error) = self.notifier.order_scheduled(order).await {
                warn!(order = %order.id, %error, "notification dispatch failed");
            }
        }
        !orders.is_empty()
    }
}

fn build_request(
    run: &DeliveryRun,
    vehicle: &Vehicle,
    start: GeoPoint,
    orders: &[Order],
) -> DispatchResult<OptimizationRequest> {
    let departure = run
        .scheduled_date
        .at(ROUTE_DEPARTURE_HOUR, 0, 0, 0)
        .to_zoned(jiff::tz::TimeZone::UTC)
        .map_err(|error| DispatchError::CannotFinalize {
            run: run.id,
            reason: format!("invalid departure time: {error}"),
        })?
        .timestamp();

    let stops = orders
        .iter()
        .map(|order| {
            let location = order.location.ok_or(DispatchError::CannotFinalize {
                run: run.id,
                reason: format!("order {} has no location", order.id),
            })?;

            Ok(OptimizationStop {
                order_id: order.id,
                location,
                service_duration: STOP_SERVICE_DURATION,
                time_window: order.delivery_window.filter(|window| !window.is_empty()),
                demand: vec![order.weight_kg, order.volume_m3()],
            })
        })
        .collect::<DispatchResult<Vec<_>>>()?;

    // Capacity dimensions are forwarded only when fully declared; the
    // dispatch-side gate has already enforced them on the order set.
    let capacity = match (vehicle.weight_capacity_kg, vehicle.volume_capacity_m3) {
        (Some(weight), Some(volume)) => vec![weight, volume],
        _ => Vec::new(),
    };

    Ok(OptimizationRequest {
        departure,
        vehicle: OptimizationVehicle {
            external_id: vehicle.registration.clone(),
            start,
            end: None,
            capacity,
        },
        stops,
    })
}
