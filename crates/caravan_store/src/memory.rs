use fxhash::FxHashMap;
use jiff::civil::Date;
use parking_lot::RwLock;

use caravan_core::{
    DispatchError, DispatchResult,
    id::{DriverId, OrderId, RunId, VehicleId, ZoneId},
    model::{DeliveryRun, Driver, Order, OrderStatus, RunStatus, Vehicle, Zone},
};

use crate::store::{DispatchStore, RunSolutionUpdate};

#[derive(Default)]
struct State {
    zones: FxHashMap<ZoneId, Zone>,
    /// Provisioning order; keeps containment tests and reports deterministic.
    zone_ids: Vec<ZoneId>,
    orders: FxHashMap<OrderId, Order>,
    runs: FxHashMap<RunId, DeliveryRun>,
    run_ids: Vec<RunId>,
    drivers: FxHashMap<DriverId, Driver>,
    vehicles: FxHashMap<VehicleId, Vehicle>,
}

impl State {
    fn order(&self, id: OrderId) -> DispatchResult<&Order> {
        self.orders.get(&id).ok_or(DispatchError::OrderNotFound(id))
    }

    fn run(&self, id: RunId) -> DispatchResult<&DeliveryRun> {
        self.runs.get(&id).ok_or(DispatchError::RunNotFound(id))
    }

    fn draft_run(&self, id: RunId) -> DispatchResult<&DeliveryRun> {
        let run = self.run(id)?;
        if !run.is_draft {
            return Err(DispatchError::RunFinalized(id));
        }
        Ok(run)
    }

    /// Every order must exist and must not belong to a different run;
    /// stealing an order would leave the source run's count stale.
    fn ensure_orders_attachable(&self, run_id: RunId, ids: &[OrderId]) -> DispatchResult<()> {
        for id in ids {
            let order = self.order(*id)?;
            if let Some(current) = order.assigned_run_id {
                if current != run_id {
                    return Err(DispatchError::OrderAlreadyAssigned {
                        order: *id,
                        run: current,
                    });
                }
            }
        }
        Ok(())
    }

    fn live_order_count(&self, run_id: RunId) -> u32 {
        self.orders
            .values()
            .filter(|order| order.assigned_run_id == Some(run_id))
            .count() as u32
    }

    /// Attaches already-validated orders and recomputes the run total.
    fn attach_orders(&mut self, run_id: RunId, order_ids: &[OrderId]) -> u32 {
        for id in order_ids {
            let order = self.orders.get_mut(id).expect("validated above");
            order.assigned_run_id = Some(run_id);
            order.sequence_in_run = None;
            if order.status == OrderStatus::Confirmed {
                order.status = OrderStatus::Assigned;
            }
        }

        let total = self.live_order_count(run_id);
        let run = self.runs.get_mut(&run_id).expect("validated above");
        run.total_orders = total;
        total
    }

    fn sorted_oldest_first(&self, mut orders: Vec<Order>) -> Vec<Order> {
        orders.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        orders
    }
}

/// In-memory `DispatchStore`. One write guard per mutation method stands in
/// for a storage transaction.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DispatchStore for MemoryStore {
    fn zone(&self, id: ZoneId) -> DispatchResult<Zone> {
        self.state
            .read()
            .zones
            .get(&id)
            .cloned()
            .ok_or(DispatchError::ZoneNotFound(id))
    }

    fn active_zones_on(&self, date: Date) -> Vec<Zone> {
        let state = self.state.read();
        state
            .zone_ids
            .iter()
            .filter_map(|id| state.zones.get(id))
            .filter(|zone| zone.is_active_on(date))
            .cloned()
            .collect()
    }

    fn order(&self, id: OrderId) -> DispatchResult<Order> {
        self.state.read().order(id).cloned()
    }

    fn orders(&self, ids: &[OrderId]) -> DispatchResult<Vec<Order>> {
        let state = self.state.read();
        ids.iter().map(|id| state.order(*id).cloned()).collect()
    }

    fn unzoned_confirmed_orders(&self, date: Date) -> Vec<Order> {
        let state = self.state.read();
        let orders = state
            .orders
            .values()
            .filter(|order| {
                order.scheduled_date == date
                    && order.status == OrderStatus::Confirmed
                    && order.zone_id.is_none()
            })
            .cloned()
            .collect();
        state.sorted_oldest_first(orders)
    }

    fn zone_orders(&self, zone_id: ZoneId, date: Date) -> Vec<Order> {
        let state = self.state.read();
        let orders = state
            .orders
            .values()
            .filter(|order| {
                order.scheduled_date == date
                    && order.zone_id == Some(zone_id)
                    && !order.status.is_terminal()
            })
            .cloned()
            .collect();
        state.sorted_oldest_first(orders)
    }

    fn unassigned_zone_orders(&self, zone_id: ZoneId, date: Date) -> Vec<Order> {
        let state = self.state.read();
        let orders = state
            .orders
            .values()
            .filter(|order| {
                order.scheduled_date == date
                    && order.zone_id == Some(zone_id)
                    && order.assigned_run_id.is_none()
                    && !order.status.is_terminal()
            })
            .cloned()
            .collect();
        state.sorted_oldest_first(orders)
    }

    fn run(&self, id: RunId) -> DispatchResult<DeliveryRun> {
        self.state.read().run(id).cloned()
    }

    fn runs_for_date(&self, date: Date) -> Vec<DeliveryRun> {
        let state = self.state.read();
        state
            .run_ids
            .iter()
            .filter_map(|id| state.runs.get(id))
            .filter(|run| run.scheduled_date == date)
            .cloned()
            .collect()
    }

    fn count_runs_for_zone_date(&self, zone_id: ZoneId, date: Date) -> usize {
        self.state
            .read()
            .runs
            .values()
            .filter(|run| run.zone_id == zone_id && run.scheduled_date == date)
            .count()
    }

    fn run_orders(&self, run_id: RunId) -> Vec<Order> {
        let state = self.state.read();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.assigned_run_id == Some(run_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            (a.sequence_in_run, a.created_at, a.id).cmp(&(b.sequence_in_run, b.created_at, b.id))
        });
        orders
    }

    fn driver(&self, id: DriverId) -> DispatchResult<Driver> {
        self.state
            .read()
            .drivers
            .get(&id)
            .cloned()
            .ok_or(DispatchError::DriverNotFound(id))
    }

    fn vehicle(&self, id: VehicleId) -> DispatchResult<Vehicle> {
        self.state
            .read()
            .vehicles
            .get(&id)
            .cloned()
            .ok_or(DispatchError::VehicleNotFound(id))
    }

    fn insert_zone(&self, zone: Zone) {
        let mut state = self.state.write();
        if !state.zones.contains_key(&zone.id) {
            state.zone_ids.push(zone.id);
        }
        state.zones.insert(zone.id, zone);
    }

    fn insert_order(&self, order: Order) {
        self.state.write().orders.insert(order.id, order);
    }

    fn insert_driver(&self, driver: Driver) {
        self.state.write().drivers.insert(driver.id, driver);
    }

    fn insert_vehicle(&self, vehicle: Vehicle) {
        self.state.write().vehicles.insert(vehicle.id, vehicle);
    }

    fn set_order_zones(&self, updates: &[(OrderId, ZoneId)]) -> DispatchResult<()> {
        let mut state = self.state.write();
        for (order_id, zone_id) in updates {
            state.order(*order_id)?;
            if !state.zones.contains_key(zone_id) {
                return Err(DispatchError::ZoneNotFound(*zone_id));
            }
        }

        for (order_id, zone_id) in updates {
            let order = state.orders.get_mut(order_id).expect("validated above");
            order.zone_id = Some(*zone_id);
        }
        Ok(())
    }

    fn create_run_with_orders(
        &self,
        run: DeliveryRun,
        order_ids: &[OrderId],
    ) -> DispatchResult<DeliveryRun> {
        let mut state = self.state.write();
        // Validate before inserting so a failure leaves no run row behind.
        state.ensure_orders_attachable(run.id, order_ids)?;

        let run_id = run.id;
        state.runs.insert(run_id, run);
        state.run_ids.push(run_id);
        state.attach_orders(run_id, order_ids);

        Ok(state.runs[&run_id].clone())
    }

    fn assign_orders_to_run(&self, run_id: RunId, order_ids: &[OrderId]) -> DispatchResult<u32> {
        let mut state = self.state.write();
        state.draft_run(run_id)?;
        state.ensure_orders_attachable(run_id, order_ids)?;
        Ok(state.attach_orders(run_id, order_ids))
    }

    fn remove_order_from_run(&self, run_id: RunId, order_id: OrderId) -> DispatchResult<u32> {
        let mut state = self.state.write();
        state.draft_run(run_id)?;

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(DispatchError::OrderNotFound(order_id))?;
        if order.assigned_run_id != Some(run_id) {
            return Err(DispatchError::OrderNotInRun {
                order: order_id,
                run: run_id,
            });
        }

        order.assigned_run_id = None;
        order.sequence_in_run = None;
        order.estimated_arrival = None;
        if order.status == OrderStatus::Assigned {
            order.status = OrderStatus::Confirmed;
        }

        let total = state.live_order_count(run_id);
        state.runs.get_mut(&run_id).expect("checked above").total_orders = total;
        Ok(total)
    }

    fn transfer_order_between_runs(
        &self,
        order_id: OrderId,
        from_run_id: RunId,
        to_run_id: RunId,
    ) -> DispatchResult<()> {
        let mut state = self.state.write();
        state.draft_run(from_run_id)?;
        state.draft_run(to_run_id)?;

        let order = state.order(order_id)?;
        if order.assigned_run_id != Some(from_run_id) {
            return Err(DispatchError::OrderNotInRun {
                order: order_id,
                run: from_run_id,
            });
        }

        let order = state.orders.get_mut(&order_id).expect("validated above");
        order.assigned_run_id = Some(to_run_id);
        order.sequence_in_run = None;
        order.estimated_arrival = None;

        let from_total = state.live_order_count(from_run_id);
        state
            .runs
            .get_mut(&from_run_id)
            .expect("checked above")
            .total_orders = from_total;
        let to_total = state.live_order_count(to_run_id);
        state
            .runs
            .get_mut(&to_run_id)
            .expect("checked above")
            .total_orders = to_total;
        Ok(())
    }

    fn set_run_sequence(&self, run_id: RunId, sequence: &[(OrderId, u32)]) -> DispatchResult<()> {
        let mut state = self.state.write();
        state.draft_run(run_id)?;

        for (order_id, _) in sequence {
            let order = state.order(*order_id)?;
            if order.assigned_run_id != Some(run_id) {
                return Err(DispatchError::OrderNotInRun {
                    order: *order_id,
                    run: run_id,
                });
            }
        }

        for (order_id, position) in sequence {
            let order = state.orders.get_mut(order_id).expect("validated above");
            order.sequence_in_run = Some(*position);
        }
        Ok(())
    }

    fn bind_run_resources(
        &self,
        run_id: RunId,
        driver_id: DriverId,
        vehicle_id: VehicleId,
    ) -> DispatchResult<()> {
        let mut state = self.state.write();
        let date = state.run(run_id)?.scheduled_date;

        // The uniqueness scan happens under the same write guard as the
        // binding itself, the in-memory analog of a unique constraint on
        // (date, driver) and (date, vehicle).
        for other in state.runs.values() {
            if other.id == run_id || other.scheduled_date != date {
                continue;
            }
            if other.driver_id == Some(driver_id) {
                return Err(DispatchError::ResourceConflict(format!(
                    "driver {driver_id} is already assigned to run {} on {date}",
                    other.run_number
                )));
            }
            if other.vehicle_id == Some(vehicle_id) {
                return Err(DispatchError::ResourceConflict(format!(
                    "vehicle {vehicle_id} is already assigned to run {} on {date}",
                    other.run_number
                )));
            }
        }

        let run = state.runs.get_mut(&run_id).expect("checked above");
        run.driver_id = Some(driver_id);
        run.vehicle_id = Some(vehicle_id);
        run.can_finalize = true;
        Ok(())
    }

    fn apply_run_solution(&self, run_id: RunId, update: RunSolutionUpdate) -> DispatchResult<()> {
        let mut state = self.state.write();

        let run = state.run(run_id)?;
        if !run.status.can_transition_to(RunStatus::Planned) {
            return Err(DispatchError::AlreadyFinalized(run_id));
        }

        for stop in &update.stops {
            let order = state.order(stop.order_id)?;
            if order.assigned_run_id != Some(run_id) {
                return Err(DispatchError::OrderNotInRun {
                    order: stop.order_id,
                    run: run_id,
                });
            }
        }

        for stop in &update.stops {
            let order = state.orders.get_mut(&stop.order_id).expect("validated above");
            order.sequence_in_run = Some(stop.sequence);
            order.estimated_arrival = Some(stop.estimated_arrival);
            if order.status == OrderStatus::Confirmed {
                order.status = OrderStatus::Assigned;
            }
        }

        let run = state.runs.get_mut(&run_id).expect("checked above");
        run.status = RunStatus::Planned;
        run.is_draft = false;
        run.can_finalize = false;
        run.route_geometry = Some(update.route_geometry);
        run.total_distance_meters = Some(update.total_distance_meters);
        run.total_duration = Some(update.total_duration);
        Ok(())
    }
}
