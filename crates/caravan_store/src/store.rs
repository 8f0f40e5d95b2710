use jiff::{SignedDuration, Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

use caravan_core::{
    DispatchResult,
    id::{DriverId, OrderId, RunId, VehicleId, ZoneId},
    model::{DeliveryRun, Driver, Order, Vehicle, Zone},
};

/// One optimized stop, as applied back onto an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopUpdate {
    pub order_id: OrderId,
    /// 1-based position in the optimized route.
    pub sequence: u32,
    pub estimated_arrival: Timestamp,
}

/// The provider's solution for one run, applied as a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSolutionUpdate {
    pub route_geometry: String,
    pub total_distance_meters: f64,
    pub total_duration: SignedDuration,
    pub stops: Vec<StopUpdate>,
}

/// Transactional persistence facade for the dispatch core.
///
/// Reads return detached copies. Each mutation method is one atomic unit:
/// it either applies completely or fails without touching any row. Aggregate
/// fields (`DeliveryRun::total_orders`) are recomputed from the live order
/// set inside the same unit, never incremented.
pub trait DispatchStore: Send + Sync {
    fn zone(&self, id: ZoneId) -> DispatchResult<Zone>;

    /// Active zones for a date, in a deterministic (provisioning) order.
    fn active_zones_on(&self, date: Date) -> Vec<Zone>;

    fn order(&self, id: OrderId) -> DispatchResult<Order>;

    /// All requested orders, failing with `OrderNotFound` on the first
    /// unknown id.
    fn orders(&self, ids: &[OrderId]) -> DispatchResult<Vec<Order>>;

    /// Confirmed orders for the date with no zone yet, oldest first.
    fn unzoned_confirmed_orders(&self, date: Date) -> Vec<Order>;

    /// Live (non-terminal) orders assigned to the zone for the date, oldest
    /// first.
    fn zone_orders(&self, zone_id: ZoneId, date: Date) -> Vec<Order>;

    /// Live zone orders for the date not yet attached to any run, oldest
    /// first.
    fn unassigned_zone_orders(&self, zone_id: ZoneId, date: Date) -> Vec<Order>;

    fn run(&self, id: RunId) -> DispatchResult<DeliveryRun>;

    fn runs_for_date(&self, date: Date) -> Vec<DeliveryRun>;

    /// Existing runs sharing the date and zone, for run-number sequencing.
    fn count_runs_for_zone_date(&self, zone_id: ZoneId, date: Date) -> usize;

    /// Orders attached to the run, by stop sequence where one is set.
    fn run_orders(&self, run_id: RunId) -> Vec<Order>;

    fn driver(&self, id: DriverId) -> DispatchResult<Driver>;

    fn vehicle(&self, id: VehicleId) -> DispatchResult<Vehicle>;

    fn insert_zone(&self, zone: Zone);

    fn insert_order(&self, order: Order);

    fn insert_driver(&self, driver: Driver);

    fn insert_vehicle(&self, vehicle: Vehicle);

    /// Bulk zone reassignment for auto-assignment and rebalancing.
    fn set_order_zones(&self, updates: &[(OrderId, ZoneId)]) -> DispatchResult<()>;

    /// Creates the run and attaches its initial orders in one unit. An
    /// unknown order id fails the whole operation and no run row persists.
    fn create_run_with_orders(
        &self,
        run: DeliveryRun,
        order_ids: &[OrderId],
    ) -> DispatchResult<DeliveryRun>;

    /// Attaches orders to an existing draft run and returns the recomputed
    /// order count. An unknown order id fails the whole operation; so does
    /// an order already belonging to a different run (`OrderAlreadyAssigned`
    /// — transfers go through `transfer_order_between_runs`) and a sealed
    /// run (`RunFinalized`).
    fn assign_orders_to_run(&self, run_id: RunId, order_ids: &[OrderId]) -> DispatchResult<u32>;

    /// Detaches an order from a draft run, clearing its run reference and
    /// sequence, and returns the recomputed order count.
    fn remove_order_from_run(&self, run_id: RunId, order_id: OrderId) -> DispatchResult<u32>;

    /// Moves one order between two draft runs in a single unit: membership
    /// check, detach, attach, and both count recomputations under the same
    /// guard.
    fn transfer_order_between_runs(
        &self,
        order_id: OrderId,
        from_run_id: RunId,
        to_run_id: RunId,
    ) -> DispatchResult<()>;

    /// Writes stop positions for orders already attached to the draft run.
    fn set_run_sequence(&self, run_id: RunId, sequence: &[(OrderId, u32)]) -> DispatchResult<()>;

    /// Binds a driver and vehicle to the run, enforcing one binding per
    /// resource per date under the store's own lock. Rebinding the same run
    /// is not a conflict. Sets `can_finalize` on success.
    fn bind_run_resources(
        &self,
        run_id: RunId,
        driver_id: DriverId,
        vehicle_id: VehicleId,
    ) -> DispatchResult<()>;

    /// Applies an optimization solution: run becomes planned and sealed,
    /// route aggregates are stored, and every referenced order receives its
    /// sequence and estimated arrival. All or nothing.
    fn apply_run_solution(&self, run_id: RunId, update: RunSolutionUpdate) -> DispatchResult<()>;
}
