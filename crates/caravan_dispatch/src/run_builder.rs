use std::sync::Arc;

use fxhash::FxHashSet;
use jiff::civil::Date;
use serde::Serialize;
use tracing::{debug, info};

use caravan_core::{
    DispatchError, DispatchResult,
    id::{OrderId, RunId, ZoneId},
    model::DeliveryRun,
};
use caravan_store::DispatchStore;

use crate::{capacity::check_vehicle_capacity, zone_resolver::active_zones};

#[derive(Debug, Clone, Serialize)]
pub struct CreatedRun {
    pub run_id: RunId,
    pub run_number: String,
    pub zone_id: ZoneId,
    pub order_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftRunReport {
    pub zones_processed: usize,
    pub runs: Vec<CreatedRun>,
}

/// Creates draft runs and owns every draft-only mutation primitive. All
/// order-to-run attachment flows through the capacity-gated path.
pub struct RunBuilder<S> {
    store: Arc<S>,
}

impl<S: DispatchStore> RunBuilder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// One draft run per active zone that has unassigned orders for the
    /// date. Zones without orders are skipped; no empty runs are created.
    pub fn create_draft_runs_for_date(&self, date: Date) -> DispatchResult<DraftRunReport> {
        let zones = active_zones(&*self.store, date)?;

        let mut runs = Vec::new();
        for zone in &zones {
            let orders = self.store.unassigned_zone_orders(zone.id, date);
            if orders.is_empty() {
                debug!(zone = %zone.name, "no unassigned orders, skipping zone");
                continue;
            }

            let order_ids: Vec<OrderId> = orders.iter().map(|order| order.id).collect();
            let run = self.create_run(zone.id, date, &order_ids)?;
            runs.push(CreatedRun {
                run_id: run.id,
                run_number: run.run_number,
                zone_id: zone.id,
                order_count: run.total_orders,
            });
        }

        info!(%date, zones = zones.len(), runs = runs.len(), "draft runs created");
        Ok(DraftRunReport {
            zones_processed: zones.len(),
            runs,
        })
    }

    /// Creates a single draft run with its initial orders in one unit; an
    /// unknown order id fails the creation and no run row persists.
    pub fn create_run(
        &self,
        zone_id: ZoneId,
        date: Date,
        order_ids: &[OrderId],
    ) -> DispatchResult<DeliveryRun> {
        let zone = self.store.zone(zone_id)?;
        let seq = self.store.count_runs_for_zone_date(zone_id, date) + 1;
        let run_number = DeliveryRun::format_run_number(date, &zone.prefix(), seq);

        let run = DeliveryRun::new_draft(zone_id, date, run_number);
        self.store.create_run_with_orders(run, order_ids)
    }

    pub fn add_order_to_run(&self, run_id: RunId, order_id: OrderId) -> DispatchResult<u32> {
        let run = self.store.run(run_id)?;
        ensure_draft(&run)?;
        self.assign_orders(&run, &[order_id])
    }

    pub fn remove_order_from_run(&self, run_id: RunId, order_id: OrderId) -> DispatchResult<u32> {
        let run = self.store.run(run_id)?;
        ensure_draft(&run)?;
        self.store.remove_order_from_run(run_id, order_id)
    }

    /// Rewrites stop positions. The supplied sequence must be a permutation
    /// of exactly the run's current orders; anything else leaves every
    /// `sequence_in_run` untouched.
    pub fn reorder_stops(&self, run_id: RunId, sequence: &[OrderId]) -> DispatchResult<()> {
        let run = self.store.run(run_id)?;
        ensure_draft(&run)?;

        let current: Vec<OrderId> = self
            .store
            .run_orders(run_id)
            .iter()
            .map(|order| order.id)
            .collect();

        let current_set: FxHashSet<OrderId> = current.iter().copied().collect();
        let supplied_set: FxHashSet<OrderId> = sequence.iter().copied().collect();

        let missing: Vec<OrderId> = current
            .iter()
            .copied()
            .filter(|id| !supplied_set.contains(id))
            .collect();

        // Foreign ids and repeated occurrences both count as unexpected, so
        // a duplicated sequence of the right length still names the culprit.
        let mut seen = FxHashSet::default();
        let unexpected: Vec<OrderId> = sequence
            .iter()
            .copied()
            .filter(|id| !current_set.contains(id) || !seen.insert(*id))
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() || sequence.len() != current.len() {
            return Err(DispatchError::SequenceMismatch { missing, unexpected });
        }

        let positions: Vec<(OrderId, u32)> = sequence
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index as u32 + 1))
            .collect();
        self.store.set_run_sequence(run_id, &positions)
    }

    /// Moves one order between two draft runs. The capacity gate runs first;
    /// the detach, attach, and both count recomputations are one store
    /// transaction, which also enforces draftness and source membership.
    pub fn move_order_between_runs(
        &self,
        order_id: OrderId,
        from_run_id: RunId,
        to_run_id: RunId,
    ) -> DispatchResult<()> {
        let from = self.store.run(from_run_id)?;
        let to = self.store.run(to_run_id)?;
        ensure_draft(&from)?;
        ensure_draft(&to)?;

        let order = self.store.order(order_id)?;
        if order.assigned_run_id != Some(from_run_id) {
            return Err(DispatchError::OrderNotInRun {
                order: order_id,
                run: from_run_id,
            });
        }

        if let Some(vehicle_id) = to.vehicle_id {
            let vehicle = self.store.vehicle(vehicle_id)?;
            let destination_orders = self.store.run_orders(to_run_id);
            check_vehicle_capacity(&vehicle, &destination_orders, std::slice::from_ref(&order))?;
        }

        self.store
            .transfer_order_between_runs(order_id, from_run_id, to_run_id)?;

        debug!(%order_id, from = %from.run_number, to = %to.run_number, "order moved between runs");
        Ok(())
    }

    /// Capacity-gated attachment. The gate only applies once a vehicle is
    /// bound; a capacity-less draft run accepts any order count.
    fn assign_orders(&self, run: &DeliveryRun, order_ids: &[OrderId]) -> DispatchResult<u32> {
        if let Some(vehicle_id) = run.vehicle_id {
            let vehicle = self.store.vehicle(vehicle_id)?;
            let current = self.store.run_orders(run.id);
            let candidates = self.store.orders(order_ids)?;
            check_vehicle_capacity(&vehicle, &current, &candidates)?;
        }

        self.store.assign_orders_to_run(run.id, order_ids)
    }
}

pub(crate) fn ensure_draft(run: &DeliveryRun) -> DispatchResult<()> {
    if run.is_draft {
        Ok(())
    } else {
        Err(DispatchError::RunFinalized(run.id))
    }
}
