use std::sync::Arc;

use jiff::{Timestamp, civil::Date};
use serde::Serialize;
use tracing::{debug, info};

use caravan_core::{
    DispatchResult,
    id::{OrderId, ZoneId},
};
use caravan_store::DispatchStore;

use crate::zone_resolver::{active_zones, nearest_zone};

#[derive(Debug, Clone, Serialize)]
pub struct ZoneAssignment {
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub order_ids: Vec<OrderId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoAssignReport {
    pub total_orders: usize,
    pub assigned: usize,
    /// Orders with no point or no reachable zone; left zone-less, never
    /// silently dropped.
    pub out_of_bounds: Vec<OrderId>,
    pub zones: Vec<ZoneAssignment>,
}

/// Assigns confirmed, geocoded, un-zoned orders to zones by containment,
/// with a nearest-zone fallback.
pub struct ZoneAssigner<S> {
    store: Arc<S>,
}

impl<S: DispatchStore> ZoneAssigner<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Orders already carrying a zone are excluded from the input set, so
    /// re-running after a partial failure is idempotent. Persistence happens
    /// per zone; progress for earlier zones survives a later failure.
    pub fn assign_orders_to_zones(
        &self,
        date: Date,
        cutoff: Option<Timestamp>,
    ) -> DispatchResult<AutoAssignReport> {
        let zones = active_zones(&*self.store, date)?;

        let orders: Vec<_> = self
            .store
            .unzoned_confirmed_orders(date)
            .into_iter()
            .filter(|order| cutoff.is_none_or(|cutoff| order.created_at <= cutoff))
            .collect();

        let mut buckets: Vec<Vec<OrderId>> = vec![Vec::new(); zones.len()];
        let mut out_of_bounds = Vec::new();

        for order in &orders {
            let Some(point) = order.location else {
                debug!(order = %order.id, "order has no location, leaving zone-less");
                out_of_bounds.push(order.id);
                continue;
            };

            // First containing zone wins; overlapping polygons are tolerated.
            let target = zones
                .iter()
                .position(|zone| zone.contains(&point))
                .or_else(|| {
                    nearest_zone(&zones, &point, None)
                        .and_then(|zone| zones.iter().position(|z| z.id == zone.id))
                });

            match target {
                Some(index) => buckets[index].push(order.id),
                None => out_of_bounds.push(order.id),
            }
        }

        let mut assigned = 0;
        let mut report_zones = Vec::new();
        for (zone, order_ids) in zones.iter().zip(buckets) {
            if order_ids.is_empty() {
                continue;
            }

            let updates: Vec<(OrderId, ZoneId)> =
                order_ids.iter().map(|id| (*id, zone.id)).collect();
            self.store.set_order_zones(&updates)?;

            assigned += order_ids.len();
            report_zones.push(ZoneAssignment {
                zone_id: zone.id,
                zone_name: zone.name.clone(),
                order_ids,
            });
        }

        info!(
            %date,
            total = orders.len(),
            assigned,
            out_of_bounds = out_of_bounds.len(),
            "auto-assignment complete"
        );

        Ok(AutoAssignReport {
            total_orders: orders.len(),
            assigned,
            out_of_bounds,
            zones: report_zones,
        })
    }
}
