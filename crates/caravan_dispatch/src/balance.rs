use std::sync::Arc;

use jiff::civil::Date;
use serde::Serialize;
use tracing::{debug, info};

use caravan_core::{
    DispatchResult,
    constants::{
        MERGE_ORDERS_PER_DRIVER, OVERLOAD_ORDERS_PER_DRIVER, REBALANCE_ORDERS_PER_DRIVER,
        UNDERUTILIZED_ORDERS_PER_DRIVER,
    },
    id::{OrderId, ZoneId},
    model::Zone,
};
use caravan_store::DispatchStore;

use crate::zone_resolver::{active_zones, nearest_zone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    Balanced,
    Overloaded,
    Underutilized,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneBalance {
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub order_count: usize,
    pub target_driver_count: u32,
    pub orders_per_driver: f64,
    pub status: BalanceStatus,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneBalanceReport {
    pub date: Date,
    pub zones: Vec<ZoneBalance>,
}

impl ZoneBalanceReport {
    pub fn overloaded(&self) -> impl Iterator<Item = &ZoneBalance> {
        self.zones
            .iter()
            .filter(|zone| zone.status == BalanceStatus::Overloaded)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RebalanceMove {
    pub order_id: OrderId,
    pub from_zone: ZoneId,
    pub to_zone: ZoneId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RebalanceReport {
    pub date: Date,
    pub zones_rebalanced: usize,
    pub moves: Vec<RebalanceMove>,
}

impl RebalanceReport {
    pub fn is_noop(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Classifies per-zone load and redistributes orders out of overloaded
/// zones. Thresholds are fixed policy, not configuration.
pub struct ZoneBalancer<S> {
    store: Arc<S>,
}

impl<S: DispatchStore> ZoneBalancer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn check_zone_balance(&self, date: Date) -> DispatchResult<ZoneBalanceReport> {
        let zones = active_zones(&*self.store, date)?;

        let zone_reports = zones
            .iter()
            .map(|zone| self.classify_zone(zone, date))
            .collect();

        Ok(ZoneBalanceReport {
            date,
            zones: zone_reports,
        })
    }

    fn classify_zone(&self, zone: &Zone, date: Date) -> ZoneBalance {
        let order_count = self.store.zone_orders(zone.id, date).len();
        let drivers = zone.target_driver_count.max(1);
        let orders_per_driver = order_count as f64 / f64::from(drivers);

        let (status, recommendation) = if orders_per_driver > OVERLOAD_ORDERS_PER_DRIVER {
            let needed = (orders_per_driver / OVERLOAD_ORDERS_PER_DRIVER).ceil() as u32;
            let extra = needed.saturating_sub(zone.target_driver_count);
            let recommendation = if extra > 0 {
                format!("split the zone or add {extra} drivers")
            } else {
                String::from("split the zone")
            };
            (BalanceStatus::Overloaded, Some(recommendation))
        } else if orders_per_driver < UNDERUTILIZED_ORDERS_PER_DRIVER && order_count > 0 {
            let reduced = ((order_count as f64 / f64::from(MERGE_ORDERS_PER_DRIVER)).ceil()
                as u32)
                .max(1);
            (
                BalanceStatus::Underutilized,
                Some(format!(
                    "merge into a neighboring zone or reduce to {reduced} drivers"
                )),
            )
        } else {
            (BalanceStatus::Balanced, None)
        };

        ZoneBalance {
            zone_id: zone.id,
            zone_name: zone.name.clone(),
            order_count,
            target_driver_count: zone.target_driver_count,
            orders_per_driver,
            status,
            recommendation,
        }
    }

    /// Moves the excess above `target_driver_count x 15` out of each
    /// overloaded zone, oldest orders first, to the nearest other active
    /// zone. Single pass: the destination may itself end up overloaded, and
    /// callers re-invoke until satisfied. Orders already attached to a run
    /// are never touched.
    pub fn rebalance_all_zones(&self, date: Date) -> DispatchResult<RebalanceReport> {
        let balance = self.check_zone_balance(date)?;
        let zones = active_zones(&*self.store, date)?;

        let mut moves = Vec::new();
        let mut zones_rebalanced = 0;

        for overloaded in balance.overloaded() {
            let Some(zone) = zones.iter().find(|zone| zone.id == overloaded.zone_id) else {
                continue;
            };

            let target = zone.target_driver_count as usize * REBALANCE_ORDERS_PER_DRIVER as usize;
            let excess = overloaded.order_count.saturating_sub(target);
            if excess == 0 {
                continue;
            }

            let movable: Vec<_> = self
                .store
                .zone_orders(zone.id, date)
                .into_iter()
                .filter(|order| order.assigned_run_id.is_none())
                .take(excess)
                .collect();

            let mut zone_moves = Vec::new();
            for order in &movable {
                let point = match order.location.or_else(|| zone.representative_point()) {
                    Some(point) => point,
                    None => continue,
                };

                let Some(destination) = nearest_zone(&zones, &point, Some(zone.id)) else {
                    debug!(zone = %zone.name, "no alternative zone to rebalance into");
                    break;
                };

                zone_moves.push(RebalanceMove {
                    order_id: order.id,
                    from_zone: zone.id,
                    to_zone: destination.id,
                    reason: format!(
                        "zone overloaded: {:.1} orders per driver",
                        overloaded.orders_per_driver
                    ),
                });
            }

            if zone_moves.is_empty() {
                continue;
            }

            let updates: Vec<(OrderId, ZoneId)> = zone_moves
                .iter()
                .map(|entry| (entry.order_id, entry.to_zone))
                .collect();
            self.store.set_order_zones(&updates)?;

            zones_rebalanced += 1;
            moves.extend(zone_moves);
        }

        info!(%date, zones_rebalanced, moves = moves.len(), "rebalance complete");
        Ok(RebalanceReport {
            date,
            zones_rebalanced,
            moves,
        })
    }
}
