use jiff::{SignedDuration, civil::Date};
use serde::{Deserialize, Serialize};

use crate::id::{DriverId, RunId, VehicleId, ZoneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Draft,
    Planned,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl RunStatus {
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        use RunStatus::*;

        matches!(
            (self, next),
            (Draft, Planned)
                | (Draft, Cancelled)
                | (Planned, Assigned)
                | (Planned, Cancelled)
                | (Assigned, InProgress)
                | (Assigned, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }
}

/// A collection of orders grouped for one vehicle on one date. Mutable while
/// `is_draft` holds; finalization seals the order set and sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRun {
    pub id: RunId,
    pub run_number: String,
    pub scheduled_date: Date,
    pub zone_id: ZoneId,
    pub driver_id: Option<DriverId>,
    pub vehicle_id: Option<VehicleId>,
    pub is_draft: bool,
    pub can_finalize: bool,
    /// Recomputed from the live order set on every mutation, never
    /// incremented in place.
    pub total_orders: u32,
    /// Opaque route geometry returned by the optimization provider.
    pub route_geometry: Option<String>,
    pub total_distance_meters: Option<f64>,
    pub total_duration: Option<SignedDuration>,
    pub status: RunStatus,
}

impl DeliveryRun {
    pub fn new_draft(zone_id: ZoneId, scheduled_date: Date, run_number: String) -> Self {
        DeliveryRun {
            id: RunId::new(),
            run_number,
            scheduled_date,
            zone_id,
            driver_id: None,
            vehicle_id: None,
            is_draft: true,
            can_finalize: false,
            total_orders: 0,
            route_geometry: None,
            total_distance_meters: None,
            total_duration: None,
            status: RunStatus::Draft,
        }
    }

    /// `RUN-<YYYYMMDD>-<ZONEPREFIX>-<NNN>` with a 1-based, zero-padded
    /// per-date-and-zone sequence.
    pub fn format_run_number(date: Date, zone_prefix: &str, seq: usize) -> String {
        format!("RUN-{}-{}-{:03}", date.strftime("%Y%m%d"), zone_prefix, seq)
    }
}
