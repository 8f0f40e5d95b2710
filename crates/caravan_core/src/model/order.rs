use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

use crate::{
    GeoPoint,
    constants::VOLUME_PER_PACKAGE_M3,
    id::{OrderId, RunId, ZoneId},
    model::time_window::TimeWindow,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Assigned,
    InProgress,
    Delivered,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Assigned)
                | (Confirmed, Cancelled)
                | (Assigned, Confirmed)
                | (Assigned, InProgress)
                | (Assigned, Cancelled)
                | (InProgress, Delivered)
                | (InProgress, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Failed | OrderStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// None until geocoding (an external concern) has resolved the address.
    pub location: Option<GeoPoint>,
    pub weight_kg: f64,
    pub package_count: u32,
    pub scheduled_date: Date,
    pub delivery_window: Option<TimeWindow>,
    pub zone_id: Option<ZoneId>,
    pub assigned_run_id: Option<RunId>,
    /// 1-based stop position, only meaningful while `assigned_run_id` is set.
    pub sequence_in_run: Option<u32>,
    pub estimated_arrival: Option<Timestamp>,
    pub status: OrderStatus,
    pub created_at: Timestamp,
}

impl Order {
    pub fn new(scheduled_date: Date, weight_kg: f64, package_count: u32) -> Self {
        Order {
            id: OrderId::new(),
            location: None,
            weight_kg,
            package_count,
            scheduled_date,
            delivery_window: None,
            zone_id: None,
            assigned_run_id: None,
            sequence_in_run: None,
            estimated_arrival: None,
            status: OrderStatus::Pending,
            created_at: Timestamp::now(),
        }
    }

    /// Estimated volume demand, a fixed per-package proxy.
    pub fn volume_m3(&self) -> f64 {
        f64::from(self.package_count) * VOLUME_PER_PACKAGE_M3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_follow_lifecycle() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Assigned));
        assert!(Assigned.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Delivered.can_transition_to(Confirmed));
        assert!(Delivered.is_terminal());
    }
}
