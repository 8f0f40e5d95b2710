use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use caravan_core::{GeoPoint, id::OrderId, model::TimeWindow};

/// The vehicle side of an optimization request: where the route starts and
/// ends and how much it can carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationVehicle {
    pub external_id: String,
    pub start: GeoPoint,
    pub end: Option<GeoPoint>,
    /// Capacity dimensions, `[weight_kg, volume_m3]`.
    pub capacity: Vec<f64>,
}

/// One delivery stop to be sequenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationStop {
    pub order_id: OrderId,
    pub location: GeoPoint,
    pub service_duration: SignedDuration,
    pub time_window: Option<TimeWindow>,
    /// Demand dimensions, `[weight_kg, volume_m3]`.
    pub demand: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRequest {
    /// Route departure; arrival offsets in the solution are absolute
    /// timestamps at or after this instant.
    pub departure: Timestamp,
    pub vehicle: OptimizationVehicle,
    pub stops: Vec<OptimizationStop>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Start,
    Service,
    End,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStep {
    pub kind: StepKind,
    /// Set for `Service` steps only.
    pub order_id: Option<OrderId>,
    pub arrival: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedRoute {
    /// Opaque geometry payload (polyline or lon/lat chain), stored on the
    /// run as-is.
    pub geometry: String,
    pub distance_meters: f64,
    pub duration: SignedDuration,
    pub steps: Vec<RouteStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationSolution {
    pub routes: Vec<OptimizedRoute>,
    /// Stops the provider could not place.
    pub unassigned: Vec<OrderId>,
}

impl OptimizationSolution {
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
