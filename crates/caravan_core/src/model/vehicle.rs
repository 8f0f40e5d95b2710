use serde::{Deserialize, Serialize};

use crate::{GeoPoint, id::VehicleId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub registration: String,
    /// None means unbounded.
    pub weight_capacity_kg: Option<f64>,
    /// None means unbounded.
    pub volume_capacity_m3: Option<f64>,
    pub start_location: Option<GeoPoint>,
    pub active: bool,
}

impl Vehicle {
    pub fn new(registration: impl Into<String>) -> Self {
        Vehicle {
            id: VehicleId::new(),
            registration: registration.into(),
            weight_capacity_kg: None,
            volume_capacity_m3: None,
            start_location: None,
            active: true,
        }
    }
}
