use serde::{Deserialize, Serialize};

use crate::id::DriverId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Available,
    OnRoute,
    OffDuty,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    pub status: DriverStatus,
}

impl Driver {
    pub fn new(name: impl Into<String>) -> Self {
        Driver {
            id: DriverId::new(),
            name: name.into(),
            status: DriverStatus::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == DriverStatus::Available
    }
}
