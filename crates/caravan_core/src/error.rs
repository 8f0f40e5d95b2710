use jiff::civil::Date;
use thiserror::Error;

use crate::id::{DriverId, OrderId, RunId, VehicleId, ZoneId};

pub type DispatchResult<T> = Result<T, DispatchError>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("zone not found: {0}")]
    ZoneNotFound(ZoneId),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("run not found: {0}")]
    RunNotFound(RunId),

    #[error("driver not found: {0}")]
    DriverNotFound(DriverId),

    #[error("vehicle not found: {0}")]
    VehicleNotFound(VehicleId),

    #[error("run {0} is no longer a draft and cannot be modified")]
    RunFinalized(RunId),

    #[error("run {run} cannot be finalized: {reason}")]
    CannotFinalize { run: RunId, reason: String },

    #[error("run {0} is already finalized")]
    AlreadyFinalized(RunId),

    #[error("driver {0} is not available")]
    DriverUnavailable(DriverId),

    #[error("vehicle {0} is not active")]
    VehicleInactive(VehicleId),

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("resource conflict: {0}")]
    ResourceConflict(String),

    #[error("order {order} is not assigned to run {run}")]
    OrderNotInRun { order: OrderId, run: RunId },

    #[error("order {order} already belongs to run {run}")]
    OrderAlreadyAssigned { order: OrderId, run: RunId },

    #[error("stop sequence mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    SequenceMismatch {
        missing: Vec<OrderId>,
        unexpected: Vec<OrderId>,
    },

    #[error("no active zones for {0}")]
    NoActiveZones(Date),

    #[error("optimization returned no routes")]
    EmptySolution,

    #[error("optimization provider failure: {0}")]
    Provider(String),
}
