pub mod assignment;
pub mod auto_assign;
pub mod balance;
pub mod capacity;
pub mod finalize;
pub mod run_builder;
pub mod zone_resolver;

pub use assignment::{AssignmentOutcome, BulkAssignReport, ResourceAssigner, RunAssignment};
pub use auto_assign::{AutoAssignReport, ZoneAssigner, ZoneAssignment};
pub use balance::{
    BalanceStatus, RebalanceMove, RebalanceReport, ZoneBalance, ZoneBalanceReport, ZoneBalancer,
};
pub use capacity::check_vehicle_capacity;
pub use finalize::{FinalizeAllReport, FinalizeOutcome, Finalizer, RunFailure};
pub use run_builder::{CreatedRun, DraftRunReport, RunBuilder};
pub use zone_resolver::{active_zones, nearest_zone};
