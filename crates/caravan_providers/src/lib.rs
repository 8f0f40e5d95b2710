pub mod crow_flies;
pub mod notifier;
pub mod optimization;
pub mod route_optimizer;
pub mod vroom;

pub use crow_flies::CrowFliesOptimizer;
pub use notifier::{NoopNotifier, NotificationDispatch};
pub use optimization::{
    OptimizationRequest, OptimizationSolution, OptimizationStop, OptimizationVehicle,
    OptimizedRoute, RouteStep, StepKind,
};
pub use route_optimizer::{OptimizerError, RouteOptimizer};
pub use vroom::{VroomClient, VroomClientParams};
