use thiserror::Error;

use crate::optimization::{OptimizationRequest, OptimizationSolution};

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// External route-optimization provider. The dispatch core only prepares
/// input for and applies output from implementations of this trait.
pub trait RouteOptimizer: Send + Sync {
    fn optimize(
        &self,
        request: &OptimizationRequest,
    ) -> impl Future<Output = Result<OptimizationSolution, OptimizerError>> + Send;
}
