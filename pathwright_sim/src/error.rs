// Error types for mesh loading, route planning, and configuration.
//
// Nothing in the per-tick path is fatal. Lookups that can simply miss return
// `Option`; operations whose failure the caller must react to (building a
// mesh, planning a route, loading a config) return these errors so the
// reason can be logged. The navigator's reaction to every `PlanError` is the
// same: leave the route cleared and try again next tick.

use crate::types::AreaId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("area id 0 is reserved and cannot name an area")]
    ZeroAreaId,
    #[error("duplicate area id {id}")]
    DuplicateAreaId { id: AreaId },
    #[error("area {from} connects to unknown area {to}")]
    DanglingConnection { from: AreaId, to: AreaId },
    #[error("invalid mesh json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("route endpoints must be non-zero (start {start}, goal {goal})")]
    InvalidEndpoint { start: AreaId, goal: AreaId },
    #[error("area {id} is not in the loaded mesh")]
    UnknownArea { id: AreaId },
    #[error("no path from {start} to {goal}")]
    NoPath { start: AreaId, goal: AreaId },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}
