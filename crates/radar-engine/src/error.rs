//! Engine error types.

use radar_core::{GridError, TargetError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("pathfinding has not been started")]
    NotStarted,
    #[error("route search failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for RouteError {
    fn from(err: tokio::task::JoinError) -> Self {
        RouteError::Worker(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AreaError {
    #[error("invalid walkability grid: {0}")]
    Grid(#[from] GridError),
    #[error(transparent)]
    Targets(#[from] TargetError),
}
