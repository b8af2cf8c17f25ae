//! Top-level error type of the dispatch service.

use crate::assignment::AssignmentError;
use crate::courier_actor::CourierError;
use crate::graph::{GraphError, GraphLoadError};
use crate::lifecycle::ConfigError;
use crate::model::OrderValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    GraphLoad(#[from] GraphLoadError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Invalid order: {0}")]
    Validation(#[from] OrderValidationError),

    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    #[error("Courier registration failed: {0}")]
    Registration(#[from] CourierError),

    /// A blocking routing task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Actor for courier {courier} failed: {reason}")]
    ActorFailed { courier: String, reason: String },
}
