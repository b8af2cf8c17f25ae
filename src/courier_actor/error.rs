//! Error types for the Courier actor.

use crate::model::CustomerId;
use thiserror::Error;

/// Errors that can occur during courier operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CourierError {
    /// A courier must be able to carry at least one order.
    #[error("Batch capacity must be at least 1")]
    InvalidCapacity,

    #[error("Rating {0} is out of range (1-5)")]
    RatingOutOfRange(u8),

    /// Only delivered orders can be rated.
    #[error("Order for {0} has not been delivered yet")]
    NotDelivered(CustomerId),

    #[error("Courier has no order for {0}")]
    UnknownOrder(CustomerId),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for CourierError {
    fn from(msg: String) -> Self {
        CourierError::ActorCommunicationError(msg)
    }
}
