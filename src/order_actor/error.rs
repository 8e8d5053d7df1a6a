//! Error types for the Order actor.

use crate::framework::FrameworkError;
use crate::model::{OrderId, OrderStatus, PartnerId};
use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur during order operations.
///
/// Every variant is returned synchronously and leaves the order untouched.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The operation is not legal from the order's current status.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The requested order was not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The delivery partner is not in the directory.
    #[error("Delivery partner not found: {0}")]
    PartnerNotFound(PartnerId),

    /// The tip recipient does not exist on this order.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The input provided is malformed.
    #[error("Order validation error: {0}")]
    ValidationError(String),

    /// The order store rejected a read or write.
    #[error("Order storage error: {0}")]
    Storage(String),

    /// The order's actor is gone (system shutting down).
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError<OrderError>> for OrderError {
    fn from(e: FrameworkError<OrderError>) -> Self {
        match e {
            FrameworkError::EntityError(inner) => inner,
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        OrderError::Storage(e.to_string())
    }
}
