//! # Framework Errors
//!
//! Errors raised by the actor plumbing itself. Domain failures travel inside
//! [`FrameworkError::EntityError`] with their original type, so clients can hand
//! them back to callers unchanged.

/// Errors that can occur within the actor framework.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError<E> {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Entity error: {0}")]
    EntityError(E),
}
