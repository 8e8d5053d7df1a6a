//! # Generic Messages
//!
//! Message types exchanged between an [`EntityClient`](super::EntityClient) and the
//! [`EntityActor`](super::EntityActor) that owns one aggregate.

use crate::framework::entity::ActorEntity;
use crate::framework::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T, E> = oneshot::Sender<Result<T, FrameworkError<E>>>;

/// Request sent to the actor owning one aggregate.
///
/// - **Get**: Returns a snapshot of the live state, ordered after every earlier request.
/// - **Action**: Applies an [`ActorEntity::Action`] atomically.
#[derive(Debug)]
pub enum EntityRequest<T: ActorEntity> {
    Get {
        respond_to: Response<T, T::Error>,
    },
    Action {
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
}
