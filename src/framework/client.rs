//! # Generic Client
//!
//! The handle used to talk to one [`EntityActor`](super::EntityActor).

use crate::framework::entity::ActorEntity;
use crate::framework::error::FrameworkError;
use crate::framework::message::EntityRequest;
use tokio::sync::{mpsc, oneshot};

/// A type-safe client for interacting with an `EntityActor`.
///
/// * **Cloneable** – holds only a sender, so cloning is inexpensive.
/// * **Ordered** – requests from one client reach the actor in the order they were sent.
pub struct EntityClient<T: ActorEntity> {
    sender: mpsc::Sender<EntityRequest<T>>,
}

impl<T: ActorEntity> Clone for EntityClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: ActorEntity> EntityClient<T> {
    pub fn new(sender: mpsc::Sender<EntityRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn get(&self) -> Result<T, FrameworkError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(EntityRequest::Get { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn perform_action(
        &self,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(EntityRequest::Action { action, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }
}
