//! # Entity Actor
//!
//! The `EntityActor` is the server half of one aggregate. It owns the live state and
//! the receiving end of the mailbox, and applies requests strictly one at a time.

use crate::framework::client::EntityClient;
use crate::framework::entity::ActorEntity;
use crate::framework::error::FrameworkError;
use crate::framework::message::EntityRequest;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The actor that owns a single aggregate.
///
/// **Concurrency Model**:
/// One actor per aggregate, each in its own Tokio task. Messages for the same
/// aggregate are processed sequentially, so its state needs no lock. Actors for
/// different aggregates share nothing and run in parallel.
///
/// # Atomic actions
///
/// Every action is applied to a draft clone of the live state:
///
/// 1. Clone the live state.
/// 2. Call [`ActorEntity::handle_action`] on the draft.
/// 3. If the result [`mutates`](ActorEntity::mutates) the aggregate, call
///    [`ActorEntity::on_commit`] on the draft.
/// 4. Swap the draft in and reply.
///
/// Any error in steps 2-3 drops the draft, leaving the live state untouched.
pub struct EntityActor<T: ActorEntity> {
    id: T::Id,
    entity: T,
    receiver: mpsc::Receiver<EntityRequest<T>>,
}

impl<T: ActorEntity> EntityActor<T> {
    /// Creates an actor owning `entity` and the client that feeds its mailbox.
    ///
    /// `buffer_size` is the mailbox capacity; senders wait when it is full.
    pub fn new(id: T::Id, entity: T, buffer_size: usize) -> (Self, EntityClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            id,
            entity,
            receiver,
        };
        (actor, EntityClient::new(sender))
    }

    /// Runs the actor's event loop until every client has been dropped.
    pub async fn run(mut self, context: T::Context) {
        // Extract just the type name (e.g., "Order" instead of "order_lifecycle::model::order::Order")
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        let id = self.id.clone();
        debug!(entity_type, %id, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                EntityRequest::Get { respond_to } => {
                    debug!(entity_type, %id, "Get");
                    let _ = respond_to.send(Ok(self.entity.clone()));
                }
                EntityRequest::Action { action, respond_to } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let mut draft = self.entity.clone();
                    let result = match draft.handle_action(action, &context).await {
                        Ok(result) if T::mutates(&result) => match draft.on_commit(&context).await {
                            Ok(()) => {
                                self.entity = draft;
                                info!(entity_type, %id, "Action committed");
                                Ok(result)
                            }
                            Err(e) => {
                                warn!(entity_type, %id, error = %e, "Commit failed");
                                Err(FrameworkError::EntityError(e))
                            }
                        },
                        Ok(result) => {
                            debug!(entity_type, %id, "Action left state unchanged");
                            Ok(result)
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Action rejected");
                            Err(FrameworkError::EntityError(e))
                        }
                    };
                    let _ = respond_to.send(result);
                }
            }
        }

        debug!(entity_type, %id, "Shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    // --- Domain Definition ---

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        id: u32,
        value: u32,
        limit: u32,
    }

    #[derive(Debug)]
    struct CounterCreate {
        limit: u32,
    }

    #[derive(Debug)]
    enum CounterAction {
        Add(u32),
        Peek,
    }

    #[derive(Debug, thiserror::Error, PartialEq)]
    #[error("limit exceeded")]
    struct LimitExceeded;

    #[async_trait]
    impl ActorEntity for Counter {
        type Id = u32;
        type Create = CounterCreate;
        type Action = CounterAction;
        type ActionResult = Option<u32>;
        type Context = ();
        type Error = LimitExceeded;

        fn from_create_params(id: u32, params: CounterCreate, _: &()) -> Result<Self, Self::Error> {
            Ok(Self {
                id,
                value: 0,
                limit: params.limit,
            })
        }

        async fn handle_action(
            &mut self,
            action: CounterAction,
            _ctx: &(),
        ) -> Result<Option<u32>, Self::Error> {
            match action {
                CounterAction::Add(n) => {
                    // Mutate first, then validate: the draft must be discarded on error.
                    self.value += n;
                    if self.value > self.limit {
                        return Err(LimitExceeded);
                    }
                    Ok(Some(self.value))
                }
                CounterAction::Peek => Ok(None),
            }
        }

        fn mutates(result: &Option<u32>) -> bool {
            result.is_some()
        }
    }

    #[tokio::test]
    async fn test_actions_apply_in_order() {
        let (actor, client) = EntityActor::new(1, Counter { id: 1, value: 0, limit: 10 }, 8);
        let handle = tokio::spawn(actor.run(()));

        assert_eq!(client.perform_action(CounterAction::Add(3)).await.unwrap(), Some(3));
        assert_eq!(client.perform_action(CounterAction::Add(4)).await.unwrap(), Some(7));
        assert_eq!(client.perform_action(CounterAction::Peek).await.unwrap(), None);
        assert_eq!(client.get().await.unwrap().value, 7);

        drop(client);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_action_leaves_state_untouched() {
        let (actor, client) = EntityActor::new(1, Counter { id: 1, value: 0, limit: 5 }, 8);
        tokio::spawn(actor.run(()));

        client.perform_action(CounterAction::Add(4)).await.unwrap();
        let err = client.perform_action(CounterAction::Add(4)).await.unwrap_err();
        assert!(matches!(err, FrameworkError::EntityError(LimitExceeded)));

        let counter = client.get().await.unwrap();
        assert_eq!(counter.value, 4);
    }

    #[tokio::test]
    async fn test_closed_actor_reports_closed() {
        let (actor, client) = EntityActor::new(1, Counter { id: 1, value: 0, limit: 5 }, 8);
        drop(actor);

        let err = client.get().await.unwrap_err();
        assert!(matches!(err, FrameworkError::ActorClosed));
    }
}
