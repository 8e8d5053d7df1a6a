//! # Actor Registry
//!
//! Creates aggregates, spawns one [`EntityActor`] per aggregate and routes requests
//! to the right mailbox by id.
//!
//! The registry lock only guards the id → client map. It is held for a lookup or an
//! insert, never while an actor processes a message, so it does not serialize work
//! across aggregates.
//!
//! Aggregates that will rarely be touched again can be [retired](ActorRegistry::retire):
//! the registry drops its client, the actor exits once the last outstanding client is
//! gone, and [`restore`](ActorRegistry::restore) restarts it from storage on demand.

use crate::framework::actor::EntityActor;
use crate::framework::client::EntityClient;
use crate::framework::entity::ActorEntity;
use crate::framework::error::FrameworkError;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::{Mutex, RwLock};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

/// Owns the clients and task handles of the live actors of one entity type.
///
/// Only live actors are kept. Memory grows with the number of aggregates that have
/// not been retired, not with the number ever created.
pub struct ActorRegistry<T: ActorEntity> {
    actors: RwLock<HashMap<T::Id, EntityClient<T>>>,
    handles: Mutex<HashMap<T::Id, JoinHandle<()>>>,
    restoring: Mutex<()>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
    buffer_size: usize,
}

impl<T: ActorEntity> ActorRegistry<T> {
    /// Creates an empty registry.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - Mailbox capacity of every spawned actor.
    /// * `next_id_fn` - Id generator; must never return the same id twice.
    pub fn new(buffer_size: usize, next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static) -> Self {
        Self {
            actors: RwLock::new(HashMap::new()),
            handles: Mutex::new(HashMap::new()),
            restoring: Mutex::new(()),
            next_id_fn: Box::new(next_id_fn),
            buffer_size,
        }
    }

    /// Creates a new aggregate and starts its actor.
    ///
    /// Runs `from_create_params`, `on_create` and `on_commit` before the actor is
    /// spawned. If any of them fails, nothing is registered.
    pub async fn create(
        &self,
        params: T::Create,
        context: T::Context,
    ) -> Result<(T::Id, T), FrameworkError<T::Error>> {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        debug!(entity_type, ?params, "Create");

        let id = (self.next_id_fn)();
        let mut entity = T::from_create_params(id.clone(), params, &context).map_err(|e| {
            warn!(entity_type, error = %e, "Create failed");
            FrameworkError::EntityError(e)
        })?;
        entity
            .on_create(&context)
            .await
            .map_err(FrameworkError::EntityError)?;
        entity
            .on_commit(&context)
            .await
            .map_err(FrameworkError::EntityError)?;

        let size = self.spawn(id.clone(), entity.clone(), context).await;
        info!(entity_type, %id, size, "Created");
        Ok((id, entity))
    }

    /// Returns the client for `id` if its actor is live.
    pub async fn client(&self, id: &T::Id) -> Option<EntityClient<T>> {
        self.actors.read().await.get(id).cloned()
    }

    /// Drops the registry's client for `id`.
    ///
    /// The actor keeps serving clients that are already out and exits once they are
    /// dropped. Returns `false` if `id` was not live.
    pub async fn retire(&self, id: &T::Id) -> bool {
        let retired = self.actors.write().await.remove(id).is_some();
        if retired {
            // Actors retired earlier have usually exited by now
            self.handles
                .lock()
                .await
                .retain(|_, handle| !handle.is_finished());
            debug!(%id, "Retired");
        }
        retired
    }

    /// Returns the client for `id`, restarting a retired actor from `load` if needed.
    ///
    /// A retired actor still draining its mailbox is awaited before `load` runs, so
    /// the restored actor starts from its last commit. Returns `Ok(None)` when `load`
    /// finds nothing.
    pub async fn restore<F, Fut>(
        &self,
        id: &T::Id,
        context: T::Context,
        load: F,
    ) -> Result<Option<EntityClient<T>>, FrameworkError<T::Error>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, T::Error>>,
    {
        let _restoring = self.restoring.lock().await;
        if let Some(client) = self.client(id).await {
            return Ok(Some(client));
        }

        let previous = self.handles.lock().await.remove(id);
        if let Some(previous) = previous {
            if let Err(e) = previous.await {
                warn!(%id, error = %e, "Retired actor did not exit cleanly");
            }
        }

        let Some(entity) = load().await.map_err(FrameworkError::EntityError)? else {
            return Ok(None);
        };
        let size = self.spawn(id.clone(), entity, context).await;
        info!(%id, size, "Restored");
        Ok(self.client(id).await)
    }

    async fn spawn(&self, id: T::Id, entity: T, context: T::Context) -> usize {
        let (actor, client) = EntityActor::new(id.clone(), entity, self.buffer_size);
        let handle = tokio::spawn(actor.run(context));

        let size = {
            let mut actors = self.actors.write().await;
            actors.insert(id.clone(), client);
            actors.len()
        };
        self.handles.lock().await.insert(id, handle);
        size
    }

    /// Number of live actors.
    pub async fn len(&self) -> usize {
        self.actors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.actors.read().await.is_empty()
    }

    /// Closes every mailbox and waits for the actor tasks to finish.
    ///
    /// Actors drain messages already queued before they exit. Clients cloned out of
    /// the registry keep their actor alive until they are dropped.
    pub async fn shutdown(&self) -> Result<(), JoinError> {
        let drained = {
            let mut actors = self.actors.write().await;
            let drained = actors.len();
            actors.clear();
            drained
        };
        let handles = std::mem::take(&mut *self.handles.lock().await);
        info!(actors = drained, "Closing actor mailboxes");

        for handle in handles.into_values() {
            handle.await?;
        }
        Ok(())
    }
}
