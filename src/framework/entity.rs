//! # ActorEntity Trait
//!
//! The `ActorEntity` trait is the contract an aggregate must satisfy to be owned by an
//! [`EntityActor`](super::EntityActor). It names the id, creation DTO, action and
//! context types, and provides the lifecycle hooks the actor calls:
//!
//! - [`ActorEntity::from_create_params`] builds and validates a new aggregate.
//! - [`ActorEntity::on_create`] runs once before the aggregate is first committed.
//! - [`ActorEntity::handle_action`] applies one domain action to a draft copy.
//! - [`ActorEntity::on_commit`] persists a draft before it replaces the live state.
//!
//! # Provided Methods (Hooks)
//! `on_create`, `on_commit` and `mutates` have default implementations. You do **not**
//! need to implement them unless you want to customize behavior.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any aggregate must implement to be owned by an `EntityActor`.
///
/// # Async & Context
/// This trait is `#[async_trait]` so hooks can await (e.g., writing to a store).
/// The `Context` type is injected into every hook when the actor is started, which
/// keeps dependencies out of the aggregate itself ("late binding").
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// The data required to create a new instance (DTO - Data Transfer Object).
    type Create: Send + Sync + Debug;

    /// Enum representing the domain operations the aggregate accepts.
    type Action: Send + Sync + Debug;

    /// The result type returned by actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Shared by every actor of the same entity type, so it must be cheap to clone.
    type Context: Clone + Send + Sync + 'static;

    /// The error type for this entity.
    ///
    /// One error enum covers every action of the aggregate; callers match on it directly.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the id and payload.
    /// This is called before `on_create`; it is where input validation belongs.
    fn from_create_params(
        id: Self::Id,
        params: Self::Create,
        ctx: &Self::Context,
    ) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks (Async) ---

    /// Called once after construction and before the first commit.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Apply an action to `self`.
    ///
    /// The actor always calls this on a draft clone of the live state. Returning an
    /// error discards the draft, so a handler may bail out halfway with `?`.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;

    /// Called with the finished draft before it becomes the live state.
    /// An error here also discards the draft.
    async fn on_commit(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Whether a successful action result changed the aggregate.
    /// Results that report a no-op skip `on_commit`.
    fn mutates(_result: &Self::ActionResult) -> bool {
        true
    }
}
