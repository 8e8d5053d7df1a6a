//! Generic actor framework for single-writer aggregates.
//!
//! Every aggregate instance (one order, say) is owned by its own [`EntityActor`]
//! running in a dedicated Tokio task. The actor processes its mailbox one message
//! at a time, so two mutations of the same aggregate can never interleave, while
//! different aggregates progress fully in parallel.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that aggregate types implement to be owned by an actor
//! - [`EntityActor`] - The task that owns one aggregate and serializes its mutations
//! - [`EntityClient`] - Cloneable handle used to send requests to one actor
//! - [`ActorRegistry`] - Creates aggregates, spawns their actors and routes by id
//! - [`FrameworkError`] - Plumbing errors (closed mailbox, dropped reply, entity error)
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test clients without spawning full actors.

pub mod actor;
pub mod client;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod registry;

// Re-export core types for convenience
pub use actor::EntityActor;
pub use client::EntityClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{EntityRequest, Response};
pub use registry::ActorRegistry;
