//! # System Lifecycle & Orchestration
//!
//! Starting the engine means wiring a handful of shared pieces together: the
//! order store, the clock, the cancellation policy, the partner directory, the
//! notification dispatcher and the actor registry. [`OrderSystem`] does that wiring
//! once, from an [`EngineConfig`](crate::config::EngineConfig), and owns the
//! shutdown sequence.
//!
//! ```rust,ignore
//! let system = OrderSystem::builder(EngineConfig::default()).build()?;
//! let id = system.engine.place_order(params).await?;
//! system.shutdown().await?;
//! ```
//!
//! Tests swap in their own store, transport or clock through the builder.

pub mod order_system;
pub mod tracing;

pub use order_system::*;
