//! # Order Lifecycle Engine
//!
//! > **Coordinates a marketplace food order from payment to doorstep.**
//!
//! Every order is owned by its own actor. The actor validates each requested
//! transition against the status graph, applies it together with its timeline entry,
//! writes the result through to the store and only then lets it become visible.
//! After each commit a declarative rule table decides who is told about it.
//!
//! ## 🚀 Core Concepts
//!
//! ### One actor per order
//! [`EntityActor<T>`](framework::EntityActor) is generic over an
//! [`ActorEntity`](framework::ActorEntity). `Order` implements it, so the message loop,
//! the draft-then-commit step and the error plumbing are written once. Requests for
//! one order are processed strictly in arrival order; different orders never wait on
//! each other.
//!
//! ### The grace window
//! A freshly placed order can be cancelled for free for a short window. A
//! [`DeferredTimers`](timer::DeferredTimers) task sends the order to the chef when
//! the window closes. An explicit early confirm can race it; whichever reaches the
//! actor first wins and the other is a no-op.
//!
//! ### Notifications as data
//! Who hears about a transition is the table in [`notifications::rules`], not code
//! spread across handlers.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: Separates the *business logic* (the aggregate) from the *plumbing*
//!   (mailboxes, draft commits, registry).
//! - **Key items**: [`ActorEntity`](framework::ActorEntity), [`EntityActor`](framework::EntityActor),
//!   [`ActorRegistry`](framework::ActorRegistry).
//!
//! ### 2. The Domain ([`model`], [`order_actor`], [`policy`])
//! - **Role**: The order aggregate, its transitions and the cancellation policy.
//!
//! ### 3. The API ([`engine`], [`clients`])
//! - **Key items**: [`OrderEngine`](engine::OrderEngine), [`OrderClient`](clients::OrderClient).
//!
//! ### 4. Collaborators ([`store`], [`directory`], [`notifications`], [`timer`], [`clock`])
//!
//! ### 5. The Orchestrator ([`lifecycle`], [`config`])
//! - **Key items**: [`OrderSystem`](lifecycle::OrderSystem), [`setup_tracing`](lifecycle::tracing::setup_tracing).
//!
//! ## Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod clients;
pub mod clock;
pub mod config;
pub mod directory;
pub mod engine;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod notifications;
pub mod order_actor;
pub mod policy;
pub mod store;
pub mod timer;
