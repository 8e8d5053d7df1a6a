//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG`.
//!
//! ```bash
//! # Lifecycle events only
//! RUST_LOG=info cargo run
//!
//! # Every request, commit and notification
//! RUST_LOG=debug cargo run
//!
//! # Just the actors
//! RUST_LOG=order_lifecycle::framework=debug cargo run
//! ```
//!
//! ## What Gets Traced
//!
//! - **Actors**: start, each request, commits, rejected actions, shutdown
//! - **Engine**: one span per public operation, carrying the order id
//! - **Timers**: scheduling, cancellation and firing
//! - **Notifications**: planned count per commit and transport failures
//!
//! A placement followed by the grace window elapsing looks like this at `info`:
//!
//! ```text
//! INFO place_order: Created entity_type="Order" id=order_1 size=1
//! INFO place_order: Order placed order_id=order_1 total=500.00 can_cancel_free=true
//! INFO send_to_chef: Order sent to chef order_id=order_1
//! INFO Grace window closed, order sent to chef order_id=order_1
//! ```

/// Installs the global subscriber. Call once, at startup.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
