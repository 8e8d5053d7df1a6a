//! Type-safe wrappers around [`EntityClient`](crate::framework::EntityClient).

pub mod order_client;

pub use order_client::*;
