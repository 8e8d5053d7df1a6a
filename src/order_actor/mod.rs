//! Order-specific actor logic and entity implementation.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clock::Clock;
use crate::framework::ActorRegistry;
use crate::model::{Order, OrderId};
use crate::policy::CancellationPolicy;
use crate::store::OrderStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Dependencies shared by every order actor.
pub struct OrderContext {
    pub policy: CancellationPolicy,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn OrderStore>,
}

impl std::fmt::Debug for OrderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderContext")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Creates the registry that spawns one actor per placed order.
///
/// Ids are allocated from a process-local counter starting at 1.
pub fn new(mailbox_capacity: usize) -> ActorRegistry<Order> {
    let order_id_counter = Arc::new(AtomicU64::new(1));
    let next_order_id = move || OrderId(order_id_counter.fetch_add(1, Ordering::SeqCst));

    ActorRegistry::new(mailbox_capacity, next_order_id)
}
