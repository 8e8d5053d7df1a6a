//! Order persistence.
//!
//! Actors write every committed order through [`OrderStore::put`]; queries read the
//! store directly and never wait on an actor's mailbox.

pub mod memory;

pub use memory::MemoryOrderStore;

use crate::model::{ChefId, CustomerId, Order, OrderId, PartnerId};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Order {0} not found in store")]
    NotFound(OrderId),
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Storage for committed order snapshots.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, id: OrderId) -> Result<Order, StoreError>;

    /// Inserts or replaces the snapshot for `order.id`.
    async fn put(&self, order: Order) -> Result<(), StoreError>;

    async fn list_by_chef(&self, chef_id: &ChefId) -> Result<Vec<Order>, StoreError>;

    async fn list_by_delivery_partner(&self, partner_id: &PartnerId) -> Result<Vec<Order>, StoreError>;

    async fn list_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>, StoreError>;
}
