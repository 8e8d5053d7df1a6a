//! In-memory order store.
//!
//! Nothing survives a restart. Listings are returned in ascending id order, which is
//! also placement order.

use super::{OrderStore, StoreError};
use crate::model::{ChefId, CustomerId, Order, OrderId, PartnerId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn list_where(&self, predicate: impl Fn(&Order) -> bool) -> Vec<Order> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders.values().filter(|o| predicate(o)).cloned().collect();
        matching.sort_by_key(|o| o.id);
        matching
    }
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
        let orders = self.orders.read().await;
        orders.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn put(&self, order: Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order);
        Ok(())
    }

    async fn list_by_chef(&self, chef_id: &ChefId) -> Result<Vec<Order>, StoreError> {
        Ok(self.list_where(|o| &o.chef_id == chef_id).await)
    }

    async fn list_by_delivery_partner(&self, partner_id: &PartnerId) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .list_where(|o| o.delivery_partner_id.as_ref() == Some(partner_id))
            .await)
    }

    async fn list_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>, StoreError> {
        Ok(self.list_where(|o| &o.customer_id == customer_id).await)
    }
}
