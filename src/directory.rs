//! Delivery partner directory.
//!
//! A lookup of known couriers and their current availability. Seeded from
//! configuration at startup; availability can be flipped at runtime.

use crate::model::{DeliveryPartner, PartnerId};
use crate::order_actor::OrderError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct PartnerDirectory {
    partners: Arc<RwLock<HashMap<PartnerId, DeliveryPartner>>>,
}

impl PartnerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a directory from a known list. Later entries replace earlier ones with the same id.
    pub fn with_partners(partners: impl IntoIterator<Item = DeliveryPartner>) -> Self {
        let partners = partners
            .into_iter()
            .map(|partner| (partner.id.clone(), partner))
            .collect();
        Self {
            partners: Arc::new(RwLock::new(partners)),
        }
    }

    /// Adds or replaces a partner.
    pub async fn register(&self, partner: DeliveryPartner) {
        info!(partner_id = %partner.id, available = partner.is_available, "Registering delivery partner");
        self.partners.write().await.insert(partner.id.clone(), partner);
    }

    pub async fn set_availability(&self, id: &PartnerId, is_available: bool) -> Result<(), OrderError> {
        let mut partners = self.partners.write().await;
        let partner = partners
            .get_mut(id)
            .ok_or_else(|| OrderError::PartnerNotFound(id.clone()))?;
        partner.is_available = is_available;
        debug!(partner_id = %id, is_available, "Availability updated");
        Ok(())
    }

    pub async fn get(&self, id: &PartnerId) -> Option<DeliveryPartner> {
        self.partners.read().await.get(id).cloned()
    }

    /// Partners currently accepting work, ordered by id.
    pub async fn available(&self) -> Vec<DeliveryPartner> {
        let partners = self.partners.read().await;
        let mut available: Vec<DeliveryPartner> =
            partners.values().filter(|p| p.is_available).cloned().collect();
        available.sort_by(|a, b| a.id.cmp(&b.id));
        available
    }
}
