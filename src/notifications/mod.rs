//! Notification fan-out.
//!
//! Each committed transition is turned into zero or more [`Notification`]s by the
//! rule table in [`rules`]. The [`NotificationDispatcher`] records every message in
//! an in-process per-recipient log and then hands it to the external
//! [`NotificationTransport`] on a background task.

pub mod rules;

pub use rules::{plan, NotificationTrigger};

use crate::model::{ChefId, CustomerId, Money, OrderId, OrderStatus, PartnerId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Who a message is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    Customer(CustomerId),
    Chef(ChefId),
    DeliveryPartner(PartnerId),
}

impl Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::Customer(id) => write!(f, "customer:{id}"),
            Recipient::Chef(id) => write!(f, "chef:{id}"),
            Recipient::DeliveryPartner(id) => write!(f, "delivery_partner:{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewOrder,
    SentToChef,
    OrderAccepted,
    DeliveryOpportunity,
    StatusUpdate,
    DeliveryAssigned,
    Delivered,
    OrderCancelled,
    CancellationCompensation,
    TipReceived,
    TipConfirmed,
}

/// Structured part of a message, for clients that render their own UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub order_id: OrderId,
    pub kind: NotificationKind,
    pub status: OrderStatus,
    /// Tip amount, penalty or compensation, depending on `kind`.
    pub amount: Option<Money>,
    pub refund: Option<Money>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub title: String,
    pub body: String,
    pub payload: NotificationPayload,
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Recipient {0} is unreachable")]
    Unreachable(String),
    #[error("Transport failure: {0}")]
    Failed(String),
}

/// Delivers a single message to push, SMS or an inbox.
///
/// Deduplication and retries are the transport's concern.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), TransportError>;
}

/// Transport that only logs. The default when no real transport is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTransport;

#[async_trait]
impl NotificationTransport for TracingTransport {
    async fn notify(&self, notification: &Notification) -> Result<(), TransportError> {
        info!(
            recipient = %notification.recipient,
            order_id = %notification.payload.order_id,
            title = %notification.title,
            "Notify"
        );
        Ok(())
    }
}

pub struct NotificationDispatcher {
    transport: Arc<dyn NotificationTransport>,
    log: RwLock<HashMap<Recipient, Vec<Notification>>>,
    in_flight: Arc<Semaphore>,
    deliveries: Mutex<Vec<JoinHandle<()>>>,
}

impl NotificationDispatcher {
    /// `max_in_flight` bounds how many transport calls run at once.
    pub fn new(transport: Arc<dyn NotificationTransport>, max_in_flight: usize) -> Self {
        Self {
            transport,
            log: RwLock::new(HashMap::new()),
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    /// Logs every message, then starts delivering them in the background.
    ///
    /// Returns once the log is updated. Delivery failures are logged and dropped.
    pub async fn dispatch(&self, notifications: Vec<Notification>) {
        if notifications.is_empty() {
            return;
        }

        {
            let mut log = self.log.write().await;
            for notification in &notifications {
                log.entry(notification.recipient.clone())
                    .or_default()
                    .push(notification.clone());
            }
        }

        let mut deliveries = self.deliveries.lock().await;
        deliveries.retain(|handle| !handle.is_finished());

        for notification in notifications {
            let transport = Arc::clone(&self.transport);
            let in_flight = Arc::clone(&self.in_flight);
            deliveries.push(tokio::spawn(async move {
                let Ok(_permit) = in_flight.acquire_owned().await else {
                    return;
                };
                match transport.notify(&notification).await {
                    Ok(()) => debug!(recipient = %notification.recipient, "Delivered"),
                    Err(e) => warn!(
                        recipient = %notification.recipient,
                        order_id = %notification.payload.order_id,
                        error = %e,
                        "Notification delivery failed"
                    ),
                }
            }));
        }
    }

    /// Every message ever addressed to `recipient`, oldest first.
    pub async fn log_for(&self, recipient: &Recipient) -> Vec<Notification> {
        self.log
            .read()
            .await
            .get(recipient)
            .cloned()
            .unwrap_or_default()
    }

    /// Waits until every delivery started so far has finished.
    pub async fn flush(&self) {
        let pending = std::mem::take(&mut *self.deliveries.lock().await);
        for handle in pending {
            if let Err(e) = handle.await {
                warn!(error = %e, "Notification task failed");
            }
        }
    }
}
