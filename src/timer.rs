//! Deferred confirmation timers.
//!
//! One cancellable task per order. When the grace window elapses the task first
//! claims its entry, then runs its callback. Cancelling removes the entry and aborts
//! the task, so a callback either runs to completion or never starts.

use crate::model::OrderId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct DeferredTimers {
    entries: Arc<Mutex<HashMap<OrderId, AbortHandle>>>,
}

impl DeferredTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `callback` after `delay` unless cancelled first.
    ///
    /// Scheduling again for the same id replaces the earlier timer.
    pub async fn schedule<F>(&self, id: OrderId, delay: Duration, callback: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let entries = Arc::clone(&self.entries);
        // Held across the spawn so the task cannot claim before it is registered
        let mut guard = self.entries.lock().await;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if entries.lock().await.remove(&id).is_none() {
                return;
            }
            debug!(order_id = %id, "Grace window elapsed");
            callback.await;
        });

        if let Some(previous) = guard.insert(id, handle.abort_handle()) {
            previous.abort();
        }
        debug!(order_id = %id, delay_ms = delay.as_millis() as u64, "Timer scheduled");
    }

    /// Cancels the pending timer for `id`. Returns `false` if none was pending.
    pub async fn cancel(&self, id: OrderId) -> bool {
        match self.entries.lock().await.remove(&id) {
            Some(handle) => {
                handle.abort();
                debug!(order_id = %id, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancels every pending timer and returns how many there were.
    pub async fn cancel_all(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        for (_, handle) in entries.drain() {
            handle.abort();
        }
        count
    }

    pub async fn is_pending(&self, id: OrderId) -> bool {
        self.entries.lock().await.contains_key(&id)
    }

    pub async fn pending(&self) -> usize {
        self.entries.lock().await.len()
    }
}
