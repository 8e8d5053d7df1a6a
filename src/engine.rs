//! # Order Engine
//!
//! The public API of the crate. Every mutating call is routed to the order's own
//! actor, so operations on one order are applied one at a time while different
//! orders proceed in parallel. Reads go straight to the store.
//!
//! After an action commits, the engine evaluates the notification rules for it and
//! hands the messages to the dispatcher. Failed actions notify nobody. Each action and
//! its follow-up run on a task of their own, so a caller that times out or is
//! cancelled cannot leave a committed change without its notifications.
//!
//! Actors of delivered and cancelled orders are retired after their last commit and
//! restored from the store if a tip arrives later.

use crate::clients::OrderClient;
use crate::directory::PartnerDirectory;
use crate::framework::ActorRegistry;
use crate::model::{
    CancellationOutcome, ChefId, CustomerId, Money, Order, OrderId, OrderStatus, PartnerId,
    PlaceOrder, TipRecipient,
};
use crate::notifications::rules::{self, RuleContext};
use crate::notifications::{Notification, NotificationDispatcher, Recipient};
use crate::order_actor::{ActionOutcome, Committed, OrderContext, OrderError};
use crate::store::StoreError;
use crate::timer::DeferredTimers;
use std::future::Future;
use std::sync::{Arc, Weak};
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct OrderEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    registry: ActorRegistry<Order>,
    context: Arc<OrderContext>,
    directory: PartnerDirectory,
    dispatcher: NotificationDispatcher,
    timers: DeferredTimers,
}

impl OrderEngine {
    pub fn new(
        registry: ActorRegistry<Order>,
        context: Arc<OrderContext>,
        directory: PartnerDirectory,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                registry,
                context,
                directory,
                dispatcher,
                timers: DeferredTimers::new(),
            }),
        }
    }

    pub fn directory(&self) -> &PartnerDirectory {
        &self.inner.directory
    }

    /// Creates the order in `payment_confirmed` and starts its grace-window timer.
    ///
    /// No notification is sent for placement.
    #[instrument(skip(self, params), fields(customer_id = %params.customer_id, chef_id = %params.chef_id))]
    pub async fn place_order(&self, params: PlaceOrder) -> Result<OrderId, OrderError> {
        let engine = self.clone();
        // Creation and timer scheduling finish together even if the caller goes away
        tokio::spawn(async move { engine.create(params).await })
            .await
            .map_err(|e| OrderError::ActorCommunicationError(e.to_string()))?
    }

    /// Sends the order to the chef. Returns `false` when the order had already
    /// left `payment_confirmed`, which is not an error.
    #[instrument(skip(self))]
    pub async fn send_to_chef(&self, id: OrderId) -> Result<bool, OrderError> {
        let client = self.client(id).await?;
        let outcome = self
            .perform(client, move |client| async move { client.send_to_chef().await })
            .await?;
        Ok(matches!(outcome, ActionOutcome::Committed(_)))
    }

    #[instrument(skip(self))]
    pub async fn accept_order(&self, id: OrderId, estimated_minutes: u32) -> Result<Order, OrderError> {
        let client = self.client(id).await?;
        let outcome = self
            .perform(client, move |client| async move { client.accept(estimated_minutes).await })
            .await?;
        Ok(require(outcome, OrderStatus::ChefAccepted)?.order)
    }

    /// Attaches a partner from the directory and moves to `delivery_assigned`.
    ///
    /// Assigning a partner who is marked unavailable is allowed and logged.
    #[instrument(skip(self))]
    pub async fn assign_delivery_partner(
        &self,
        id: OrderId,
        partner_id: PartnerId,
    ) -> Result<Order, OrderError> {
        let client = self.client(id).await?;
        let partner = self
            .inner
            .directory
            .get(&partner_id)
            .await
            .ok_or_else(|| OrderError::PartnerNotFound(partner_id.clone()))?;
        if !partner.is_available {
            warn!(order_id = %id, %partner_id, "Assigning a partner who is not available");
        }

        let outcome = self
            .perform(client, move |client| async move { client.assign_partner(partner).await })
            .await?;
        Ok(require(outcome, OrderStatus::DeliveryAssigned)?.order)
    }

    #[instrument(skip(self))]
    pub async fn advance_status(
        &self,
        id: OrderId,
        target: OrderStatus,
        message: Option<String>,
    ) -> Result<Order, OrderError> {
        let client = self.client(id).await?;
        let outcome = self
            .perform(client, move |client| async move { client.advance(target, message).await })
            .await?;
        Ok(require(outcome, target)?.order)
    }

    /// Cancels the order and stops its timer. Returns the penalty and refund split.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: OrderId, reason: String) -> Result<CancellationOutcome, OrderError> {
        let client = self.client(id).await?;
        let outcome = self
            .perform(client, move |client| async move { client.cancel(reason).await })
            .await?;
        let committed = require(outcome, OrderStatus::Cancelled)?;

        committed
            .cancellation
            .ok_or(OrderError::InvalidTransition {
                from: committed.order.status,
                to: OrderStatus::Cancelled,
            })
    }

    /// Sets or replaces the tip for one recipient. Allowed in every status.
    #[instrument(skip(self))]
    pub async fn add_tip(
        &self,
        id: OrderId,
        recipient: TipRecipient,
        amount: Money,
        message: Option<String>,
    ) -> Result<Order, OrderError> {
        let client = self.client(id).await?;
        let outcome = self
            .perform(client, move |client| async move {
                client.add_tip(recipient, amount, message).await
            })
            .await?;
        match outcome {
            ActionOutcome::Committed(committed) => Ok(committed.order),
            ActionOutcome::Skipped { status } => Err(OrderError::ValidationError(format!(
                "tip was not applied to {status} order"
            ))),
        }
    }

    /// The committed state of an order.
    ///
    /// While still `payment_confirmed`, `can_cancel_free` also reflects whether the
    /// grace window is still open at the time of the read.
    pub async fn get_order(&self, id: OrderId) -> Result<Order, OrderError> {
        match self.inner.context.store.get(id).await {
            Ok(order) => Ok(self.with_live_quote(order)),
            Err(StoreError::NotFound(id)) => Err(OrderError::OrderNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_orders_for_chef(&self, chef_id: &ChefId) -> Result<Vec<Order>, OrderError> {
        let orders = self.inner.context.store.list_by_chef(chef_id).await?;
        Ok(orders.into_iter().map(|o| self.with_live_quote(o)).collect())
    }

    pub async fn list_orders_for_delivery_partner(
        &self,
        partner_id: &PartnerId,
    ) -> Result<Vec<Order>, OrderError> {
        let orders = self
            .inner
            .context
            .store
            .list_by_delivery_partner(partner_id)
            .await?;
        Ok(orders.into_iter().map(|o| self.with_live_quote(o)).collect())
    }

    pub async fn list_orders_for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>, OrderError> {
        let orders = self.inner.context.store.list_by_customer(customer_id).await?;
        Ok(orders.into_iter().map(|o| self.with_live_quote(o)).collect())
    }

    /// Every notification dispatched to `recipient`, oldest first.
    pub async fn notifications_for(&self, recipient: &Recipient) -> Vec<Notification> {
        self.inner.dispatcher.log_for(recipient).await
    }

    /// Waits for in-flight transport calls to finish.
    pub async fn flush_notifications(&self) {
        self.inner.dispatcher.flush().await;
    }

    /// Number of orders with a live actor. Finished orders are retired.
    pub async fn live_orders(&self) -> usize {
        self.inner.registry.len().await
    }

    /// Cancels pending timers, stops every order actor and drains notifications.
    pub async fn shutdown(&self) -> Result<(), OrderError> {
        let cancelled = self.inner.timers.cancel_all().await;
        debug!(cancelled, "Pending timers cancelled");

        self.inner
            .registry
            .shutdown()
            .await
            .map_err(|e| OrderError::ActorCommunicationError(e.to_string()))?;
        self.inner.dispatcher.flush().await;
        Ok(())
    }

    async fn create(&self, params: PlaceOrder) -> Result<OrderId, OrderError> {
        let (id, order) = self
            .inner
            .registry
            .create(params, Arc::clone(&self.inner.context))
            .await?;

        let engine = Arc::downgrade(&self.inner);
        let grace_window = self.inner.context.policy.grace_window();
        self.inner
            .timers
            .schedule(id, grace_window, confirm_when_due(engine, id))
            .await;

        info!(order_id = %id, total = %order.total, can_cancel_free = order.can_cancel_free, "Order placed");
        Ok(id)
    }

    /// The live actor of `id`, restored from the store if the order was retired.
    async fn client(&self, id: OrderId) -> Result<OrderClient, OrderError> {
        if let Some(client) = self.inner.registry.client(&id).await {
            return Ok(OrderClient::new(client));
        }

        let store = Arc::clone(&self.inner.context.store);
        let restored = self
            .inner
            .registry
            .restore(&id, Arc::clone(&self.inner.context), || async move {
                match store.get(id).await {
                    Ok(order) => Ok(Some(order)),
                    Err(StoreError::NotFound(_)) => Ok(None),
                    Err(e) => Err(OrderError::from(e)),
                }
            })
            .await?;
        restored
            .map(OrderClient::new)
            .ok_or(OrderError::OrderNotFound(id))
    }

    /// Runs one action on its own task, together with everything its commit sets off.
    ///
    /// A caller that stops waiting does not stop the action or its notifications.
    async fn perform<F, Fut>(&self, client: OrderClient, op: F) -> Result<ActionOutcome, OrderError>
    where
        F: FnOnce(OrderClient) -> Fut + Send + 'static,
        Fut: Future<Output = Result<ActionOutcome, OrderError>> + Send + 'static,
    {
        let engine = self.clone();
        tokio::spawn(async move {
            let outcome = op(client).await?;
            if let ActionOutcome::Committed(committed) = &outcome {
                engine.after_commit(committed).await;
            }
            Ok::<_, OrderError>(outcome)
        })
        .await
        .map_err(|e| OrderError::ActorCommunicationError(e.to_string()))?
    }

    async fn after_commit(&self, committed: &Committed) {
        self.notify(committed).await;

        let order = &committed.order;
        if order.status != OrderStatus::PaymentConfirmed {
            self.inner.timers.cancel(order.id).await;
        }
        if order.status.is_terminal() {
            self.inner.registry.retire(&order.id).await;
        }
    }

    fn with_live_quote(&self, mut order: Order) -> Order {
        if order.status == OrderStatus::PaymentConfirmed && order.can_cancel_free {
            let now = self.inner.context.clock.now();
            order.can_cancel_free = self.inner.context.policy.within_grace_window(order.placed_at, now);
        }
        order
    }

    /// Notifies everyone the rules name for a committed action.
    async fn notify(&self, committed: &Committed) {
        let available = if rules::needs_available_partners(committed.trigger) {
            self.inner.directory.available().await
        } else {
            Vec::new()
        };
        let ctx = RuleContext {
            order: &committed.order,
            cancellation: committed.cancellation.as_ref(),
        };
        let notifications = rules::plan(committed.trigger, &ctx, &available);
        debug!(order_id = %committed.order.id, count = notifications.len(), "Dispatching notifications");
        self.inner.dispatcher.dispatch(notifications).await;
    }
}

/// A skipped action means the order was not in a state `to` can be reached from.
fn require(outcome: ActionOutcome, to: OrderStatus) -> Result<Committed, OrderError> {
    match outcome {
        ActionOutcome::Committed(committed) => Ok(committed),
        ActionOutcome::Skipped { status } => Err(OrderError::InvalidTransition { from: status, to }),
    }
}

/// The timer callback. Holds the engine weakly so pending timers do not keep it alive.
async fn confirm_when_due(engine: Weak<EngineInner>, id: OrderId) {
    let Some(inner) = engine.upgrade() else {
        return;
    };
    let engine = OrderEngine { inner };
    match engine.send_to_chef(id).await {
        Ok(true) => info!(order_id = %id, "Grace window closed, order sent to chef"),
        Ok(false) => debug!(order_id = %id, "Grace window closed, nothing to do"),
        Err(e) => warn!(order_id = %id, error = %e, "Automatic send to chef failed"),
    }
}
