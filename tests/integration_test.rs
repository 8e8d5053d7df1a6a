use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use order_lifecycle::clock::TokioClock;
use order_lifecycle::config::EngineConfig;
use order_lifecycle::engine::OrderEngine;
use order_lifecycle::lifecycle::OrderSystem;
use order_lifecycle::model::{
    ChefId, CustomerId, DeliveryPartner, LineItem, Money, Order, OrderId, OrderStatus, OrderTotals,
    PartnerId, PlaceOrder, TipRecipient,
};
use order_lifecycle::notifications::{
    Notification, NotificationKind, NotificationTransport, Recipient, TransportError,
};
use order_lifecycle::order_actor::OrderError;
use order_lifecycle::store::{MemoryOrderStore, OrderStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;

/// Records every message handed to the transport.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingTransport {
    fn count(&self, recipient: &Recipient, kind: NotificationKind) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|n| &n.recipient == recipient && n.payload.kind == kind)
            .count()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn notify(&self, notification: &Notification) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Memory store whose writes take 200ms once `slow` is set.
#[derive(Default)]
struct SlowStore {
    inner: MemoryOrderStore,
    slow: AtomicBool,
}

#[async_trait]
impl OrderStore for SlowStore {
    async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
        self.inner.get(id).await
    }

    async fn put(&self, order: Order) -> Result<(), StoreError> {
        if self.slow.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        self.inner.put(order).await
    }

    async fn list_by_chef(&self, chef_id: &ChefId) -> Result<Vec<Order>, StoreError> {
        self.inner.list_by_chef(chef_id).await
    }

    async fn list_by_delivery_partner(&self, partner_id: &PartnerId) -> Result<Vec<Order>, StoreError> {
        self.inner.list_by_delivery_partner(partner_id).await
    }

    async fn list_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>, StoreError> {
        self.inner.list_by_customer(customer_id).await
    }
}

fn money(amount: &str) -> Money {
    amount.parse().unwrap()
}

fn customer() -> Recipient {
    Recipient::Customer("cust_1".into())
}

fn chef() -> Recipient {
    Recipient::Chef("chef_1".into())
}

fn partner(id: &str) -> Recipient {
    Recipient::DeliveryPartner(id.into())
}

/// Subtotal 450, delivery fee 30, taxes 20: total 500.
fn sample_order() -> PlaceOrder {
    PlaceOrder {
        customer_id: "cust_1".into(),
        chef_id: "chef_1".into(),
        items: vec![
            LineItem::new("dish_1", "Butter Chicken", 1, money("300.00")),
            LineItem::new("dish_2", "Garlic Naan", 3, money("50.00")),
        ],
        delivery_address: "12 MG Road".to_string(),
        totals: OrderTotals {
            subtotal: money("450.00"),
            delivery_fee: money("30.00"),
            taxes: money("20.00"),
        },
    }
}

fn start() -> (OrderSystem, Arc<RecordingTransport>) {
    start_with_store(Arc::new(MemoryOrderStore::new()))
}

fn start_with_store(store: Arc<dyn OrderStore>) -> (OrderSystem, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let config = EngineConfig {
        partners: vec![
            DeliveryPartner::new("dp_1", "Ravi", "scooter"),
            DeliveryPartner::new("dp_2", "Meera", "bicycle").unavailable(),
        ],
        ..EngineConfig::default()
    };
    let anchor = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

    let system = OrderSystem::builder(config)
        .with_store(store)
        .with_transport(transport.clone())
        .with_clock(Arc::new(TokioClock::starting_at(anchor)))
        .build()
        .expect("Failed to build system");
    (system, transport)
}

async fn ready_for_pickup(engine: &OrderEngine) -> OrderId {
    let id = engine.place_order(sample_order()).await.unwrap();
    assert!(engine.send_to_chef(id).await.unwrap());
    engine.accept_order(id, 30).await.unwrap();
    engine
        .advance_status(id, OrderStatus::Preparing, None)
        .await
        .unwrap();
    engine
        .advance_status(id, OrderStatus::ReadyForPickup, None)
        .await
        .unwrap();
    id
}

#[tokio::test(start_paused = true)]
async fn test_cancel_within_grace_window_is_free() {
    let (system, _) = start();
    let engine = &system.engine;

    let id = engine.place_order(sample_order()).await.unwrap();
    let placed = engine.get_order(id).await.unwrap();
    assert_eq!(placed.total, money("500.00"));
    assert!(placed.can_cancel_free);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let outcome = engine
        .cancel_order(id, "ordered twice".to_string())
        .await
        .unwrap();
    assert_eq!(outcome.penalty_amount, Money::ZERO);
    assert_eq!(outcome.refund_amount, money("500.00"));

    // The timer must not resurrect the order
    tokio::time::sleep(Duration::from_secs(60)).await;
    let order = engine.get_order(id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.timeline.len(), 2);
    assert!(order
        .timeline
        .iter()
        .all(|entry| entry.status != OrderStatus::SentToChef));

    // Still in payment_confirmed when cancelled: only the customer hears about it
    let customer_log = engine.notifications_for(&customer()).await;
    assert_eq!(customer_log.len(), 1);
    assert_eq!(customer_log[0].payload.kind, NotificationKind::OrderCancelled);
    assert_eq!(customer_log[0].payload.refund, Some(money("500.00")));
    assert!(engine.notifications_for(&chef()).await.is_empty());

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_grace_window_sends_to_chef_then_accept_sets_eta() {
    let (system, _) = start();
    let engine = &system.engine;

    let id = engine.place_order(sample_order()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(31)).await;

    let order = engine.get_order(id).await.unwrap();
    assert_eq!(order.status, OrderStatus::SentToChef);
    assert!(!order.can_cancel_free);

    let accepted = engine.accept_order(id, 30).await.unwrap();
    assert_eq!(accepted.status, OrderStatus::ChefAccepted);
    let entry = accepted.timeline.last().unwrap();
    assert_eq!(
        accepted.estimated_delivery_time,
        Some(entry.timestamp + chrono::Duration::minutes(30))
    );
    assert_eq!(entry.estimated_time, accepted.estimated_delivery_time);

    // Outside the window the frozen penalty applies and the chef is compensated
    let outcome = engine
        .cancel_order(id, "running late".to_string())
        .await
        .unwrap();
    assert_eq!(outcome.penalty_amount, money("250.00"));
    assert_eq!(outcome.refund_amount, money("250.00"));

    let chef_log = engine.notifications_for(&chef()).await;
    let compensation = chef_log.last().unwrap();
    assert_eq!(compensation.payload.kind, NotificationKind::CancellationCompensation);
    assert_eq!(compensation.payload.amount, Some(money("250.00")));

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_can_cancel_free_holds_inside_window() {
    let (system, _) = start();
    let engine = &system.engine;

    let id = engine.place_order(sample_order()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(engine.get_order(id).await.unwrap().can_cancel_free);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unknown_partner_leaves_order_untouched() {
    let (system, _) = start();
    let engine = &system.engine;

    let id = ready_for_pickup(engine).await;
    let before = engine.get_order(id).await.unwrap();

    let err = engine
        .assign_delivery_partner(id, "dp_ghost".into())
        .await
        .unwrap_err();
    assert_eq!(err, OrderError::PartnerNotFound("dp_ghost".into()));

    let after = engine.get_order(id).await.unwrap();
    assert_eq!(after.status, OrderStatus::ReadyForPickup);
    assert_eq!(after.timeline, before.timeline);
    assert!(after.delivery_partner_id.is_none());

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_happy_path_notifies_each_party_once_on_delivery() {
    let (system, transport) = start();
    let engine = &system.engine;

    let id = ready_for_pickup(engine).await;
    let assigned = engine
        .assign_delivery_partner(id, "dp_1".into())
        .await
        .unwrap();
    assert_eq!(assigned.delivery_partner_name.as_deref(), Some("Ravi"));

    for target in [
        OrderStatus::PickedUp,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ] {
        engine.advance_status(id, target, None).await.unwrap();
    }
    engine.flush_notifications().await;

    for recipient in [customer(), chef(), partner("dp_1")] {
        assert_eq!(
            transport.count(&recipient, NotificationKind::Delivered),
            1,
            "{recipient} should hear about delivery exactly once"
        );
    }

    let order = engine.get_order(id).await.unwrap();
    assert!(order.rating_eligible);
    assert_eq!(order.timeline.len(), 9);
    for pair in order.timeline.windows(2) {
        assert!(pair[0].status.can_transition_to(pair[1].status));
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }

    // Terminal: nothing moves any more
    let err = engine
        .advance_status(id, OrderStatus::OutForDelivery, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
    let err = engine
        .cancel_order(id, "too late".to_string())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        }
    );
    assert!(!engine.send_to_chef(id).await.unwrap());

    let by_partner = engine
        .list_orders_for_delivery_partner(&"dp_1".into())
        .await
        .unwrap();
    assert_eq!(by_partner.len(), 1);
    assert_eq!(
        engine.list_orders_for_chef(&"chef_1".into()).await.unwrap()[0].id,
        id
    );

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_double_send_to_chef_applies_once() {
    let (system, transport) = start();
    let engine = &system.engine;

    let id = engine.place_order(sample_order()).await.unwrap();
    assert!(engine.send_to_chef(id).await.unwrap());
    assert!(!engine.send_to_chef(id).await.unwrap());

    // The timer was cancelled by the early confirm
    tokio::time::sleep(Duration::from_secs(60)).await;
    engine.flush_notifications().await;

    let order = engine.get_order(id).await.unwrap();
    let sent = order
        .timeline
        .iter()
        .filter(|entry| entry.status == OrderStatus::SentToChef)
        .count();
    assert_eq!(sent, 1);
    assert_eq!(transport.count(&chef(), NotificationKind::NewOrder), 1);
    assert_eq!(transport.count(&customer(), NotificationKind::SentToChef), 1);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_timer_racing_early_confirm() {
    let (system, transport) = start();
    let engine = &system.engine;

    let id = engine.place_order(sample_order()).await.unwrap();

    // Wake at the same instant as the timer
    tokio::time::sleep(Duration::from_secs(30)).await;
    let mut confirms = JoinSet::new();
    for _ in 0..4 {
        let engine = engine.clone();
        confirms.spawn(async move { engine.send_to_chef(id).await });
    }
    let mut applied = 0;
    while let Some(result) = confirms.join_next().await {
        if result.unwrap().unwrap() {
            applied += 1;
        }
    }
    tokio::time::sleep(Duration::from_secs(1)).await;
    engine.flush_notifications().await;

    assert!(applied <= 1);
    let order = engine.get_order(id).await.unwrap();
    assert_eq!(order.status, OrderStatus::SentToChef);
    assert_eq!(order.timeline.len(), 2);
    assert_eq!(engine.notifications_for(&chef()).await.len(), 1);
    assert_eq!(transport.count(&chef(), NotificationKind::NewOrder), 1);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_timer_racing_cancel() {
    let (system, transport) = start();
    let engine = &system.engine;

    let id = engine.place_order(sample_order()).await.unwrap();

    // Wake at the same instant as the timer
    tokio::time::sleep(Duration::from_secs(30)).await;
    let mut cancels = JoinSet::new();
    for _ in 0..4 {
        let engine = engine.clone();
        cancels.spawn(async move { engine.cancel_order(id, "changed my mind".to_string()).await });
    }
    let mut outcomes = Vec::new();
    while let Some(result) = cancels.join_next().await {
        match result.unwrap() {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => assert!(matches!(e, OrderError::InvalidTransition { .. }), "{e}"),
        }
    }
    tokio::time::sleep(Duration::from_secs(1)).await;
    engine.flush_notifications().await;

    assert_eq!(outcomes.len(), 1);
    let order = engine.get_order(id).await.unwrap();
    let path: Vec<_> = order.timeline.iter().map(|entry| entry.status).collect();
    let sent_first = path
        == [
            OrderStatus::PaymentConfirmed,
            OrderStatus::SentToChef,
            OrderStatus::Cancelled,
        ];
    assert!(
        sent_first || path == [OrderStatus::PaymentConfirmed, OrderStatus::Cancelled],
        "unexpected path {path:?}"
    );

    let chef_log = engine.notifications_for(&chef()).await;
    if sent_first {
        assert_eq!(outcomes[0].penalty_amount, money("250.00"));
        assert_eq!(transport.count(&chef(), NotificationKind::NewOrder), 1);
        assert!(chef_log
            .iter()
            .any(|n| n.payload.kind == NotificationKind::CancellationCompensation));
    } else {
        assert_eq!(outcomes[0].penalty_amount, Money::ZERO);
        assert_eq!(outcomes[0].refund_amount, money("500.00"));
        assert!(chef_log.is_empty());
    }
    assert_eq!(transport.count(&customer(), NotificationKind::OrderCancelled), 1);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_caller_timeout_still_notifies_committed_change() {
    let store = Arc::new(SlowStore::default());
    let (system, transport) = start_with_store(store.clone());
    let engine = &system.engine;

    let id = engine.place_order(sample_order()).await.unwrap();
    store.slow.store(true, Ordering::SeqCst);

    let gave_up = tokio::time::timeout(Duration::from_millis(50), engine.send_to_chef(id)).await;
    assert!(gave_up.is_err());

    tokio::time::sleep(Duration::from_secs(1)).await;
    engine.flush_notifications().await;

    let order = engine.get_order(id).await.unwrap();
    assert_eq!(order.status, OrderStatus::SentToChef);
    assert_eq!(transport.count(&chef(), NotificationKind::NewOrder), 1);
    assert_eq!(transport.count(&customer(), NotificationKind::SentToChef), 1);

    // The timer was stopped by the commit and sends nothing more
    tokio::time::sleep(Duration::from_secs(60)).await;
    engine.flush_notifications().await;
    assert_eq!(engine.get_order(id).await.unwrap().timeline.len(), 2);
    assert_eq!(engine.notifications_for(&chef()).await.len(), 1);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_finished_orders_are_retired_and_still_take_tips() {
    let (system, transport) = start();
    let engine = &system.engine;

    let id = ready_for_pickup(engine).await;
    let open = engine.place_order(sample_order()).await.unwrap();
    engine
        .assign_delivery_partner(id, "dp_1".into())
        .await
        .unwrap();
    for target in [
        OrderStatus::PickedUp,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ] {
        engine.advance_status(id, target, None).await.unwrap();
    }
    assert_eq!(engine.live_orders().await, 1);

    // Tips for both recipients at once land on the restored actor
    let (chef_tip, delivery_tip) = tokio::join!(
        engine.add_tip(id, TipRecipient::Chef, money("40.00"), None),
        engine.add_tip(id, TipRecipient::Delivery, money("60.00"), None),
    );
    chef_tip.unwrap();
    delivery_tip.unwrap();

    let order = engine.get_order(id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.chef_tip.as_ref().unwrap().amount, money("40.00"));
    assert_eq!(order.delivery_tip.as_ref().unwrap().amount, money("60.00"));
    assert_eq!(order.timeline.len(), 9);

    engine.flush_notifications().await;
    assert_eq!(transport.count(&chef(), NotificationKind::TipReceived), 1);
    assert_eq!(transport.count(&partner("dp_1"), NotificationKind::TipReceived), 1);

    engine.cancel_order(open, "no longer hungry".to_string()).await.unwrap();
    assert_eq!(engine.live_orders().await, 0);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_skipping_steps_is_rejected() {
    let (system, _) = start();
    let engine = &system.engine;

    let id = engine.place_order(sample_order()).await.unwrap();
    let err = engine.accept_order(id, 30).await.unwrap_err();
    assert_eq!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::PaymentConfirmed,
            to: OrderStatus::ChefAccepted,
        }
    );

    engine.send_to_chef(id).await.unwrap();
    engine.accept_order(id, 30).await.unwrap();
    let err = engine
        .advance_status(id, OrderStatus::ReadyForPickup, None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::ChefAccepted,
            to: OrderStatus::ReadyForPickup,
        }
    );

    // Assignment only from ready_for_pickup
    let err = engine
        .assign_delivery_partner(id, "dp_1".into())
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
    assert_eq!(engine.get_order(id).await.unwrap().timeline.len(), 3);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_tips_overwrite_and_require_a_partner() {
    let (system, transport) = start();
    let engine = &system.engine;

    let id = ready_for_pickup(engine).await;

    let err = engine
        .add_tip(id, TipRecipient::Delivery, money("30.00"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidRecipient(_)));

    engine
        .add_tip(id, TipRecipient::Chef, money("20.00"), None)
        .await
        .unwrap();
    let order = engine
        .add_tip(id, TipRecipient::Chef, money("50.00"), Some("Delicious".to_string()))
        .await
        .unwrap();
    assert_eq!(order.chef_tip.as_ref().unwrap().amount, money("50.00"));
    assert_eq!(order.timeline.len(), 5);

    engine
        .assign_delivery_partner(id, "dp_1".into())
        .await
        .unwrap();
    let order = engine
        .add_tip(id, TipRecipient::Delivery, money("30.00"), None)
        .await
        .unwrap();
    assert_eq!(order.delivery_tip.as_ref().unwrap().amount, money("30.00"));

    engine.flush_notifications().await;
    assert_eq!(transport.count(&chef(), NotificationKind::TipReceived), 2);
    assert_eq!(transport.count(&partner("dp_1"), NotificationKind::TipReceived), 1);
    assert_eq!(transport.count(&customer(), NotificationKind::TipConfirmed), 3);

    let err = engine
        .add_tip(id, TipRecipient::Chef, money("-5.00"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::ValidationError(_)));

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_accept_broadcasts_to_available_partners_only() {
    let (system, _) = start();
    let engine = &system.engine;

    let id = engine.place_order(sample_order()).await.unwrap();
    engine.send_to_chef(id).await.unwrap();
    engine.accept_order(id, 20).await.unwrap();

    let ravi = engine.notifications_for(&partner("dp_1")).await;
    assert_eq!(ravi.len(), 1);
    assert_eq!(ravi[0].payload.kind, NotificationKind::DeliveryOpportunity);
    assert!(engine.notifications_for(&partner("dp_2")).await.is_empty());

    // Unavailable partners can still be assigned explicitly
    engine
        .advance_status(id, OrderStatus::Preparing, None)
        .await
        .unwrap();
    engine
        .advance_status(id, OrderStatus::ReadyForPickup, None)
        .await
        .unwrap();
    let order = engine
        .assign_delivery_partner(id, "dp_2".into())
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::DeliveryAssigned);

    let err = engine
        .assign_delivery_partner(id, "dp_1".into())
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unknown_order_and_bad_placement() {
    let (system, _) = start();
    let engine = &system.engine;

    let missing = OrderId(999);
    assert_eq!(
        engine.get_order(missing).await.unwrap_err(),
        OrderError::OrderNotFound(missing)
    );
    assert_eq!(
        engine.accept_order(missing, 30).await.unwrap_err(),
        OrderError::OrderNotFound(missing)
    );
    // Order lookup comes before partner lookup
    assert_eq!(
        engine
            .assign_delivery_partner(missing, "dp_ghost".into())
            .await
            .unwrap_err(),
        OrderError::OrderNotFound(missing)
    );

    let mut empty = sample_order();
    empty.items.clear();
    let err = engine.place_order(empty).await.unwrap_err();
    assert!(matches!(err, OrderError::ValidationError(_)));
    assert!(engine
        .list_orders_for_customer(&"cust_1".into())
        .await
        .unwrap()
        .is_empty());

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_orders_progress_independently() {
    let (system, _) = start();
    let engine = &system.engine;

    let mut tasks = JoinSet::new();
    for _ in 0..20 {
        let engine = engine.clone();
        tasks.spawn(async move {
            let id = engine.place_order(sample_order()).await?;
            engine.send_to_chef(id).await?;
            engine.accept_order(id, 25).await?;
            Ok::<_, OrderError>(id)
        });
    }

    let mut ids = Vec::new();
    while let Some(result) = tasks.join_next().await {
        ids.push(result.unwrap().unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);

    let orders = engine
        .list_orders_for_customer(&"cust_1".into())
        .await
        .unwrap();
    assert_eq!(orders.len(), 20);
    assert!(orders
        .iter()
        .all(|order| order.status == OrderStatus::ChefAccepted));

    system.shutdown().await.unwrap();
}
