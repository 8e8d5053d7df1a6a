//! # Order Lifecycle Demo
//!
//! Walks one order through the whole happy path and cancels a second one inside
//! the grace window.
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RUST_LOG=debug cargo run -- engine.toml
//! ```

use order_lifecycle::config::EngineConfig;
use order_lifecycle::lifecycle::tracing::setup_tracing;
use order_lifecycle::lifecycle::OrderSystem;
use order_lifecycle::model::{DeliveryPartner, LineItem, Money, OrderStatus, OrderTotals, PlaceOrder, TipRecipient};
use order_lifecycle::notifications::Recipient;
use tracing::{info, Instrument};

fn sample_order() -> PlaceOrder {
    PlaceOrder {
        customer_id: "cust_asha".into(),
        chef_id: "chef_kumar".into(),
        items: vec![
            LineItem::new("dish_biryani", "Hyderabadi Biryani", 1, Money::new(32000, 2)),
            LineItem::new("dish_raita", "Raita", 2, Money::new(6500, 2)).with_instructions("less salt"),
        ],
        delivery_address: "221 Indiranagar 2nd Stage".to_string(),
        totals: OrderTotals {
            subtotal: Money::new(45000, 2),
            delivery_fee: Money::new(3000, 2),
            taxes: Money::new(2000, 2),
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let mut config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(&path)
            .await
            .map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    if config.partners.is_empty() {
        config.partners = vec![
            DeliveryPartner::new("dp_ravi", "Ravi", "scooter").at(12.9716, 77.5946),
            DeliveryPartner::new("dp_meera", "Meera", "bicycle").at(12.9352, 77.6245),
        ];
    }

    let system = OrderSystem::new(config).map_err(|e| e.to_string())?;
    let engine = system.engine.clone();

    let span = tracing::info_span!("happy_path");
    let order_id = async {
        let id = engine.place_order(sample_order()).await?;
        engine.send_to_chef(id).await?;
        engine.accept_order(id, 35).await?;
        engine.advance_status(id, OrderStatus::Preparing, None).await?;
        engine.advance_status(id, OrderStatus::ReadyForPickup, None).await?;
        engine.assign_delivery_partner(id, "dp_ravi".into()).await?;
        engine.advance_status(id, OrderStatus::PickedUp, None).await?;
        engine.advance_status(id, OrderStatus::OutForDelivery, None).await?;
        engine.advance_status(id, OrderStatus::Delivered, None).await?;
        engine
            .add_tip(id, TipRecipient::Delivery, Money::new(5000, 2), Some("Thanks!".to_string()))
            .await?;
        Ok::<_, order_lifecycle::order_actor::OrderError>(id)
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    let order = engine.get_order(order_id).await.map_err(|e| e.to_string())?;
    info!(
        order_id = %order.id,
        status = %order.status,
        timeline = order.timeline.len(),
        rating_eligible = order.rating_eligible,
        "Order complete"
    );

    let cancelled = engine.place_order(sample_order()).await.map_err(|e| e.to_string())?;
    let outcome = engine
        .cancel_order(cancelled, "ordered by mistake".to_string())
        .await
        .map_err(|e| e.to_string())?;
    info!(
        order_id = %cancelled,
        penalty = %outcome.penalty_amount,
        refund = %outcome.refund_amount,
        "Cancelled within grace window"
    );

    engine.flush_notifications().await;
    let inbox = engine
        .notifications_for(&Recipient::Customer("cust_asha".into()))
        .await;
    for notification in &inbox {
        info!(order_id = %notification.payload.order_id, title = %notification.title, "Customer inbox");
    }

    system.shutdown().await.map_err(|e| e.to_string())
}
