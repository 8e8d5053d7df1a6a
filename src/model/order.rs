//! The order aggregate and its value types.

use crate::model::{Money, OrderStatus, PartnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "order_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChefId(pub String);

impl From<&str> for CustomerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ChefId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for ChefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One dish on the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub dish_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub instructions: Option<String>,
}

impl LineItem {
    pub fn new(dish_id: impl Into<String>, name: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        Self {
            dish_id: dish_id.into(),
            name: name.into(),
            quantity,
            unit_price,
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

/// Totals computed by the checkout before placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub taxes: Money,
}

impl OrderTotals {
    /// The grand total, or `None` if it does not fit in a [`Money`].
    pub fn checked_total(&self) -> Option<Money> {
        self.subtotal
            .checked_add(self.delivery_fee)?
            .checked_add(self.taxes)
    }

    /// Saturates at [`Money::MAX`]. Placement rejects totals that would.
    pub fn total(&self) -> Money {
        self.checked_total().unwrap_or(Money::MAX)
    }
}

/// Payload for placing a new order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: CustomerId,
    pub chef_id: ChefId,
    pub items: Vec<LineItem>,
    pub delivery_address: String,
    pub totals: OrderTotals,
}

/// One entry of the append-only order history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub estimated_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipRecipient {
    Chef,
    Delivery,
}

impl Display for TipRecipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TipRecipient::Chef => f.write_str("chef"),
            TipRecipient::Delivery => f.write_str("delivery"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    pub amount: Money,
    pub message: Option<String>,
    pub tipped_at: DateTime<Utc>,
}

/// Money split returned by a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationOutcome {
    pub penalty_amount: Money,
    pub refund_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub reason: String,
    pub cancelled_from: OrderStatus,
    pub outcome: CancellationOutcome,
    pub cancelled_at: DateTime<Utc>,
}

/// Represents a placed food order.
///
/// # Actor Framework
/// This struct implements the [`ActorEntity`](crate::framework::ActorEntity) trait,
/// so every order is owned by its own [`EntityActor`](crate::framework::EntityActor).
///
/// See [`impl ActorEntity for Order`](#impl-ActorEntity-for-Order) for details on:
/// - Creation parameters ([`PlaceOrder`])
/// - Actions ([`OrderAction`](crate::order_actor::OrderAction))
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub chef_id: ChefId,
    pub delivery_partner_id: Option<PartnerId>,
    pub delivery_partner_name: Option<String>,

    pub items: Vec<LineItem>,
    pub delivery_address: String,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub taxes: Money,
    pub total: Money,

    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub timeline: Vec<TimelineEntry>,

    pub can_cancel_free: bool,
    pub cancellation_penalty: Money,
    pub cancellation: Option<CancellationRecord>,

    pub chef_tip: Option<Tip>,
    pub delivery_tip: Option<Tip>,
    pub rating_eligible: bool,
}

impl Order {
    /// Creates a freshly placed order in `PaymentConfirmed` with its creation entry.
    ///
    /// Payment is confirmed by the gateway before placement reaches the engine.
    pub fn new(
        id: OrderId,
        params: PlaceOrder,
        placed_at: DateTime<Utc>,
        can_cancel_free: bool,
        cancellation_penalty: Money,
    ) -> Self {
        let PlaceOrder {
            customer_id,
            chef_id,
            items,
            delivery_address,
            totals,
        } = params;

        Self {
            id,
            customer_id,
            chef_id,
            delivery_partner_id: None,
            delivery_partner_name: None,
            items,
            delivery_address,
            subtotal: totals.subtotal,
            delivery_fee: totals.delivery_fee,
            taxes: totals.taxes,
            total: totals.total(),
            status: OrderStatus::PaymentConfirmed,
            placed_at,
            estimated_delivery_time: None,
            timeline: vec![TimelineEntry {
                status: OrderStatus::PaymentConfirmed,
                timestamp: placed_at,
                message: "Order placed and payment confirmed".to_string(),
                estimated_time: None,
            }],
            can_cancel_free,
            cancellation_penalty,
            cancellation: None,
            chef_tip: None,
            delivery_tip: None,
            rating_eligible: false,
        }
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn tip(&self, recipient: TipRecipient) -> Option<&Tip> {
        match recipient {
            TipRecipient::Chef => self.chef_tip.as_ref(),
            TipRecipient::Delivery => self.delivery_tip.as_ref(),
        }
    }
}
