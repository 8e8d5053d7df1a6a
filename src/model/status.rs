//! Order status and the transition graph.
//!
//! The graph is strictly linear with a side exit to `Cancelled`:
//!
//! ```text
//! PendingPayment → PaymentConfirmed → SentToChef → ChefAccepted → Preparing
//!   → ReadyForPickup → DeliveryAssigned → PickedUp → OutForDelivery → Delivered
//!
//! PaymentConfirmed ..= OutForDelivery → Cancelled
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    PaymentConfirmed,
    SentToChef,
    ChefAccepted,
    Preparing,
    ReadyForPickup,
    DeliveryAssigned,
    PickedUp,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The only forward successor on the happy path, `None` for terminal states.
    pub fn successor(self) -> Option<OrderStatus> {
        use OrderStatus::*;
        match self {
            PendingPayment => Some(PaymentConfirmed),
            PaymentConfirmed => Some(SentToChef),
            SentToChef => Some(ChefAccepted),
            ChefAccepted => Some(Preparing),
            Preparing => Some(ReadyForPickup),
            ReadyForPickup => Some(DeliveryAssigned),
            DeliveryAssigned => Some(PickedUp),
            PickedUp => Some(OutForDelivery),
            OutForDelivery => Some(Delivered),
            Delivered | Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether `Cancelled` is reachable from this status.
    ///
    /// `PendingPayment` belongs to the payment gateway and is not cancellable here.
    pub fn is_cancellable(self) -> bool {
        !self.is_terminal() && self != OrderStatus::PendingPayment
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        if to == OrderStatus::Cancelled {
            return self.is_cancellable();
        }
        self.successor() == Some(to)
    }

    /// All statuses reachable in one step.
    pub fn valid_next_states(self) -> Vec<OrderStatus> {
        let mut next: Vec<OrderStatus> = self.successor().into_iter().collect();
        if self.is_cancellable() {
            next.push(OrderStatus::Cancelled);
        }
        next
    }

    pub fn as_str(self) -> &'static str {
        use OrderStatus::*;
        match self {
            PendingPayment => "pending_payment",
            PaymentConfirmed => "payment_confirmed",
            SentToChef => "sent_to_chef",
            ChefAccepted => "chef_accepted",
            Preparing => "preparing",
            ReadyForPickup => "ready_for_pickup",
            DeliveryAssigned => "delivery_assigned",
            PickedUp => "picked_up",
            OutForDelivery => "out_for_delivery",
            Delivered => "delivered",
            Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
