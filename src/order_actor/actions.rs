//! Actions accepted by the Order actor and what they report back.
//!
//! Each [`OrderAction`] is applied atomically by the order's actor. A committed
//! action returns the post-commit order together with the [`NotificationTrigger`]
//! the engine feeds to the notification rule table.

use crate::model::{CancellationOutcome, DeliveryPartner, Money, Order, OrderStatus, TipRecipient};
use crate::notifications::NotificationTrigger;

#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Leave the free-cancellation window and hand the order to the chef.
    /// A no-op unless the order is still `PaymentConfirmed`.
    SendToChef,
    /// Chef accepts with a preparation-plus-delivery estimate.
    Accept { estimated_minutes: u32 },
    /// Attach a courier from the directory.
    AssignPartner { partner: DeliveryPartner },
    /// Move to the immediate successor status.
    Advance {
        target: OrderStatus,
        message: Option<String>,
    },
    Cancel { reason: String },
    AddTip {
        recipient: TipRecipient,
        amount: Money,
        message: Option<String>,
    },
}

/// A change that was applied and persisted.
#[derive(Debug, Clone)]
pub struct Committed {
    pub order: Order,
    pub trigger: NotificationTrigger,
    pub cancellation: Option<CancellationOutcome>,
}

#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// The action did not apply to the current state; nothing changed.
    Skipped { status: OrderStatus },
    Committed(Committed),
}

impl ActionOutcome {
    pub fn committed(self) -> Option<Committed> {
        match self {
            ActionOutcome::Committed(committed) => Some(committed),
            ActionOutcome::Skipped { .. } => None,
        }
    }
}
