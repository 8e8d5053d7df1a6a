//! Declarative notification rules.
//!
//! Which parties hear about a change, and what they are told, is data: one [`Rule`]
//! per `(trigger, recipient)` pair. After a transition commits, [`plan`] walks the
//! table once and renders a message for every recipient of every matching rule.

use super::{Notification, NotificationKind, NotificationPayload, Recipient};
use crate::model::{CancellationOutcome, DeliveryPartner, Money, Order, OrderStatus, TipRecipient};
use crate::model::OrderStatus as S;
use self::RecipientSelector as R;

/// What happened to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTrigger {
    Transition { from: OrderStatus, to: OrderStatus },
    Tip(TipRecipient),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FromMatch {
    Any,
    /// Any source status except this one.
    Not(OrderStatus),
}

impl FromMatch {
    fn matches(self, from: OrderStatus) -> bool {
        match self {
            FromMatch::Any => true,
            FromMatch::Not(excluded) => from != excluded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMatch {
    Transition { from: FromMatch, to: OrderStatus },
    Tip(TipRecipient),
}

impl TriggerMatch {
    fn matches(self, trigger: NotificationTrigger) -> bool {
        match (self, trigger) {
            (TriggerMatch::Transition { from, to }, NotificationTrigger::Transition { from: f, to: t }) => {
                to == t && from.matches(f)
            }
            (TriggerMatch::Tip(expected), NotificationTrigger::Tip(actual)) => expected == actual,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientSelector {
    Customer,
    Chef,
    /// The partner on the order; selects nobody if none is assigned.
    AssignedPartner,
    /// Every partner the directory lists as available right now.
    AvailablePartners,
}

/// Inputs a template may draw on.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub order: &'a Order,
    pub cancellation: Option<&'a CancellationOutcome>,
}

/// Rendered text plus the message kind and headline amount.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub amount: Option<Money>,
}

pub type Template = fn(&RuleContext<'_>) -> Message;

#[derive(Clone, Copy)]
pub struct Rule {
    pub trigger: TriggerMatch,
    pub recipient: RecipientSelector,
    pub template: Template,
}

const fn on(to: OrderStatus, recipient: RecipientSelector, template: Template) -> Rule {
    Rule {
        trigger: TriggerMatch::Transition {
            from: FromMatch::Any,
            to,
        },
        recipient,
        template,
    }
}

const fn on_tip(to: TipRecipient, recipient: RecipientSelector, template: Template) -> Rule {
    Rule {
        trigger: TriggerMatch::Tip(to),
        recipient,
        template,
    }
}

pub static RULES: &[Rule] = &[
    on(S::SentToChef, R::Chef, new_order),
    on(S::SentToChef, R::Customer, sent_to_chef),
    on(S::ChefAccepted, R::Customer, accepted),
    on(S::ChefAccepted, R::AvailablePartners, delivery_opportunity),
    on(S::Preparing, R::Customer, status_update),
    on(S::ReadyForPickup, R::Customer, status_update),
    on(S::DeliveryAssigned, R::Customer, partner_assigned),
    on(S::DeliveryAssigned, R::Chef, partner_assigned),
    on(S::DeliveryAssigned, R::AssignedPartner, assignment),
    on(S::PickedUp, R::Customer, status_update),
    on(S::OutForDelivery, R::Customer, status_update),
    on(S::Delivered, R::Customer, delivered_customer),
    on(S::Delivered, R::Chef, delivered),
    on(S::Delivered, R::AssignedPartner, delivered),
    on(S::Cancelled, R::Customer, cancelled_customer),
    Rule {
        trigger: TriggerMatch::Transition {
            from: FromMatch::Not(S::PaymentConfirmed),
            to: S::Cancelled,
        },
        recipient: R::Chef,
        template: cancelled_chef,
    },
    on_tip(TipRecipient::Chef, R::Chef, chef_tip_received),
    on_tip(TipRecipient::Chef, R::Customer, chef_tip_confirmed),
    on_tip(TipRecipient::Delivery, R::AssignedPartner, delivery_tip_received),
    on_tip(TipRecipient::Delivery, R::Customer, delivery_tip_confirmed),
];

/// Whether any rule for `trigger` needs the directory's available partners.
pub fn needs_available_partners(trigger: NotificationTrigger) -> bool {
    RULES
        .iter()
        .any(|rule| rule.recipient == R::AvailablePartners && rule.trigger.matches(trigger))
}

/// Renders every message owed for `trigger`, in table order.
pub fn plan(
    trigger: NotificationTrigger,
    ctx: &RuleContext<'_>,
    available_partners: &[DeliveryPartner],
) -> Vec<Notification> {
    let order = ctx.order;
    let mut notifications = Vec::new();

    for rule in RULES.iter().filter(|rule| rule.trigger.matches(trigger)) {
        let recipients: Vec<Recipient> = match rule.recipient {
            R::Customer => vec![Recipient::Customer(order.customer_id.clone())],
            R::Chef => vec![Recipient::Chef(order.chef_id.clone())],
            R::AssignedPartner => order
                .delivery_partner_id
                .iter()
                .cloned()
                .map(Recipient::DeliveryPartner)
                .collect(),
            R::AvailablePartners => available_partners
                .iter()
                .map(|partner| Recipient::DeliveryPartner(partner.id.clone()))
                .collect(),
        };
        if recipients.is_empty() {
            continue;
        }

        let message = (rule.template)(ctx);
        for recipient in recipients {
            notifications.push(Notification {
                recipient,
                title: message.title.clone(),
                body: message.body.clone(),
                payload: NotificationPayload {
                    order_id: order.id,
                    kind: message.kind,
                    status: order.status,
                    amount: message.amount,
                    refund: ctx.cancellation.map(|c| c.refund_amount),
                    estimated_delivery_time: order.estimated_delivery_time,
                },
            });
        }
    }
    notifications
}

fn message(kind: NotificationKind, title: &str, body: String) -> Message {
    Message {
        kind,
        title: title.to_string(),
        body,
        amount: None,
    }
}

fn new_order(ctx: &RuleContext<'_>) -> Message {
    let order = ctx.order;
    Message {
        amount: Some(order.total),
        ..message(
            NotificationKind::NewOrder,
            "New order",
            format!(
                "{} items for {}. Accept or decline {}.",
                order.item_count(),
                order.total,
                order.id
            ),
        )
    }
}

fn sent_to_chef(ctx: &RuleContext<'_>) -> Message {
    message(
        NotificationKind::SentToChef,
        "Order sent to the kitchen",
        format!("{} is with the chef now.", ctx.order.id),
    )
}

fn accepted(ctx: &RuleContext<'_>) -> Message {
    let body = match ctx.order.estimated_delivery_time {
        Some(eta) => format!("The chef accepted your order. Estimated arrival {}.", eta.format("%H:%M")),
        None => "The chef accepted your order.".to_string(),
    };
    message(NotificationKind::OrderAccepted, "Order accepted", body)
}

fn delivery_opportunity(ctx: &RuleContext<'_>) -> Message {
    message(
        NotificationKind::DeliveryOpportunity,
        "Delivery available",
        format!("{} will be ready soon near {}.", ctx.order.id, ctx.order.delivery_address),
    )
}

fn status_update(ctx: &RuleContext<'_>) -> Message {
    let title = match ctx.order.status {
        OrderStatus::Preparing => "Preparing your food",
        OrderStatus::ReadyForPickup => "Ready for pickup",
        OrderStatus::PickedUp => "Order picked up",
        OrderStatus::OutForDelivery => "Out for delivery",
        _ => "Order update",
    };
    let body = ctx
        .order
        .timeline
        .last()
        .map(|entry| entry.message.clone())
        .unwrap_or_default();
    message(NotificationKind::StatusUpdate, title, body)
}

fn partner_assigned(ctx: &RuleContext<'_>) -> Message {
    let name = ctx.order.delivery_partner_name.as_deref().unwrap_or("A delivery partner");
    message(
        NotificationKind::DeliveryAssigned,
        "Delivery partner assigned",
        format!("{name} will deliver {}.", ctx.order.id),
    )
}

fn assignment(ctx: &RuleContext<'_>) -> Message {
    message(
        NotificationKind::DeliveryAssigned,
        "New delivery",
        format!("Pick up {} and deliver to {}.", ctx.order.id, ctx.order.delivery_address),
    )
}

fn delivered_customer(ctx: &RuleContext<'_>) -> Message {
    message(
        NotificationKind::Delivered,
        "Order delivered",
        format!("Enjoy your meal! Rate and tip for {}.", ctx.order.id),
    )
}

fn delivered(ctx: &RuleContext<'_>) -> Message {
    message(
        NotificationKind::Delivered,
        "Order delivered",
        format!("{} was delivered.", ctx.order.id),
    )
}

fn cancelled_customer(ctx: &RuleContext<'_>) -> Message {
    let (penalty, refund) = ctx
        .cancellation
        .map_or((Money::ZERO, ctx.order.total), |c| (c.penalty_amount, c.refund_amount));
    let body = if penalty.is_zero() {
        format!("{} was cancelled. Full refund of {refund}.", ctx.order.id)
    } else {
        format!(
            "{} was cancelled. Refund of {refund} after a {penalty} cancellation fee.",
            ctx.order.id
        )
    };
    Message {
        amount: Some(penalty),
        ..message(NotificationKind::OrderCancelled, "Order cancelled", body)
    }
}

fn cancelled_chef(ctx: &RuleContext<'_>) -> Message {
    let compensation = ctx.cancellation.map_or(Money::ZERO, |c| c.penalty_amount);
    Message {
        amount: Some(compensation),
        ..message(
            NotificationKind::CancellationCompensation,
            "Order cancelled",
            format!("{} was cancelled. You will receive {compensation}.", ctx.order.id),
        )
    }
}

fn chef_tip_received(ctx: &RuleContext<'_>) -> Message {
    tip_message(ctx, TipRecipient::Chef, NotificationKind::TipReceived, "You received a tip")
}

fn chef_tip_confirmed(ctx: &RuleContext<'_>) -> Message {
    tip_message(ctx, TipRecipient::Chef, NotificationKind::TipConfirmed, "Tip sent to your chef")
}

fn delivery_tip_received(ctx: &RuleContext<'_>) -> Message {
    tip_message(ctx, TipRecipient::Delivery, NotificationKind::TipReceived, "You received a tip")
}

fn delivery_tip_confirmed(ctx: &RuleContext<'_>) -> Message {
    tip_message(
        ctx,
        TipRecipient::Delivery,
        NotificationKind::TipConfirmed,
        "Tip sent to your delivery partner",
    )
}

fn tip_message(ctx: &RuleContext<'_>, to: TipRecipient, kind: NotificationKind, title: &str) -> Message {
    let tip = ctx.order.tip(to);
    let amount = tip.map(|tip| tip.amount);
    let body = match tip.and_then(|tip| tip.message.as_deref()) {
        Some(note) => format!("Tip of {} on {}: \"{note}\"", amount.unwrap_or_default(), ctx.order.id),
        None => format!("Tip of {} on {}.", amount.unwrap_or_default(), ctx.order.id),
    };
    Message {
        amount,
        ..message(kind, title, body)
    }
}
