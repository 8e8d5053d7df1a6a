//! ActorEntity trait implementation for the Order domain type.
//!
//! This module contains the [`ActorEntity`] implementation that lets [`Order`] be
//! owned by the generic [`EntityActor`](crate::framework::EntityActor).
//!
//! Every handler runs on a draft clone, so returning an error halfway through leaves
//! the live order exactly as it was. Status change and timeline append always happen
//! together through [`Order::transition`].

use super::actions::{ActionOutcome, Committed, OrderAction};
use super::error::OrderError;
use super::OrderContext;
use crate::framework::ActorEntity;
use crate::model::{
    CancellationOutcome, CancellationRecord, DeliveryPartner, Money, Order, OrderId, OrderStatus,
    PlaceOrder, TimelineEntry, Tip, TipRecipient,
};
use crate::notifications::NotificationTrigger;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = PlaceOrder;
    type Action = OrderAction;
    type ActionResult = ActionOutcome;
    type Context = Arc<OrderContext>;
    type Error = OrderError;

    /// Validates placement input and freezes the cancellation quote at `placed_at`.
    fn from_create_params(id: OrderId, params: PlaceOrder, ctx: &Self::Context) -> Result<Self, OrderError> {
        let total = validate_placement(&params)?;

        let placed_at = ctx.clock.now();
        let quote = ctx.policy.evaluate(placed_at, placed_at, total);

        Ok(Order::new(id, params, placed_at, quote.can_cancel_free, quote.penalty))
    }

    async fn handle_action(
        &mut self,
        action: OrderAction,
        ctx: &Self::Context,
    ) -> Result<ActionOutcome, OrderError> {
        let now = ctx.clock.now();
        match action {
            OrderAction::SendToChef => Ok(self.send_to_chef(now)),
            OrderAction::Accept { estimated_minutes } => self.accept(estimated_minutes, now),
            OrderAction::AssignPartner { partner } => self.assign_partner(partner, now),
            OrderAction::Advance { target, message } => self.advance(target, message, now),
            OrderAction::Cancel { reason } => self.cancel(reason, now),
            OrderAction::AddTip {
                recipient,
                amount,
                message,
            } => self.add_tip(recipient, amount, message, now),
        }
    }

    /// Writes the finished draft through to the store before it goes live.
    async fn on_commit(&self, ctx: &Self::Context) -> Result<(), OrderError> {
        ctx.store.put(self.clone()).await?;
        debug!(order_id = %self.id, status = %self.status, "Order persisted");
        Ok(())
    }

    fn mutates(result: &ActionOutcome) -> bool {
        matches!(result, ActionOutcome::Committed(_))
    }
}

/// Checks placement input and returns the grand total.
fn validate_placement(params: &PlaceOrder) -> Result<Money, OrderError> {
    if params.items.is_empty() {
        return Err(OrderError::ValidationError("order has no items".to_string()));
    }
    if let Some(item) = params.items.iter().find(|item| item.quantity == 0) {
        return Err(OrderError::ValidationError(format!(
            "item {} has zero quantity",
            item.dish_id
        )));
    }
    if let Some(item) = params.items.iter().find(|item| item.unit_price < Money::ZERO) {
        return Err(OrderError::ValidationError(format!(
            "item {} has a negative price",
            item.dish_id
        )));
    }
    let totals = &params.totals;
    for (name, value) in [
        ("subtotal", totals.subtotal),
        ("delivery_fee", totals.delivery_fee),
        ("taxes", totals.taxes),
    ] {
        if value < Money::ZERO {
            return Err(OrderError::ValidationError(format!("{name} must not be negative")));
        }
    }
    totals
        .checked_total()
        .ok_or_else(|| OrderError::ValidationError("order total is out of range".to_string()))
}

impl Order {
    /// Moves to `to` and appends the matching timeline entry, or fails without touching anything.
    fn transition(
        &mut self,
        to: OrderStatus,
        now: DateTime<Utc>,
        message: String,
        estimated_time: Option<DateTime<Utc>>,
    ) -> Result<OrderStatus, OrderError> {
        let from = self.status;
        if !from.can_transition_to(to) {
            return Err(OrderError::InvalidTransition { from, to });
        }

        // Timestamps never run backwards even if the wall clock does
        let timestamp = self
            .timeline
            .last()
            .map_or(now, |last| last.timestamp.max(now));

        self.status = to;
        self.timeline.push(TimelineEntry {
            status: to,
            timestamp,
            message,
            estimated_time,
        });
        Ok(from)
    }

    fn committed(&self, trigger: NotificationTrigger) -> ActionOutcome {
        ActionOutcome::Committed(Committed {
            order: self.clone(),
            trigger,
            cancellation: None,
        })
    }

    fn send_to_chef(&mut self, now: DateTime<Utc>) -> ActionOutcome {
        let status = self.status;
        // Only legal from PaymentConfirmed; the timer and an early confirm may both get here
        let Ok(from) = self.transition(
            OrderStatus::SentToChef,
            now,
            "Order sent to chef".to_string(),
            None,
        ) else {
            debug!(order_id = %self.id, %status, "Already past payment_confirmed, skipping");
            return ActionOutcome::Skipped { status };
        };
        self.can_cancel_free = false;

        info!(order_id = %self.id, "Order sent to chef");
        self.committed(NotificationTrigger::Transition {
            from,
            to: OrderStatus::SentToChef,
        })
    }

    fn accept(&mut self, estimated_minutes: u32, now: DateTime<Utc>) -> Result<ActionOutcome, OrderError> {
        if estimated_minutes == 0 {
            return Err(OrderError::ValidationError(
                "estimated minutes must be greater than zero".to_string(),
            ));
        }

        let eta = now + chrono::Duration::minutes(i64::from(estimated_minutes));
        let from = self.transition(
            OrderStatus::ChefAccepted,
            now,
            format!("Chef accepted your order, ready in about {estimated_minutes} minutes"),
            Some(eta),
        )?;
        self.estimated_delivery_time = Some(eta);

        Ok(self.committed(NotificationTrigger::Transition {
            from,
            to: OrderStatus::ChefAccepted,
        }))
    }

    fn assign_partner(&mut self, partner: DeliveryPartner, now: DateTime<Utc>) -> Result<ActionOutcome, OrderError> {
        if self.delivery_partner_id.is_some() {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: OrderStatus::DeliveryAssigned,
            });
        }

        let from = self.transition(
            OrderStatus::DeliveryAssigned,
            now,
            format!("{} is picking up your order", partner.name),
            None,
        )?;
        self.delivery_partner_id = Some(partner.id);
        self.delivery_partner_name = Some(partner.name);

        Ok(self.committed(NotificationTrigger::Transition {
            from,
            to: OrderStatus::DeliveryAssigned,
        }))
    }

    fn advance(
        &mut self,
        target: OrderStatus,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ActionOutcome, OrderError> {
        let default_message = match target {
            OrderStatus::Preparing => "Chef is preparing your food",
            OrderStatus::ReadyForPickup => "Your order is ready for pickup",
            OrderStatus::PickedUp => "Your order has been picked up",
            OrderStatus::OutForDelivery => "Your order is on the way",
            OrderStatus::Delivered => "Your order has been delivered",
            // Other targets have their own operations
            _ => {
                return Err(OrderError::InvalidTransition {
                    from: self.status,
                    to: target,
                })
            }
        };

        let from = self.transition(
            target,
            now,
            message.unwrap_or_else(|| default_message.to_string()),
            None,
        )?;
        if target == OrderStatus::Delivered {
            self.rating_eligible = true;
        }

        Ok(self.committed(NotificationTrigger::Transition { from, to: target }))
    }

    fn cancel(&mut self, reason: String, now: DateTime<Utc>) -> Result<ActionOutcome, OrderError> {
        let penalty_amount = if self.can_cancel_free {
            Money::ZERO
        } else {
            self.cancellation_penalty
        };
        let outcome = CancellationOutcome {
            penalty_amount,
            refund_amount: self.total - penalty_amount,
        };

        let from = self.transition(
            OrderStatus::Cancelled,
            now,
            format!("Order cancelled: {reason}"),
            None,
        )?;
        self.can_cancel_free = false;
        self.cancellation = Some(CancellationRecord {
            reason,
            cancelled_from: from,
            outcome,
            cancelled_at: now,
        });

        info!(
            order_id = %self.id,
            %from,
            penalty = %outcome.penalty_amount,
            refund = %outcome.refund_amount,
            "Order cancelled"
        );
        Ok(ActionOutcome::Committed(Committed {
            order: self.clone(),
            trigger: NotificationTrigger::Transition {
                from,
                to: OrderStatus::Cancelled,
            },
            cancellation: Some(outcome),
        }))
    }

    fn add_tip(
        &mut self,
        recipient: TipRecipient,
        amount: Money,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ActionOutcome, OrderError> {
        if amount <= Money::ZERO {
            return Err(OrderError::ValidationError(format!(
                "tip amount must be positive, got {amount}"
            )));
        }

        let tip = Some(Tip {
            amount,
            message,
            tipped_at: now,
        });
        match recipient {
            TipRecipient::Chef => self.chef_tip = tip,
            TipRecipient::Delivery => {
                if self.delivery_partner_id.is_none() {
                    return Err(OrderError::InvalidRecipient(format!(
                        "{} has no delivery partner assigned",
                        self.id
                    )));
                }
                self.delivery_tip = tip;
            }
        }

        Ok(self.committed(NotificationTrigger::Tip(recipient)))
    }
}
