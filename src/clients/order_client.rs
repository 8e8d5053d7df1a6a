//! # Order Client
//!
//! Provides a typed API over one order's mailbox. It wraps an
//! `EntityClient<Order>` and exposes one method per [`OrderAction`] variant, so
//! callers never build actions or unwrap framework errors by hand.

use crate::framework::EntityClient;
use crate::model::{DeliveryPartner, Money, Order, OrderStatus, TipRecipient};
use crate::order_actor::{ActionOutcome, OrderAction, OrderError};
use tracing::{debug, instrument};

/// Client for a single order's actor.
#[derive(Clone)]
pub struct OrderClient {
    inner: EntityClient<Order>,
}

impl OrderClient {
    pub fn new(inner: EntityClient<Order>) -> Self {
        Self { inner }
    }

    /// The actor's live copy of the order.
    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> Result<Order, OrderError> {
        debug!("Sending request");
        self.inner.get().await.map_err(OrderError::from)
    }
}

/// Generates one async method per action variant, named after the variant in snake case.
macro_rules! order_actions {
    ($( $(#[$doc:meta])* $variant:ident { $($field:ident : $ty:ty),* } ),* $(,)?) => {
        paste::paste! {
            impl OrderClient {
                $(
                    $(#[$doc])*
                    #[instrument(skip(self))]
                    pub async fn [<$variant:snake>](&self, $($field: $ty),*) -> Result<ActionOutcome, OrderError> {
                        debug!("Sending request");
                        self.inner
                            .perform_action(OrderAction::$variant { $($field),* })
                            .await
                            .map_err(OrderError::from)
                    }
                )*
            }
        }
    };
}

order_actions! {
    /// Hands the order to the chef. Skipped unless still `payment_confirmed`.
    SendToChef {},
    Accept { estimated_minutes: u32 },
    AssignPartner { partner: DeliveryPartner },
    Advance { target: OrderStatus, message: Option<String> },
    Cancel { reason: String },
    AddTip { recipient: TipRecipient, amount: Money, message: Option<String> },
}
