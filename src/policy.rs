//! Cancellation policy.
//!
//! A pure function of placement time, "now" and the order total. Cancelling inside
//! the grace window is free; outside it the customer pays `total * penalty_rate`,
//! rounded to cents. The result is evaluated once at placement and frozen on the
//! order; cancellation trusts the frozen flag rather than the clock.

use crate::config::{ConfigError, PolicyConfig};
use crate::model::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;

/// Result of evaluating the policy at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CancellationQuote {
    pub can_cancel_free: bool,
    /// Charged when cancellation is not free.
    pub penalty: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancellationPolicy {
    grace_window: Duration,
    penalty_rate: Decimal,
}

impl CancellationPolicy {
    pub fn new(grace_window: Duration, penalty_rate: Decimal) -> Result<Self, ConfigError> {
        if penalty_rate < Decimal::ZERO || penalty_rate > Decimal::ONE {
            return Err(ConfigError::Validation(format!(
                "penalty_rate must be within [0, 1], got {penalty_rate}"
            )));
        }
        if grace_window.is_zero() {
            return Err(ConfigError::Validation(
                "grace_window_secs must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            grace_window,
            penalty_rate,
        })
    }

    pub fn from_config(config: &PolicyConfig) -> Result<Self, ConfigError> {
        Self::new(Duration::from_secs(config.grace_window_secs), config.penalty_rate)
    }

    pub fn grace_window(&self) -> Duration {
        self.grace_window
    }

    pub fn penalty_rate(&self) -> Decimal {
        self.penalty_rate
    }

    /// Penalty owed for cancelling an order of `total` outside the grace window.
    pub fn penalty_for(&self, total: Money) -> Money {
        total.saturating_mul(self.penalty_rate).round_dp(2)
    }

    /// Whether `now` still falls inside the free window opened at `placed_at`.
    ///
    /// A `now` earlier than `placed_at` (clock skew) counts as inside the window.
    pub fn within_grace_window(&self, placed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match (now - placed_at).to_std() {
            Ok(elapsed) => elapsed < self.grace_window,
            Err(_) => true,
        }
    }

    pub fn evaluate(&self, placed_at: DateTime<Utc>, now: DateTime<Utc>, total: Money) -> CancellationQuote {
        CancellationQuote {
            can_cancel_free: self.within_grace_window(placed_at, now),
            penalty: self.penalty_for(total),
        }
    }
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        let config = PolicyConfig::default();
        Self {
            grace_window: Duration::from_secs(config.grace_window_secs),
            penalty_rate: config.penalty_rate,
        }
    }
}
