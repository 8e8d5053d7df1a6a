//! Engine configuration.
//!
//! Loaded from TOML. Every section is optional and falls back to defaults:
//!
//! ```toml
//! [policy]
//! grace_window_secs = 30
//! penalty_rate = "0.5"
//!
//! [actor]
//! mailbox_capacity = 32
//!
//! [notifications]
//! max_in_flight = 16
//!
//! [[partners]]
//! id = "dp_1"
//! name = "Ravi"
//! rating = 4.8
//! vehicle = "scooter"
//! location = { lat = 12.97, lng = 77.59 }
//! ```

use crate::model::DeliveryPartner;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // Keep the message, drop the echoed input
        ConfigError::Parse(err.message().to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub actor: ActorConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Candidate delivery partners loaded into the directory at startup.
    #[serde(default)]
    pub partners: Vec<DeliveryPartner>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Free-cancellation window measured from placement.
    #[serde(default = "default_grace_window_secs")]
    pub grace_window_secs: u64,
    /// Fraction of the order total charged when cancelling outside the window.
    #[serde(default = "default_penalty_rate")]
    pub penalty_rate: Decimal,
}

fn default_grace_window_secs() -> u64 {
    30
}

fn default_penalty_rate() -> Decimal {
    Decimal::new(5, 1)
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            grace_window_secs: default_grace_window_secs(),
            penalty_rate: default_penalty_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActorConfig {
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

fn default_mailbox_capacity() -> usize {
    32
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: default_mailbox_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    /// Upper bound on transport calls running at once.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_max_in_flight() -> usize {
    16
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actor.mailbox_capacity == 0 {
            return Err(ConfigError::Validation(
                "actor.mailbox_capacity must be greater than zero".to_string(),
            ));
        }
        if self.notifications.max_in_flight == 0 {
            return Err(ConfigError::Validation(
                "notifications.max_in_flight must be greater than zero".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for partner in &self.partners {
            if !seen.insert(&partner.id) {
                return Err(ConfigError::Validation(format!(
                    "duplicate delivery partner id: {}",
                    partner.id
                )));
            }
        }
        crate::policy::CancellationPolicy::from_config(&self.policy)?;
        Ok(())
    }
}
