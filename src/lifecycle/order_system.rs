use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, EngineConfig};
use crate::directory::PartnerDirectory;
use crate::engine::OrderEngine;
use crate::notifications::{NotificationDispatcher, NotificationTransport, TracingTransport};
use crate::order_actor::{self, OrderContext, OrderError};
use crate::policy::CancellationPolicy;
use crate::store::{MemoryOrderStore, OrderStore};
use std::sync::Arc;
use tracing::{error, info};

/// The runtime orchestrator for the order engine.
///
/// `OrderSystem` is responsible for:
/// - **Dependency Wiring**: building the shared context every order actor receives
/// - **Seeding**: loading configured delivery partners into the directory
/// - **Lifecycle Management**: stopping timers, actors and notification delivery
///
/// # Example
///
/// ```ignore
/// let system = OrderSystem::builder(config)
///     .with_transport(Arc::new(PushGateway::new()))
///     .build()?;
///
/// let order_id = system.engine.place_order(params).await?;
///
/// // Gracefully shut down when done
/// system.shutdown().await?;
/// ```
pub struct OrderSystem {
    /// The public API.
    pub engine: OrderEngine,

    /// Directory of delivery partners, shared with the engine.
    pub directory: PartnerDirectory,
}

/// Collects optional overrides before the system is built.
pub struct OrderSystemBuilder {
    config: EngineConfig,
    store: Option<Arc<dyn OrderStore>>,
    transport: Option<Arc<dyn NotificationTransport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl OrderSystemBuilder {
    pub fn with_store(mut self, store: Arc<dyn OrderStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn NotificationTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validates the configuration and wires every component.
    ///
    /// Defaults: in-memory store, logging-only transport, system clock.
    pub fn build(self) -> Result<OrderSystem, ConfigError> {
        self.config.validate()?;
        let policy = CancellationPolicy::from_config(&self.config.policy)?;

        let context = Arc::new(OrderContext {
            policy,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryOrderStore::new())),
        });
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(TracingTransport));

        let directory = PartnerDirectory::with_partners(self.config.partners);
        let dispatcher = NotificationDispatcher::new(transport, self.config.notifications.max_in_flight);
        let registry = order_actor::new(self.config.actor.mailbox_capacity);

        info!(
            grace_window_secs = self.config.policy.grace_window_secs,
            penalty_rate = %self.config.policy.penalty_rate,
            "Order system started"
        );

        Ok(OrderSystem {
            engine: OrderEngine::new(registry, context, directory.clone(), dispatcher),
            directory,
        })
    }
}

impl OrderSystem {
    pub fn builder(config: EngineConfig) -> OrderSystemBuilder {
        OrderSystemBuilder {
            config,
            store: None,
            transport: None,
            clock: None,
        }
    }

    /// Builds a system with every default.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::builder(config).build()
    }

    /// Gracefully shuts down the engine.
    ///
    /// Pending grace-window timers are dropped, every order actor drains its mailbox
    /// and exits, and in-flight notifications are allowed to finish.
    pub async fn shutdown(self) -> Result<(), OrderError> {
        info!("Shutting down system...");

        if let Err(e) = self.engine.shutdown().await {
            error!(error = %e, "Shutdown failed");
            return Err(e);
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
