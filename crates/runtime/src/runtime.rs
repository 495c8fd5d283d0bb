//! Runtime configuration and builder.
//!
//! [`RuntimeBuilder`] wires the ledger reader, cache, event bus and
//! orchestrator into a [`SessionMachine`] for one authenticated account.

use std::sync::Arc;
use std::time::Duration;

use client_blockchain_core::{ChainDescriptor, LedgerReader, SmartAccountHandle};

use crate::cache::GameCache;
use crate::events::EventBus;
use crate::inflight::InFlightOperations;
use crate::machine::SessionMachine;
use crate::orchestrator::{OrchestratorConfig, TransactionOrchestrator};

/// Runtime configuration shared by the machine and orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub orchestrator: OrchestratorConfig,
    pub event_buffer_size: usize,
}

impl RuntimeConfig {
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.orchestrator.confirmation_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.orchestrator.poll_interval = interval;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorConfig::default(),
            event_buffer_size: 100,
        }
    }
}

/// Builder for [`SessionMachine`].
pub struct RuntimeBuilder {
    reader: Arc<dyn LedgerReader>,
    config: RuntimeConfig,
    events: Option<EventBus>,
    cache: Option<Arc<GameCache>>,
    in_flight: Option<Arc<InFlightOperations>>,
}

impl RuntimeBuilder {
    pub fn new(reader: Arc<dyn LedgerReader>) -> Self {
        Self {
            reader,
            config: RuntimeConfig::default(),
            events: None,
            cache: None,
            in_flight: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Publish to an existing bus instead of creating one.
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Share a cache across sessions.
    pub fn cache(mut self, cache: Arc<GameCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Share in-flight slots across sessions of the same players.
    pub fn in_flight(mut self, in_flight: Arc<InFlightOperations>) -> Self {
        self.in_flight = Some(in_flight);
        self
    }

    pub fn build(self, handle: SmartAccountHandle, chain: ChainDescriptor) -> SessionMachine {
        let events = self
            .events
            .unwrap_or_else(|| EventBus::with_capacity(self.config.event_buffer_size));
        let orchestrator = TransactionOrchestrator::new(self.config.orchestrator, events.clone());

        tracing::debug!(
            player = %handle.address,
            chain_id = chain.chain_id,
            "Building session machine"
        );

        SessionMachine::new(
            handle,
            chain,
            self.reader,
            orchestrator,
            self.cache.unwrap_or_default(),
            events,
            self.in_flight.unwrap_or_default(),
        )
    }
}
