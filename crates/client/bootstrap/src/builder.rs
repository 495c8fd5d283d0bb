//! Builds the chain, account and ledger stack used by front-ends.
use std::sync::Arc;

use anyhow::{Context, Result};
use client_blockchain_core::{AccountProvider, BaseWallet, ChainDescriptor, LedgerReader};
use client_blockchain_evm::{ChainRegistry, EvmAccountProvider, EvmLedgerReader};
use runtime::{EventBus, GameCache, InFlightOperations, RuntimeBuilder};

use crate::account::AccountBootstrap;
use crate::config::ClientConfig;
use crate::session::ClientSession;

/// Builder that assembles the registry, account provider and ledger reader.
///
/// Defaults to the EVM implementations; tests and offline runs can swap in
/// any [`AccountProvider`] or [`LedgerReader`].
pub struct ClientBuilder {
    config: ClientConfig,
    registry: Option<ChainRegistry>,
    provider: Option<Arc<dyn AccountProvider>>,
    reader: Option<Arc<dyn LedgerReader>>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            registry: None,
            provider: None,
            reader: None,
        }
    }

    pub fn registry(mut self, registry: ChainRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn account_provider(mut self, provider: Arc<dyn AccountProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn ledger_reader(mut self, reader: Arc<dyn LedgerReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn build(self) -> Result<ClientContext> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => self.config.registry()?,
        };
        let chain = registry
            .require(self.config.chain_id)
            .with_context(|| format!("Chain {} is not in the registry", self.config.chain_id))?
            .clone();

        let provider: Arc<dyn AccountProvider> = match self.provider {
            Some(provider) => provider,
            None => {
                let aa = self.config.account_abstraction()?;
                tracing::debug!(
                    bundler = %aa.bundler_url,
                    paymaster = %aa.paymaster_url,
                    entry_point = %aa.entry_point,
                    "Using account-abstraction endpoints"
                );
                Arc::new(EvmAccountProvider::new(aa)?)
            }
        };
        let reader: Arc<dyn LedgerReader> = match self.reader {
            Some(reader) => reader,
            None => Arc::new(EvmLedgerReader::default()),
        };

        tracing::info!(chain = %chain.name, chain_id = chain.chain_id, "Client configured");

        Ok(ClientContext {
            config: self.config,
            registry,
            chain,
            bootstrap: Arc::new(AccountBootstrap::new(provider)),
            reader,
            cache: Arc::new(GameCache::new()),
            in_flight: Arc::new(InFlightOperations::new()),
            events: EventBus::new(),
        })
    }
}

/// Everything needed to log a wallet in on the configured chain.
pub struct ClientContext {
    config: ClientConfig,
    registry: ChainRegistry,
    chain: ChainDescriptor,
    bootstrap: Arc<AccountBootstrap>,
    reader: Arc<dyn LedgerReader>,
    cache: Arc<GameCache>,
    in_flight: Arc<InFlightOperations>,
    events: EventBus,
}

impl ClientContext {
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn chain(&self) -> &ChainDescriptor {
        &self.chain
    }

    pub fn bootstrap(&self) -> &Arc<AccountBootstrap> {
        &self.bootstrap
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Derive the smart account for `wallet` and start its session.
    ///
    /// Sessions share this context's cache and in-flight slots. Front-ends
    /// go through [`SessionSlot::login`](crate::SessionSlot::login).
    pub(crate) async fn login(
        &self,
        wallet: Option<Arc<dyn BaseWallet>>,
    ) -> client_blockchain_core::Result<ClientSession> {
        let handle = self.bootstrap.derive(wallet, &self.chain).await?;
        let machine = RuntimeBuilder::new(Arc::clone(&self.reader))
            .config(self.config.runtime_config())
            .events(self.events.clone())
            .cache(Arc::clone(&self.cache))
            .in_flight(Arc::clone(&self.in_flight))
            .build(handle, self.chain.clone());

        Ok(ClientSession::new(Arc::clone(&self.bootstrap), machine))
    }
}
