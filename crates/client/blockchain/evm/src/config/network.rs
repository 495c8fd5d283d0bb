//! Account-abstraction endpoints and contracts.

use std::time::Duration;

use alloy_primitives::{Address, U256, address};

use crate::core::error::{EvmError, Result};

/// EntryPoint v0.6, deployed at the same address on every network.
pub const ENTRY_POINT_V06: Address = address!("0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");

/// SimpleAccountFactory for EntryPoint v0.6.
pub const SIMPLE_ACCOUNT_FACTORY_V06: Address =
    address!("0x9406Cc6185a346906296840746125a0E44976454");

/// Bundler, paymaster and account-factory settings for one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountAbstractionConfig {
    /// ERC-4337 bundler endpoint
    pub bundler_url: String,

    /// Paymaster endpoint serving `pm_sponsorUserOperation`
    pub paymaster_url: String,

    pub entry_point: Address,

    /// Factory deriving counterfactual account addresses
    pub account_factory: Address,

    /// Salt passed to the factory; distinct indexes give distinct accounts
    pub account_index: U256,

    /// Blocks a transaction must be buried under to count as confirmed
    pub confirmations: u64,

    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,
}

impl AccountAbstractionConfig {
    /// Hosted endpoints for `chain_id` with v0.6 contracts.
    pub fn for_chain(chain_id: u64) -> Self {
        Self {
            bundler_url: format!("https://bundler.biconomy.io/api/v2/{chain_id}/"),
            paymaster_url: format!("https://paymaster.biconomy.io/api/v1/{chain_id}/"),
            entry_point: ENTRY_POINT_V06,
            account_factory: SIMPLE_ACCOUNT_FACTORY_V06,
            account_index: U256::ZERO,
            confirmations: 1,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_bundler_url(mut self, url: impl Into<String>) -> Self {
        self.bundler_url = url.into();
        self
    }

    pub fn with_paymaster_url(mut self, url: impl Into<String>) -> Self {
        self.paymaster_url = url.into();
        self
    }

    pub fn with_entry_point(mut self, entry_point: Address) -> Self {
        self.entry_point = entry_point;
        self
    }

    pub fn with_account_factory(mut self, factory: Address) -> Self {
        self.account_factory = factory;
        self
    }

    pub fn with_account_index(mut self, index: u64) -> Self {
        self.account_index = U256::from(index);
        self
    }

    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (label, raw) in [("bundler", &self.bundler_url), ("paymaster", &self.paymaster_url)] {
            let url = url::Url::parse(raw)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(EvmError::InvalidConfig(format!(
                    "{label} URL must be http(s): {raw}"
                )));
            }
        }
        if self.entry_point == Address::ZERO {
            return Err(EvmError::InvalidConfig("entry point is unset".to_string()));
        }
        if self.account_factory == Address::ZERO {
            return Err(EvmError::InvalidConfig("account factory is unset".to_string()));
        }
        Ok(())
    }
}
