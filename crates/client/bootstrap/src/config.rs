//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use client_blockchain_core::Address;
use client_blockchain_evm::config::BASE_SEPOLIA_CHAIN_ID;
use client_blockchain_evm::{AccountAbstractionConfig, ChainRegistry, LocalWallet};
use runtime::{FundingEnvironment, RuntimeConfig, TransakWidget};

/// Configuration required to bootstrap a client session.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub chain_id: u64,
    pub chains_file: Option<PathBuf>,
    pub private_key: Option<String>,
    pub account: AccountConfig,
    pub tracking: TrackingConfig,
    pub funding: FundingConfig,
    pub log_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_id: BASE_SEPOLIA_CHAIN_ID,
            chains_file: None,
            private_key: None,
            account: AccountConfig::default(),
            tracking: TrackingConfig::default(),
            funding: FundingConfig::default(),
            log_dir: None,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SLASHER_CHAIN_ID` - Target network (default: 84532, Base Sepolia)
    /// - `SLASHER_CHAINS_FILE` - TOML registry replacing the built-in table
    /// - `SLASHER_PRIVATE_KEY` - Base wallet key (default: not authenticated)
    /// - `SLASHER_BUNDLER_URL` / `SLASHER_PAYMASTER_URL` - Endpoint overrides
    /// - `SLASHER_ENTRY_POINT` / `SLASHER_ACCOUNT_FACTORY` - Contract overrides
    /// - `SLASHER_ACCOUNT_INDEX` - Account salt (default: 0)
    /// - `SLASHER_CONFIRMATION_TIMEOUT_SECS` - Tracking ceiling (default: 120)
    /// - `SLASHER_POLL_INTERVAL_MS` - Status polling cadence (default: 2000)
    /// - `SLASHER_CONFIRMATIONS` - Blocks required for confirmation (default: 1)
    /// - `SLASHER_FUNDING_ENV` - `staging` or `production` (default: staging)
    /// - `SLASHER_FUNDING_API_KEY` - On-ramp API key
    /// - `SLASHER_LOG_DIR` - Log directory (default: platform-specific)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(chain_id) = read_parsed::<u64>(&read, "SLASHER_CHAIN_ID") {
            config.chain_id = chain_id;
        }
        config.chains_file = read("SLASHER_CHAINS_FILE").map(PathBuf::from);
        config.private_key = read("SLASHER_PRIVATE_KEY");

        // Account abstraction overrides
        config.account.bundler_url = read("SLASHER_BUNDLER_URL");
        config.account.paymaster_url = read("SLASHER_PAYMASTER_URL");
        config.account.entry_point = read("SLASHER_ENTRY_POINT");
        config.account.account_factory = read("SLASHER_ACCOUNT_FACTORY");
        if let Some(index) = read_parsed::<u64>(&read, "SLASHER_ACCOUNT_INDEX") {
            config.account.account_index = index;
        }

        // Tracking
        if let Some(secs) = read_parsed::<u64>(&read, "SLASHER_CONFIRMATION_TIMEOUT_SECS") {
            config.tracking.confirmation_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(ms) = read_parsed::<u64>(&read, "SLASHER_POLL_INTERVAL_MS") {
            config.tracking.poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(confirmations) = read_parsed::<u64>(&read, "SLASHER_CONFIRMATIONS") {
            config.tracking.confirmations = confirmations.max(1);
        }

        // Funding
        if let Some(environment) = read_parsed::<FundingEnvironment>(&read, "SLASHER_FUNDING_ENV") {
            config.funding.environment = environment;
        }
        config.funding.api_key = read("SLASHER_FUNDING_API_KEY");

        config.log_dir = read("SLASHER_LOG_DIR").map(PathBuf::from);

        config
    }

    /// The configured chains file, or the built-in table.
    pub fn registry(&self) -> Result<ChainRegistry> {
        match &self.chains_file {
            Some(path) => ChainRegistry::from_toml_file(path)
                .with_context(|| format!("Failed to load chains file {}", path.display())),
            None => Ok(ChainRegistry::builtin()),
        }
    }

    /// Endpoints and contracts for the configured chain.
    pub fn account_abstraction(&self) -> Result<AccountAbstractionConfig> {
        let mut config = AccountAbstractionConfig::for_chain(self.chain_id)
            .with_account_index(self.account.account_index)
            .with_confirmations(self.tracking.confirmations);

        if let Some(url) = &self.account.bundler_url {
            config = config.with_bundler_url(url.clone());
        }
        if let Some(url) = &self.account.paymaster_url {
            config = config.with_paymaster_url(url.clone());
        }
        if let Some(raw) = &self.account.entry_point {
            let entry_point: Address = raw
                .parse()
                .with_context(|| format!("SLASHER_ENTRY_POINT is not an address: {raw}"))?;
            config = config.with_entry_point(entry_point);
        }
        if let Some(raw) = &self.account.account_factory {
            let factory: Address = raw
                .parse()
                .with_context(|| format!("SLASHER_ACCOUNT_FACTORY is not an address: {raw}"))?;
            config = config.with_account_factory(factory);
        }

        config.validate()?;
        Ok(config)
    }

    /// Base wallet from `SLASHER_PRIVATE_KEY`, if one is configured.
    pub fn wallet(&self) -> Result<Option<LocalWallet>> {
        self.private_key
            .as_deref()
            .map(|key| LocalWallet::from_private_key(key).context("SLASHER_PRIVATE_KEY is invalid"))
            .transpose()
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::default()
            .with_confirmation_timeout(self.tracking.confirmation_timeout)
            .with_poll_interval(self.tracking.poll_interval)
    }

    pub fn funding_widget(&self) -> TransakWidget {
        TransakWidget::new(self.funding.environment, self.funding.api_key.clone())
    }

    /// `SLASHER_LOG_DIR`, or the platform log directory.
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }
}

/// Platform-specific log directory.
///
/// - macOS: `~/Library/Caches/slasher/logs`
/// - Linux: `~/.cache/slasher/logs` (or `$XDG_CACHE_HOME/slasher/logs`)
/// - Windows: `%LOCALAPPDATA%\slasher\cache\logs`
pub fn default_log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "slasher")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| env::temp_dir().join("slasher"))
        .join("logs")
}

/// Raw account-abstraction overrides; validated when the provider is built.
#[derive(Clone, Debug, Default)]
pub struct AccountConfig {
    pub bundler_url: Option<String>,
    pub paymaster_url: Option<String>,
    pub entry_point: Option<String>,
    pub account_factory: Option<String>,
    pub account_index: u64,
}

#[derive(Clone, Debug)]
pub struct TrackingConfig {
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    pub confirmations: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(2000),
            confirmations: 1,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FundingConfig {
    pub environment: FundingEnvironment,
    pub api_key: Option<String>,
}

fn read_parsed<T>(read: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    read(key)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::{BaseWallet, U256};
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_target_base_sepolia() {
        let config = config_from(&[]);

        assert_eq!(config.chain_id, 84532);
        assert!(config.private_key.is_none());
        assert_eq!(config.tracking.confirmation_timeout, Duration::from_secs(120));
        assert_eq!(config.tracking.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.funding.environment, FundingEnvironment::Staging);
        assert!(config.wallet().unwrap().is_none());
        assert_eq!(config.resolved_log_dir(), default_log_dir());
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("SLASHER_CHAIN_ID", "base"),
            ("SLASHER_POLL_INTERVAL_MS", "-5"),
            ("SLASHER_CONFIRMATIONS", "0"),
            ("SLASHER_FUNDING_ENV", "moon"),
        ]);

        assert_eq!(config.chain_id, 84532);
        assert_eq!(config.tracking.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.tracking.confirmations, 1);
        assert_eq!(config.funding.environment, FundingEnvironment::Staging);
    }

    #[test]
    fn overrides_reach_account_abstraction_config() {
        let config = config_from(&[
            ("SLASHER_BUNDLER_URL", "http://localhost:4337"),
            ("SLASHER_ACCOUNT_INDEX", "3"),
            ("SLASHER_CONFIRMATIONS", "2"),
            ("SLASHER_FUNDING_ENV", "production"),
        ]);
        let aa = config.account_abstraction().unwrap();

        assert_eq!(aa.bundler_url, "http://localhost:4337");
        assert_eq!(aa.paymaster_url, "https://paymaster.biconomy.io/api/v1/84532/");
        assert_eq!(aa.account_index, U256::from(3u64));
        assert_eq!(aa.confirmations, 2);
        assert_eq!(config.funding.environment, FundingEnvironment::Production);
    }

    #[test]
    fn malformed_key_and_addresses_are_errors() {
        let config = config_from(&[
            ("SLASHER_PRIVATE_KEY", "0xnot-a-key"),
            ("SLASHER_ENTRY_POINT", "entrypoint"),
        ]);

        assert!(config.wallet().is_err());
        assert!(config.account_abstraction().is_err());
    }

    #[test]
    fn private_key_yields_wallet() {
        let config = config_from(&[(
            "SLASHER_PRIVATE_KEY",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )]);
        let wallet = config.wallet().unwrap().unwrap();
        assert_eq!(
            wallet.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn chains_file_replaces_builtin_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chains.toml");
        std::fs::write(
            &path,
            r#"
default = 31337

[[chains]]
name = "Anvil"
contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
rpc_url = "http://localhost:8545"
explorer_url_prefix = "http://localhost/tx/"
chain_id = 31337
"#,
        )
        .unwrap();

        let config = config_from(&[("SLASHER_CHAINS_FILE", path.to_str().unwrap())]);
        let registry = config.registry().unwrap();
        assert_eq!(registry.default_chain().chain_id, 31337);
        assert!(registry.get(84532).is_none());

        let missing = config_from(&[("SLASHER_CHAINS_FILE", "/nonexistent/chains.toml")]);
        assert!(missing.registry().is_err());
    }
}
