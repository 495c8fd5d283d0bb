//! Chain Registry: the sole source of network parameters.
//!
//! A built-in table covers the networks the ledger is deployed on. A TOML file
//! can replace it entirely:
//!
//! ```toml
//! default = 84532
//!
//! [[chains]]
//! name = "Base Sepolia"
//! contract_address = "0x166c5cef16D3234621059EEa66c1144A4F4807E2"
//! rpc_url = "https://sepolia.base.org"
//! explorer_url_prefix = "https://sepolia.basescan.org/tx/"
//! chain_id = 84532
//! ```

use std::collections::HashSet;
use std::path::Path;

use alloy_primitives::address;
use client_blockchain_core::ChainDescriptor;
use serde::Deserialize;
use url::Url;

use crate::core::error::{EvmError, Result};

pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;

/// Immutable table of supported networks.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<ChainDescriptor>,
    default_chain_id: u64,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    default: Option<u64>,
    chains: Vec<ChainDescriptor>,
}

impl ChainRegistry {
    /// Networks the Pomodoro ledger is deployed on.
    pub fn builtin() -> Self {
        Self {
            chains: vec![ChainDescriptor {
                name: "Base Sepolia".to_string(),
                contract_address: address!("0x166c5cef16D3234621059EEa66c1144A4F4807E2"),
                rpc_url: "https://sepolia.base.org".to_string(),
                explorer_url_prefix: "https://sepolia.basescan.org/tx/".to_string(),
                chain_id: BASE_SEPOLIA_CHAIN_ID,
            }],
            default_chain_id: BASE_SEPOLIA_CHAIN_ID,
        }
    }

    /// Build a registry from explicit descriptors.
    ///
    /// The default is the first entry unless `default_chain_id` names another.
    pub fn from_chains(chains: Vec<ChainDescriptor>, default_chain_id: Option<u64>) -> Result<Self> {
        let first = chains
            .first()
            .ok_or_else(|| EvmError::InvalidConfig("chain registry is empty".to_string()))?;
        let default_chain_id = default_chain_id.unwrap_or(first.chain_id);

        let mut seen = HashSet::new();
        for chain in &chains {
            if !seen.insert(chain.chain_id) {
                return Err(EvmError::InvalidConfig(format!(
                    "duplicate chain id {}",
                    chain.chain_id
                )));
            }
            validate_url(&chain.rpc_url, &chain.name)?;
            validate_url(&chain.explorer_url_prefix, &chain.name)?;
        }

        if !seen.contains(&default_chain_id) {
            return Err(EvmError::InvalidConfig(format!(
                "default chain {default_chain_id} is not in the registry"
            )));
        }

        Ok(Self {
            chains,
            default_chain_id,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(content)?;
        Self::from_chains(file.chains, file.default)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainDescriptor> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// Like [`ChainRegistry::get`], failing for unknown ids.
    pub fn require(&self, chain_id: u64) -> Result<&ChainDescriptor> {
        self.get(chain_id).ok_or_else(|| {
            EvmError::InvalidConfig(format!("chain {chain_id} is not in the registry"))
        })
    }

    pub fn default_chain(&self) -> &ChainDescriptor {
        // Presence of the default is checked on construction
        self.get(self.default_chain_id).unwrap_or(&self.chains[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainDescriptor> {
        self.chains.iter()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_url(raw: &str, chain: &str) -> Result<()> {
    let url = Url::parse(raw)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(EvmError::InvalidConfig(format!(
            "{chain}: unsupported URL scheme in {raw}"
        )));
    }
    Ok(())
}
