//! EVM integration for the Pomodoro staking client.
//!
//! This crate implements the account and ledger seams of
//! `client-blockchain-core` on EVM chains:
//! - Chain Registry (built-in table, TOML override)
//! - JSON-RPC transport for nodes, bundlers and paymasters
//! - ERC-4337 v0.6 smart accounts with sponsored gas
//! - `games(address)` reads over `eth_call`
//! - Local private-key base wallet
//!
//! # Architecture
//!
//! ```text
//! LedgerOperation ──► LedgerCall ──► execute(dest, value, func)
//!                                        │
//!                                        ▼
//!                    UserOperation ──► paymaster ──► sign ──► bundler
//!                                                               │
//!                           eth_getUserOperationReceipt ◄───────┘
//!                           eth_getTransactionReceipt
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_evm::{AccountAbstractionConfig, ChainRegistry, EvmAccountProvider, LocalWallet};
//!
//! let registry = ChainRegistry::builtin();
//! let chain = registry.default_chain();
//! let provider = EvmAccountProvider::new(AccountAbstractionConfig::for_chain(chain.chain_id))?;
//! let wallet = Arc::new(LocalWallet::from_private_key(&key)?);
//! let account = provider.derive(wallet, chain).await?;
//! ```

pub mod account;
pub mod bundler;
pub mod config;
pub mod contracts;
pub mod core;
pub mod reader;
pub mod rpc;
pub mod utils;
pub mod wallet;

pub use account::{EvmAccountProvider, EvmSmartAccount};
pub use bundler::{BundlerClient, UserOperation};
pub use config::{AccountAbstractionConfig, BASE_SEPOLIA_CHAIN_ID, ChainRegistry};
pub use crate::core::{EvmError, Result};
pub use reader::EvmLedgerReader;
pub use rpc::JsonRpcClient;
pub use wallet::LocalWallet;
