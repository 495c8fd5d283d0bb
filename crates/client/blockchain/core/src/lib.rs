//! Blockchain abstraction layer for the Pomodoro staking client.
//!
//! This crate provides the chain-family types and seams the rest of the
//! client is written against.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: Remote Ledger Interface (ledger)
//!          └── typed contract ABI, calldata codec, game record decoding
//!
//! Layer 1: Account seams (traits)
//!          ├── BaseWallet       authenticated signer
//!          ├── AccountProvider  smart account derivation
//!          ├── SmartAccount     sponsored submission + tracking
//!          └── LedgerReader     games(address) reads
//!
//! Layer 0: Domain types and errors (types, error)
//! ```
//!
//! # Design Philosophy
//!
//! - **Layer 0**: Plain data, no I/O
//! - **Layer 1**: Async traits implemented by transport crates (EVM, mock)
//! - **Layer 2**: The contract is never implemented here, only described
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_core::{LedgerOperation, SmartAccount};
//!
//! async fn complete(account: &dyn SmartAccount, chain: &ChainDescriptor) {
//!     let call = LedgerOperation::CompleteTask.into_call(chain.contract_address);
//!     let id = account.send_sponsored(call).await?;
//! }
//! ```

pub mod error;
pub mod ledger;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export error taxonomy
pub use error::{Result, SessionError, TransportError};

// Re-export ledger codec
pub use ledger::{LedgerCall, LedgerOperation};

// Re-export all traits
pub use traits::{AccountProvider, BaseWallet, LedgerReader, SmartAccount};

// Re-export all types
pub use types::{
    Address, B256, Bytes, ChainDescriptor, Game, GameConfig, Inclusion, OperationId,
    OperationKind, OperationStatus, PendingOperation, SmartAccountHandle, TxHash, TxReceipt,
    U256,
};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockAccountProvider, MockLedger, MockSmartAccount, MockWallet};
