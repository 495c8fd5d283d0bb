//! Account and ledger seams.
//!
//! - [`BaseWallet`]: the authenticated externally-owned signer
//! - [`AccountProvider`]: derives a sponsor-capable smart account from it
//! - [`SmartAccount`]: submits sponsored operations and reports their progress
//! - [`LedgerReader`]: reads a player's game record

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::ledger::LedgerCall;
use crate::types::{
    Address, Bytes, ChainDescriptor, Game, Inclusion, OperationId, TxHash, TxReceipt,
};

/// Authenticated base wallet.
#[async_trait]
pub trait BaseWallet: Send + Sync {
    fn address(&self) -> Address;

    /// Sign `message` with the EIP-191 personal-message prefix.
    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, TransportError>;
}

/// Derives smart accounts from base wallets.
///
/// Derivation is a query against the account-abstraction provider: it never
/// touches the ledger and returns an equivalent account when repeated.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    async fn derive(
        &self,
        wallet: Arc<dyn BaseWallet>,
        chain: &ChainDescriptor,
    ) -> Result<Arc<dyn SmartAccount>, TransportError>;
}

/// Sponsor-capable account able to execute ledger calls.
#[async_trait]
pub trait SmartAccount: Send + Sync {
    fn address(&self) -> Address;

    fn chain_id(&self) -> u64;

    /// Sign and hand `call` to the bundler with sponsorship requested.
    async fn send_sponsored(&self, call: LedgerCall) -> Result<OperationId, TransportError>;

    /// `None` until the operation has been included in a transaction.
    async fn inclusion(&self, operation: &OperationId) -> Result<Option<Inclusion>, TransportError>;

    /// `None` until the transaction is final by the provider's standard.
    async fn confirmation(&self, tx_hash: &TxHash) -> Result<Option<TxReceipt>, TransportError>;
}

/// Read access to the ledger's per-player record.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Returns [`Game::empty`] when the player has no game.
    async fn game(&self, chain: &ChainDescriptor, player: Address) -> Result<Game, TransportError>;
}
