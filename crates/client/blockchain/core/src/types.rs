//! Common types for ledger interactions.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use alloy_primitives::{Address, B256, Bytes, U256};

use crate::error::SessionError;
use crate::traits::SmartAccount;

/// Hash of a mined transaction.
pub type TxHash = B256;

// ============================================================================
// Network
// ============================================================================

/// One supported network and the ledger deployed on it.
///
/// Descriptors are loaded once at process start and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    /// Human-readable network name (e.g. "Base Sepolia")
    pub name: String,

    /// Address of the Pomodoro ledger contract
    pub contract_address: Address,

    /// JSON-RPC endpoint
    pub rpc_url: String,

    /// Explorer prefix; a transaction hash is appended to it
    pub explorer_url_prefix: String,

    /// EIP-155 chain id
    pub chain_id: u64,
}

impl ChainDescriptor {
    /// Explorer link for a transaction on this network.
    pub fn explorer_tx_url(&self, tx_hash: &TxHash) -> String {
        format!("{}{}", self.explorer_url_prefix, tx_hash)
    }

    /// Network slug used by fiat on-ramps (e.g. "base_sepolia").
    pub fn ramp_network(&self) -> String {
        self.name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("_")
    }
}

// ============================================================================
// Ledger records
// ============================================================================

/// Parameters for a new commitment, in contract units (seconds, wei).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Focus session duration in seconds
    pub time: u64,

    /// Tasks committed for the round cycle
    pub task_amount: u32,

    /// Stake in wei
    pub amount: U256,

    /// Break duration in seconds
    pub break_time: u64,

    /// Rounds committed
    pub rounds: u32,
}

impl GameConfig {
    /// Build a config from the units users type: minutes and decimal ether.
    pub fn from_minutes(
        time_minutes: u64,
        task_amount: u32,
        stake_ether: &str,
        break_minutes: u64,
        rounds: u32,
    ) -> Result<Self, SessionError> {
        let amount = alloy_primitives::utils::parse_ether(stake_ether.trim()).map_err(|e| {
            SessionError::InvalidConfig(format!("invalid stake amount {stake_ether:?}: {e}"))
        })?;

        Ok(Self {
            time: time_minutes.saturating_mul(60),
            task_amount,
            amount,
            break_time: break_minutes.saturating_mul(60),
            rounds,
        })
    }

    /// Client-side validation performed before anything is submitted.
    ///
    /// `amount` and `break_time` are unsigned, so `>= 0` holds by construction.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.time == 0 {
            return Err(SessionError::InvalidConfig(
                "session time must be greater than 0".to_string(),
            ));
        }
        if self.task_amount == 0 {
            return Err(SessionError::InvalidConfig(
                "task amount must be greater than 0".to_string(),
            ));
        }
        if self.rounds == 0 {
            return Err(SessionError::InvalidConfig(
                "rounds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            time: 25 * 60,
            task_amount: 1,
            amount: U256::from(10_000_000_000_000_000u64), // 0.01 ether
            break_time: 5 * 60,
            rounds: 4,
        }
    }
}

/// Mirror of the ledger's `games(player)` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub time: u64,
    pub task_amount: u32,
    pub task_completed: u32,
    pub amount: U256,
    pub break_time: u64,
    pub rounds: u32,
    pub player: Address,
}

impl Game {
    /// Record returned by the ledger for a player with no game.
    pub fn empty() -> Self {
        Self {
            time: 0,
            task_amount: 0,
            task_completed: 0,
            amount: U256::ZERO,
            break_time: 0,
            rounds: 0,
            player: Address::ZERO,
        }
    }

    /// A zero `player` means "no active game".
    pub fn is_empty(&self) -> bool {
        self.player == Address::ZERO
    }

    /// All committed tasks have been reported to the ledger.
    pub fn all_tasks_completed(&self) -> bool {
        self.task_completed >= self.task_amount
    }

    pub fn remaining_tasks(&self) -> u32 {
        self.task_amount.saturating_sub(self.task_completed)
    }

    /// Stake formatted in ether.
    pub fn stake_ether(&self) -> String {
        alloy_primitives::utils::format_ether(self.amount)
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Ledger-mutating operations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
pub enum OperationKind {
    CreateGame,
    CompleteTask,
    EndGame,
}

/// Life-cycle of one orchestrated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum OperationStatus {
    /// Calldata being assembled; nothing has left the process
    Building,
    /// Handed to the bundler; waiting for a transaction hash
    Submitted,
    /// Transaction hash known; waiting for finality
    AwaitingConfirmation,
    Confirmed,
    Failed,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationStatus::Confirmed | OperationStatus::Failed)
    }

    fn can_advance_to(self, next: OperationStatus) -> bool {
        use OperationStatus::*;
        matches!(
            (self, next),
            (Building, Submitted)
                | (Building, Failed)
                | (Submitted, AwaitingConfirmation)
                | (Submitted, Failed)
                | (AwaitingConfirmation, Confirmed)
                | (AwaitingConfirmation, Failed)
        )
    }
}

/// Transient record of one in-flight operation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub kind: OperationKind,
    pub submitted_at: DateTime<Utc>,
    pub status: OperationStatus,
    pub tx_hash: Option<TxHash>,
}

impl PendingOperation {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            submitted_at: Utc::now(),
            status: OperationStatus::Building,
            tx_hash: None,
        }
    }

    /// Move to `next` if the transition is legal. Returns whether it moved.
    pub fn advance(&mut self, next: OperationStatus) -> bool {
        if !self.status.can_advance_to(next) {
            tracing::warn!(
                kind = %self.kind,
                from = %self.status,
                to = %next,
                "Ignoring illegal operation status transition"
            );
            return false;
        }
        if next == OperationStatus::Submitted {
            self.submitted_at = Utc::now();
        }
        self.status = next;
        true
    }

    pub fn record_tx_hash(&mut self, tx_hash: TxHash) {
        self.tx_hash = Some(tx_hash);
    }
}

/// Identifier the bundler assigns to a sponsored submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(pub B256);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A submitted operation has landed in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inclusion {
    pub tx_hash: TxHash,
    /// Whether the wrapped ledger call executed without reverting
    pub success: bool,
}

/// Finalized transaction receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub success: bool,
}

// ============================================================================
// Accounts
// ============================================================================

/// Sponsor-capable smart account bound to one network.
///
/// Owned by the authenticated session that derived it and discarded on
/// logout or account switch.
#[derive(Clone)]
pub struct SmartAccountHandle {
    /// Signer able to submit sponsored operations for `address`
    pub signer: Arc<dyn SmartAccount>,

    /// Smart account address (the ledger's `player`)
    pub address: Address,

    pub chain_id: u64,

    /// Base wallet the account was derived from
    pub owner: Address,
}

impl SmartAccountHandle {
    pub fn new(signer: Arc<dyn SmartAccount>, owner: Address) -> Self {
        Self {
            address: signer.address(),
            chain_id: signer.chain_id(),
            signer,
            owner,
        }
    }
}

impl fmt::Debug for SmartAccountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartAccountHandle")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
