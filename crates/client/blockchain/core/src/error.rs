//! Error taxonomy shared by the account, orchestration and session layers.
//!
//! Seam implementations report [`TransportError`]. Those never reach callers
//! directly: the Account Bootstrap, the Transaction Orchestrator and hydration
//! each convert them into a [`SessionError`] at their boundary.

use thiserror::Error;

use crate::types::{OperationId, OperationKind, TxHash};

pub type Result<T> = std::result::Result<T, SessionError>;

/// Raw provider failures.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Signing declined, sponsorship refused, or bundler validation failed
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Signer or account type cannot be used with this provider
    #[error("Incompatible signer: {0}")]
    Incompatible(String),

    #[error("Decoding error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The signed operation was sent but no answer came back; it may still
    /// be accepted.
    #[error("No acknowledgement for operation {operation}: {message}")]
    Unacknowledged {
        operation: OperationId,
        message: String,
    },
}

impl TransportError {
    /// Network-level failures that may succeed if repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Network(_) | TransportError::Rpc { .. })
    }
}

/// Errors surfaced to the user-facing layers.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("no base wallet is connected")]
    NotAuthenticated,

    #[error("account provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("smart account derivation failed: {0}")]
    DerivationFailed(String),

    #[error("{in_flight} is still in flight")]
    OperationInFlight { in_flight: OperationKind },

    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    /// The transaction may still land. Re-hydrate before assuming anything.
    #[error("timed out waiting for {kind} (operation {operation}, tx {tx_hash:?})")]
    Timeout {
        kind: OperationKind,
        operation: OperationId,
        tx_hash: Option<TxHash>,
    },

    #[error("ledger read failed: {0}")]
    LedgerReadFailed(String),

    #[error("{kind} reverted on-chain in {tx_hash}")]
    Reverted { kind: OperationKind, tx_hash: TxHash },

    #[error("invalid game config: {0}")]
    InvalidConfig(String),

    #[error("{requested} is not valid while {state}")]
    InvalidTransition {
        requested: OperationKind,
        state: String,
    },

    #[error("smart account is bound to chain {handle} but chain {descriptor} was requested")]
    ChainMismatch { handle: u64, descriptor: u64 },

    #[error("no destination address for funding")]
    NoDestinationAddress,
}

impl SessionError {
    /// Stable taxonomy name for notifications and logs.
    pub fn name(&self) -> &'static str {
        match self {
            SessionError::NotAuthenticated => "NotAuthenticated",
            SessionError::ProviderUnavailable(_) => "ProviderUnavailable",
            SessionError::DerivationFailed(_) => "DerivationFailed",
            SessionError::OperationInFlight { .. } => "OperationInFlight",
            SessionError::SubmissionRejected(_) => "SubmissionRejected",
            SessionError::Timeout { .. } => "Timeout",
            SessionError::LedgerReadFailed(_) => "LedgerReadFailed",
            SessionError::Reverted { .. } => "Reverted",
            SessionError::InvalidConfig(_) => "InvalidConfig",
            SessionError::InvalidTransition { .. } => "InvalidTransition",
            SessionError::ChainMismatch { .. } => "ChainMismatch",
            SessionError::NoDestinationAddress => "NoDestinationAddress",
        }
    }

    /// The caller may repeat the same request without risk of double effects.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::ProviderUnavailable(_) | SessionError::LedgerReadFailed(_)
        )
    }

    /// Outcome is unknown until the ledger is read again.
    pub fn requires_rehydrate(&self) -> bool {
        matches!(self, SessionError::Timeout { .. })
    }

    /// Transaction hash attached to the failure, if one was obtained.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            SessionError::Timeout { tx_hash, .. } => *tx_hash,
            SessionError::Reverted { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }

    /// Conversion used when deriving or hydrating through a provider.
    pub fn from_derivation(err: TransportError) -> Self {
        match err {
            TransportError::Network(msg) => SessionError::ProviderUnavailable(msg),
            TransportError::Rpc { code, message } => {
                SessionError::ProviderUnavailable(format!("rpc {code}: {message}"))
            }
            other => SessionError::DerivationFailed(other.to_string()),
        }
    }

    /// Conversion used for `games(address)` reads.
    pub fn from_read(err: TransportError) -> Self {
        SessionError::LedgerReadFailed(err.to_string())
    }

    /// Conversion used for signing and submission of a `kind` operation.
    ///
    /// A network failure before the operation left is retryable; one after
    /// it was sent is as ambiguous as a timeout.
    pub fn from_submission(kind: OperationKind, err: TransportError) -> Self {
        match err {
            TransportError::Unacknowledged { operation, .. } => SessionError::Timeout {
                kind,
                operation,
                tx_hash: None,
            },
            TransportError::Network(msg) => SessionError::ProviderUnavailable(msg),
            other => SessionError::SubmissionRejected(other.to_string()),
        }
    }
}
