//! Event types for each topic.

use client_blockchain_core::{Address, OperationKind, PendingOperation, TxHash};
use serde::{Deserialize, Serialize};

use crate::state::SessionState;

/// Session state transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    StateChanged {
        player: Address,
        from: SessionState,
        to: SessionState,
    },
}

/// Progress of one orchestrated operation.
///
/// Every operation produces exactly one terminal event: `Confirmed` or `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OperationEvent {
    /// Non-terminal status change (Building, Submitted, AwaitingConfirmation)
    StatusChanged {
        player: Address,
        pending: PendingOperation,
    },

    Confirmed {
        player: Address,
        kind: OperationKind,
        tx_hash: TxHash,
        explorer_url: String,
    },

    Failed {
        player: Address,
        kind: OperationKind,
        /// Taxonomy name of the error
        reason: String,
        message: String,
        tx_hash: Option<TxHash>,
    },
}

impl OperationEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationEvent::Confirmed { .. } | OperationEvent::Failed { .. }
        )
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            OperationEvent::StatusChanged { pending, .. } => pending.kind,
            OperationEvent::Confirmed { kind, .. } | OperationEvent::Failed { kind, .. } => *kind,
        }
    }
}
