//! Transaction Orchestrator.
//!
//! Turns a [`LedgerOperation`] into a sponsored, tracked transaction:
//!
//! ```text
//! Building ──► Submitted ──► AwaitingConfirmation ──► Confirmed
//!    │             │                 │
//!    └─────────────┴─────────────────┴──────────────► Failed
//! ```
//!
//! Inclusion and confirmation share one deadline. Nothing is retried: a
//! failure is reported once and the caller decides what to do next.

mod tracker;

use std::time::Duration;

use client_blockchain_core::{
    ChainDescriptor, LedgerOperation, OperationId, OperationKind, OperationStatus,
    PendingOperation, Result, SessionError, SmartAccountHandle, TxHash,
};
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, timeout_at};

use crate::events::{Event, EventBus, OperationEvent};
use tracker::poll_until;

/// Timing for inclusion and confirmation tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Ceiling on waiting for inclusion plus confirmation
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Terminal success of one orchestrated operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReport {
    pub kind: OperationKind,
    pub operation: OperationId,
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub explorer_url: String,
}

/// Submits ledger operations through a smart account and tracks them.
#[derive(Clone)]
pub struct TransactionOrchestrator {
    config: OrchestratorConfig,
    events: EventBus,
}

impl TransactionOrchestrator {
    pub fn new(config: OrchestratorConfig, events: EventBus) -> Self {
        Self { config, events }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run `operation` to a terminal status.
    ///
    /// Publishes each status change on the operation topic, ending with
    /// exactly one `Confirmed` or `Failed` event.
    pub async fn execute(
        &self,
        handle: &SmartAccountHandle,
        chain: &ChainDescriptor,
        operation: LedgerOperation,
    ) -> Result<OperationReport> {
        let mut pending = PendingOperation::new(operation.kind());
        self.publish_status(handle, &pending);

        let result = self.drive(&mut pending, handle, chain, operation).await;

        match &result {
            Ok(report) => {
                tracing::info!(
                    kind = %report.kind,
                    tx_hash = %report.tx_hash,
                    block_number = report.block_number,
                    player = %handle.address,
                    "Operation confirmed"
                );
                self.events.publish(Event::Operation(OperationEvent::Confirmed {
                    player: handle.address,
                    kind: report.kind,
                    tx_hash: report.tx_hash,
                    explorer_url: report.explorer_url.clone(),
                }));
            }
            Err(err) => {
                pending.advance(OperationStatus::Failed);
                tracing::error!(
                    kind = %pending.kind,
                    tx_hash = ?pending.tx_hash,
                    player = %handle.address,
                    error = %err,
                    "Operation failed"
                );
                self.events.publish(Event::Operation(OperationEvent::Failed {
                    player: handle.address,
                    kind: pending.kind,
                    reason: err.name().to_string(),
                    message: err.to_string(),
                    tx_hash: err.tx_hash().or(pending.tx_hash),
                }));
            }
        }

        result
    }

    async fn drive(
        &self,
        pending: &mut PendingOperation,
        handle: &SmartAccountHandle,
        chain: &ChainDescriptor,
        operation: LedgerOperation,
    ) -> Result<OperationReport> {
        if handle.chain_id != chain.chain_id {
            return Err(SessionError::ChainMismatch {
                handle: handle.chain_id,
                descriptor: chain.chain_id,
            });
        }

        let kind = pending.kind;
        let call = operation.into_call(chain.contract_address);
        tracing::info!(
            kind = %kind,
            value = %call.value,
            chain_id = chain.chain_id,
            player = %handle.address,
            "Submitting sponsored operation"
        );

        let operation_id = handle
            .signer
            .send_sponsored(call)
            .await
            .map_err(|e| SessionError::from_submission(kind, e))?;
        self.advance(handle, pending, OperationStatus::Submitted);

        // Past this point the operation cannot be withdrawn; every failure
        // below carries whatever identifiers are known.
        let deadline = Instant::now() + self.config.confirmation_timeout;
        let account = handle.signer.as_ref();

        let inclusion = timeout_at(
            deadline,
            poll_until(self.config.poll_interval, "inclusion", || {
                account.inclusion(&operation_id)
            }),
        )
        .await
        .map_err(|_| SessionError::Timeout {
            kind,
            operation: operation_id,
            tx_hash: None,
        })?;

        pending.record_tx_hash(inclusion.tx_hash);
        if !inclusion.success {
            return Err(SessionError::Reverted {
                kind,
                tx_hash: inclusion.tx_hash,
            });
        }
        self.advance(handle, pending, OperationStatus::AwaitingConfirmation);

        let tx_hash = inclusion.tx_hash;
        let receipt = timeout_at(
            deadline,
            poll_until(self.config.poll_interval, "confirmation", || {
                account.confirmation(&tx_hash)
            }),
        )
        .await
        .map_err(|_| SessionError::Timeout {
            kind,
            operation: operation_id,
            tx_hash: Some(tx_hash),
        })?;

        if !receipt.success {
            return Err(SessionError::Reverted { kind, tx_hash });
        }
        pending.advance(OperationStatus::Confirmed);

        Ok(OperationReport {
            kind,
            operation: operation_id,
            tx_hash,
            block_number: receipt.block_number,
            explorer_url: chain.explorer_tx_url(&tx_hash),
        })
    }

    fn advance(
        &self,
        handle: &SmartAccountHandle,
        pending: &mut PendingOperation,
        next: OperationStatus,
    ) {
        if pending.advance(next) {
            self.publish_status(handle, pending);
        }
    }

    fn publish_status(&self, handle: &SmartAccountHandle, pending: &PendingOperation) {
        self.events
            .publish(Event::Operation(OperationEvent::StatusChanged {
                player: handle.address,
                pending: pending.clone(),
            }));
    }
}
