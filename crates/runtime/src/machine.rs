//! Session State Machine.
//!
//! Mirrors the player's ledger record and gates which operations may be
//! requested:
//!
//! ```text
//! Unknown ──hydrate──► Idle ──create──► Active ──complete(last)──► Terminal(Completed)
//!                       ▲                 │                           │
//!                       └──────end────────┴────────────end────────────┘
//! ```
//!
//! State only ever changes by reading the ledger. A mutation that fails leaves
//! the state exactly as it was; a confirmed one invalidates the cached record
//! and re-reads it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use client_blockchain_core::{
    ChainDescriptor, Game, GameConfig, LedgerOperation, LedgerReader, OperationKind, Result,
    SessionError, SmartAccountHandle,
};
use serde::{Deserialize, Serialize};

use crate::cache::GameCache;
use crate::events::{Event, EventBus, SessionEvent};
use crate::inflight::{InFlightGuard, InFlightOperations};
use crate::orchestrator::{OperationReport, TransactionOrchestrator};
use crate::state::{Outcome, SessionState};

/// Result of a confirmed `endGame`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndReport {
    pub report: OperationReport,
    /// Record as last read before ending
    pub game: Game,
    pub outcome: Outcome,
}

/// One player's session on one chain.
pub struct SessionMachine {
    handle: SmartAccountHandle,
    chain: ChainDescriptor,
    reader: Arc<dyn LedgerReader>,
    orchestrator: TransactionOrchestrator,
    cache: Arc<GameCache>,
    events: EventBus,
    in_flight: Arc<InFlightOperations>,
    state: Mutex<SessionState>,
}

impl SessionMachine {
    pub fn new(
        handle: SmartAccountHandle,
        chain: ChainDescriptor,
        reader: Arc<dyn LedgerReader>,
        orchestrator: TransactionOrchestrator,
        cache: Arc<GameCache>,
        events: EventBus,
        in_flight: Arc<InFlightOperations>,
    ) -> Self {
        Self {
            handle,
            chain,
            reader,
            orchestrator,
            cache,
            events,
            in_flight,
            state: Mutex::new(SessionState::Unknown),
        }
    }

    pub fn state(&self) -> SessionState {
        self.lock_state().clone()
    }

    pub fn handle(&self) -> &SmartAccountHandle {
        &self.handle
    }

    pub fn chain(&self) -> &ChainDescriptor {
        &self.chain
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Operation currently outstanding for this player, from any session.
    pub fn in_flight(&self) -> Option<OperationKind> {
        self.in_flight.get(&self.handle.address)
    }

    /// Read the player's record (through the cache) and derive the state.
    ///
    /// A failed read leaves the state unchanged.
    pub async fn hydrate(&self) -> Result<SessionState> {
        let player = self.handle.address;
        let game = self
            .cache
            .get_or_fetch(self.reader.as_ref(), &self.chain, player)
            .await
            .map_err(|e| {
                tracing::warn!(player = %player, error = %e, "Ledger read failed");
                SessionError::from_read(e)
            })?;

        let next = SessionState::from_record(&game);
        let previous = std::mem::replace(&mut *self.lock_state(), next.clone());

        if previous != next {
            tracing::info!(
                player = %player,
                from = %previous.label(),
                to = %next.label(),
                "Session state changed"
            );
            self.events.publish(Event::Session(SessionEvent::StateChanged {
                player,
                from: previous,
                to: next.clone(),
            }));
        }
        Ok(next)
    }

    /// Drop the cached record and hydrate from the ledger.
    pub async fn refresh(&self) -> Result<SessionState> {
        self.cache.invalidate(&self.handle.address);
        self.hydrate().await
    }

    /// Open a game. Valid from `Idle`.
    pub async fn request_create(&self, config: GameConfig) -> Result<OperationReport> {
        let _guard = self.begin(OperationKind::CreateGame)?;
        {
            let state = self.lock_state();
            if !matches!(*state, SessionState::Idle) {
                return Err(self.invalid(OperationKind::CreateGame, &state));
            }
        }
        config.validate()?;

        let report = self.submit(LedgerOperation::CreateGame(config)).await?;
        self.settle().await;
        Ok(report)
    }

    /// Report one finished task. Valid from `Active`.
    pub async fn request_complete_task(&self) -> Result<OperationReport> {
        let _guard = self.begin(OperationKind::CompleteTask)?;
        {
            let state = self.lock_state();
            if !state.is_active() {
                return Err(self.invalid(OperationKind::CompleteTask, &state));
            }
        }

        let report = self.submit(LedgerOperation::CompleteTask).await?;
        self.settle().await;
        Ok(report)
    }

    /// End the game; the ledger settles the stake and clears the record.
    /// Valid from `Active` and `Terminal`.
    ///
    /// The outcome is judged from the record as last read: ending with tasks
    /// outstanding is `Failed`.
    pub async fn request_end(&self) -> Result<EndReport> {
        let _guard = self.begin(OperationKind::EndGame)?;
        let game = {
            let state = self.lock_state();
            match &*state {
                SessionState::Active(game) | SessionState::Terminal { game, .. } => game.clone(),
                SessionState::Unknown | SessionState::Idle => {
                    return Err(self.invalid(OperationKind::EndGame, &state));
                }
            }
        };

        let report = self.submit(LedgerOperation::EndGame).await?;
        let outcome = Outcome::of(&game);
        tracing::info!(
            player = %self.handle.address,
            outcome = %outcome,
            completed = game.task_completed,
            tasks = game.task_amount,
            "Game ended"
        );
        self.settle().await;
        Ok(EndReport {
            report,
            game,
            outcome,
        })
    }

    /// Claim this player's in-flight slot.
    fn begin(&self, kind: OperationKind) -> Result<InFlightGuard<'_>> {
        self.in_flight
            .claim(self.handle.address, kind)
            .map_err(|in_flight| {
                tracing::warn!(
                    requested = %kind,
                    in_flight = %in_flight,
                    player = %self.handle.address,
                    "Rejecting request while another operation is outstanding"
                );
                SessionError::OperationInFlight { in_flight }
            })
    }

    async fn submit(&self, operation: LedgerOperation) -> Result<OperationReport> {
        let result = self
            .orchestrator
            .execute(&self.handle, &self.chain, operation)
            .await;

        if let Err(err) = &result
            && err.requires_rehydrate()
        {
            // The transaction may still land; the next hydrate must not trust the cache
            self.cache.invalidate(&self.handle.address);
        }
        result
    }

    /// Re-read the ledger after a confirmed mutation.
    async fn settle(&self) {
        self.cache.invalidate(&self.handle.address);
        if let Err(e) = self.hydrate().await {
            tracing::warn!(
                player = %self.handle.address,
                error = %e,
                "Re-hydration after confirmed operation failed"
            );
            let previous = std::mem::replace(&mut *self.lock_state(), SessionState::Unknown);
            self.events.publish(Event::Session(SessionEvent::StateChanged {
                player: self.handle.address,
                from: previous,
                to: SessionState::Unknown,
            }));
        }
    }

    fn invalid(&self, requested: OperationKind, state: &SessionState) -> SessionError {
        SessionError::InvalidTransition {
            requested,
            state: state.label(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
