//! Session runtime for the Pomodoro staking client.
//!
//! This crate keeps the local view of a player's game consistent with the
//! remote ledger and serializes every mutation through one orchestrator.
//! Consumers build a [`SessionMachine`] with [`RuntimeBuilder`], hydrate it,
//! request operations and subscribe to [`EventBus`] topics for progress.
//!
//! Modules are organized by responsibility:
//! - [`machine`] hosts the Session State Machine
//! - [`orchestrator`] submits and tracks sponsored transactions
//! - [`cache`] is the read-through cache of ledger records
//! - [`inflight`] holds the one outstanding operation per player
//! - [`events`] provides the topic-based event bus
//! - [`funding`] opens fiat on-ramps for the smart account
pub mod cache;
pub mod events;
pub mod funding;
pub mod inflight;
pub mod machine;
pub mod orchestrator;
pub mod runtime;
pub mod state;

pub use cache::GameCache;
pub use events::{Event, EventBus, OperationEvent, SessionEvent, Topic};
pub use funding::{
    FundingEnvironment, FundingGateway, FundingRequest, TransakWidget, trigger_funding,
};
pub use inflight::InFlightOperations;
pub use machine::{EndReport, SessionMachine};
pub use orchestrator::{OperationReport, OrchestratorConfig, TransactionOrchestrator};
pub use runtime::{RuntimeBuilder, RuntimeConfig};
pub use state::{Outcome, SessionState};

pub use client_blockchain_core::{Result, SessionError};
