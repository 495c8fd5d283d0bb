//! Contract bindings used by the account-abstraction stack.
//!
//! The Pomodoro ledger itself lives in `client_blockchain_core::ledger`.

pub mod account;

pub use account::{IEntryPoint, ISimpleAccount, ISimpleAccountFactory};
