//! Shared bootstrap utilities for client front-ends.
//!
//! Provides configuration loading, smart-account derivation and session setup
//! that can be reused by the CLI or any other front-end crate.
pub mod account;
pub mod builder;
pub mod config;
pub mod session;

pub use account::AccountBootstrap;
pub use builder::{ClientBuilder, ClientContext};
pub use config::{ClientConfig, default_log_dir};
pub use session::{ClientSession, SessionSlot};
