//! Core EVM transport types.

pub mod error;

pub use error::{EvmError, Result};
