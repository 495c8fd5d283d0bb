//! Utility functions for EVM JSON-RPC payloads.

pub mod quantity;

pub use quantity::{lenient_quantity, quantity_to_u64};
