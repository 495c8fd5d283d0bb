//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod chains;
mod clean;
mod keygen;

pub use chains::Chains;
pub use clean::Clean;
pub use keygen::Keygen;
