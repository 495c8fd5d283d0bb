//! EVM network and account-abstraction configuration.

pub mod network;
pub mod registry;

// Re-export commonly used items
pub use network::{AccountAbstractionConfig, ENTRY_POINT_V06, SIMPLE_ACCOUNT_FACTORY_V06};
pub use registry::{BASE_SEPOLIA_CHAIN_ID, ChainRegistry};
