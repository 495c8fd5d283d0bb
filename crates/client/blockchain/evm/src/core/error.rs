//! Error types for EVM transport operations.

use client_blockchain_core::TransportError;
use thiserror::Error;

/// Errors that can occur while talking to a node, bundler or paymaster.
#[derive(Debug, Error)]
pub enum EvmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Empty RPC response for {0}")]
    EmptyResponse(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Sponsorship refused: {0}")]
    Sponsorship(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Chain id mismatch: rpc reports {rpc}, expected {expected}")]
    ChainIdMismatch { rpc: u64, expected: u64 },

    #[error("ABI decoding failed: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to read chains file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed chains file: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EvmError>;

/// JSON-RPC codes bundlers use for user operations that fail validation.
const BUNDLER_REJECTION_CODES: [i64; 4] = [-32500, -32501, -32502, -32506];

impl From<EvmError> for TransportError {
    fn from(err: EvmError) -> Self {
        match err {
            EvmError::Http(e) => TransportError::Network(e.to_string()),
            EvmError::Rpc { code, message } if BUNDLER_REJECTION_CODES.contains(&code) => {
                TransportError::Rejected(format!("{code}: {message}"))
            }
            EvmError::Rpc { code, message } => TransportError::Rpc { code, message },
            EvmError::EmptyResponse(method) => {
                TransportError::Network(format!("empty response for {method}"))
            }
            EvmError::Sponsorship(msg) | EvmError::Signing(msg) => TransportError::Rejected(msg),
            EvmError::ChainIdMismatch { rpc, expected } => TransportError::Incompatible(format!(
                "rpc reports chain {rpc}, expected {expected}"
            )),
            EvmError::InvalidConfig(msg) => TransportError::Config(msg),
            EvmError::Url(e) => TransportError::Config(e.to_string()),
            EvmError::Io(e) => TransportError::Config(e.to_string()),
            EvmError::Toml(e) => TransportError::Config(e.to_string()),
            EvmError::InvalidResponse(msg) => TransportError::Decode(msg),
            EvmError::Abi(e) => TransportError::Decode(e.to_string()),
            EvmError::Serialization(e) => TransportError::Decode(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundler_validation_codes_become_rejections() {
        let err: TransportError = EvmError::Rpc {
            code: -32500,
            message: "AA21 didn't pay prefund".into(),
        }
        .into();
        assert!(matches!(err, TransportError::Rejected(_)));

        let err: TransportError = EvmError::Rpc {
            code: -32000,
            message: "header not found".into(),
        }
        .into();
        assert!(err.is_transient());
    }

    #[test]
    fn chain_mismatch_is_incompatible() {
        let err: TransportError = EvmError::ChainIdMismatch {
            rpc: 1,
            expected: 84532,
        }
        .into();
        assert!(matches!(err, TransportError::Incompatible(_)));
    }
}
