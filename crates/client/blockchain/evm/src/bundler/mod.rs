//! Bundler and paymaster JSON-RPC client.

pub mod user_op;

pub use user_op::{SponsorshipData, UserOperation, UserOperationReceipt};

use std::time::Duration;

use alloy_primitives::{Address, B256};
use serde_json::json;

use crate::core::error::{EvmError, Result};
use crate::rpc::JsonRpcClient;

/// Sponsorship context sent with every paymaster request.
fn sponsored_context() -> serde_json::Value {
    json!({
        "mode": "SPONSORED",
        "calculateGasLimits": true,
    })
}

/// Client for an ERC-4337 bundler and its paymaster.
#[derive(Debug)]
pub struct BundlerClient {
    bundler: JsonRpcClient,
    paymaster: JsonRpcClient,
    entry_point: Address,
}

impl BundlerClient {
    pub fn new(
        bundler_url: &str,
        paymaster_url: &str,
        entry_point: Address,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            bundler: JsonRpcClient::with_timeout(bundler_url, timeout)?,
            paymaster: JsonRpcClient::with_timeout(paymaster_url, timeout)?,
            entry_point,
        })
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    /// Ask the paymaster to cover gas for `op`.
    ///
    /// A JSON-RPC error from the paymaster is a refusal, not an outage.
    pub async fn sponsor(&self, op: &UserOperation) -> Result<SponsorshipData> {
        self.paymaster
            .request("pm_sponsorUserOperation", json!([op, sponsored_context()]))
            .await
            .map_err(|e| match e {
                EvmError::Rpc { code, message } => {
                    EvmError::Sponsorship(format!("{code}: {message}"))
                }
                other => other,
            })
    }

    /// Submit a signed operation. Returns the user-operation hash.
    pub async fn send_user_operation(&self, op: &UserOperation) -> Result<B256> {
        let hash: B256 = self
            .bundler
            .request("eth_sendUserOperation", json!([op, self.entry_point]))
            .await?;

        tracing::info!(
            user_op_hash = %hash,
            sender = %op.sender,
            nonce = %op.nonce,
            "User operation accepted by bundler"
        );
        Ok(hash)
    }

    /// `None` while the operation has not been included.
    pub async fn user_operation_receipt(
        &self,
        user_op_hash: B256,
    ) -> Result<Option<UserOperationReceipt>> {
        self.bundler
            .request("eth_getUserOperationReceipt", json!([user_op_hash]))
            .await
    }
}
