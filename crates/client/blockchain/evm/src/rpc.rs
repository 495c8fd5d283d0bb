//! JSON-RPC 2.0 over HTTP.
//!
//! One client type serves the node, the bundler and the paymaster; they differ
//! only in endpoint and method namespace.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

use crate::core::error::{EvmError, Result};
use crate::utils::{lenient_quantity, quantity_to_u64};

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Subset of `eth_getTransactionReceipt` used for confirmation tracking.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: B256,
    #[serde(deserialize_with = "lenient_quantity")]
    pub block_number: U256,
    #[serde(deserialize_with = "lenient_quantity")]
    pub status: U256,
}

impl RpcReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == U256::from(1)
    }
}

/// HTTP JSON-RPC client.
#[derive(Debug)]
pub struct JsonRpcClient {
    url: Url,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: &str) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(30))
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url)?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Issue `method` and decode its `result`.
    ///
    /// A `null` result decodes into `Option::None` when `R` is an `Option`,
    /// and is an [`EvmError::EmptyResponse`] otherwise.
    pub async fn request<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, url = %self.url, "JSON-RPC request");

        let response = self.http.post(self.url.clone()).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: RpcResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(EvmError::Rpc {
                    code: i64::from(status.as_u16()),
                    message: body,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(error) = parsed.error {
            tracing::debug!(method, code = error.code, message = %error.message, "JSON-RPC error");
            return Err(EvmError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        let result = parsed.result.unwrap_or(Value::Null);
        let is_null = result.is_null();
        serde_json::from_value(result).map_err(|e| {
            if is_null {
                EvmError::EmptyResponse(method.to_string())
            } else {
                EvmError::Serialization(e)
            }
        })
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<U256> {
        let value: Value = self.request(method, params).await?;
        crate::utils::quantity::parse_quantity(&value)
            .ok_or_else(|| EvmError::InvalidResponse(format!("{method} returned {value}")))
    }

    pub async fn chain_id(&self) -> Result<u64> {
        quantity_to_u64(self.quantity("eth_chainId", json!([])).await?, "chainId")
    }

    pub async fn block_number(&self) -> Result<u64> {
        quantity_to_u64(self.quantity("eth_blockNumber", json!([])).await?, "blockNumber")
    }

    pub async fn gas_price(&self) -> Result<U256> {
        self.quantity("eth_gasPrice", json!([])).await
    }

    pub async fn max_priority_fee_per_gas(&self) -> Result<U256> {
        self.quantity("eth_maxPriorityFeePerGas", json!([])).await
    }

    pub async fn get_code(&self, address: Address) -> Result<Bytes> {
        self.request("eth_getCode", json!([address, "latest"])).await
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: &Bytes) -> Result<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    pub async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<RpcReceipt>> {
        self.request("eth_getTransactionReceipt", json!([tx_hash]))
            .await
    }
}
