//! Funding Trigger: points a fiat on-ramp at the smart account.
//!
//! The core never observes the outcome. Funds show up, or not, on a later
//! ledger read.

use client_blockchain_core::{Address, ChainDescriptor, Result, SessionError, SmartAccountHandle};
use serde::{Deserialize, Serialize};
use url::Url;

/// Everything an on-ramp needs to open its flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRequest {
    pub address: Address,
    /// On-ramp network slug (e.g. "base_sepolia")
    pub network: String,
    pub crypto_currency: String,
    /// Suggested fiat amount
    pub fiat_amount: Option<String>,
}

/// Opens an external funding flow.
pub trait FundingGateway: Send + Sync {
    fn open(&self, request: &FundingRequest) -> Result<()>;
}

/// Open the funding flow for the session's smart account on `chain`.
pub fn trigger_funding(
    gateway: &dyn FundingGateway,
    handle: &SmartAccountHandle,
    chain: &ChainDescriptor,
    fiat_amount: Option<String>,
) -> Result<()> {
    if handle.address == Address::ZERO {
        return Err(SessionError::NoDestinationAddress);
    }

    let request = FundingRequest {
        address: handle.address,
        network: chain.ramp_network(),
        crypto_currency: "ETH".to_string(),
        fiat_amount,
    };
    tracing::info!(
        address = %request.address,
        network = %request.network,
        "Opening funding flow"
    );
    gateway.open(&request)
}

/// Transak deployment to target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum FundingEnvironment {
    #[default]
    Staging,
    Production,
}

impl FundingEnvironment {
    fn base_url(self) -> &'static str {
        match self {
            FundingEnvironment::Staging => "https://global-stg.transak.com",
            FundingEnvironment::Production => "https://global.transak.com",
        }
    }
}

/// Builds Transak widget links.
#[derive(Debug, Clone)]
pub struct TransakWidget {
    environment: FundingEnvironment,
    api_key: Option<String>,
}

impl TransakWidget {
    pub fn new(environment: FundingEnvironment, api_key: Option<String>) -> Self {
        Self {
            environment,
            api_key,
        }
    }

    pub fn url(&self, request: &FundingRequest) -> std::result::Result<Url, url::ParseError> {
        let address = request.address.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("walletAddress", address.as_str()),
            ("network", request.network.as_str()),
            ("defaultCryptoCurrency", request.crypto_currency.as_str()),
            ("disableWalletAddressForm", "true"),
        ];
        if let Some(key) = &self.api_key {
            params.push(("apiKey", key.as_str()));
        }
        if let Some(amount) = &request.fiat_amount {
            params.push(("defaultFiatAmount", amount.as_str()));
        }

        Url::parse_with_params(self.environment.base_url(), params)
    }
}
