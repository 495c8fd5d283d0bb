//! ERC-4337 user operations (EntryPoint v0.6 layout).

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_sol_types::{SolValue, sol};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{EvmError, Result};
use crate::utils::quantity::parse_quantity;

sol! {
    /// Hashed form of a user operation as packed by EntryPoint v0.6.
    struct PackedUserOperation {
        address sender;
        uint256 nonce;
        bytes32 initCodeHash;
        bytes32 callDataHash;
        uint256 callGasLimit;
        uint256 verificationGasLimit;
        uint256 preVerificationGas;
        uint256 maxFeePerGas;
        uint256 maxPriorityFeePerGas;
        bytes32 paymasterAndDataHash;
    }
}

/// Gas limits used until the paymaster supplies its own estimate.
const DEFAULT_CALL_GAS_LIMIT: u64 = 200_000;
const DEFAULT_VERIFICATION_GAS_LIMIT: u64 = 500_000;
const DEFAULT_PRE_VERIFICATION_GAS: u64 = 60_000;

/// A pseudo-transaction submitted to a bundler on behalf of a smart account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    /// Factory address and deployment calldata, empty once deployed
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

impl UserOperation {
    /// Unsigned operation with default gas limits and no paymaster.
    pub fn new(sender: Address, nonce: U256, init_code: Bytes, call_data: Bytes) -> Self {
        Self {
            sender,
            nonce,
            init_code,
            call_data,
            call_gas_limit: U256::from(DEFAULT_CALL_GAS_LIMIT),
            verification_gas_limit: U256::from(DEFAULT_VERIFICATION_GAS_LIMIT),
            pre_verification_gas: U256::from(DEFAULT_PRE_VERIFICATION_GAS),
            max_fee_per_gas: U256::ZERO,
            max_priority_fee_per_gas: U256::ZERO,
            paymaster_and_data: Bytes::new(),
            signature: Bytes::new(),
        }
    }

    pub fn with_fees(mut self, max_fee_per_gas: U256, max_priority_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = max_fee_per_gas;
        self.max_priority_fee_per_gas = max_priority_fee_per_gas;
        self
    }

    /// Attach a signature of valid ECDSA shape so gas can be estimated.
    pub fn with_dummy_signature(mut self) -> Self {
        self.signature = dummy_signature();
        self
    }

    /// Hash the account signs: binds the operation to one EntryPoint and chain.
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> B256 {
        let packed = PackedUserOperation {
            sender: self.sender,
            nonce: self.nonce,
            initCodeHash: keccak256(&self.init_code),
            callDataHash: keccak256(&self.call_data),
            callGasLimit: self.call_gas_limit,
            verificationGasLimit: self.verification_gas_limit,
            preVerificationGas: self.pre_verification_gas,
            maxFeePerGas: self.max_fee_per_gas,
            maxPriorityFeePerGas: self.max_priority_fee_per_gas,
            paymasterAndDataHash: keccak256(&self.paymaster_and_data),
        };
        let inner = keccak256(packed.abi_encode());
        keccak256((inner, entry_point, U256::from(chain_id)).abi_encode())
    }
}

/// 65-byte placeholder accepted by ECDSA recovery during simulation.
pub fn dummy_signature() -> Bytes {
    let mut signature = [0u8; 65];
    signature[..15].fill(0xff);
    signature[15] = 0xf0;
    signature[32] = 0x7a;
    signature[33..64].fill(0xaa);
    signature[64] = 0x1c;
    Bytes::copy_from_slice(&signature)
}

/// Result of `pm_sponsorUserOperation`.
///
/// Gas fields are optional: a paymaster that does not re-estimate leaves the
/// operation's limits untouched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipData {
    pub paymaster_and_data: Bytes,
    #[serde(default)]
    pub call_gas_limit: Option<Value>,
    #[serde(default)]
    pub verification_gas_limit: Option<Value>,
    #[serde(default)]
    pub pre_verification_gas: Option<Value>,
}

impl SponsorshipData {
    /// Copy paymaster data and any gas estimates onto `op`.
    pub fn apply_to(&self, op: &mut UserOperation) -> Result<()> {
        if self.paymaster_and_data.is_empty() {
            return Err(EvmError::Sponsorship(
                "paymaster returned empty paymasterAndData".to_string(),
            ));
        }
        op.paymaster_and_data = self.paymaster_and_data.clone();

        for (field, target) in [
            (&self.call_gas_limit, &mut op.call_gas_limit),
            (&self.verification_gas_limit, &mut op.verification_gas_limit),
            (&self.pre_verification_gas, &mut op.pre_verification_gas),
        ] {
            if let Some(raw) = field {
                *target = parse_quantity(raw).ok_or_else(|| {
                    EvmError::InvalidResponse(format!("invalid gas value from paymaster: {raw}"))
                })?;
            }
        }
        Ok(())
    }
}

/// Result of `eth_getUserOperationReceipt`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    pub user_op_hash: B256,
    /// Whether the account's call executed without reverting
    pub success: bool,
    #[serde(default)]
    pub reason: Option<String>,
    pub receipt: IncludedTransaction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedTransaction {
    pub transaction_hash: B256,
}
