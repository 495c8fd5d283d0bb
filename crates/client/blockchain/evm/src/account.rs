//! Counterfactual smart accounts submitting sponsored user operations.
//!
//! ## Submission Flow
//!
//! 1. Wrap the ledger call in `execute(dest, value, func)`
//! 2. Attach `initCode` while the account has no code, fetch nonce and fees
//! 3. `pm_sponsorUserOperation` fills `paymasterAndData` and gas limits
//! 4. The base wallet signs the user-operation hash (EIP-191)
//! 5. `eth_sendUserOperation` returns the user-operation hash used for tracking

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use client_blockchain_core::{
    AccountProvider, BaseWallet, ChainDescriptor, Inclusion, LedgerCall, OperationId,
    SmartAccount, TransportError, TxHash, TxReceipt,
};

use crate::bundler::{BundlerClient, UserOperation};
use crate::config::AccountAbstractionConfig;
use crate::contracts::account::{
    IEntryPoint, ISimpleAccountFactory, execute_calldata, get_address_calldata,
    get_nonce_calldata, init_code,
};
use crate::core::error::{EvmError, Result};
use crate::rpc::JsonRpcClient;
use crate::utils::quantity_to_u64;

/// Derives [`EvmSmartAccount`]s through an ERC-4337 account factory.
#[derive(Debug, Clone)]
pub struct EvmAccountProvider {
    config: AccountAbstractionConfig,
}

impl EvmAccountProvider {
    pub fn new(config: AccountAbstractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AccountAbstractionConfig {
        &self.config
    }
}

#[async_trait]
impl AccountProvider for EvmAccountProvider {
    async fn derive(
        &self,
        wallet: Arc<dyn BaseWallet>,
        chain: &ChainDescriptor,
    ) -> std::result::Result<Arc<dyn SmartAccount>, TransportError> {
        let account = EvmSmartAccount::connect(wallet, chain, &self.config).await?;
        Ok(Arc::new(account))
    }
}

/// Smart account owned by a base wallet on one chain.
pub struct EvmSmartAccount {
    wallet: Arc<dyn BaseWallet>,
    address: Address,
    chain_id: u64,
    rpc: JsonRpcClient,
    bundler: BundlerClient,
    factory: Address,
    salt: U256,
    confirmations: u64,
}

impl EvmSmartAccount {
    /// Resolve the account address for `wallet` without deploying anything.
    pub async fn connect(
        wallet: Arc<dyn BaseWallet>,
        chain: &ChainDescriptor,
        config: &AccountAbstractionConfig,
    ) -> Result<Self> {
        let rpc = JsonRpcClient::with_timeout(&chain.rpc_url, config.request_timeout)?;

        let rpc_chain_id = rpc.chain_id().await?;
        if rpc_chain_id != chain.chain_id {
            return Err(EvmError::ChainIdMismatch {
                rpc: rpc_chain_id,
                expected: chain.chain_id,
            });
        }

        let owner = wallet.address();
        let returned = rpc
            .call(
                config.account_factory,
                &get_address_calldata(owner, config.account_index),
            )
            .await?;
        let address = ISimpleAccountFactory::getAddressCall::abi_decode_returns(&returned)?;

        tracing::info!(
            owner = %owner,
            account = %address,
            chain_id = chain.chain_id,
            "Derived smart account"
        );

        let bundler = BundlerClient::new(
            &config.bundler_url,
            &config.paymaster_url,
            config.entry_point,
            config.request_timeout,
        )?;

        Ok(Self {
            wallet,
            address,
            chain_id: chain.chain_id,
            rpc,
            bundler,
            factory: config.account_factory,
            salt: config.account_index,
            confirmations: config.confirmations,
        })
    }

    pub async fn is_deployed(&self) -> Result<bool> {
        Ok(!self.rpc.get_code(self.address).await?.is_empty())
    }

    /// Unsigned, unsponsored user operation executing `call`.
    async fn build(&self, call: &LedgerCall) -> Result<UserOperation> {
        let init_code = if self.is_deployed().await? {
            Bytes::new()
        } else {
            tracing::debug!(account = %self.address, "Account not deployed, attaching initCode");
            init_code(self.factory, self.wallet.address(), self.salt)
        };

        let returned = self
            .rpc
            .call(self.bundler.entry_point(), &get_nonce_calldata(self.address))
            .await?;
        let nonce = IEntryPoint::getNonceCall::abi_decode_returns(&returned)?;

        let priority_fee = self.rpc.max_priority_fee_per_gas().await?;
        let gas_price = self.rpc.gas_price().await?;

        let call_data = execute_calldata(call.to, call.value, call.data.clone());
        Ok(
            UserOperation::new(self.address, nonce, init_code, call_data)
                .with_fees(gas_price.saturating_add(priority_fee), priority_fee),
        )
    }
}

#[async_trait]
impl SmartAccount for EvmSmartAccount {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn send_sponsored(
        &self,
        call: LedgerCall,
    ) -> std::result::Result<OperationId, TransportError> {
        let mut op = self.build(&call).await?.with_dummy_signature();

        let sponsorship = self.bundler.sponsor(&op).await?;
        sponsorship.apply_to(&mut op)?;

        let hash = op.hash(self.bundler.entry_point(), self.chain_id);
        op.signature = self.wallet.sign_message(hash.as_slice()).await?;

        let user_op_hash = self
            .bundler
            .send_user_operation(&op)
            .await
            .map_err(|e| match e {
                // The bundler may have accepted it before the connection dropped
                EvmError::Http(e) => TransportError::Unacknowledged {
                    operation: OperationId(hash),
                    message: e.to_string(),
                },
                other => other.into(),
            })?;
        if user_op_hash != hash {
            tracing::warn!(
                local = %hash,
                bundler = %user_op_hash,
                "Bundler reported a different user operation hash"
            );
        }
        Ok(OperationId(user_op_hash))
    }

    async fn inclusion(
        &self,
        operation: &OperationId,
    ) -> std::result::Result<Option<Inclusion>, TransportError> {
        let receipt = self.bundler.user_operation_receipt(operation.0).await?;
        Ok(receipt.map(|r| {
            if !r.success {
                tracing::warn!(
                    user_op_hash = %r.user_op_hash,
                    reason = r.reason.as_deref().unwrap_or("unknown"),
                    "User operation reverted"
                );
            }
            Inclusion {
                tx_hash: r.receipt.transaction_hash,
                success: r.success,
            }
        }))
    }

    async fn confirmation(
        &self,
        tx_hash: &TxHash,
    ) -> std::result::Result<Option<TxReceipt>, TransportError> {
        let Some(receipt) = self.rpc.transaction_receipt(*tx_hash).await? else {
            return Ok(None);
        };

        let block_number = quantity_to_u64(receipt.block_number, "blockNumber")?;
        let head = self.rpc.block_number().await?;
        let depth = head.saturating_sub(block_number) + 1;
        if depth < self.confirmations {
            tracing::debug!(tx_hash = %tx_hash, depth, "Waiting for more confirmations");
            return Ok(None);
        }

        Ok(Some(TxReceipt {
            tx_hash: receipt.transaction_hash,
            block_number,
            success: receipt.succeeded(),
        }))
    }
}
