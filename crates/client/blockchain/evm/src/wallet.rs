//! Local private-key base wallet.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, Bytes};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use client_blockchain_core::{BaseWallet, TransportError};

use crate::core::error::{EvmError, Result};

/// Base wallet backed by an in-process secp256k1 key.
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
}

impl LocalWallet {
    /// Parse a hex private key, with or without `0x`.
    pub fn from_private_key(key: &str) -> Result<Self> {
        let key = key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let signer = PrivateKeySigner::from_str(key)
            .map_err(|e| EvmError::InvalidConfig(format!("invalid private key: {e}")))?;
        Ok(Self { signer })
    }

    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    /// Hex-encoded private key, without `0x`.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signer.to_bytes())
    }
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BaseWallet for LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_message(&self, message: &[u8]) -> std::result::Result<Bytes, TransportError> {
        let signature = self
            .signer
            .sign_message(message)
            .await
            .map_err(|e| TransportError::Rejected(format!("signing failed: {e}")))?;
        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Signature;

    // Anvil's first development key
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn parses_key_with_or_without_prefix() {
        let a = LocalWallet::from_private_key(DEV_KEY).unwrap();
        let b = LocalWallet::from_private_key(&DEV_KEY[2..]).unwrap();

        assert_eq!(a.address(), b.address());
        assert_eq!(
            a.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
        assert_eq!(a.private_key_hex(), &DEV_KEY[2..]);
    }

    #[test]
    fn rejects_garbage_key() {
        assert!(LocalWallet::from_private_key("not-a-key").is_err());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let wallet = LocalWallet::from_private_key(DEV_KEY).unwrap();
        assert!(!format!("{wallet:?}").contains(&DEV_KEY[2..]));
    }

    #[tokio::test]
    async fn personal_signature_recovers_to_wallet() {
        let wallet = LocalWallet::random();
        let message = [7u8; 32];

        let raw = wallet.sign_message(&message).await.unwrap();
        assert_eq!(raw.len(), 65);

        let signature = Signature::from_raw(&raw).unwrap();
        let recovered = signature.recover_address_from_msg(message).unwrap();
        assert_eq!(recovered, wallet.address());
    }
}
