//! Account Bootstrap: derives sponsored smart accounts from base wallets.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use client_blockchain_core::{
    AccountProvider, Address, BaseWallet, ChainDescriptor, Result, SessionError,
    SmartAccountHandle,
};

/// Derives [`SmartAccountHandle`]s and caches them by wallet and chain.
///
/// Derivation only queries the account-abstraction provider, so a cached
/// handle is equivalent to a fresh one.
pub struct AccountBootstrap {
    provider: Arc<dyn AccountProvider>,
    handles: Mutex<HashMap<(Address, u64), SmartAccountHandle>>,
}

impl AccountBootstrap {
    pub fn new(provider: Arc<dyn AccountProvider>) -> Self {
        Self {
            provider,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Handle for `wallet` on `chain`, deriving it on first use.
    pub async fn derive(
        &self,
        wallet: Option<Arc<dyn BaseWallet>>,
        chain: &ChainDescriptor,
    ) -> Result<SmartAccountHandle> {
        let wallet = wallet.ok_or(SessionError::NotAuthenticated)?;
        let owner = wallet.address();
        let key = (owner, chain.chain_id);

        if let Some(handle) = self.lock().get(&key) {
            tracing::debug!(owner = %owner, chain_id = chain.chain_id, "Using cached smart account");
            return Ok(handle.clone());
        }

        let account = self.provider.derive(wallet, chain).await.map_err(|e| {
            tracing::warn!(owner = %owner, chain_id = chain.chain_id, error = %e, "Smart account derivation failed");
            SessionError::from_derivation(e)
        })?;

        if account.chain_id() != chain.chain_id {
            return Err(SessionError::ChainMismatch {
                handle: account.chain_id(),
                descriptor: chain.chain_id,
            });
        }

        let handle = SmartAccountHandle::new(account, owner);
        tracing::info!(
            owner = %owner,
            account = %handle.address,
            chain_id = handle.chain_id,
            "Smart account ready"
        );
        self.lock().insert(key, handle.clone());
        Ok(handle)
    }

    /// Drop every cached handle derived from `owner`.
    pub fn evict(&self, owner: Address) {
        self.lock().retain(|(cached_owner, _), _| *cached_owner != owner);
    }

    pub fn is_cached(&self, owner: Address, chain_id: u64) -> bool {
        self.lock().contains_key(&(owner, chain_id))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(Address, u64), SmartAccountHandle>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::{MockAccountProvider, MockLedger, MockWallet, TransportError};

    fn chain() -> ChainDescriptor {
        ChainDescriptor {
            name: "Base Sepolia".to_string(),
            contract_address: Address::repeat_byte(0xcc),
            rpc_url: "https://sepolia.base.org".to_string(),
            explorer_url_prefix: "https://sepolia.basescan.org/tx/".to_string(),
            chain_id: 84532,
        }
    }

    fn bootstrap() -> (Arc<MockAccountProvider>, AccountBootstrap) {
        let provider = Arc::new(MockAccountProvider::new(MockLedger::new()));
        let bootstrap = AccountBootstrap::new(provider.clone());
        (provider, bootstrap)
    }

    #[tokio::test]
    async fn no_wallet_is_not_authenticated() {
        let (provider, bootstrap) = bootstrap();

        let err = bootstrap.derive(None, &chain()).await.unwrap_err();
        assert!(matches!(err, SessionError::NotAuthenticated));
        assert_eq!(provider.derivations(), 0);
    }

    #[tokio::test]
    async fn repeated_derivation_uses_cache() {
        let (provider, bootstrap) = bootstrap();
        let wallet: Arc<dyn BaseWallet> = Arc::new(MockWallet::with_seed(1));

        let first = bootstrap.derive(Some(wallet.clone()), &chain()).await.unwrap();
        let second = bootstrap.derive(Some(wallet.clone()), &chain()).await.unwrap();

        assert_eq!(first.address, second.address);
        assert_eq!(first.owner, wallet.address());
        assert_eq!(first.chain_id, 84532);
        assert_eq!(provider.derivations(), 1);
        assert!(bootstrap.is_cached(wallet.address(), 84532));
    }

    #[tokio::test]
    async fn distinct_wallets_get_distinct_accounts() {
        let (_, bootstrap) = bootstrap();
        let a = bootstrap
            .derive(Some(Arc::new(MockWallet::with_seed(1))), &chain())
            .await
            .unwrap();
        let b = bootstrap
            .derive(Some(Arc::new(MockWallet::with_seed(2))), &chain())
            .await
            .unwrap();

        assert_ne!(a.address, b.address);
    }

    #[tokio::test]
    async fn provider_failures_are_classified() {
        let (provider, bootstrap) = bootstrap();
        let wallet: Arc<dyn BaseWallet> = Arc::new(MockWallet::with_seed(1));

        provider.fail_with(Some(TransportError::Network("timed out".into())));
        let err = bootstrap.derive(Some(wallet.clone()), &chain()).await.unwrap_err();
        assert!(matches!(err, SessionError::ProviderUnavailable(_)));
        assert!(err.is_retryable());

        provider.fail_with(Some(TransportError::Incompatible("signer cannot sign".into())));
        let err = bootstrap.derive(Some(wallet.clone()), &chain()).await.unwrap_err();
        assert!(matches!(err, SessionError::DerivationFailed(_)));
        assert!(!bootstrap.is_cached(wallet.address(), 84532));

        provider.fail_with(None);
        assert!(bootstrap.derive(Some(wallet), &chain()).await.is_ok());
    }

    #[tokio::test]
    async fn evict_forgets_only_that_wallet() {
        let (provider, bootstrap) = bootstrap();
        let a: Arc<dyn BaseWallet> = Arc::new(MockWallet::with_seed(1));
        let b: Arc<dyn BaseWallet> = Arc::new(MockWallet::with_seed(2));
        bootstrap.derive(Some(a.clone()), &chain()).await.unwrap();
        bootstrap.derive(Some(b.clone()), &chain()).await.unwrap();

        bootstrap.evict(a.address());

        assert!(!bootstrap.is_cached(a.address(), 84532));
        assert!(bootstrap.is_cached(b.address(), 84532));
        bootstrap.derive(Some(a), &chain()).await.unwrap();
        assert_eq!(provider.derivations(), 3);
    }
}
