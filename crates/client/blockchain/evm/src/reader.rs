//! `games(address)` reads over `eth_call`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use client_blockchain_core::ledger::{decode_game, games_calldata};
use client_blockchain_core::{ChainDescriptor, Game, LedgerReader, TransportError};
use tokio::sync::RwLock;

use crate::core::error::Result;
use crate::rpc::JsonRpcClient;

/// Reads ledger records from whichever chain the descriptor names.
///
/// One RPC client is kept per chain id.
#[derive(Debug)]
pub struct EvmLedgerReader {
    timeout: Duration,
    clients: RwLock<HashMap<u64, Arc<JsonRpcClient>>>,
}

impl EvmLedgerReader {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            clients: RwLock::new(HashMap::new()),
        }
    }

    async fn client(&self, chain: &ChainDescriptor) -> Result<Arc<JsonRpcClient>> {
        if let Some(client) = self.clients.read().await.get(&chain.chain_id) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(JsonRpcClient::with_timeout(&chain.rpc_url, self.timeout)?);
        self.clients
            .write()
            .await
            .insert(chain.chain_id, Arc::clone(&client));
        Ok(client)
    }
}

impl Default for EvmLedgerReader {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl LedgerReader for EvmLedgerReader {
    async fn game(
        &self,
        chain: &ChainDescriptor,
        player: Address,
    ) -> std::result::Result<Game, TransportError> {
        let client = self.client(chain).await?;
        let returned = client
            .call(chain.contract_address, &games_calldata(player))
            .await?;

        let game = decode_game(&returned)?;
        tracing::debug!(
            player = %player,
            chain_id = chain.chain_id,
            task_completed = game.task_completed,
            task_amount = game.task_amount,
            "Read game record"
        );
        Ok(game)
    }
}
