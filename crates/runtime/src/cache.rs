//! Read-through cache of ledger records keyed by player address.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use client_blockchain_core::{Address, ChainDescriptor, Game, LedgerReader, TransportError};

/// Caches `games(player)` reads until a mutation invalidates them.
#[derive(Debug, Default)]
pub struct GameCache {
    entries: Mutex<HashMap<Address, Game>>,
}

impl GameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player: &Address) -> Option<Game> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(player)
            .cloned()
    }

    /// Cached record for `player`, reading through `reader` on a miss.
    ///
    /// Failed reads are not cached.
    pub async fn get_or_fetch(
        &self,
        reader: &dyn LedgerReader,
        chain: &ChainDescriptor,
        player: Address,
    ) -> Result<Game, TransportError> {
        if let Some(game) = self.get(&player) {
            tracing::trace!(player = %player, "Game cache hit");
            return Ok(game);
        }

        let game = reader.game(chain, player).await?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player, game.clone());
        Ok(game)
    }

    pub fn invalidate(&self, player: &Address) {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(player);
        if removed.is_some() {
            tracing::debug!(player = %player, "Invalidated cached game");
        }
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
