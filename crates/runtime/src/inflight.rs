//! Outstanding operations, at most one per player.
//!
//! Shared by every [`SessionMachine`](crate::SessionMachine) built from the
//! same context, so two sessions for one player cannot both submit.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use client_blockchain_core::{Address, OperationKind};

#[derive(Debug, Default)]
pub struct InFlightOperations {
    slots: Mutex<HashMap<Address, OperationKind>>,
}

impl InFlightOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operation outstanding for `player`, if any.
    pub fn get(&self, player: &Address) -> Option<OperationKind> {
        self.slots().get(player).copied()
    }

    /// Claim `player`'s slot, or return the operation already holding it.
    pub(crate) fn claim(
        &self,
        player: Address,
        kind: OperationKind,
    ) -> Result<InFlightGuard<'_>, OperationKind> {
        let mut slots = self.slots();
        if let Some(held) = slots.get(&player) {
            return Err(*held);
        }
        slots.insert(player, kind);
        Ok(InFlightGuard {
            operations: self,
            player,
        })
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Address, OperationKind>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the slot when the request finishes or is dropped.
pub(crate) struct InFlightGuard<'a> {
    operations: &'a InFlightOperations,
    player: Address,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.operations.slots().remove(&self.player);
    }
}
