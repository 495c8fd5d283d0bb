//! Authenticated sessions: one wallet, one smart account, one state machine.

use std::sync::Arc;

use client_blockchain_core::{Address, BaseWallet, Result, SmartAccountHandle};
use runtime::SessionMachine;

use crate::account::AccountBootstrap;
use crate::builder::ClientContext;

/// Session created by [`SessionSlot::login`].
///
/// Owns the smart account handle through its machine; dropping the session
/// drops the handle.
pub struct ClientSession {
    bootstrap: Arc<AccountBootstrap>,
    machine: SessionMachine,
}

impl ClientSession {
    pub(crate) fn new(bootstrap: Arc<AccountBootstrap>, machine: SessionMachine) -> Self {
        Self { bootstrap, machine }
    }

    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    pub fn handle(&self) -> &SmartAccountHandle {
        self.machine.handle()
    }

    /// Base wallet this session was derived from.
    pub fn owner(&self) -> Address {
        self.machine.handle().owner
    }

    /// End the session and forget the wallet's cached accounts.
    pub fn logout(self) {
        let owner = self.owner();
        self.bootstrap.evict(owner);
        tracing::info!(owner = %owner, account = %self.handle().address, "Logged out");
    }
}

/// Holds at most one live session.
#[derive(Default)]
pub struct SessionSlot {
    current: Option<ClientSession>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ClientSession> {
        self.current.as_ref()
    }

    /// Log `wallet` in, tearing down a session held by another wallet.
    ///
    /// Logging in again with the current wallet keeps the existing session.
    pub async fn login(
        &mut self,
        context: &ClientContext,
        wallet: Option<Arc<dyn BaseWallet>>,
    ) -> Result<&ClientSession> {
        let same_wallet = match (&self.current, &wallet) {
            (Some(session), Some(wallet)) => session.owner() == wallet.address(),
            _ => false,
        };

        if !same_wallet {
            self.logout();
            self.current = Some(context.login(wallet).await?);
        }

        self.current
            .as_ref()
            .ok_or(client_blockchain_core::SessionError::NotAuthenticated)
    }

    pub fn logout(&mut self) {
        if let Some(session) = self.current.take() {
            session.logout();
        }
    }
}
