//! In-memory ledger and account provider for testing.
//!
//! [`MockLedger`] applies the contract's observable rules to calldata it
//! receives through [`MockSmartAccount`]: effects land when the operation is
//! first observed as included, mirroring a real bundler.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy_primitives::keccak256;
use async_trait::async_trait;

use crate::error::TransportError;
use crate::ledger::{LedgerCall, LedgerOperation};
use crate::traits::{AccountProvider, BaseWallet, LedgerReader, SmartAccount};
use crate::types::{
    Address, B256, Bytes, ChainDescriptor, Game, Inclusion, OperationId, TxHash, TxReceipt,
};

#[derive(Default)]
struct LedgerState {
    games: HashMap<Address, Game>,
    queued: HashMap<OperationId, (Address, LedgerCall)>,
    included: HashMap<OperationId, Inclusion>,
    receipts: HashMap<TxHash, TxReceipt>,
    counter: u64,
    block_number: u64,
    submissions: usize,
    reads: usize,
    reject_submissions: Option<String>,
    fail_reads: Option<String>,
    hold_inclusion: bool,
    hold_confirmation: bool,
    stall_submissions: bool,
    lose_acknowledgements: bool,
}

/// Mock Pomodoro ledger shared by every account it hands out.
#[derive(Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing `createGame`.
    pub fn insert_game(&self, game: Game) {
        self.state.lock().unwrap().games.insert(game.player, game);
    }

    pub fn game_of(&self, player: Address) -> Game {
        self.state
            .lock()
            .unwrap()
            .games
            .get(&player)
            .cloned()
            .unwrap_or_else(Game::empty)
    }

    /// Number of operations accepted by the bundler so far.
    pub fn submissions(&self) -> usize {
        self.state.lock().unwrap().submissions
    }

    /// Number of `games(address)` reads served so far.
    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    /// Refuse every submission with `reason` (sponsor refusal, declined signature).
    pub fn reject_submissions(&self, reason: Option<&str>) {
        self.state.lock().unwrap().reject_submissions = reason.map(str::to_string);
    }

    /// Fail every read with a network error.
    pub fn fail_reads(&self, reason: Option<&str>) {
        self.state.lock().unwrap().fail_reads = reason.map(str::to_string);
    }

    /// Keep submitted operations pending: no transaction hash is produced.
    pub fn hold_inclusion(&self, hold: bool) {
        self.state.lock().unwrap().hold_inclusion = hold;
    }

    /// Keep included transactions unconfirmed.
    pub fn hold_confirmation(&self, hold: bool) {
        self.state.lock().unwrap().hold_confirmation = hold;
    }

    /// Park `send_sponsored` before the bundler sees the operation.
    ///
    /// A parked submission never completes; it can only be dropped.
    pub fn stall_submissions(&self, stall: bool) {
        self.state.lock().unwrap().stall_submissions = stall;
    }

    fn submissions_stalled(&self) -> bool {
        self.state.lock().unwrap().stall_submissions
    }

    /// Accept and include submissions, but fail the reply as if the
    /// connection dropped after sending.
    pub fn lose_acknowledgements(&self, lose: bool) {
        self.state.lock().unwrap().lose_acknowledgements = lose;
    }

    fn acknowledgements_lost(&self) -> bool {
        self.state.lock().unwrap().lose_acknowledgements
    }

    /// Lift both holds so queued operations land on the next poll.
    pub fn release(&self) {
        let mut state = self.state.lock().unwrap();
        state.hold_inclusion = false;
        state.hold_confirmation = false;
    }

    fn submit(&self, sender: Address, call: LedgerCall) -> Result<OperationId, TransportError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.reject_submissions {
            return Err(TransportError::Rejected(reason.clone()));
        }

        state.counter += 1;
        state.submissions += 1;
        let id = OperationId(keccak256(state.counter.to_be_bytes()));
        state.queued.insert(id, (sender, call));
        Ok(id)
    }

    fn include(&self, id: &OperationId) -> Result<Option<Inclusion>, TransportError> {
        let mut state = self.state.lock().unwrap();
        if let Some(inclusion) = state.included.get(id) {
            return Ok(Some(*inclusion));
        }
        if state.hold_inclusion {
            return Ok(None);
        }

        let (sender, call) = state
            .queued
            .remove(id)
            .ok_or_else(|| TransportError::Rpc {
                code: -32602,
                message: format!("unknown user operation {id}"),
            })?;

        let success = state.apply(sender, &call);
        state.block_number += 1;

        let tx_hash = keccak256(id.0);
        let inclusion = Inclusion { tx_hash, success };
        let receipt = TxReceipt {
            tx_hash,
            block_number: state.block_number,
            success,
        };
        state.included.insert(*id, inclusion);
        state.receipts.insert(tx_hash, receipt);
        Ok(Some(inclusion))
    }

    fn confirm(&self, tx_hash: &TxHash) -> Option<TxReceipt> {
        let state = self.state.lock().unwrap();
        if state.hold_confirmation {
            return None;
        }
        state.receipts.get(tx_hash).copied()
    }
}

impl LedgerState {
    /// Execute `call` as `sender`. Returns `false` when the contract would revert.
    fn apply(&mut self, sender: Address, call: &LedgerCall) -> bool {
        let Ok(operation) = LedgerOperation::decode(&call.data) else {
            return false;
        };

        match operation {
            LedgerOperation::CreateGame(config) => {
                let occupied = self.games.get(&sender).is_some_and(|game| !game.is_empty());
                if occupied || call.value != config.amount {
                    return false;
                }
                self.games.insert(
                    sender,
                    Game {
                        time: config.time,
                        task_amount: config.task_amount,
                        task_completed: 0,
                        amount: config.amount,
                        break_time: config.break_time,
                        rounds: config.rounds,
                        player: sender,
                    },
                );
                true
            }
            LedgerOperation::CompleteTask => match self.games.get_mut(&sender) {
                Some(game) if !game.is_empty() && !game.all_tasks_completed() => {
                    game.task_completed += 1;
                    true
                }
                _ => false,
            },
            // Settles the stake and clears the record
            LedgerOperation::EndGame => self
                .games
                .remove(&sender)
                .is_some_and(|game| !game.is_empty()),
        }
    }
}

#[async_trait]
impl LedgerReader for MockLedger {
    async fn game(&self, _chain: &ChainDescriptor, player: Address) -> Result<Game, TransportError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.fail_reads {
            return Err(TransportError::Network(reason.clone()));
        }
        state.reads += 1;
        Ok(state.games.get(&player).cloned().unwrap_or_else(Game::empty))
    }
}

/// Smart account backed by a [`MockLedger`].
pub struct MockSmartAccount {
    address: Address,
    chain_id: u64,
    ledger: MockLedger,
}

#[async_trait]
impl SmartAccount for MockSmartAccount {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn send_sponsored(&self, call: LedgerCall) -> Result<OperationId, TransportError> {
        if self.ledger.submissions_stalled() {
            std::future::pending::<()>().await;
        }
        let id = self.ledger.submit(self.address, call)?;
        if self.ledger.acknowledgements_lost() {
            self.ledger.include(&id)?;
            return Err(TransportError::Unacknowledged {
                operation: id,
                message: "connection reset".to_string(),
            });
        }
        Ok(id)
    }

    async fn inclusion(&self, operation: &OperationId) -> Result<Option<Inclusion>, TransportError> {
        self.ledger.include(operation)
    }

    async fn confirmation(&self, tx_hash: &TxHash) -> Result<Option<TxReceipt>, TransportError> {
        Ok(self.ledger.confirm(tx_hash))
    }
}

/// Derives deterministic smart accounts on a [`MockLedger`].
#[derive(Clone)]
pub struct MockAccountProvider {
    ledger: MockLedger,
    derivations: Arc<Mutex<usize>>,
    failure: Arc<Mutex<Option<TransportError>>>,
}

impl MockAccountProvider {
    pub fn new(ledger: MockLedger) -> Self {
        Self {
            ledger,
            derivations: Arc::new(Mutex::new(0)),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every derivation fail with `error`.
    pub fn fail_with(&self, error: Option<TransportError>) {
        *self.failure.lock().unwrap() = error;
    }

    pub fn derivations(&self) -> usize {
        *self.derivations.lock().unwrap()
    }

    /// Address a wallet's smart account will have on `chain_id`.
    pub fn account_address(owner: Address, chain_id: u64) -> Address {
        let mut preimage = owner.to_vec();
        preimage.extend_from_slice(&chain_id.to_be_bytes());
        Address::from_word(keccak256(preimage))
    }
}

#[async_trait]
impl AccountProvider for MockAccountProvider {
    async fn derive(
        &self,
        wallet: Arc<dyn BaseWallet>,
        chain: &ChainDescriptor,
    ) -> Result<Arc<dyn SmartAccount>, TransportError> {
        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        *self.derivations.lock().unwrap() += 1;

        Ok(Arc::new(MockSmartAccount {
            address: Self::account_address(wallet.address(), chain.chain_id),
            chain_id: chain.chain_id,
            ledger: self.ledger.clone(),
        }))
    }
}

/// Base wallet with a fixed address. Signatures are not cryptographic.
#[derive(Debug, Clone)]
pub struct MockWallet {
    address: Address,
}

impl MockWallet {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn with_seed(seed: u8) -> Self {
        Self::new(Address::repeat_byte(seed))
    }
}

#[async_trait]
impl BaseWallet for MockWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, TransportError> {
        let digest: B256 = keccak256(message);
        let mut signature = digest.to_vec();
        signature.extend_from_slice(&[0u8; 32]);
        signature.push(27);
        Ok(Bytes::from(signature))
    }
}

impl MockLedger {
    /// Account for `owner` on `chain_id` without going through a provider.
    pub fn account_for(&self, owner: Address, chain_id: u64) -> MockSmartAccount {
        MockSmartAccount {
            address: MockAccountProvider::account_address(owner, chain_id),
            chain_id,
            ledger: self.clone(),
        }
    }
}
