//! Test Utilities Module
//!
//! Scriptable in-memory [`ChainRpc`] for deterministic tests. Every call is
//! recorded so tests can assert what did, and did not, reach the network.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::rpc::{
    duration_ms, ChainRpc, ConfirmFailure, ConfirmationChannel, RpcError, RpcResult, SignatureState,
};

#[derive(Default)]
struct MockState {
    balances: HashMap<Pubkey, u64>,
    balance_error: Option<RpcError>,

    token_balances: HashMap<Pubkey, u64>,
    token_balance_error: Option<RpcError>,

    accounts: HashSet<Pubkey>,
    account_error: Option<RpcError>,

    blockhash: Hash,
    blockhash_error: Option<RpcError>,
    blockhash_requests: usize,

    fee_samples: Vec<u64>,
    fee_error: Option<RpcError>,

    channel_error: Option<RpcError>,
    confirm_error: Option<RpcError>,
    execution_error: Option<String>,
    hang_confirmation: bool,
    broadcast_error: Option<RpcError>,

    statuses: HashMap<Signature, SignatureState>,
    status_error: Option<RpcError>,

    calls: Vec<&'static str>,
    channel_sent: Vec<Transaction>,
    broadcast: Vec<Transaction>,
}

/// Mock RPC backend
///
/// Clones share state, so a test can hand one clone to the code under test
/// and keep another for scripting and assertions.
#[derive(Clone, Default)]
pub struct MockRpc {
    state: Arc<Mutex<MockState>>,
}

impl MockRpc {
    /// Healthy backend: channel available, no fee samples, empty ledger
    pub fn new() -> Self {
        let rpc = Self::default();
        rpc.state.lock().blockhash = Hash::new_unique();
        rpc
    }

    pub fn set_balance(&self, address: Pubkey, lamports: u64) {
        self.state.lock().balances.insert(address, lamports);
    }

    pub fn fail_balance(&self, error: RpcError) {
        self.state.lock().balance_error = Some(error);
    }

    /// Set the balance of a token account; the account also starts to exist
    pub fn set_token_balance(&self, token_account: Pubkey, amount: u64) {
        let mut state = self.state.lock();
        state.token_balances.insert(token_account, amount);
        state.accounts.insert(token_account);
    }

    pub fn fail_token_balance(&self, error: RpcError) {
        self.state.lock().token_balance_error = Some(error);
    }

    pub fn add_account(&self, address: Pubkey) {
        self.state.lock().accounts.insert(address);
    }

    pub fn fail_account_exists(&self, error: RpcError) {
        self.state.lock().account_error = Some(error);
    }

    pub fn set_blockhash(&self, blockhash: Hash) {
        self.state.lock().blockhash = blockhash;
    }

    pub fn fail_blockhash(&self, error: RpcError) {
        self.state.lock().blockhash_error = Some(error);
    }

    pub fn set_prioritization_fees(&self, samples: Vec<u64>) {
        self.state.lock().fee_samples = samples;
    }

    pub fn fail_fee_query(&self, error: RpcError) {
        self.state.lock().fee_error = Some(error);
    }

    pub fn fail_channel_open(&self, error: RpcError) {
        self.state.lock().channel_error = Some(error);
    }

    /// Make the channel's send fail before the node accepts the transaction
    pub fn fail_confirmation(&self, error: RpcError) {
        self.state.lock().confirm_error = Some(error);
    }

    /// Land the channel's transaction with an on-chain execution error
    pub fn fail_execution(&self, reason: impl Into<String>) {
        self.state.lock().execution_error = Some(reason.into());
    }

    /// Send through the channel, then wait until the timeout or cancellation
    pub fn hang_confirmation(&self) {
        self.state.lock().hang_confirmation = true;
    }

    pub fn fail_broadcast(&self, error: RpcError) {
        self.state.lock().broadcast_error = Some(error);
    }

    pub fn set_signature_status(&self, signature: Signature, state: SignatureState) {
        self.state.lock().statuses.insert(signature, state);
    }

    pub fn fail_signature_status(&self, error: RpcError) {
        self.state.lock().status_error = Some(error);
    }

    /// Names of every RPC method called, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    pub fn blockhash_requests(&self) -> usize {
        self.state.lock().blockhash_requests
    }

    /// Transactions the confirmation channel delivered to the node
    pub fn channel_transactions(&self) -> Vec<Transaction> {
        self.state.lock().channel_sent.clone()
    }

    /// Transactions sent through one-shot broadcast
    pub fn broadcast_transactions(&self) -> Vec<Transaction> {
        self.state.lock().broadcast.clone()
    }

    /// Number of transactions that reached either submission path
    pub fn submitted_count(&self) -> usize {
        let state = self.state.lock();
        state.channel_sent.len() + state.broadcast.len()
    }

    fn record(&self, call: &'static str) {
        self.state.lock().calls.push(call);
    }
}

fn payer_signature(tx: &Transaction) -> Signature {
    tx.signatures.first().copied().unwrap_or_default()
}

#[async_trait]
impl ChainRpc for MockRpc {
    async fn balance(&self, address: &Pubkey) -> RpcResult<u64> {
        self.record("balance");
        let state = self.state.lock();
        if let Some(e) = &state.balance_error {
            return Err(e.clone());
        }
        Ok(state.balances.get(address).copied().unwrap_or(0))
    }

    async fn token_balance(&self, token_account: &Pubkey) -> RpcResult<u64> {
        self.record("token_balance");
        let state = self.state.lock();
        if let Some(e) = &state.token_balance_error {
            return Err(e.clone());
        }
        state
            .token_balances
            .get(token_account)
            .copied()
            .ok_or_else(|| RpcError::Response {
                code: Some(-32602),
                message: format!("Invalid param: could not find account {token_account}"),
            })
    }

    async fn account_exists(&self, address: &Pubkey) -> RpcResult<bool> {
        self.record("account_exists");
        let state = self.state.lock();
        if let Some(e) = &state.account_error {
            return Err(e.clone());
        }
        Ok(state.accounts.contains(address))
    }

    async fn latest_blockhash(&self) -> RpcResult<Hash> {
        self.record("latest_blockhash");
        let mut state = self.state.lock();
        state.blockhash_requests += 1;
        if let Some(e) = &state.blockhash_error {
            return Err(e.clone());
        }
        Ok(state.blockhash)
    }

    async fn recent_prioritization_fees(&self, _accounts: &[Pubkey]) -> RpcResult<Vec<u64>> {
        self.record("recent_prioritization_fees");
        let state = self.state.lock();
        if let Some(e) = &state.fee_error {
            return Err(e.clone());
        }
        Ok(state.fee_samples.clone())
    }

    async fn send_transaction(&self, tx: &Transaction) -> RpcResult<Signature> {
        self.record("send_transaction");
        let mut state = self.state.lock();
        if let Some(e) = &state.broadcast_error {
            return Err(e.clone());
        }
        state.broadcast.push(tx.clone());
        Ok(payer_signature(tx))
    }

    async fn signature_status(&self, signature: &Signature) -> RpcResult<Option<SignatureState>> {
        self.record("signature_status");
        let state = self.state.lock();
        if let Some(e) = &state.status_error {
            return Err(e.clone());
        }
        Ok(state.statuses.get(signature).copied())
    }

    async fn open_confirmation_channel(&self) -> RpcResult<Box<dyn ConfirmationChannel>> {
        self.record("open_confirmation_channel");
        if let Some(e) = &self.state.lock().channel_error {
            return Err(e.clone());
        }
        Ok(Box::new(MockChannel { rpc: self.clone() }))
    }
}

/// Confirmation channel handed out by [`MockRpc`]
pub struct MockChannel {
    rpc: MockRpc,
}

#[async_trait]
impl ConfirmationChannel for MockChannel {
    async fn send_and_confirm(
        &self,
        tx: &Transaction,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Signature, ConfirmFailure> {
        self.rpc.record("send_and_confirm");
        let signature = payer_signature(tx);

        let (hang, execution_error) = {
            let mut state = self.rpc.state.lock();
            if let Some(e) = &state.confirm_error {
                return Err(ConfirmFailure::NotSent(e.clone()));
            }
            // Sent before any waiting, like the pubsub channel
            state.channel_sent.push(tx.clone());
            (state.hang_confirmation, state.execution_error.clone())
        };

        if let Some(reason) = execution_error {
            return Err(ConfirmFailure::ExecutionFailed { signature, reason });
        }
        if hang {
            let error = tokio::select! {
                _ = cancel.cancelled() => RpcError::Cancelled,
                _ = tokio::time::sleep(timeout) => RpcError::Timeout {
                    timeout_ms: duration_ms(timeout),
                },
            };
            return Err(ConfirmFailure::Unconfirmed { signature, error });
        }
        if cancel.is_cancelled() {
            return Err(ConfirmFailure::Unconfirmed {
                signature,
                error: RpcError::Cancelled,
            });
        }
        Ok(signature)
    }
}
