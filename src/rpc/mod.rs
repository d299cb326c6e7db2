//! RPC seam between the chain access core and the network
//!
//! The core talks to the network only through [`ChainRpc`] and
//! [`ConfirmationChannel`]. [`SolanaRpc`] is the production implementation on
//! top of `solana-client`; tests plug in `MockRpc` from `test_utils`.
//!
//! Every method is a single round-trip (or, for the confirmation channel, a
//! send followed by one notification wait). Nothing here retries.

pub mod client;
pub mod rpc_errors;

pub use client::SolanaRpc;
pub use rpc_errors::RpcError;

use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result type for RPC backend calls
pub type RpcResult<T> = Result<T, RpcError>;

/// Whole milliseconds in `duration`, saturating at `u64::MAX`
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Observed state of a submitted signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureState {
    /// Reached `confirmed` or `finalized` commitment
    pub confirmed: bool,
    /// Included, but the transaction returned an execution error
    pub failed: bool,
}

/// Read/write RPC operations used by the pipeline
///
/// Reads are made at `finalized` commitment unless noted.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Native balance in lamports
    async fn balance(&self, address: &Pubkey) -> RpcResult<u64>;

    /// Raw token amount held by a token account
    async fn token_balance(&self, token_account: &Pubkey) -> RpcResult<u64>;

    /// Whether an account exists on-chain
    async fn account_exists(&self, address: &Pubkey) -> RpcResult<bool>;

    /// Latest finalized blockhash; never cached
    async fn latest_blockhash(&self) -> RpcResult<Hash>;

    /// Recent per-slot prioritization fees (micro-lamports per CU) touching `accounts`
    async fn recent_prioritization_fees(&self, accounts: &[Pubkey]) -> RpcResult<Vec<u64>>;

    /// One-shot broadcast; returns as soon as the node accepts the transaction
    async fn send_transaction(&self, tx: &Transaction) -> RpcResult<Signature>;

    /// Status lookup including the node's history; `None` when unknown
    async fn signature_status(&self, signature: &Signature) -> RpcResult<Option<SignatureState>>;

    /// Open the subscription channel used for confirmed submission
    async fn open_confirmation_channel(&self) -> RpcResult<Box<dyn ConfirmationChannel>>;
}

/// How a confirmed submission ended without observing confirmation
///
/// The split matters to the caller: once the node has accepted the
/// transaction it must not be sent again.
#[derive(Debug, Clone)]
pub enum ConfirmFailure {
    /// The transaction never reached the node
    NotSent(RpcError),
    /// Accepted by the node; the wait ended before a confirmation arrived
    Unconfirmed { signature: Signature, error: RpcError },
    /// Included, but execution failed on chain
    ExecutionFailed { signature: Signature, reason: String },
}

impl ConfirmFailure {
    /// Signature of the transaction if the node accepted it
    pub fn sent_signature(&self) -> Option<Signature> {
        match self {
            Self::NotSent(_) => None,
            Self::Unconfirmed { signature, .. } | Self::ExecutionFailed { signature, .. } => {
                Some(*signature)
            }
        }
    }
}

impl std::fmt::Display for ConfirmFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSent(e) => write!(f, "not sent: {e}"),
            Self::Unconfirmed { signature, error } => write!(f, "{signature} sent, unconfirmed: {error}"),
            Self::ExecutionFailed { signature, reason } => write!(f, "{signature} failed on chain: {reason}"),
        }
    }
}

/// A live subscription able to send a transaction and wait for its inclusion
#[async_trait]
pub trait ConfirmationChannel: Send + Sync {
    /// Send `tx` and wait for the network to report it confirmed
    ///
    /// The wait ends at `timeout` or when `cancel` fires, whichever is first.
    async fn send_and_confirm(
        &self,
        tx: &Transaction,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Signature, ConfirmFailure>;
}
