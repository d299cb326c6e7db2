//! Production [`ChainRpc`] on top of the nonblocking `solana-client`
//!
//! - One `RpcClient` per configured chain, shared across calls
//! - Optional outbound throttling through a `governor` direct rate limiter
//! - Websocket `PubsubClient` opened per confirmed submission
use async_trait::async_trait;
use futures::StreamExt;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSignatureSubscribeConfig;
use solana_client::rpc_response::RpcSignatureResult;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use solana_transaction_status::TransactionStatus;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::{
    duration_ms, ChainRpc, ConfirmFailure, ConfirmationChannel, RpcError, RpcResult, SignatureState,
};
use crate::config::SolanaChainConfig;

/// Collapse a node status into confirmed/failed flags
fn signature_state(status: &TransactionStatus) -> SignatureState {
    SignatureState {
        confirmed: status.satisfies_commitment(CommitmentConfig::confirmed()),
        failed: status.err.is_some(),
    }
}

/// Rate-limited Solana RPC backend
#[derive(Clone)]
pub struct SolanaRpc {
    client: Arc<RpcClient>,
    endpoint: String,
    ws_endpoint: String,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl std::fmt::Debug for SolanaRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaRpc")
            .field("endpoint", &self.endpoint)
            .field("ws_endpoint", &self.ws_endpoint)
            .field("rate_limited", &self.limiter.is_some())
            .finish_non_exhaustive()
    }
}

impl SolanaRpc {
    /// Create a backend for `endpoint`; `rate_limit` is requests per second, 0 disables throttling
    pub fn new(
        endpoint: impl Into<String>,
        ws_endpoint: impl Into<String>,
        rate_limit: u32,
        request_timeout: Duration,
    ) -> Self {
        let endpoint = endpoint.into();
        let client = RpcClient::new_with_timeout_and_commitment(
            endpoint.clone(),
            request_timeout,
            CommitmentConfig::finalized(),
        );
        let limiter = NonZeroU32::new(rate_limit)
            .map(|per_second| Arc::new(RateLimiter::direct(Quota::per_second(per_second))));

        Self {
            client: Arc::new(client),
            endpoint,
            ws_endpoint: ws_endpoint.into(),
            limiter,
        }
    }

    /// Create a backend from chain configuration
    pub fn from_config(config: &SolanaChainConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.ws_endpoint.clone(),
            config.rate_limit,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// RPC endpoint this backend talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether outbound calls are throttled
    pub fn is_rate_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Wait for the rate limiter, if any
    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl ChainRpc for SolanaRpc {
    async fn balance(&self, address: &Pubkey) -> RpcResult<u64> {
        self.throttle().await;
        let response = self
            .client
            .get_balance_with_commitment(address, CommitmentConfig::finalized())
            .await?;
        Ok(response.value)
    }

    async fn token_balance(&self, token_account: &Pubkey) -> RpcResult<u64> {
        self.throttle().await;
        let response = self
            .client
            .get_token_account_balance_with_commitment(token_account, CommitmentConfig::finalized())
            .await?;
        response.value.amount.parse::<u64>().map_err(|e| {
            RpcError::Decode(format!(
                "token amount '{}' is not a u64: {}",
                response.value.amount, e
            ))
        })
    }

    async fn account_exists(&self, address: &Pubkey) -> RpcResult<bool> {
        self.throttle().await;
        // Confirmed, not finalized: an account created moments ago must count as existing
        let response = self
            .client
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await?;
        Ok(response.value.is_some())
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn latest_blockhash(&self) -> RpcResult<Hash> {
        self.throttle().await;
        let (hash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(CommitmentConfig::finalized())
            .await?;
        debug!(%hash, last_valid_block_height, "Fetched latest blockhash");
        Ok(hash)
    }

    async fn recent_prioritization_fees(&self, accounts: &[Pubkey]) -> RpcResult<Vec<u64>> {
        self.throttle().await;
        let fees = self.client.get_recent_prioritization_fees(accounts).await?;
        Ok(fees.into_iter().map(|f| f.prioritization_fee).collect())
    }

    #[instrument(skip(self, tx), fields(endpoint = %self.endpoint))]
    async fn send_transaction(&self, tx: &Transaction) -> RpcResult<Signature> {
        self.throttle().await;
        let signature = self.client.send_transaction(tx).await?;
        debug!(%signature, "Transaction accepted by node");
        Ok(signature)
    }

    async fn signature_status(&self, signature: &Signature) -> RpcResult<Option<SignatureState>> {
        self.throttle().await;
        let response = self
            .client
            .get_signature_statuses_with_history(&[*signature])
            .await?;
        Ok(response.value.into_iter().next().flatten().as_ref().map(signature_state))
    }

    async fn open_confirmation_channel(&self) -> RpcResult<Box<dyn ConfirmationChannel>> {
        if self.ws_endpoint.is_empty() {
            return Err(RpcError::ChannelUnavailable(
                "no subscription endpoint configured".to_string(),
            ));
        }
        let pubsub = PubsubClient::new(&self.ws_endpoint)
            .await
            .map_err(|e| RpcError::ChannelUnavailable(e.to_string()))?;
        debug!(ws_endpoint = %self.ws_endpoint, "Confirmation channel connected");
        Ok(Box::new(PubsubChannel {
            pubsub,
            rpc: self.clone(),
        }))
    }
}

/// Signature subscription over the chain's websocket endpoint
struct PubsubChannel {
    pubsub: PubsubClient,
    rpc: SolanaRpc,
}

#[async_trait]
impl ConfirmationChannel for PubsubChannel {
    async fn send_and_confirm(
        &self,
        tx: &Transaction,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Signature, ConfirmFailure> {
        let signature = *tx.signatures.first().ok_or_else(|| {
            ConfirmFailure::NotSent(RpcError::Decode("transaction carries no signature".to_string()))
        })?;

        // Subscribe before sending so the notification cannot be missed
        let (mut notifications, unsubscribe) = self
            .pubsub
            .signature_subscribe(
                &signature,
                Some(RpcSignatureSubscribeConfig {
                    commitment: Some(CommitmentConfig::confirmed()),
                    enable_received_notification: Some(false),
                }),
            )
            .await
            .map_err(|e| ConfirmFailure::NotSent(RpcError::ChannelUnavailable(e.to_string())))?;

        let outcome = match self.rpc.send_transaction(tx).await {
            Err(e) => Err(ConfirmFailure::NotSent(e)),
            Ok(sent) => {
                let wait = async {
                    while let Some(response) = notifications.next().await {
                        match response.value {
                            RpcSignatureResult::ProcessedSignature(result) => {
                                return match result.err {
                                    None => Ok(sent),
                                    Some(err) => Err(ConfirmFailure::ExecutionFailed {
                                        signature: sent,
                                        reason: format!("{err:?}"),
                                    }),
                                };
                            }
                            RpcSignatureResult::ReceivedSignature(_) => continue,
                        }
                    }
                    Err(ConfirmFailure::Unconfirmed {
                        signature: sent,
                        error: RpcError::ChannelUnavailable(
                            "subscription closed before confirmation".to_string(),
                        ),
                    })
                };

                let timeout_ms = duration_ms(timeout);
                tokio::select! {
                    _ = cancel.cancelled() => Err(ConfirmFailure::Unconfirmed {
                        signature: sent,
                        error: RpcError::Cancelled,
                    }),
                    waited = tokio::time::timeout(timeout, wait) => match waited {
                        Ok(result) => result,
                        Err(_) => {
                            warn!(%signature, timeout_ms, "Confirmation wait timed out");
                            Err(ConfirmFailure::Unconfirmed {
                                signature: sent,
                                error: RpcError::Timeout { timeout_ms },
                            })
                        }
                    },
                }
            }
        };

        drop(notifications);
        unsubscribe().await;
        outcome
    }
}
