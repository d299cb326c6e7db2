//! Submission pipeline: confirm first, broadcast as fallback
//!
//! A signed transaction first goes out through a subscription channel that
//! waits for confirmation. Once the node has accepted it, the call returns
//! its signature whether or not confirmation was observed, and it is never
//! sent again. Only when the channel cannot be opened or its send fails are
//! the same signed bytes broadcast once without waiting.

use solana_sdk::signature::Signature;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{ChainAccessError, Result};
use crate::rpc::{ChainRpc, ConfirmFailure};
use crate::tx_builder::SignedTransfer;

/// Per-call submission knobs
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Upper bound on the confirmation wait
    pub confirm_timeout: Duration,
    /// Ends the confirmation wait early; a sent transaction still returns its signature
    pub cancel: CancellationToken,
}

impl SubmitOptions {
    pub fn new(confirm_timeout: Duration) -> Self {
        Self {
            confirm_timeout,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// How a submission completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Observed confirmed through the subscription channel
    Confirmed(Signature),
    /// Accepted by the node; confirmation not observed
    Broadcast(Signature),
}

impl SubmitOutcome {
    pub fn signature(&self) -> Signature {
        match self {
            Self::Confirmed(signature) | Self::Broadcast(signature) => *signature,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

/// Submit `signed`, preferring observed confirmation
pub async fn submit(rpc: &dyn ChainRpc, signed: &SignedTransfer, options: &SubmitOptions) -> Result<SubmitOutcome> {
    let tx = signed.transaction();

    let confirm_error = match rpc.open_confirmation_channel().await {
        Ok(channel) => {
            match channel
                .send_and_confirm(tx, options.confirm_timeout, &options.cancel)
                .await
            {
                Ok(signature) => {
                    debug!(%signature, "Transaction confirmed through subscription");
                    return Ok(SubmitOutcome::Confirmed(signature));
                }
                Err(ConfirmFailure::Unconfirmed { signature, error }) => {
                    warn!(%signature, error = %error, "Transaction sent, confirmation not observed");
                    return Ok(SubmitOutcome::Broadcast(signature));
                }
                Err(ConfirmFailure::ExecutionFailed { signature, reason }) => {
                    return Err(ChainAccessError::ExecutionFailed {
                        signature: signature.to_string(),
                        reason,
                    });
                }
                Err(ConfirmFailure::NotSent(e)) => {
                    warn!(signature = %signed.signature(), error = %e, "Confirmed submission failed, falling back to broadcast");
                    Some(e.to_string())
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "Confirmation channel unavailable, falling back to broadcast");
            None
        }
    };

    match rpc.send_transaction(tx).await {
        Ok(signature) => {
            debug!(%signature, "Transaction broadcast without confirmation");
            Ok(SubmitOutcome::Broadcast(signature))
        }
        Err(e) if e.is_already_processed() => {
            // An earlier send reached the node even though its reply was lost
            warn!(signature = %signed.signature(), "Broadcast reports transaction already processed");
            Ok(SubmitOutcome::Broadcast(signed.signature()))
        }
        Err(e) => Err(ChainAccessError::Submission {
            confirm: confirm_error,
            broadcast: e.to_string(),
            retryable: e.is_retryable(),
        }),
    }
}
