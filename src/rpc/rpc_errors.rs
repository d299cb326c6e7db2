use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_request::RpcError as ClientRpcError;
use thiserror::Error;

const ALREADY_PROCESSED: &str = "already been processed";

/// Errors surfaced by a [`ChainRpc`](super::ChainRpc) backend
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// Transport-level errors (network, connection)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Timeout errors
    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// RPC response errors (from the RPC server)
    #[error("RPC response error: {message} (code: {code:?})")]
    Response { code: Option<i64>, message: String },

    /// The response arrived but could not be interpreted
    #[error("Malformed response: {0}")]
    Decode(String),

    /// The confirmation subscription channel could not be opened or used
    #[error("Confirmation channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// The node refused the transaction
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Waiting was cancelled by the caller
    #[error("Cancelled by caller")]
    Cancelled,
}

impl RpcError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// The node reports the transaction as already landed
    ///
    /// Preflight rejects a resend of an included transaction with this text.
    pub fn is_already_processed(&self) -> bool {
        let message = match self {
            RpcError::Transport { message } | RpcError::Response { message, .. } => message,
            RpcError::Rejected(message) => message,
            _ => return false,
        };
        message.contains(ALREADY_PROCESSED)
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        if self.is_already_processed() {
            return false;
        }
        match self {
            RpcError::Transport { .. } => true,
            RpcError::Timeout { .. } => true,
            RpcError::ChannelUnavailable(_) => true,

            RpcError::Decode(_) => false,
            RpcError::Rejected(_) => false,
            RpcError::Cancelled => false,

            RpcError::Response { code, .. } => {
                // JSON-RPC server errors live in -32000..=-32099
                if let Some(c) = code {
                    (-32099..=-32000).contains(c)
                } else {
                    false
                }
            }
        }
    }

    /// Classify a `solana-client` error
    pub fn from_client_error(err: &ClientError) -> Self {
        match err.kind() {
            ClientErrorKind::RpcError(ClientRpcError::RpcResponseError { code, message, .. }) => {
                RpcError::Response {
                    code: Some(*code),
                    message: message.clone(),
                }
            }
            ClientErrorKind::SerdeJson(e) => RpcError::Decode(e.to_string()),
            _ => {
                let message = err.to_string();
                let lowered = message.to_lowercase();
                if lowered.contains("timeout") || lowered.contains("timed out") {
                    RpcError::Timeout { timeout_ms: 0 }
                } else {
                    RpcError::Transport { message }
                }
            }
        }
    }
}

impl From<ClientError> for RpcError {
    fn from(err: ClientError) -> Self {
        Self::from_client_error(&err)
    }
}
