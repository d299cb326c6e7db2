//! Error types for chain access operations
//!
//! Every public operation returns a [`ChainAccessError`]. The variants are
//! backend-agnostic so the owning service can map them onto its own API
//! responses without knowing anything about Solana.
//!
//! "Transaction not found" is deliberately absent: a confirmation query for an
//! unknown signature returns `Ok(false)`.

use thiserror::Error;

use crate::rpc::RpcError;

/// Short reason returned alongside a failed balance pre-check.
pub const REASON_BALANCE_UNAVAILABLE: &str = "cannot get from account balance";

/// Short reason returned alongside an insufficient token balance.
pub const REASON_INSUFFICIENT_TOKEN: &str = "insufficient token";

/// Comprehensive error type for all chain access operations
#[derive(Error, Debug)]
pub enum ChainAccessError {
    /// A caller-supplied address string is not a valid base58 public key
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress {
        /// The offending input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// A caller-supplied transaction identifier is not a valid signature
    #[error("Invalid transaction id '{input}': {reason}")]
    InvalidSignature { input: String, reason: String },

    /// Associated token account derivation failed
    #[error("Associated account derivation failed (wallet={wallet}, mint={mint})")]
    Derivation { wallet: String, mint: String },

    /// The source token balance could not be fetched before a transfer
    #[error("Failed to fetch balance of {account}: {source}")]
    BalanceUnavailable {
        account: String,
        #[source]
        source: RpcError,
    },

    /// Pre-flight balance check failed
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    /// Requested amount is not acceptable for a transfer
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Requested amount does not fit the backend's native integer width
    #[error("Amount {amount} exceeds the backend limit of {max}")]
    AmountOverflow { amount: String, max: u64 },

    /// Failed to build an instruction for a specific program
    #[error("Instruction build error (program={program}): {reason}")]
    InstructionBuild { program: String, reason: String },

    /// The recent blockhash could not be fetched
    #[error("Recent blockhash unavailable: {0}")]
    RecencyFetch(#[source] RpcError),

    /// A required signature could not be produced
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Both the confirm path and the fallback broadcast failed
    #[error(
        "Submission failed (confirm path: {}; broadcast: {})",
        .confirm.as_deref().unwrap_or("unavailable"),
        .broadcast
    )]
    Submission {
        /// Error from the subscribe-and-confirm path, if it was attempted
        confirm: Option<String>,
        /// Error from the one-shot broadcast
        broadcast: String,
        /// Whether a fresh attempt may succeed; false when the node refused the transaction outright
        retryable: bool,
    },

    /// The transaction landed but its execution failed on chain
    #[error("Transaction {signature} failed on chain: {reason}")]
    ExecutionFailed { signature: String, reason: String },

    /// Read path failure
    #[error("Query '{operation}' failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: RpcError,
    },

    /// The operation is not supported by this backend
    #[error("Operation not supported by the {backend} backend: {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// Configuration or validation error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ChainAccessError {
    /// Check if this error is potentially retryable by the caller
    ///
    /// The core never retries on its own; this is advice for the owning service.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RecencyFetch(_) => true,
            Self::BalanceUnavailable { source, .. } | Self::Query { source, .. } => {
                source.is_retryable()
            }
            Self::Submission { retryable, .. } => *retryable,

            Self::InvalidAddress { .. }
            | Self::InvalidSignature { .. }
            | Self::Derivation { .. }
            | Self::InsufficientFunds { .. }
            | Self::InvalidAmount(_)
            | Self::AmountOverflow { .. }
            | Self::InstructionBuild { .. }
            | Self::Signing(_)
            | Self::ExecutionFailed { .. }
            | Self::Unsupported { .. }
            | Self::Configuration(_) => false,
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidAddress { .. } | Self::InvalidSignature { .. } => "address",
            Self::Derivation { .. } => "derivation",
            Self::BalanceUnavailable { .. } => "balance",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::InvalidAmount(_) | Self::AmountOverflow { .. } => "amount",
            Self::InstructionBuild { .. } => "instruction",
            Self::RecencyFetch(_) => "blockhash",
            Self::Signing(_) => "signing",
            Self::Submission { .. } => "submission",
            Self::ExecutionFailed { .. } => "execution",
            Self::Query { .. } => "query",
            Self::Unsupported { .. } => "unsupported",
            Self::Configuration(_) => "config",
        }
    }

    /// Human-readable short string for the token transfer pre-flight failures
    ///
    /// Callers that surface a plain string next to the error (the token
    /// transfer path of the owning service does) read it from here.
    pub fn short_reason(&self) -> Option<&'static str> {
        match self {
            Self::BalanceUnavailable { .. } => Some(REASON_BALANCE_UNAVAILABLE),
            Self::InsufficientFunds { .. } => Some(REASON_INSUFFICIENT_TOKEN),
            _ => None,
        }
    }
}

// Convenience constructors for common error scenarios
impl ChainAccessError {
    /// Create an invalid address error
    pub fn invalid_address(input: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidAddress {
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an instruction build error for a specific program
    pub fn instruction_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InstructionBuild {
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Create a query error for the named read operation
    pub fn query(operation: &'static str, source: RpcError) -> Self {
        Self::Query { operation, source }
    }

    /// Create an unsupported-operation error
    pub fn unsupported(backend: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { backend, operation }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ChainAccessError>;
