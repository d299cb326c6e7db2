//! Chain access library
//!
//! Wallet management, token account resolution, fee-aware transfer
//! construction, submission and read-side queries for a Solana cluster,
//! behind the backend-agnostic [`ChainAccess`] trait.

pub mod account;
pub mod amount;
pub mod chain;
pub mod config;
pub mod errors;
pub mod fees;
pub mod metrics;
pub mod query;
pub mod rpc;
pub mod structured_logging;
pub mod submit;
pub mod test_utils;
pub mod tx_builder;
pub mod wallet;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use alloy_primitives::U256;
pub use chain::{build_chain_access, ChainAccess, SolanaChainAccess};
pub use config::{ChainConfig, Secret, SolanaChainConfig};
pub use errors::{ChainAccessError, Result};
pub use submit::{SubmitOptions, SubmitOutcome};
