//! Priority fee and compute ceiling estimation
//!
//! The live estimate is a nearest-rank percentile of recent prioritization
//! fees paid on the accounts the transaction writes. Any failure falls back
//! to the configured default; fee estimation never blocks a transfer.

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::config::SolanaChainConfig;
use crate::rpc::ChainRpc;

/// Where a fee estimate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeSource {
    Live,
    Fallback,
}

/// Priority fee and compute ceiling for one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimate {
    /// Micro-lamports per compute unit
    pub priority_fee: u64,
    /// Compute unit limit
    pub compute_unit_limit: u32,
    pub source: FeeSource,
}

/// Fee policy derived from static configuration
#[derive(Debug, Clone, Copy)]
pub struct FeeEstimator {
    default_priority_fee: u64,
    compute_unit_limit: u32,
    percentile: u8,
    max_priority_fee: Option<u64>,
}

impl FeeEstimator {
    pub fn new(default_priority_fee: u64, compute_unit_limit: u32, percentile: u8) -> Self {
        Self {
            default_priority_fee,
            compute_unit_limit,
            percentile: percentile.min(100),
            max_priority_fee: None,
        }
    }

    pub fn from_config(config: &SolanaChainConfig) -> Self {
        Self {
            max_priority_fee: config.max_priority_fee,
            ..Self::new(
                config.default_priority_fee,
                config.compute_unit_limit,
                config.priority_fee_percentile,
            )
        }
    }

    /// The static estimate used whenever live estimation is unavailable
    pub fn fallback(&self) -> FeeEstimate {
        FeeEstimate {
            priority_fee: self.default_priority_fee,
            compute_unit_limit: self.compute_unit_limit,
            source: FeeSource::Fallback,
        }
    }

    /// Estimate fees for a transaction writing `writable_accounts`
    pub async fn estimate(&self, rpc: &dyn ChainRpc, writable_accounts: &[Pubkey]) -> FeeEstimate {
        let samples = match rpc.recent_prioritization_fees(writable_accounts).await {
            Ok(samples) => samples,
            Err(e) => {
                warn!(error = %e, fallback = self.default_priority_fee, "Priority fee query failed, using configured default");
                return self.fallback();
            }
        };

        match self.percentile_fee(samples) {
            Some(fee) => {
                let capped = self.max_priority_fee.map_or(fee, |max| fee.min(max));
                debug!(
                    live_fee = fee,
                    capped_fee = capped,
                    percentile = self.percentile,
                    "Live priority fee estimate"
                );
                FeeEstimate {
                    priority_fee: capped,
                    compute_unit_limit: self.compute_unit_limit,
                    source: FeeSource::Live,
                }
            }
            None => {
                warn!(fallback = self.default_priority_fee, "No usable prioritization fee samples, using configured default");
                self.fallback()
            }
        }
    }

    /// Nearest-rank percentile over the non-zero samples
    fn percentile_fee(&self, samples: Vec<u64>) -> Option<u64> {
        let mut fees: Vec<u64> = samples.into_iter().filter(|&fee| fee > 0).collect();
        if fees.is_empty() {
            return None;
        }
        fees.sort_unstable();

        // ceil(N * P) - 1 for 0-based indexing, clamped to the valid range
        let len = fees.len();
        let rank = (len * usize::from(self.percentile)).div_ceil(100);
        let index = rank.saturating_sub(1).min(len - 1);
        Some(fees[index])
    }
}
