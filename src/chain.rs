//! Chain access facade
//!
//! [`ChainAccess`] is the capability surface the owning service programs
//! against. [`build_chain_access`] picks the backend from configuration;
//! Solana is the only one today.

use alloy_primitives::U256;
use async_trait::async_trait;
use solana_sdk::signature::{Keypair, Signer};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::account::{self, parse_address};
use crate::config::{ChainConfig, SolanaChainConfig};
use crate::errors::{ChainAccessError, Result};
use crate::fees::{FeeEstimator, FeeSource};
use crate::metrics::{Metrics, Timer};
use crate::query;
use crate::rpc::{ChainRpc, SolanaRpc};
use crate::structured_logging::OperationLogger;
use crate::submit::{submit, SubmitOptions, SubmitOutcome};
use crate::tx_builder::{SignedTransfer, TransferIntent, TxBuilder};
use crate::wallet;

/// Backend-agnostic chain operations
///
/// Amounts are `U256` at this surface; transaction ids are returned as
/// strings in the backend's native encoding.
#[async_trait]
pub trait ChainAccess: Send + Sync {
    /// Short backend name, as used in configuration
    fn backend(&self) -> &'static str;

    /// Generate a wallet, returning `(address, secret)`
    fn new_wallet(&self) -> (String, String);

    /// Create `owner`'s token account for `mint`; returns the transaction id
    async fn new_token_account(&self, mint: &str, owner: &str) -> Result<String>;

    async fn query_coin(&self, address: &str) -> Result<U256>;

    /// Balance of the token account at `address`
    async fn query_token(&self, address: &str, mint: &str) -> Result<U256>;

    async fn transfer_coin(&self, from_secret: &str, to: &str, amount: U256) -> Result<String>;

    async fn transfer_token(
        &self,
        from_secret: &str,
        to: &str,
        amount: U256,
        mint: &str,
        decimals: u8,
    ) -> Result<String>;

    /// Token account of `owner` for `mint`; no network access
    fn find_token_account(&self, mint: &str, owner: &str) -> Result<String>;

    /// `Ok(false)` when the transaction is unknown or not yet confirmed
    async fn confirm_transaction(&self, tx_id: &str) -> Result<bool>;

    async fn mint_nft(&self, _to: &str, _contract: &str, _token_id: u64, _token_uri: &str) -> Result<String> {
        Err(ChainAccessError::unsupported(self.backend(), "mint_nft"))
    }

    async fn transfer_nft(&self, _from_secret: &str, _to: &str, _contract: &str, _token_id: u64) -> Result<String> {
        Err(ChainAccessError::unsupported(self.backend(), "transfer_nft"))
    }
}

/// Construct the chain access handle for `config`
pub fn build_chain_access(config: &ChainConfig) -> Result<Arc<dyn ChainAccess>> {
    match config {
        ChainConfig::Solana(solana) => {
            let access = SolanaChainAccess::new(solana.clone())?;
            info!(endpoint = %solana.endpoint, rate_limit = solana.rate_limit, "Solana chain access ready");
            Ok(Arc::new(access))
        }
    }
}

/// Solana implementation of [`ChainAccess`]
pub struct SolanaChainAccess {
    rpc: Arc<dyn ChainRpc>,
    config: SolanaChainConfig,
    fees: FeeEstimator,
    metrics: Arc<Metrics>,
}

impl SolanaChainAccess {
    pub const BACKEND: &'static str = "solana";

    /// Validate `config` and connect through the production RPC client
    pub fn new(config: SolanaChainConfig) -> Result<Self> {
        let rpc: Arc<dyn ChainRpc> = Arc::new(SolanaRpc::from_config(&config));
        Self::with_rpc(config, rpc)
    }

    /// Use a caller-supplied RPC backend
    pub fn with_rpc(config: SolanaChainConfig, rpc: Arc<dyn ChainRpc>) -> Result<Self> {
        config.validate()?;
        let metrics = Metrics::new()
            .map_err(|e| ChainAccessError::Configuration(format!("metrics registry: {e}")))?;
        Ok(Self {
            rpc,
            fees: FeeEstimator::from_config(&config),
            config,
            metrics: Arc::new(metrics),
        })
    }

    pub fn config(&self) -> &SolanaChainConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Submission options using the configured confirmation timeout
    pub fn default_submit_options(&self) -> SubmitOptions {
        SubmitOptions::new(Duration::from_secs(self.config.confirm_timeout_secs))
    }

    /// [`ChainAccess::transfer_coin`] with explicit submission options
    pub async fn transfer_coin_with(
        &self,
        from_secret: &str,
        to: &str,
        amount: U256,
        options: &SubmitOptions,
    ) -> Result<SubmitOutcome> {
        let logger = self.start("transfer_coin", to);
        let timer = Timer::new();

        let result: Result<SubmitOutcome> = async {
            let source = wallet::keypair_from_secret(from_secret)?;
            let intent = TransferIntent::coin(source.pubkey(), to, amount)?;
            let funder = self.funder()?;
            let signed = self.builder().build_transfer(&funder, &source, &intent).await?;
            self.submit_signed(&logger, &timer, &signed, options).await
        }
        .await;

        self.finish(&logger, &timer, result)
    }

    /// [`ChainAccess::transfer_token`] with explicit submission options
    pub async fn transfer_token_with(
        &self,
        from_secret: &str,
        to: &str,
        amount: U256,
        mint: &str,
        decimals: u8,
        options: &SubmitOptions,
    ) -> Result<SubmitOutcome> {
        let logger = self.start("transfer_token", to);
        let timer = Timer::new();

        let result: Result<SubmitOutcome> = async {
            let source = wallet::keypair_from_secret(from_secret)?;
            let intent = TransferIntent::token(source.pubkey(), to, amount, mint, decimals)?;
            let funder = self.funder()?;
            let signed = self.builder().build_transfer(&funder, &source, &intent).await?;
            self.submit_signed(&logger, &timer, &signed, options).await
        }
        .await;

        self.finish(&logger, &timer, result)
    }

    /// [`ChainAccess::new_token_account`] with explicit submission options
    pub async fn new_token_account_with(&self, mint: &str, owner: &str, options: &SubmitOptions) -> Result<SubmitOutcome> {
        let logger = self.start("new_token_account", owner);
        let timer = Timer::new();

        let result: Result<SubmitOutcome> = async {
            let owner = parse_address(owner)?;
            let mint = parse_address(mint)?;
            let funder = self.funder()?;
            let signed = self
                .builder()
                .build_create_account(&funder, &owner, &mint)
                .await?;
            self.submit_signed(&logger, &timer, &signed, options).await
        }
        .await;

        self.finish(&logger, &timer, result)
    }

    fn builder(&self) -> TxBuilder<'_> {
        TxBuilder::new(self.rpc.as_ref(), &self.fees)
    }

    /// Decoded per call and dropped when the call ends
    fn funder(&self) -> Result<Keypair> {
        wallet::keypair_from_secret(self.config.funder.expose())
    }

    fn start(&self, operation: &'static str, detail: &str) -> OperationLogger {
        self.metrics.record_operation(operation);
        let logger = OperationLogger::new(operation);
        logger.log_start(detail);
        logger
    }

    async fn submit_signed(
        &self,
        logger: &OperationLogger,
        timer: &Timer,
        signed: &SignedTransfer,
        options: &SubmitOptions,
    ) -> Result<SubmitOutcome> {
        timer.observe_duration(&self.metrics.build_latency);
        if signed.fee().source == FeeSource::Fallback {
            self.metrics.fee_fallback_total.inc();
        }
        logger.log_built(
            &signed.signature().to_string(),
            signed.creates_account(),
            signed.fee().priority_fee,
            timer.elapsed_ms(),
        );

        let submit_timer = Timer::new();
        let outcome = submit(self.rpc.as_ref(), signed, options).await?;
        submit_timer.observe_duration(&self.metrics.submit_latency);

        match outcome {
            SubmitOutcome::Confirmed(_) => self.metrics.submissions_confirmed.inc(),
            SubmitOutcome::Broadcast(_) => {
                self.metrics.submissions_broadcast.inc();
                logger.warn("confirmation not observed, transaction broadcast only");
            }
        }
        if signed.creates_account() {
            self.metrics.token_accounts_created.inc();
        }
        logger.log_submitted(
            &outcome.signature().to_string(),
            outcome.is_confirmed(),
            timer.elapsed_ms(),
        );
        Ok(outcome)
    }

    fn finish<T>(&self, logger: &OperationLogger, timer: &Timer, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.metrics.record_error(e.category());
            logger.log_failure(e.category(), &e.to_string(), timer.elapsed_ms());
        }
        result
    }
}

impl std::fmt::Debug for SolanaChainAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaChainAccess")
            .field("config", &self.config)
            .field("fees", &self.fees)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChainAccess for SolanaChainAccess {
    fn backend(&self) -> &'static str {
        Self::BACKEND
    }

    fn new_wallet(&self) -> (String, String) {
        wallet::new_wallet()
    }

    async fn new_token_account(&self, mint: &str, owner: &str) -> Result<String> {
        let options = self.default_submit_options();
        self.new_token_account_with(mint, owner, &options)
            .await
            .map(|outcome| outcome.signature().to_string())
    }

    async fn query_coin(&self, address: &str) -> Result<U256> {
        let logger = self.start("query_coin", address);
        let timer = Timer::new();
        let result = query::query_coin(self.rpc.as_ref(), address).await;
        self.finish(&logger, &timer, result)
    }

    async fn query_token(&self, address: &str, mint: &str) -> Result<U256> {
        let logger = self.start("query_token", address);
        let timer = Timer::new();
        let result = query::query_token(self.rpc.as_ref(), address, mint).await;
        self.finish(&logger, &timer, result)
    }

    async fn transfer_coin(&self, from_secret: &str, to: &str, amount: U256) -> Result<String> {
        let options = self.default_submit_options();
        self.transfer_coin_with(from_secret, to, amount, &options)
            .await
            .map(|outcome| outcome.signature().to_string())
    }

    async fn transfer_token(
        &self,
        from_secret: &str,
        to: &str,
        amount: U256,
        mint: &str,
        decimals: u8,
    ) -> Result<String> {
        let options = self.default_submit_options();
        self.transfer_token_with(from_secret, to, amount, mint, decimals, &options)
            .await
            .map(|outcome| outcome.signature().to_string())
    }

    fn find_token_account(&self, mint: &str, owner: &str) -> Result<String> {
        account::find_token_account(mint, owner)
    }

    async fn confirm_transaction(&self, tx_id: &str) -> Result<bool> {
        let logger = self.start("confirm_transaction", tx_id);
        let timer = Timer::new();
        let result = query::confirm_transaction(self.rpc.as_ref(), tx_id).await;
        self.finish(&logger, &timer, result)
    }
}
