//! Chain access operator CLI
//!
//! Thin wrapper exposing every chain access operation from the command line.
//! Configuration comes from a TOML file plus `CHAIN_ACCESS_*` environment
//! overrides (a `.env` file is honored).

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use chain_access::{
    account, build_chain_access, wallet, ChainAccess, ChainConfig, SolanaChainAccess,
    SubmitOptions, SubmitOutcome, U256,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "CHAIN_ACCESS_CONFIG", default_value = "chain.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new wallet, printed as JSON
    NewWallet,

    /// Print the token account of a wallet (no network access)
    FindTokenAccount {
        #[arg(long)]
        mint: String,
        #[arg(long)]
        owner: String,
    },

    /// Create a wallet's token account, paid by the funder
    NewTokenAccount {
        #[arg(long)]
        mint: String,
        #[arg(long)]
        owner: String,
        #[command(flatten)]
        submit: SubmitArgs,
    },

    /// Native balance of an address
    QueryCoin {
        #[arg(long)]
        address: String,
    },

    /// Balance of a token account
    QueryToken {
        /// Token account address
        #[arg(long)]
        address: String,
        #[arg(long)]
        mint: String,
    },

    /// Send native coin
    TransferCoin {
        /// Base58 secret of the sending wallet
        #[arg(long, env = "CHAIN_ACCESS_FROM_SECRET", hide_env_values = true)]
        from_secret: String,
        #[arg(long)]
        to: String,
        /// Amount in lamports
        #[arg(long, value_parser = parse_amount)]
        amount: U256,
        #[command(flatten)]
        submit: SubmitArgs,
    },

    /// Send tokens, creating the destination token account when missing
    TransferToken {
        /// Base58 secret of the sending wallet
        #[arg(long, env = "CHAIN_ACCESS_FROM_SECRET", hide_env_values = true)]
        from_secret: String,
        /// Destination wallet address
        #[arg(long)]
        to: String,
        /// Amount in raw token units
        #[arg(long, value_parser = parse_amount)]
        amount: U256,
        #[arg(long)]
        mint: String,
        #[arg(long)]
        decimals: u8,
        #[command(flatten)]
        submit: SubmitArgs,
    },

    /// Check whether a transaction is confirmed
    Confirm {
        #[arg(long)]
        tx_id: String,
    },
}

#[derive(clap::Args, Debug)]
struct SubmitArgs {
    /// Override the configured confirmation timeout, in seconds
    #[arg(long)]
    confirm_timeout: Option<u64>,
}

fn parse_amount(input: &str) -> std::result::Result<U256, String> {
    U256::from_str_radix(input.trim(), 10).map_err(|e| format!("invalid amount '{input}': {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.json_logs);

    match args.command {
        Command::NewWallet => {
            let (address, secret) = wallet::new_wallet();
            let wallet = serde_json::json!({ "address": address, "secret": secret });
            println!("{}", serde_json::to_string_pretty(&wallet)?);
        }
        Command::FindTokenAccount { mint, owner } => {
            println!("{}", account::find_token_account(&mint, &owner)?);
        }
        Command::QueryCoin { address } => {
            let chain = load_chain(&args.config)?;
            println!("{}", chain.query_coin(&address).await?);
        }
        Command::QueryToken { address, mint } => {
            let chain = load_chain(&args.config)?;
            println!("{}", chain.query_token(&address, &mint).await?);
        }
        Command::Confirm { tx_id } => {
            let chain = load_chain(&args.config)?;
            println!("{}", chain.confirm_transaction(&tx_id).await?);
        }
        Command::NewTokenAccount { mint, owner, submit } => {
            let chain = load_solana(&args.config)?;
            let options = submit_options(&chain, &submit);
            let outcome = chain.new_token_account_with(&mint, &owner, &options).await?;
            report(outcome);
        }
        Command::TransferCoin {
            from_secret,
            to,
            amount,
            submit,
        } => {
            let chain = load_solana(&args.config)?;
            let options = submit_options(&chain, &submit);
            let outcome = chain
                .transfer_coin_with(&from_secret, &to, amount, &options)
                .await?;
            report(outcome);
        }
        Command::TransferToken {
            from_secret,
            to,
            amount,
            mint,
            decimals,
            submit,
        } => {
            let chain = load_solana(&args.config)?;
            let options = submit_options(&chain, &submit);
            let result = chain
                .transfer_token_with(&from_secret, &to, amount, &mint, decimals, &options)
                .await;
            match result {
                Ok(outcome) => report(outcome),
                Err(e) => {
                    if let Some(reason) = e.short_reason() {
                        eprintln!("{reason}");
                    }
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) {
    let env_filter = if verbose {
        "chain_access=debug,info"
    } else {
        "chain_access=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    // Logs go to stderr; stdout carries command output
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(path: &str) -> Result<ChainConfig> {
    let config = ChainConfig::from_file_with_env(path)
        .with_context(|| format!("Failed to load configuration from {path}"))?;
    info!(backend = config.backend(), "Configuration loaded");
    Ok(config)
}

fn load_chain(path: &str) -> Result<Arc<dyn ChainAccess>> {
    let config = load_config(path)?;
    build_chain_access(&config).context("Failed to initialize chain access")
}

fn load_solana(path: &str) -> Result<SolanaChainAccess> {
    match load_config(path)? {
        ChainConfig::Solana(config) => {
            SolanaChainAccess::new(config).context("Failed to initialize Solana chain access")
        }
    }
}

/// Submission options honoring `--confirm-timeout` and Ctrl-C
fn submit_options(chain: &SolanaChainAccess, args: &SubmitArgs) -> SubmitOptions {
    let mut options = chain.default_submit_options();
    if let Some(secs) = args.confirm_timeout {
        options.confirm_timeout = Duration::from_secs(secs);
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning confirmation wait");
            on_signal.cancel();
        }
    });
    options.with_cancel(cancel)
}

fn report(outcome: SubmitOutcome) {
    if !outcome.is_confirmed() {
        warn!("Confirmation not observed; check later with `confirm`");
    }
    println!("{}", outcome.signature());
}
