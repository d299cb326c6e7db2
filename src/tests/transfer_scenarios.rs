//! Token and coin transfer scenarios
//!
//! - Instruction layout with and without destination account creation
//! - Pre-flight balance failures never reach submission
//! - Signer collapse when the funder is the source wallet
//! - Live and fallback fee pricing

use alloy_primitives::U256;
use solana_sdk::{
    compute_budget, pubkey::Pubkey, signature::Signer, system_program,
};

use super::{decoded, signer_of, wallet, Fixture, TEST_DECIMALS};
use crate::chain::ChainAccess;
use crate::errors::ChainAccessError;
use crate::rpc::RpcError;

const SET_COMPUTE_UNIT_LIMIT: u8 = 2;
const SET_COMPUTE_UNIT_PRICE: u8 = 3;
const TRANSFER_CHECKED: u8 = 12;

#[tokio::test]
async fn test_token_transfer_creates_missing_destination() {
    let fx = Fixture::new();
    let (source, source_secret) = wallet();
    let destination = Pubkey::new_unique();
    fx.fund_tokens(&source.pubkey(), 150);

    let signature = fx
        .chain
        .transfer_token(
            &source_secret,
            &destination.to_string(),
            U256::from(100u64),
            &fx.mint.to_string(),
            TEST_DECIMALS,
        )
        .await
        .expect("transfer succeeds");

    let tx = fx.only_submitted();
    assert_eq!(signature, tx.signatures[0].to_string());

    let ixs = decoded(&tx);
    assert_eq!(ixs.len(), 4);
    assert_eq!(ixs[0].0, compute_budget::id());
    assert_eq!(ixs[0].1[0], SET_COMPUTE_UNIT_PRICE);
    assert_eq!(ixs[1].0, compute_budget::id());
    assert_eq!(ixs[1].1[0], SET_COMPUTE_UNIT_LIMIT);
    assert_eq!(ixs[2].0, spl_associated_token_account::id());
    assert_eq!(ixs[3].0, spl_token::id());
    assert_eq!(ixs[3].1[0], TRANSFER_CHECKED);
    assert_eq!(&ixs[3].1[1..9], &100u64.to_le_bytes());
    assert_eq!(ixs[3].1[9], TEST_DECIMALS);

    // Funder pays, source authorizes
    assert_eq!(tx.message.account_keys[0], fx.funder.pubkey());
    assert!(signer_of(&tx, &source));
    assert_eq!(tx.message.header.num_required_signatures, 2);
    assert!(tx.verify().is_ok());

    assert_eq!(fx.chain.metrics().token_accounts_created.get(), 1);
}

#[tokio::test]
async fn test_token_transfer_skips_creation_when_destination_exists() {
    let fx = Fixture::new();
    let (source, source_secret) = wallet();
    let destination = Pubkey::new_unique();
    fx.fund_tokens(&source.pubkey(), 150);
    fx.open_token_account(&destination);

    fx.chain
        .transfer_token(
            &source_secret,
            &destination.to_string(),
            U256::from(100u64),
            &fx.mint.to_string(),
            TEST_DECIMALS,
        )
        .await
        .unwrap();

    let ixs = decoded(&fx.only_submitted());
    assert_eq!(ixs.len(), 3);
    assert!(ixs
        .iter()
        .all(|(program, _)| *program != spl_associated_token_account::id()));
    assert_eq!(fx.chain.metrics().token_accounts_created.get(), 0);
}

#[tokio::test]
async fn test_insufficient_tokens_never_submit() {
    let fx = Fixture::new();
    let (source, source_secret) = wallet();
    fx.fund_tokens(&source.pubkey(), 50);

    let err = fx
        .chain
        .transfer_token(
            &source_secret,
            &Pubkey::new_unique().to_string(),
            U256::from(100u64),
            &fx.mint.to_string(),
            TEST_DECIMALS,
        )
        .await
        .unwrap_err();

    match &err {
        ChainAccessError::InsufficientFunds { required, available } => {
            assert_eq!(*required, 100);
            assert_eq!(*available, 50);
        }
        other => panic!("Expected InsufficientFunds, got {other:?}"),
    }
    assert_eq!(err.short_reason(), Some("insufficient token"));
    assert_eq!(fx.rpc.submitted_count(), 0);
    assert_eq!(fx.rpc.blockhash_requests(), 0);
    assert!(!fx.rpc.calls().contains(&"open_confirmation_channel"));
    assert_eq!(
        fx.chain
            .metrics()
            .errors_total
            .with_label_values(&["insufficient_funds"])
            .get(),
        1
    );
}

#[tokio::test]
async fn test_missing_source_account_is_balance_unavailable() {
    let fx = Fixture::new();
    let (_, source_secret) = wallet();

    let err = fx
        .chain
        .transfer_token(
            &source_secret,
            &Pubkey::new_unique().to_string(),
            U256::from(1u64),
            &fx.mint.to_string(),
            TEST_DECIMALS,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ChainAccessError::BalanceUnavailable { .. }));
    assert_eq!(err.short_reason(), Some("cannot get from account balance"));
    assert_eq!(fx.rpc.submitted_count(), 0);
}

#[tokio::test]
async fn test_funder_as_source_signs_once() {
    let fx = Fixture::new();
    fx.fund_tokens(&fx.funder.pubkey(), 1_000);

    fx.chain
        .transfer_token(
            &fx.funder_secret(),
            &Pubkey::new_unique().to_string(),
            U256::from(10u64),
            &fx.mint.to_string(),
            TEST_DECIMALS,
        )
        .await
        .unwrap();

    let tx = fx.only_submitted();
    assert_eq!(tx.message.header.num_required_signatures, 1);
    assert_eq!(tx.signatures.len(), 1);
    assert!(tx.verify().is_ok());
}

#[tokio::test]
async fn test_amount_overflow_rejected_before_network() {
    let fx = Fixture::new();
    let (_, source_secret) = wallet();
    let too_big = U256::from(u64::MAX) + U256::from(1u64);

    let err = fx
        .chain
        .transfer_token(
            &source_secret,
            &Pubkey::new_unique().to_string(),
            too_big,
            &fx.mint.to_string(),
            TEST_DECIMALS,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ChainAccessError::AmountOverflow { .. }));
    assert!(fx.rpc.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_destination_rejected_before_network() {
    let fx = Fixture::new();
    let (_, source_secret) = wallet();

    let err = fx
        .chain
        .transfer_coin(&source_secret, "definitely-not-base58!", U256::from(1u64))
        .await
        .unwrap_err();

    assert!(matches!(err, ChainAccessError::InvalidAddress { .. }));
    assert!(fx.rpc.calls().is_empty());
}

#[tokio::test]
async fn test_coin_transfer() {
    let fx = Fixture::new();
    let (source, source_secret) = wallet();
    let destination = Pubkey::new_unique();

    let signature = fx
        .chain
        .transfer_coin(&source_secret, &destination.to_string(), U256::from(2_500u64))
        .await
        .unwrap();

    let tx = fx.only_submitted();
    assert_eq!(signature, tx.signatures[0].to_string());
    assert_eq!(tx.message.account_keys[0], fx.funder.pubkey());
    assert!(signer_of(&tx, &source));

    let ixs = decoded(&tx);
    assert_eq!(ixs.len(), 3);
    assert_eq!(ixs[2].0, system_program::id());
    // SystemInstruction::Transfer = 2 (u32), then lamports
    assert_eq!(&ixs[2].1[0..4], &2u32.to_le_bytes());
    assert_eq!(&ixs[2].1[4..12], &2_500u64.to_le_bytes());
}

#[tokio::test]
async fn test_live_fee_is_priced_into_transaction() {
    let fx = Fixture::new();
    fx.rpc.set_prioritization_fees(vec![1_000, 2_000, 3_000, 4_000]);
    let (_, source_secret) = wallet();

    fx.chain
        .transfer_coin(&source_secret, &Pubkey::new_unique().to_string(), U256::from(1u64))
        .await
        .unwrap();

    let ixs = decoded(&fx.only_submitted());
    assert_eq!(&ixs[0].1[1..9], &3_000u64.to_le_bytes());
    assert_eq!(fx.chain.metrics().fee_fallback_total.get(), 0);
}

#[tokio::test]
async fn test_fee_fallback_uses_configured_default() {
    let fx = Fixture::with_config(|config| {
        config.default_priority_fee = 7_777;
        config.compute_unit_limit = 123_456;
    });
    fx.rpc.fail_fee_query(RpcError::transport("method not found"));
    let (_, source_secret) = wallet();

    fx.chain
        .transfer_coin(&source_secret, &Pubkey::new_unique().to_string(), U256::from(1u64))
        .await
        .unwrap();

    let ixs = decoded(&fx.only_submitted());
    assert_eq!(&ixs[0].1[1..9], &7_777u64.to_le_bytes());
    assert_eq!(&ixs[1].1[1..5], &123_456u32.to_le_bytes());
    assert_eq!(fx.chain.metrics().fee_fallback_total.get(), 1);
}

#[tokio::test]
async fn test_new_token_account() {
    let fx = Fixture::new();
    let owner = Pubkey::new_unique();

    let signature = fx
        .chain
        .new_token_account(&fx.mint.to_string(), &owner.to_string())
        .await
        .unwrap();

    let tx = fx.only_submitted();
    assert_eq!(signature, tx.signatures[0].to_string());
    assert_eq!(tx.message.header.num_required_signatures, 1);

    let ixs = decoded(&tx);
    assert_eq!(ixs.len(), 3);
    assert_eq!(ixs[2].0, spl_associated_token_account::id());
    assert_eq!(fx.chain.metrics().token_accounts_created.get(), 1);
}

#[tokio::test]
async fn test_each_transaction_fetches_fresh_blockhash() {
    let fx = Fixture::new();
    let (_, source_secret) = wallet();
    let to = Pubkey::new_unique().to_string();

    for _ in 0..3 {
        fx.chain
            .transfer_coin(&source_secret, &to, U256::from(1u64))
            .await
            .unwrap();
    }
    assert_eq!(fx.rpc.blockhash_requests(), 3);
}
