//! Read-side operations and capability surface of the facade

use alloy_primitives::U256;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Signature, Signer},
};

use super::Fixture;
use crate::account::derive_associated_account;
use crate::chain::ChainAccess;
use crate::errors::ChainAccessError;
use crate::rpc::{RpcError, SignatureState};
use crate::wallet::keypair_from_secret;

#[tokio::test]
async fn test_query_coin_and_token() {
    let fx = Fixture::new();
    let owner = Pubkey::new_unique();
    fx.rpc.set_balance(owner, 1_500_000_000);
    let account = fx.fund_tokens(&owner, 42);

    let coin = fx.chain.query_coin(&owner.to_string()).await.unwrap();
    assert_eq!(coin, U256::from(1_500_000_000u64));

    let token = fx
        .chain
        .query_token(&account.to_string(), &fx.mint.to_string())
        .await
        .unwrap();
    assert_eq!(token, U256::from(42u64));
}

#[tokio::test]
async fn test_invalid_address_query_makes_no_rpc_call() {
    let fx = Fixture::new();

    let err = fx.chain.query_coin("0OIl").await.unwrap_err();
    assert!(matches!(err, ChainAccessError::InvalidAddress { .. }));

    let err = fx
        .chain
        .query_token(&Pubkey::new_unique().to_string(), "not-a-mint")
        .await
        .unwrap_err();
    assert!(matches!(err, ChainAccessError::InvalidAddress { .. }));

    assert!(fx.rpc.calls().is_empty());
}

#[tokio::test]
async fn test_confirm_transaction_tri_state() {
    let fx = Fixture::new();
    let unknown = Signature::from([11u8; 64]);
    let processed = Signature::from([12u8; 64]);
    let finalized = Signature::from([13u8; 64]);
    fx.rpc.set_signature_status(
        processed,
        SignatureState {
            confirmed: false,
            failed: false,
        },
    );
    fx.rpc.set_signature_status(
        finalized,
        SignatureState {
            confirmed: true,
            failed: false,
        },
    );

    assert!(!fx.chain.confirm_transaction(&unknown.to_string()).await.unwrap());
    assert!(!fx.chain.confirm_transaction(&processed.to_string()).await.unwrap());
    assert!(fx.chain.confirm_transaction(&finalized.to_string()).await.unwrap());

    fx.rpc.fail_signature_status(RpcError::transport("connection reset"));
    let err = fx
        .chain
        .confirm_transaction(&finalized.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ChainAccessError::Query { .. }));
}

#[tokio::test]
async fn test_confirm_rejects_malformed_id() {
    let fx = Fixture::new();
    let err = fx.chain.confirm_transaction("xyz").await.unwrap_err();
    assert!(matches!(err, ChainAccessError::InvalidSignature { .. }));
    assert!(fx.rpc.calls().is_empty());
}

#[test]
fn test_wallet_and_token_account_are_offline() {
    let fx = Fixture::new();
    let (address, secret) = fx.chain.new_wallet();
    assert_eq!(keypair_from_secret(&secret).unwrap().pubkey().to_string(), address);

    let owner: Pubkey = address.parse().unwrap();
    let found = fx
        .chain
        .find_token_account(&fx.mint.to_string(), &address)
        .unwrap();
    assert_eq!(found, derive_associated_account(&owner, &fx.mint).unwrap().to_string());
    assert!(fx.rpc.calls().is_empty());
}

#[tokio::test]
async fn test_nft_operations_unsupported() {
    let fx = Fixture::new();
    let to = Pubkey::new_unique().to_string();

    let err = fx
        .chain
        .mint_nft(&to, &fx.mint.to_string(), 1, "ipfs://token")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ChainAccessError::Unsupported {
            backend: "solana",
            operation: "mint_nft"
        }
    ));

    let err = fx
        .chain
        .transfer_nft(&fx.funder_secret(), &to, &fx.mint.to_string(), 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ChainAccessError::Unsupported {
            operation: "transfer_nft",
            ..
        }
    ));
    assert!(fx.rpc.calls().is_empty());
}

#[tokio::test]
async fn test_operations_are_counted() {
    let fx = Fixture::new();
    let metrics = fx.chain.metrics();

    let _ = fx.chain.query_coin(&Pubkey::new_unique().to_string()).await;
    let _ = fx.chain.query_coin("bogus").await;

    let text = metrics.encode().unwrap();
    assert!(text.contains("chain_operations_total{operation=\"query_coin\"} 2"));
    assert!(text.contains("chain_errors_total{category=\"address\"} 1"));
}
