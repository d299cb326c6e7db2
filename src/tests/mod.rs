//! End-to-end scenarios against the scripted RPC backend
//!
//! Shared fixtures live here; each submodule drives `SolanaChainAccess`
//! through its public operations and inspects what reached the mock.

mod facade_tests;
mod transfer_scenarios;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::sync::Arc;

use crate::account::derive_associated_account;
use crate::chain::SolanaChainAccess;
use crate::config::{Secret, SolanaChainConfig};
use crate::test_utils::MockRpc;

pub(crate) const TEST_DECIMALS: u8 = 6;

/// A chain access handle wired to a fresh [`MockRpc`]
pub(crate) struct Fixture {
    pub rpc: MockRpc,
    pub chain: SolanaChainAccess,
    pub funder: Keypair,
    pub mint: Pubkey,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut SolanaChainConfig)) -> Self {
        let funder = Keypair::new();
        let mut config = SolanaChainConfig::new(
            "http://127.0.0.1:8899",
            "ws://127.0.0.1:8900",
            Secret::new(funder.to_base58_string()),
        );
        adjust(&mut config);

        let rpc = MockRpc::new();
        let chain = SolanaChainAccess::with_rpc(config, Arc::new(rpc.clone()))
            .expect("fixture config is valid");
        Self {
            rpc,
            chain,
            funder,
            mint: Pubkey::new_unique(),
        }
    }

    pub fn funder_secret(&self) -> String {
        self.funder.to_base58_string()
    }

    /// Give `owner` a token account for the fixture mint holding `amount`
    pub fn fund_tokens(&self, owner: &Pubkey, amount: u64) -> Pubkey {
        let account = derive_associated_account(owner, &self.mint).unwrap();
        self.rpc.set_token_balance(account, amount);
        account
    }

    /// Mark `owner`'s token account for the fixture mint as existing
    pub fn open_token_account(&self, owner: &Pubkey) -> Pubkey {
        let account = derive_associated_account(owner, &self.mint).unwrap();
        self.rpc.add_account(account);
        account
    }

    /// The one transaction that reached the network, on either path
    pub fn only_submitted(&self) -> Transaction {
        let mut sent = self.rpc.channel_transactions();
        sent.extend(self.rpc.broadcast_transactions());
        assert_eq!(sent.len(), 1, "expected exactly one submission");
        sent.remove(0)
    }
}

/// A fresh wallet and its base58 secret
pub(crate) fn wallet() -> (Keypair, String) {
    let keypair = Keypair::new();
    let secret = keypair.to_base58_string();
    (keypair, secret)
}

/// Program id and data of each instruction, in order
pub(crate) fn decoded(tx: &Transaction) -> Vec<(Pubkey, Vec<u8>)> {
    tx.message
        .instructions
        .iter()
        .map(|ix| {
            (
                tx.message.account_keys[ix.program_id_index as usize],
                ix.data.clone(),
            )
        })
        .collect()
}

pub(crate) fn signer_of(tx: &Transaction, keypair: &Keypair) -> bool {
    let required = tx.message.header.num_required_signatures as usize;
    tx.message.account_keys[..required].contains(&keypair.pubkey())
}
