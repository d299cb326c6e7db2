//! Core transaction building pipeline
//!
//! [`TxBuilder`] turns a transfer intent into a [`SignedTransfer`]:
//! pre-flight checks, fee estimation, instruction planning, recent blockhash
//! and signing. Nothing is sent from here.

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use tracing::{debug, instrument};

use crate::account::derive_associated_account;
use crate::errors::{ChainAccessError, Result};
use crate::fees::FeeEstimator;
use crate::rpc::ChainRpc;
use crate::tx_builder::instructions::{
    plan_coin_transfer, plan_create_account, plan_token_transfer, required_signers, sanity_check_plan,
    InstructionPlan, TokenAsset,
};
use crate::tx_builder::intent::TransferIntent;
use crate::tx_builder::output::SignedTransfer;
use crate::wallet::SignerSet;

/// Builds signed transactions against one RPC backend
pub struct TxBuilder<'a> {
    rpc: &'a dyn ChainRpc,
    fees: &'a FeeEstimator,
}

impl<'a> TxBuilder<'a> {
    pub fn new(rpc: &'a dyn ChainRpc, fees: &'a FeeEstimator) -> Self {
        Self { rpc, fees }
    }

    /// Build the transaction for `intent`, paid by `funder` and authorized by `source`
    pub async fn build_transfer(&self, funder: &Keypair, source: &Keypair, intent: &TransferIntent) -> Result<SignedTransfer> {
        if intent.source != source.pubkey() {
            return Err(ChainAccessError::Signing(format!(
                "intent source {} does not match the supplied keypair",
                intent.source
            )));
        }
        ensure_positive(intent.amount)?;

        match &intent.asset {
            None => self.build_coin_transfer(funder, source, &intent.destination, intent.amount).await,
            Some(asset) => {
                self.build_token_transfer(funder, source, &intent.destination, asset, intent.amount)
                    .await
            }
        }
    }

    #[instrument(skip_all, fields(from = %source.pubkey(), to = %to, lamports = lamports))]
    async fn build_coin_transfer(&self, funder: &Keypair, source: &Keypair, to: &Pubkey, lamports: u64) -> Result<SignedTransfer> {
        let from = source.pubkey();
        let funder_key = funder.pubkey();
        let fee = self.fees.estimate(self.rpc, &[from, *to]).await;
        let plan = plan_coin_transfer(&from, to, lamports, &fee);
        sanity_check_plan(&plan)?;

        let signers = SignerSet::from_keypairs(&[funder, source]);
        let tx = self.assemble(&plan, &funder_key, &signers).await?;
        let signed = SignedTransfer::new(tx, plan.creates_account, fee);
        debug_assert_eq!(signed.required_signers(), required_signers(&funder_key, &source.pubkey()));
        Ok(signed)
    }

    /// Token transfer from `source`'s associated account to `destination`'s
    ///
    /// The source balance is checked before any instruction is built. A
    /// missing destination account is created in the same transaction, paid
    /// for by `funder`.
    #[instrument(skip_all, fields(source = %source.pubkey(), destination = %destination, mint = %asset.mint, amount = amount))]
    async fn build_token_transfer(
        &self,
        funder: &Keypair,
        source: &Keypair,
        destination: &Pubkey,
        asset: &TokenAsset,
        amount: u64,
    ) -> Result<SignedTransfer> {
        let source_wallet = source.pubkey();
        let source_account = derive_associated_account(&source_wallet, &asset.mint)?;
        self.check_token_balance(&source_account, amount).await?;

        let destination_account = derive_associated_account(destination, &asset.mint)?;
        let destination_exists = self
            .rpc
            .account_exists(&destination_account)
            .await
            .map_err(|e| ChainAccessError::query("account_exists", e))?;
        debug!(%destination_account, destination_exists, "Resolved destination token account");

        let fee = self
            .fees
            .estimate(self.rpc, &[source_account, destination_account])
            .await;

        let funder_key = funder.pubkey();
        let plan = plan_token_transfer(
            &funder_key,
            &source_wallet,
            &source_account,
            destination,
            &destination_account,
            asset,
            amount,
            destination_exists,
            &fee,
        )?;
        sanity_check_plan(&plan)?;

        let signers = SignerSet::from_keypairs(&[funder, source]);
        let tx = self.assemble(&plan, &funder_key, &signers).await?;
        let signed = SignedTransfer::new(tx, plan.creates_account, fee);
        debug_assert_eq!(signed.required_signers(), required_signers(&funder_key, &source.pubkey()));
        Ok(signed)
    }

    /// Create the associated token account of `owner` for `mint`
    #[instrument(skip_all, fields(owner = %owner, mint = %mint))]
    pub async fn build_create_account(&self, funder: &Keypair, owner: &Pubkey, mint: &Pubkey) -> Result<SignedTransfer> {
        let account = derive_associated_account(owner, mint)?;
        let funder_key = funder.pubkey();

        let fee = self.fees.estimate(self.rpc, &[funder_key, account]).await;
        let plan = plan_create_account(&funder_key, owner, mint, &fee);
        sanity_check_plan(&plan)?;

        let signers = SignerSet::from_keypairs(&[funder]);
        let tx = self.assemble(&plan, &funder_key, &signers).await?;
        Ok(SignedTransfer::new(tx, plan.creates_account, fee))
    }

    async fn check_token_balance(&self, account: &Pubkey, required: u64) -> Result<()> {
        let available = self
            .rpc
            .token_balance(account)
            .await
            .map_err(|source| ChainAccessError::BalanceUnavailable {
                account: account.to_string(),
                source,
            })?;

        if available < required {
            return Err(ChainAccessError::InsufficientFunds { required, available });
        }
        debug!(%account, available, required, "Token balance pre-check passed");
        Ok(())
    }

    /// Attach a fresh blockhash and sign with every key the message requires
    async fn assemble(&self, plan: &InstructionPlan, payer: &Pubkey, signers: &SignerSet<'_>) -> Result<Transaction> {
        let blockhash = self
            .rpc
            .latest_blockhash()
            .await
            .map_err(ChainAccessError::RecencyFetch)?;

        let mut tx = Transaction::new_with_payer(&plan.instructions, Some(payer));

        let keypairs: Vec<&Keypair> = tx
            .message
            .signer_keys()
            .into_iter()
            .map(|key| {
                signers.lookup(key).ok_or_else(|| {
                    ChainAccessError::Signing(format!("no signer available for required key {key}"))
                })
            })
            .collect::<Result<_>>()?;

        tx.try_sign(keypairs.as_slice(), blockhash)
            .map_err(|e| ChainAccessError::Signing(e.to_string()))?;

        debug!(
            signatures = tx.signatures.len(),
            instructions = plan.instructions.len(),
            %blockhash,
            "Transaction signed"
        );
        Ok(tx)
    }
}

fn ensure_positive(amount: u64) -> Result<()> {
    if amount == 0 {
        return Err(ChainAccessError::InvalidAmount(
            "transfer amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
