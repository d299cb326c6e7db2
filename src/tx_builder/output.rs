//! Signed transaction ready for submission
//!
//! [`SignedTransfer`] is the only thing the submission pipeline accepts. It is
//! produced fully signed by the builder and never mutated afterwards, so the
//! same bytes go out on both the confirm path and the broadcast fallback.

use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};

use crate::fees::FeeEstimate;

/// Fully signed transaction plus the metadata gathered while building it
///
/// # Invariants
///
/// 1. Every key in `required_signers` has a signature in `tx`
/// 2. `signature()` equals the fee payer's signature, which is the id the
///    chain reports the transaction under
/// 3. Immutable after construction
#[derive(Debug, Clone)]
pub struct SignedTransfer {
    tx: Transaction,

    /// Extracted from message.header.num_required_signatures
    required_signers: Vec<Pubkey>,

    creates_account: bool,

    fee: FeeEstimate,
}

impl SignedTransfer {
    /// Wrap a signed transaction
    ///
    /// Required signers are extracted from the message header.
    pub(crate) fn new(tx: Transaction, creates_account: bool, fee: FeeEstimate) -> Self {
        let required_signers = tx.message.signer_keys().into_iter().copied().collect();
        Self {
            tx,
            required_signers,
            creates_account,
            fee,
        }
    }

    /// Fee payer signature, used as the transaction id
    pub fn signature(&self) -> Signature {
        self.tx.signatures.first().copied().unwrap_or_default()
    }

    pub fn required_signers(&self) -> &[Pubkey] {
        &self.required_signers
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// Whether the transaction creates an associated token account
    pub fn creates_account(&self) -> bool {
        self.creates_account
    }

    /// The fee parameters baked into the compute budget instructions
    pub fn fee(&self) -> &FeeEstimate {
        &self.fee
    }
}
