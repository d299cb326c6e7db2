//! Wallet secrets and signer lookup

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::collections::HashMap;
use zeroize::Zeroizing;

use crate::errors::ChainAccessError;

/// Generate a fresh wallet, returning `(public address, base58 secret)`
///
/// The secret is handed to the caller and not retained here.
pub fn new_wallet() -> (String, String) {
    let keypair = Keypair::new();
    (keypair.pubkey().to_string(), keypair.to_base58_string())
}

/// Decode a base58 keypair secret
///
/// Accepts the 64-byte `secret || public` encoding produced by [`new_wallet`].
/// The decoded bytes are zeroized before returning.
pub fn keypair_from_secret(secret: &str) -> Result<Keypair, ChainAccessError> {
    let bytes = Zeroizing::new(
        bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| ChainAccessError::Signing(format!("secret is not base58: {e}")))?,
    );

    if bytes.len() != 64 {
        return Err(ChainAccessError::Signing(format!(
            "invalid keypair length: expected 64 bytes, got {}",
            bytes.len()
        )));
    }
    if bytes.iter().all(|&b| b == 0) {
        return Err(ChainAccessError::Signing(
            "invalid keypair: all-zero key rejected".to_string(),
        ));
    }

    Keypair::try_from(bytes.as_slice())
        .map_err(|e| ChainAccessError::Signing(format!("invalid keypair bytes: {e}")))
}

/// Explicit mapping from public key to the keypair able to sign for it
///
/// Inserting the same key twice keeps one entry, so a funder that is also the
/// transfer authority signs exactly once.
#[derive(Default)]
pub struct SignerSet<'a> {
    signers: HashMap<Pubkey, &'a Keypair>,
}

impl<'a> SignerSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from keypairs, collapsing duplicates
    pub fn from_keypairs(keypairs: &[&'a Keypair]) -> Self {
        let mut set = Self::new();
        for keypair in keypairs {
            set.insert(keypair);
        }
        set
    }

    /// Register a keypair under its public key
    pub fn insert(&mut self, keypair: &'a Keypair) {
        self.signers.insert(keypair.pubkey(), keypair);
    }

    /// Keypair for `pubkey`, or `None` when this set cannot sign for it
    pub fn lookup(&self, pubkey: &Pubkey) -> Option<&'a Keypair> {
        self.signers.get(pubkey).copied()
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}

impl std::fmt::Debug for SignerSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.signers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_wallet_round_trips() {
        let (address, secret) = new_wallet();
        let keypair = keypair_from_secret(&secret).expect("generated secret decodes");
        assert_eq!(keypair.pubkey().to_string(), address);
    }

    #[test]
    fn test_rejects_malformed_secrets() {
        assert!(matches!(
            keypair_from_secret("0OIl"),
            Err(ChainAccessError::Signing(_))
        ));

        let short = bs58::encode([7u8; 32]).into_string();
        let err = keypair_from_secret(&short).unwrap_err();
        assert!(err.to_string().contains("expected 64 bytes"));

        let zeros = bs58::encode([0u8; 64]).into_string();
        let err = keypair_from_secret(&zeros).unwrap_err();
        assert!(err.to_string().contains("all-zero"));
    }

    #[test]
    fn test_signer_set_collapses_duplicates() {
        let funder = Keypair::new();
        let set = SignerSet::from_keypairs(&[&funder, &funder]);
        assert_eq!(set.len(), 1);
        assert!(set.lookup(&funder.pubkey()).is_some());
    }

    #[test]
    fn test_signer_set_lookup_absent() {
        let funder = Keypair::new();
        let source = Keypair::new();
        let set = SignerSet::from_keypairs(&[&funder, &source]);
        assert_eq!(set.len(), 2);
        assert!(set.lookup(&Pubkey::new_unique()).is_none());
    }
}
