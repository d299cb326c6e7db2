//! Address parsing and associated token account derivation
//!
//! Everything here is pure: no RPC calls are made, so invalid input is
//! rejected before the network is touched.

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::str::FromStr;

use crate::errors::ChainAccessError;

/// Parse a base58 address into a [`Pubkey`]
pub fn parse_address(input: &str) -> Result<Pubkey, ChainAccessError> {
    Pubkey::from_str(input).map_err(|e| ChainAccessError::invalid_address(input, e))
}

/// Parse a base58 transaction identifier
pub fn parse_signature(input: &str) -> Result<Signature, ChainAccessError> {
    Signature::from_str(input).map_err(|e| ChainAccessError::InvalidSignature {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Derive the associated token account of `wallet` for `mint`
///
/// Deterministic: the same pair always yields the same address.
pub fn derive_associated_account(wallet: &Pubkey, mint: &Pubkey) -> Result<Pubkey, ChainAccessError> {
    let token_program = spl_token::id();
    Pubkey::try_find_program_address(
        &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
        &spl_associated_token_account::id(),
    )
    .map(|(address, _bump)| address)
    .ok_or_else(|| ChainAccessError::Derivation {
        wallet: wallet.to_string(),
        mint: mint.to_string(),
    })
}

/// String-level variant of [`derive_associated_account`]
pub fn find_token_account(mint: &str, owner: &str) -> Result<String, ChainAccessError> {
    let owner = parse_address(owner)?;
    let mint = parse_address(mint)?;
    derive_associated_account(&owner, &mint).map(|address| address.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use spl_associated_token_account::get_associated_token_address;

    const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    #[test]
    fn test_parse_address_rejects_garbage() {
        for input in ["", "not-an-address", "0OIl0OIl", "11111111111111111111111111111111111111111111111"] {
            assert!(
                matches!(parse_address(input), Err(ChainAccessError::InvalidAddress { .. })),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_known_mint() {
        let mint = parse_address(USDC_MINT).expect("valid mint");
        assert_eq!(mint.to_string(), USDC_MINT);
    }

    #[test]
    fn test_derivation_matches_spl_helper() {
        let wallet = Pubkey::new_unique();
        let mint = parse_address(USDC_MINT).unwrap();
        let derived = derive_associated_account(&wallet, &mint).expect("derivable");
        assert_eq!(derived, get_associated_token_address(&wallet, &mint));
    }

    #[test]
    fn test_find_token_account_validates_both_inputs() {
        let owner = Pubkey::new_unique().to_string();
        assert!(matches!(
            find_token_account("bogus", &owner),
            Err(ChainAccessError::InvalidAddress { .. })
        ));
        assert!(matches!(
            find_token_account(USDC_MINT, "bogus"),
            Err(ChainAccessError::InvalidAddress { .. })
        ));
        assert!(find_token_account(USDC_MINT, &owner).is_ok());
    }

    #[test]
    fn test_parse_signature() {
        let signature = Signature::from([9u8; 64]);
        assert_eq!(parse_signature(&signature.to_string()).unwrap(), signature);
        assert!(matches!(
            parse_signature("abc"),
            Err(ChainAccessError::InvalidSignature { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_address_round_trip(bytes in prop::array::uniform32(any::<u8>())) {
            let encoded = Pubkey::new_from_array(bytes).to_string();
            let decoded = parse_address(&encoded).unwrap();
            prop_assert_eq!(decoded.to_string(), encoded);
        }

        #[test]
        fn prop_derivation_is_deterministic(
            wallet in prop::array::uniform32(any::<u8>()),
            mint in prop::array::uniform32(any::<u8>()),
        ) {
            let wallet = Pubkey::new_from_array(wallet);
            let mint = Pubkey::new_from_array(mint);
            let first = derive_associated_account(&wallet, &mint).unwrap();
            let second = derive_associated_account(&wallet, &mint).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
