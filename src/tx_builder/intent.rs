//! Validated transfer requests

use alloy_primitives::U256;
use solana_sdk::pubkey::Pubkey;

use crate::account::parse_address;
use crate::amount::transfer_amount;
use crate::errors::Result;
use crate::tx_builder::instructions::TokenAsset;

/// A transfer request whose addresses and amount have already been checked
///
/// `asset` is `None` for the native coin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIntent {
    pub source: Pubkey,
    pub destination: Pubkey,
    pub amount: u64,
    pub asset: Option<TokenAsset>,
}

impl TransferIntent {
    pub fn coin(source: Pubkey, destination: &str, amount: U256) -> Result<Self> {
        Ok(Self {
            source,
            destination: parse_address(destination)?,
            amount: transfer_amount(amount)?,
            asset: None,
        })
    }

    pub fn token(source: Pubkey, destination: &str, amount: U256, mint: &str, decimals: u8) -> Result<Self> {
        let destination = parse_address(destination)?;
        let mint = parse_address(mint)?;
        Ok(Self {
            source,
            destination,
            amount: transfer_amount(amount)?,
            asset: Some(TokenAsset { mint, decimals }),
        })
    }
}
