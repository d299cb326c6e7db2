//! Conversions between public `U256` amounts and the backend's `u64`
//!
//! Balances come off the chain as `u64` (lamports or raw token units) and are
//! widened losslessly. Transfer amounts travel the other way and are only
//! accepted within `0..=u64::MAX`; anything larger is rejected instead of
//! being truncated.

use alloy_primitives::U256;

use crate::errors::ChainAccessError;

/// Largest amount the backend can represent
pub const MAX_NATIVE_AMOUNT: u64 = u64::MAX;

/// Widen a backend amount; always lossless
pub fn widen(amount: u64) -> U256 {
    U256::from(amount)
}

/// Narrow a public amount to the backend width
pub fn narrow(amount: U256) -> Result<u64, ChainAccessError> {
    if amount > U256::from(MAX_NATIVE_AMOUNT) {
        return Err(ChainAccessError::AmountOverflow {
            amount: amount.to_string(),
            max: MAX_NATIVE_AMOUNT,
        });
    }
    Ok(amount.as_limbs()[0])
}

/// Narrow a transfer amount, rejecting zero
pub fn transfer_amount(amount: U256) -> Result<u64, ChainAccessError> {
    let native = narrow(amount)?;
    if native == 0 {
        return Err(ChainAccessError::InvalidAmount(
            "transfer amount must be greater than zero".to_string(),
        ));
    }
    Ok(native)
}
