//! Read-only chain queries
//!
//! Balances are returned widened to `U256`. Confirmation is a tri-state
//! collapsed to `bool`: unknown or not yet confirmed is `Ok(false)`, a
//! transport failure is an error.

use alloy_primitives::U256;
use tracing::{debug, warn};

use crate::account::{parse_address, parse_signature};
use crate::amount::widen;
use crate::errors::{ChainAccessError, Result};
use crate::rpc::ChainRpc;

/// Native balance of `address`
pub async fn query_coin(rpc: &dyn ChainRpc, address: &str) -> Result<U256> {
    let address = parse_address(address)?;
    let lamports = rpc
        .balance(&address)
        .await
        .map_err(|e| ChainAccessError::query("get_balance", e))?;
    Ok(widen(lamports))
}

/// Raw balance of the token account at `token_account`
///
/// `mint` is validated but not cross-checked against the account; callers
/// holding only a wallet address resolve the account with
/// [`find_token_account`](crate::account::find_token_account) first.
pub async fn query_token(rpc: &dyn ChainRpc, token_account: &str, mint: &str) -> Result<U256> {
    let account = parse_address(token_account)?;
    parse_address(mint)?;
    let amount = rpc
        .token_balance(&account)
        .await
        .map_err(|e| ChainAccessError::query("get_token_account_balance", e))?;
    Ok(widen(amount))
}

/// Whether `tx_id` has reached confirmed commitment
///
/// A transaction that landed with an execution error still counts as
/// confirmed; the failure is logged.
pub async fn confirm_transaction(rpc: &dyn ChainRpc, tx_id: &str) -> Result<bool> {
    let signature = parse_signature(tx_id)?;
    let status = rpc
        .signature_status(&signature)
        .await
        .map_err(|e| ChainAccessError::query("get_signature_statuses", e))?;

    match status {
        None => {
            debug!(%signature, "Signature unknown to the node");
            Ok(false)
        }
        Some(state) if !state.confirmed => {
            debug!(%signature, "Signature seen but not yet confirmed");
            Ok(false)
        }
        Some(state) => {
            if state.failed {
                warn!(%signature, "Transaction confirmed with an execution error");
            }
            Ok(true)
        }
    }
}
