//! Transaction construction
//!
//! ## Architecture
//!
//! - **intent**: validated transfer requests
//! - **instructions**: stateless instruction planning and ordering validation
//! - **builder**: pre-flight checks, fee estimation, blockhash and signing
//! - **output**: the immutable signed transaction handed to submission
//!
//! ## Transaction layout
//!
//! Compute unit price, compute unit limit, optional associated token account
//! creation, then the transfer itself. The funder pays fees; for token
//! transfers the source wallet is the transfer authority. When both are the
//! same wallet it signs once.

mod builder;
mod instructions;
mod intent;
mod output;

pub use builder::TxBuilder;
pub use instructions::{
    compute_budget_instructions, plan_coin_transfer, plan_create_account, plan_token_transfer,
    required_signers, sanity_check_plan, InstructionPlan, TokenAsset,
};
pub use intent::TransferIntent;
pub use output::SignedTransfer;
