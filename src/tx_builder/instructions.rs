//! Instruction planning and ordering validation
//!
//! Every transfer transaction has the same layout:
//! 1. Compute unit price (priority fee)
//! 2. Compute unit limit
//! 3. Associated token account creation, when the destination is missing
//! 4. The value movement itself (system transfer or `transfer_checked`)
//!
//! Planning is stateless: callers resolve balances, account existence and
//! fees first, then hand the results in here.

use solana_sdk::{
    compute_budget::{self, ComputeBudgetInstruction},
    instruction::Instruction,
    pubkey::Pubkey,
    system_instruction,
};

use crate::errors::ChainAccessError;
use crate::fees::FeeEstimate;

/// Fungible token identity needed for `transfer_checked`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAsset {
    pub mint: Pubkey,
    pub decimals: u8,
}

/// Ordered instructions for one transaction
#[derive(Debug, Clone)]
pub struct InstructionPlan {
    /// The ordered list of instructions for the transaction
    pub instructions: Vec<Instruction>,

    /// Whether the plan creates the destination associated token account
    pub creates_account: bool,
}

impl InstructionPlan {
    pub fn new(instructions: Vec<Instruction>, creates_account: bool) -> Self {
        Self {
            instructions,
            creates_account,
        }
    }
}

/// Compute budget prefix: price first, then limit
pub fn compute_budget_instructions(fee: &FeeEstimate) -> [Instruction; 2] {
    [
        ComputeBudgetInstruction::set_compute_unit_price(fee.priority_fee),
        ComputeBudgetInstruction::set_compute_unit_limit(fee.compute_unit_limit),
    ]
}

/// Native coin transfer from `from` to `to`
pub fn plan_coin_transfer(from: &Pubkey, to: &Pubkey, lamports: u64, fee: &FeeEstimate) -> InstructionPlan {
    let mut instructions = Vec::with_capacity(3);
    instructions.extend(compute_budget_instructions(fee));
    instructions.push(system_instruction::transfer(from, to, lamports));
    InstructionPlan::new(instructions, false)
}

/// Token transfer between the associated accounts of two wallets
///
/// `funder` pays for the destination account when `destination_exists` is
/// false. The source wallet is the transfer authority.
#[allow(clippy::too_many_arguments)]
pub fn plan_token_transfer(
    funder: &Pubkey,
    source_wallet: &Pubkey,
    source_account: &Pubkey,
    destination_wallet: &Pubkey,
    destination_account: &Pubkey,
    asset: &TokenAsset,
    amount: u64,
    destination_exists: bool,
    fee: &FeeEstimate,
) -> Result<InstructionPlan, ChainAccessError> {
    let mut instructions = Vec::with_capacity(4);
    instructions.extend(compute_budget_instructions(fee));

    if !destination_exists {
        instructions.push(create_account_instruction(funder, destination_wallet, &asset.mint));
    }

    let transfer = spl_token::instruction::transfer_checked(
        &spl_token::id(),
        source_account,
        &asset.mint,
        destination_account,
        source_wallet,
        &[],
        amount,
        asset.decimals,
    )
    .map_err(|e| ChainAccessError::instruction_failed("spl_token", e.to_string()))?;
    instructions.push(transfer);

    Ok(InstructionPlan::new(instructions, !destination_exists))
}

/// Create the associated token account of `owner` for `mint`, paid by `funder`
pub fn plan_create_account(funder: &Pubkey, owner: &Pubkey, mint: &Pubkey, fee: &FeeEstimate) -> InstructionPlan {
    let mut instructions = Vec::with_capacity(3);
    instructions.extend(compute_budget_instructions(fee));
    instructions.push(create_account_instruction(funder, owner, mint));
    InstructionPlan::new(instructions, true)
}

/// Keys that must sign a transaction paid by `funder` and authorized by `authority`
///
/// Collapses to a single key when both are the same wallet.
pub fn required_signers(funder: &Pubkey, authority: &Pubkey) -> Vec<Pubkey> {
    if funder == authority {
        vec![*funder]
    } else {
        vec![*funder, *authority]
    }
}

fn create_account_instruction(funder: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    spl_associated_token_account::instruction::create_associated_token_account(
        funder,
        owner,
        mint,
        &spl_token::id(),
    )
}

// SetComputeUnitLimit = 2, SetComputeUnitPrice = 3
const SET_COMPUTE_UNIT_LIMIT: u8 = 2;
const SET_COMPUTE_UNIT_PRICE: u8 = 3;

fn is_compute_budget(ix: &Instruction, discriminator: u8) -> bool {
    ix.program_id == compute_budget::id() && ix.data.first() == Some(&discriminator)
}

/// Sanity check instruction ordering (debug/test only)
///
/// Validates the layout documented at the top of this module. Compiled out of
/// release builds.
#[cfg(debug_assertions)]
pub fn sanity_check_plan(plan: &InstructionPlan) -> Result<(), ChainAccessError> {
    let invalid = |reason: &str| ChainAccessError::instruction_failed("plan", reason);

    let instructions = &plan.instructions;
    if instructions.len() < 3 {
        return Err(invalid("plan must hold the compute budget prefix and a payload"));
    }
    if !is_compute_budget(&instructions[0], SET_COMPUTE_UNIT_PRICE) {
        return Err(invalid("first instruction must set the compute unit price"));
    }
    if !is_compute_budget(&instructions[1], SET_COMPUTE_UNIT_LIMIT) {
        return Err(invalid("second instruction must set the compute unit limit"));
    }
    if instructions[2..]
        .iter()
        .any(|ix| ix.program_id == compute_budget::id())
    {
        return Err(invalid("compute budget instructions must precede the payload"));
    }

    let creates = instructions[2..]
        .iter()
        .filter(|ix| ix.program_id == spl_associated_token_account::id())
        .count();
    match (plan.creates_account, creates) {
        (true, 1) | (false, 0) => Ok(()),
        (true, _) => Err(invalid("plan must create exactly one associated account")),
        (false, _) => Err(invalid("unexpected associated account creation")),
    }
}

/// Release-mode no-op counterpart of the debug sanity check
#[cfg(not(debug_assertions))]
#[inline(always)]
pub fn sanity_check_plan(_plan: &InstructionPlan) -> Result<(), ChainAccessError> {
    Ok(())
}
