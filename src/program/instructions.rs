//! Instruction builders for the zo margin program.
//!
//! Each builder returns a single [`Instruction`]; batching into transactions
//! happens in the trading layer.

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::program::constants::{instruction, TOKEN_PROGRAM_ID};
use crate::program::types::{
    CancelTarget, DepositParams, DexMarketAccounts, MarginAccounts, PlacePerpOrderParams,
    WithdrawParams,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Create an account meta for a read-only signer.
fn signer(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new_readonly(pubkey, true)
}

/// Create an account meta for a writable account.
fn writable(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new(pubkey, false)
}

/// Create an account meta for a read-only account.
fn readonly(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new_readonly(pubkey, false)
}

// ============================================================================
// Instruction Builders
// ============================================================================

/// Build Deposit instruction.
///
/// Accounts:
/// 0. state (readonly)
/// 1. state_signer (readonly)
/// 2. cache (mut)
/// 3. authority (signer)
/// 4. margin (mut)
/// 5. token_account (mut) - authority's token account
/// 6. vault (mut)
/// 7. token_program (readonly)
pub fn build_deposit_ix(
    accounts: &MarginAccounts,
    params: &DepositParams,
    program_id: &Pubkey,
) -> Instruction {
    let keys = vec![
        readonly(accounts.state),
        readonly(accounts.state_signer),
        writable(accounts.cache),
        signer(accounts.authority),
        writable(accounts.margin),
        writable(params.token_account),
        writable(params.vault),
        readonly(*TOKEN_PROGRAM_ID),
    ];

    // Data: [discriminator(8), repay_only(1), amount(8)]
    let mut data = Vec::with_capacity(17);
    data.extend_from_slice(&instruction::DEPOSIT);
    data.push(params.repay_only as u8);
    data.extend_from_slice(&params.amount.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: keys,
        data,
    }
}

/// Build Withdraw instruction.
///
/// Accounts:
/// 0. state (mut)
/// 1. state_signer (readonly)
/// 2. cache (mut)
/// 3. authority (signer)
/// 4. margin (mut)
/// 5. control (mut)
/// 6. token_account (mut)
/// 7. vault (mut)
/// 8. token_program (readonly)
pub fn build_withdraw_ix(
    accounts: &MarginAccounts,
    params: &WithdrawParams,
    program_id: &Pubkey,
) -> Instruction {
    let keys = vec![
        writable(accounts.state),
        readonly(accounts.state_signer),
        writable(accounts.cache),
        signer(accounts.authority),
        writable(accounts.margin),
        writable(accounts.control),
        writable(params.token_account),
        writable(params.vault),
        readonly(*TOKEN_PROGRAM_ID),
    ];

    // Data: [discriminator(8), allow_borrow(1), amount(8)]
    let mut data = Vec::with_capacity(17);
    data.extend_from_slice(&instruction::WITHDRAW);
    data.push(params.allow_borrow as u8);
    data.extend_from_slice(&params.amount.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: keys,
        data,
    }
}

/// Build PlacePerpOrder instruction.
///
/// Accounts:
/// 0. state (readonly)
/// 1. state_signer (mut)
/// 2. cache (mut)
/// 3. authority (signer)
/// 4. margin (mut)
/// 5. control (mut)
/// 6. dex_market (mut)
/// 7. bids (mut)
/// 8. asks (mut)
/// 9. dex_program (readonly)
pub fn build_place_perp_order_ix(
    accounts: &MarginAccounts,
    dex: &DexMarketAccounts,
    params: &PlacePerpOrderParams,
    program_id: &Pubkey,
) -> Instruction {
    let keys = vec![
        readonly(accounts.state),
        writable(accounts.state_signer),
        writable(accounts.cache),
        signer(accounts.authority),
        writable(accounts.margin),
        writable(accounts.control),
        writable(dex.market),
        writable(dex.bids),
        writable(dex.asks),
        readonly(dex.dex_program),
    ];

    // Data: [discriminator(8), is_long(1), limit_price(8), max_base_quantity(8),
    //        max_quote_quantity(8), order_type(1), limit(2), client_id(8)]
    let mut data = Vec::with_capacity(44);
    data.extend_from_slice(&instruction::PLACE_PERP_ORDER);
    data.push(params.is_long as u8);
    data.extend_from_slice(&params.limit_price.to_le_bytes());
    data.extend_from_slice(&params.max_base_quantity.to_le_bytes());
    data.extend_from_slice(&params.max_quote_quantity.to_le_bytes());
    data.push(params.order_type as u8);
    data.extend_from_slice(&params.limit.to_le_bytes());
    data.extend_from_slice(&params.client_id.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: keys,
        data,
    }
}

/// Build CancelPerpOrder instruction.
///
/// Accounts:
/// 0. state (readonly)
/// 1. cache (mut)
/// 2. authority (signer)
/// 3. margin (mut)
/// 4. control (mut)
/// 5. dex_market (mut)
/// 6. bids (mut)
/// 7. asks (mut)
/// 8. dex_program (readonly)
pub fn build_cancel_perp_order_ix(
    accounts: &MarginAccounts,
    dex: &DexMarketAccounts,
    target: CancelTarget,
    program_id: &Pubkey,
) -> Instruction {
    let keys = vec![
        readonly(accounts.state),
        writable(accounts.cache),
        signer(accounts.authority),
        writable(accounts.margin),
        writable(accounts.control),
        writable(dex.market),
        writable(dex.bids),
        writable(dex.asks),
        readonly(dex.dex_program),
    ];

    // Data: [discriminator(8), Option<u128> order_id, Option<bool> is_long, Option<u64> client_id]
    let mut data = Vec::with_capacity(37);
    data.extend_from_slice(&instruction::CANCEL_PERP_ORDER);
    match target {
        CancelTarget::OrderId { order_id, is_long } => {
            data.push(1);
            data.extend_from_slice(&order_id.to_le_bytes());
            data.push(1);
            data.push(is_long as u8);
            data.push(0);
        }
        CancelTarget::ClientId(client_id) => {
            data.push(0);
            data.push(0);
            data.push(1);
            data.extend_from_slice(&client_id.to_le_bytes());
        }
    }

    Instruction {
        program_id: *program_id,
        accounts: keys,
        data,
    }
}
