//! PDA (Program Derived Address) derivation functions.

use solana_pubkey::Pubkey;

use crate::program::constants::{ASSOCIATED_TOKEN_PROGRAM_ID, MARGIN_SEED, TOKEN_PROGRAM_ID};

/// Get the State signer PDA.
///
/// Seeds: [state]
pub fn get_state_signer_pda(state: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[state.as_ref()], program_id)
}

/// Get a Margin PDA.
///
/// Seeds: [authority, state, "marginv1"]
pub fn get_margin_pda(authority: &Pubkey, state: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[authority.as_ref(), state.as_ref(), MARGIN_SEED],
        program_id,
    )
}

/// Get the associated token account of a wallet for an SPL mint.
///
/// Seeds: [wallet, token_program, mint] under the associated token program
pub fn get_associated_token_address(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[wallet.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .0
}
