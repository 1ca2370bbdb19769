//! SPL token custody helpers.
//!
//! All escrowed fees, stake, reward balances and emission budget sit in a
//! single vault token account owned by the protocol config PDA. Inbound
//! transfers are signed by the depositor, outbound transfers by the PDA.

use crate::errors::MarketError;
use crate::state::ProtocolConfig;
use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

/// Pull `amount` tokens from a user token account into the vault.
///
/// # Arguments
/// * `from` - Depositor's token account (source)
/// * `vault` - Program vault (destination)
/// * `authority` - Owner of `from`, signing the transaction
/// * `amount` - Number of tokens to transfer
/// * `token_program` - SPL Token program
pub fn pull_tokens<'info>(
    from: &Account<'info, TokenAccount>,
    vault: &Account<'info, TokenAccount>,
    authority: &Signer<'info>,
    amount: u64,
    token_program: &Program<'info, Token>,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    token::transfer(
        CpiContext::new(
            token_program.to_account_info(),
            Transfer {
                from: from.to_account_info(),
                to: vault.to_account_info(),
                authority: authority.to_account_info(),
            },
        ),
        amount,
    )
    .map_err(|_| MarketError::TokenTransferFailed)?;

    Ok(())
}

/// Push `amount` tokens from the vault to a recipient using PDA-signed CPI.
///
/// # Arguments
/// * `vault` - Program vault (source)
/// * `to` - Recipient token account (destination)
/// * `protocol_config` - Config PDA owning the vault, signs via seeds `[b"protocol", &[bump]]`
/// * `amount` - Number of tokens to transfer
/// * `token_program` - SPL Token program
pub fn push_tokens<'info>(
    vault: &Account<'info, TokenAccount>,
    to: &Account<'info, TokenAccount>,
    protocol_config: &Account<'info, ProtocolConfig>,
    amount: u64,
    token_program: &Program<'info, Token>,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    let bump = [protocol_config.bump];
    let seeds: &[&[u8]] = &[b"protocol", &bump];
    let signer_seeds: &[&[&[u8]]] = &[seeds];

    token::transfer(
        CpiContext::new_with_signer(
            token_program.to_account_info(),
            Transfer {
                from: vault.to_account_info(),
                to: to.to_account_info(),
                authority: protocol_config.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
    )
    .map_err(|_| MarketError::TokenTransferFailed)?;

    Ok(())
}

/// Validate that a token account holds the protocol mint and, when given,
/// belongs to `expected_owner`.
pub fn validate_token_account(
    token_account: &TokenAccount,
    expected_mint: &Pubkey,
    expected_owner: Option<&Pubkey>,
) -> Result<()> {
    require!(
        token_account.mint == *expected_mint,
        MarketError::InvalidTokenAccount
    );
    if let Some(owner) = expected_owner {
        require!(
            token_account.owner == *owner,
            MarketError::InvalidTokenAccount
        );
    }
    Ok(())
}
