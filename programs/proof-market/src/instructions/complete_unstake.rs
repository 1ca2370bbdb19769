//! Pay out matured unstake entries

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::MarketError;
use crate::events::UnstakeCompleted;
use crate::instructions::ledger_helpers::sweep_matured_unstakes;
use crate::instructions::token_helpers::{push_tokens, validate_token_account};
use crate::state::{ProtocolConfig, ProviderAccount, StakePosition};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct CompleteUnstake<'info> {
    #[account(
        mut,
        seeds = [b"provider", provider.authority.as_ref()],
        bump = provider.bump
    )]
    pub provider: Box<Account<'info, ProviderAccount>>,

    #[account(
        mut,
        seeds = [b"stake", provider.key().as_ref(), staker.key().as_ref()],
        bump = position.bump,
        has_one = staker @ MarketError::UnauthorizedStaker
    )]
    pub position: Box<Account<'info, StakePosition>>,

    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Box<Account<'info, ProtocolConfig>>,

    #[account(
        mut,
        seeds = [b"vault"],
        bump = protocol_config.vault_bump
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub staker_token_account: Box<Account<'info, TokenAccount>>,

    pub staker: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

/// Entries are paid at the scale in effect now, so a slash during the
/// delay reaches them.
pub fn handler(ctx: Context<CompleteUnstake>) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    validate_token_account(
        &ctx.accounts.staker_token_account,
        &config.stake_mint,
        Some(&ctx.accounts.staker.key()),
    )?;
    let unstake_delay = config.unstake_delay;

    let now = Clock::get()?.unix_timestamp;
    let sweep = sweep_matured_unstakes(
        &mut ctx.accounts.provider,
        &mut ctx.accounts.position,
        unstake_delay,
        now,
    )?;

    push_tokens(
        &ctx.accounts.vault,
        &ctx.accounts.staker_token_account,
        &ctx.accounts.protocol_config,
        sweep.amount,
        &ctx.accounts.token_program,
    )?;

    emit!(UnstakeCompleted {
        provider: ctx.accounts.provider.key(),
        staker: ctx.accounts.staker.key(),
        raw_shares: sweep.raw_shares,
        amount: sweep.amount,
        timestamp: now,
    });

    Ok(())
}
