//! Withdraw accumulated rounding dust (multisig gated)

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::MarketError;
use crate::events::DustWithdrawn;
use crate::instructions::token_helpers::{push_tokens, validate_token_account};
use crate::state::{ProtocolConfig, RewardPool};
use crate::utils::multisig::require_multisig;

#[derive(Accounts)]
pub struct WithdrawDust<'info> {
    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Box<Account<'info, ProtocolConfig>>,

    #[account(
        mut,
        seeds = [b"reward_pool"],
        bump = reward_pool.bump
    )]
    pub reward_pool: Account<'info, RewardPool>,

    #[account(
        mut,
        seeds = [b"vault"],
        bump = protocol_config.vault_bump
    )]
    pub vault: Account<'info, TokenAccount>,

    #[account(mut)]
    pub recipient: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<WithdrawDust>, amount: u64) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_multisig(config, ctx.remaining_accounts)?;
    require!(amount > 0, MarketError::ZeroAmount);
    validate_token_account(&ctx.accounts.recipient, &config.stake_mint, None)?;

    let pool = &mut ctx.accounts.reward_pool;
    require!(amount <= pool.dust_pool, MarketError::InsufficientDust);
    pool.dust_pool -= amount;
    let remaining = pool.dust_pool;

    push_tokens(
        &ctx.accounts.vault,
        &ctx.accounts.recipient,
        &ctx.accounts.protocol_config,
        amount,
        &ctx.accounts.token_program,
    )?;

    emit!(DustWithdrawn {
        recipient: ctx.accounts.recipient.key(),
        amount,
        remaining,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
