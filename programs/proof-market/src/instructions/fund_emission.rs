//! Top up the emission budget

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::MarketError;
use crate::events::EmissionFunded;
use crate::instructions::reward_helpers::advance_emission;
use crate::instructions::token_helpers::{pull_tokens, validate_token_account};
use crate::state::{ProtocolConfig, RewardPool};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct FundEmission<'info> {
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
    pub funder_token_account: Account<'info, TokenAccount>,

    pub funder: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<FundEmission>, amount: u64) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    require!(amount > 0, MarketError::ZeroAmount);
    validate_token_account(
        &ctx.accounts.funder_token_account,
        &config.stake_mint,
        Some(&ctx.accounts.funder.key()),
    )?;

    let now = Clock::get()?.unix_timestamp;
    let pool = &mut ctx.accounts.reward_pool;
    // Settle elapsed time first so a drained budget does not back-pay
    advance_emission(pool, now)?;
    pool.remaining_budget = pool
        .remaining_budget
        .checked_add(amount)
        .ok_or(MarketError::ArithmeticOverflow)?;
    let remaining_budget = pool.remaining_budget;

    pull_tokens(
        &ctx.accounts.funder_token_account,
        &ctx.accounts.vault,
        &ctx.accounts.funder,
        amount,
        &ctx.accounts.token_program,
    )?;

    emit!(EmissionFunded {
        funder: ctx.accounts.funder.key(),
        amount,
        remaining_budget,
        timestamp: now,
    });

    Ok(())
}
