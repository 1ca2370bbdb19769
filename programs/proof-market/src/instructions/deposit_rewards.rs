//! Deposit rewards into a provider's accumulator

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::events::RewardsDeposited;
use crate::instructions::reward_helpers::{
    distribute_rewards, sweep_dust, REWARD_SOURCE_DIRECT,
};
use crate::instructions::token_helpers::{pull_tokens, validate_token_account};
use crate::state::{ProtocolConfig, ProviderAccount, RewardPool};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct DepositRewards<'info> {
    #[account(
        mut,
        seeds = [b"provider", provider.authority.as_ref()],
        bump = provider.bump
    )]
    pub provider: Box<Account<'info, ProviderAccount>>,

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
    pub reward_pool: Box<Account<'info, RewardPool>>,

    #[account(
        mut,
        seeds = [b"vault"],
        bump = protocol_config.vault_bump
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub depositor_token_account: Box<Account<'info, TokenAccount>>,

    pub depositor: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

/// Anyone may reward a provider's stakers. A zero amount is a no-op.
pub fn handler(ctx: Context<DepositRewards>, amount: u64) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    if amount == 0 {
        return Ok(());
    }
    validate_token_account(
        &ctx.accounts.depositor_token_account,
        &config.stake_mint,
        Some(&ctx.accounts.depositor.key()),
    )?;

    let now = Clock::get()?.unix_timestamp;
    let provider = &mut ctx.accounts.provider;
    let commission_bps = provider.commission_bps;
    let split = distribute_rewards(provider, amount, commission_bps)?;
    sweep_dust(&mut ctx.accounts.reward_pool, split.dust)?;

    pull_tokens(
        &ctx.accounts.depositor_token_account,
        &ctx.accounts.vault,
        &ctx.accounts.depositor,
        amount,
        &ctx.accounts.token_program,
    )?;

    emit!(RewardsDeposited {
        provider: ctx.accounts.provider.key(),
        source: REWARD_SOURCE_DIRECT,
        amount,
        commission: split.commission,
        to_stakers: split.to_stakers,
        dust: split.dust,
        timestamp: now,
    });

    Ok(())
}
