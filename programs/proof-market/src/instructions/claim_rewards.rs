//! Claim a position's banked rewards

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::MarketError;
use crate::events::RewardsClaimed;
use crate::instructions::reward_helpers::{
    settle_position, sync_provider_emission, take_banked_rewards,
};
use crate::instructions::token_helpers::{push_tokens, validate_token_account};
use crate::state::{ProtocolConfig, ProviderAccount, RewardPool, StakePosition};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct ClaimRewards<'info> {
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
    pub staker_token_account: Box<Account<'info, TokenAccount>>,

    pub staker: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<ClaimRewards>) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    validate_token_account(
        &ctx.accounts.staker_token_account,
        &config.stake_mint,
        Some(&ctx.accounts.staker.key()),
    )?;

    let now = Clock::get()?.unix_timestamp;
    let provider_key = ctx.accounts.provider.key();
    let provider = &mut ctx.accounts.provider;
    let position = &mut ctx.accounts.position;

    // Emission weight is unchanged by a claim; no reweight needed
    sync_provider_emission(provider_key, provider, &mut ctx.accounts.reward_pool, now)?;
    settle_position(provider, position)?;
    let amount = take_banked_rewards(position)?;

    push_tokens(
        &ctx.accounts.vault,
        &ctx.accounts.staker_token_account,
        &ctx.accounts.protocol_config,
        amount,
        &ctx.accounts.token_program,
    )?;

    emit!(RewardsClaimed {
        provider: provider_key,
        staker: ctx.accounts.staker.key(),
        amount,
        timestamp: now,
    });

    Ok(())
}
