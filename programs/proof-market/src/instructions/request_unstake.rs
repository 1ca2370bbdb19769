//! Queue raw shares for delayed withdrawal

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::UnstakeRequested;
use crate::instructions::ledger_helpers::{effective_amount, emission_weight, queue_unstake};
use crate::instructions::reward_helpers::{reweight_active_stake, sync_provider_emission};
use crate::state::{ProtocolConfig, ProviderAccount, RewardPool, StakePosition};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct RequestUnstake<'info> {
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

    pub staker: Signer<'info>,
}

pub fn handler(ctx: Context<RequestUnstake>, raw_shares: u128) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    let unstake_delay = config.unstake_delay;

    let now = Clock::get()?.unix_timestamp;
    let provider_key = ctx.accounts.provider.key();
    let staker = ctx.accounts.staker.key();
    let provider = &mut ctx.accounts.provider;
    let position = &mut ctx.accounts.position;
    let pool = &mut ctx.accounts.reward_pool;
    let is_self = staker == provider.authority;

    let weight_before = sync_provider_emission(provider_key, provider, pool, now)?;
    queue_unstake(provider, position, raw_shares, is_self, now)?;
    reweight_active_stake(pool, weight_before, emission_weight(provider)?)?;

    let value = effective_amount(raw_shares, provider.scale)?;
    let matures_at = now
        .checked_add(unstake_delay)
        .ok_or(MarketError::ArithmeticOverflow)?;

    emit!(UnstakeRequested {
        provider: provider_key,
        staker,
        raw_shares,
        value,
        matures_at,
        timestamp: now,
    });

    Ok(())
}
