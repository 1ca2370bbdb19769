//! Voluntarily leave the Active set

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::ProviderStateChanged;
use crate::instructions::ledger_helpers::{emission_weight, transition_provider};
use crate::instructions::reward_helpers::{reweight_active_stake, sync_provider_emission};
use crate::state::{ProtocolConfig, ProviderAccount, ProviderState, RewardPool};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct RetireProvider<'info> {
    #[account(
        mut,
        seeds = [b"provider", authority.key().as_ref()],
        bump = provider.bump,
        has_one = authority @ MarketError::UnauthorizedProvider
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
    pub reward_pool: Account<'info, RewardPool>,

    pub authority: Signer<'info>,
}

/// Retiring stops new work and emission; stake stays slashable until it
/// is unstaked.
pub fn handler(ctx: Context<RetireProvider>) -> Result<()> {
    require_market_open(&ctx.accounts.protocol_config)?;
    let now = Clock::get()?.unix_timestamp;

    let provider_key = ctx.accounts.provider.key();
    let provider = &mut ctx.accounts.provider;
    let pool = &mut ctx.accounts.reward_pool;

    let weight_before = sync_provider_emission(provider_key, provider, pool, now)?;
    transition_provider(provider, ProviderState::Retired)?;
    reweight_active_stake(pool, weight_before, emission_weight(provider)?)?;

    emit!(ProviderStateChanged {
        provider: provider_key,
        old_state: ProviderState::Active as u8,
        new_state: ProviderState::Retired as u8,
        timestamp: now,
    });

    Ok(())
}
