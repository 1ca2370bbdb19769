//! Return a Retired or Deactivated provider to the Active set

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::ProviderStateChanged;
use crate::instructions::ledger_helpers::{self, emission_weight};
use crate::instructions::reward_helpers::{
    advance_emission, rebaseline_emission, reweight_active_stake,
};
use crate::state::{ProtocolConfig, ProviderAccount, RewardPool};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct ReactivateProvider<'info> {
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

pub fn handler(ctx: Context<ReactivateProvider>) -> Result<()> {
    require_market_open(&ctx.accounts.protocol_config)?;
    let now = Clock::get()?.unix_timestamp;

    let provider_key = ctx.accounts.provider.key();
    let provider = &mut ctx.accounts.provider;
    let pool = &mut ctx.accounts.reward_pool;

    advance_emission(pool, now)?;
    let old_state = provider.state;
    let weight_before = emission_weight(provider)?;

    ledger_helpers::reactivate_provider(provider)?;
    // Time spent outside the Active set earns nothing
    rebaseline_emission(provider, pool);
    reweight_active_stake(pool, weight_before, emission_weight(provider)?)?;

    emit!(ProviderStateChanged {
        provider: provider_key,
        old_state: old_state as u8,
        new_state: provider.state as u8,
        timestamp: now,
    });

    Ok(())
}
