//! Jail or release a provider (multisig gated)

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::ProviderStateChanged;
use crate::instructions::ledger_helpers::{emission_weight, transition_provider};
use crate::instructions::reward_helpers::{reweight_active_stake, sync_provider_emission};
use crate::state::{ProtocolConfig, ProviderAccount, ProviderState, RewardPool};
use crate::utils::multisig::require_multisig;

#[derive(Accounts)]
pub struct SetProviderJailed<'info> {
    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(
        mut,
        seeds = [b"provider", provider.authority.as_ref()],
        bump = provider.bump
    )]
    pub provider: Box<Account<'info, ProviderAccount>>,

    #[account(
        mut,
        seeds = [b"reward_pool"],
        bump = reward_pool.bump
    )]
    pub reward_pool: Account<'info, RewardPool>,
}

/// Released providers land in Retired and must reactivate themselves.
pub fn handler(ctx: Context<SetProviderJailed>, jailed: bool) -> Result<()> {
    require_multisig(&ctx.accounts.protocol_config, ctx.remaining_accounts)?;
    let now = Clock::get()?.unix_timestamp;

    let provider_key = ctx.accounts.provider.key();
    let provider = &mut ctx.accounts.provider;
    let pool = &mut ctx.accounts.reward_pool;

    let weight_before = sync_provider_emission(provider_key, provider, pool, now)?;
    let old_state = provider.state;

    if jailed {
        transition_provider(provider, ProviderState::Jailed)?;
    } else {
        require!(
            provider.state == ProviderState::Jailed,
            MarketError::InvalidProviderTransition
        );
        transition_provider(provider, ProviderState::Retired)?;
    }

    reweight_active_stake(pool, weight_before, emission_weight(provider)?)?;

    emit!(ProviderStateChanged {
        provider: provider_key,
        old_state: old_state as u8,
        new_state: provider.state as u8,
        timestamp: now,
    });

    Ok(())
}
