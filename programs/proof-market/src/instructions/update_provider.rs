//! Update a provider's pledge, commission rates and submitter

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::ProviderUpdated;
use crate::instructions::reward_helpers::sync_provider_emission;
use crate::instructions::validation::validate_commission;
use crate::state::{ProtocolConfig, ProviderAccount, RewardPool};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct UpdateProvider<'info> {
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

/// `None` leaves a field unchanged. `Some(Pubkey::default())` clears the
/// submitter.
pub fn handler(
    ctx: Context<UpdateProvider>,
    min_self_stake: Option<u64>,
    commission_bps: Option<u16>,
    emission_commission_bps: Option<u16>,
    submitter: Option<Pubkey>,
) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    if let Some(pledge) = min_self_stake {
        require!(
            pledge >= config.min_self_stake_floor,
            MarketError::MinSelfStakeBelowFloor
        );
    }
    if let Some(bps) = commission_bps {
        validate_commission(bps)?;
    }
    if let Some(bps) = emission_commission_bps {
        validate_commission(bps)?;
    }

    let now = Clock::get()?.unix_timestamp;
    let provider_key = ctx.accounts.provider.key();
    let provider = &mut ctx.accounts.provider;

    // Emission earned so far is split at the old rate
    sync_provider_emission(provider_key, provider, &mut ctx.accounts.reward_pool, now)?;

    if let Some(pledge) = min_self_stake {
        provider.min_self_stake = pledge;
    }
    if let Some(bps) = commission_bps {
        provider.commission_bps = bps;
    }
    if let Some(bps) = emission_commission_bps {
        provider.emission_commission_bps = bps;
    }
    if let Some(key) = submitter {
        require!(key != provider.authority, MarketError::InvalidInput);
        provider.submitter = key;
    }

    emit!(ProviderUpdated {
        provider: provider_key,
        submitter: provider.submitter,
        min_self_stake: provider.min_self_stake,
        commission_bps: provider.commission_bps,
        emission_commission_bps: provider.emission_commission_bps,
        timestamp: now,
    });

    Ok(())
}
