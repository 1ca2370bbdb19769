//! Register a proof provider

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::ProviderRegistered;
use crate::instructions::constants::PRECISION;
use crate::instructions::ledger_helpers::transition_provider;
use crate::instructions::reward_helpers::{advance_emission, rebaseline_emission};
use crate::instructions::validation::validate_commission;
use crate::state::{ProtocolConfig, ProviderAccount, ProviderState, RewardPool, StatsBucket};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct RegisterProvider<'info> {
    #[account(
        init,
        payer = authority,
        space = ProviderAccount::SIZE,
        seeds = [b"provider", authority.key().as_ref()],
        bump
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

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Register the signer as a provider. `submitter` is an optional delegate
/// key allowed to bid and submit proofs on the provider's behalf.
pub fn handler(
    ctx: Context<RegisterProvider>,
    min_self_stake: u64,
    commission_bps: u16,
    emission_commission_bps: u16,
    submitter: Option<Pubkey>,
) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    require!(
        min_self_stake >= config.min_self_stake_floor,
        MarketError::MinSelfStakeBelowFloor
    );
    validate_commission(commission_bps)?;
    validate_commission(emission_commission_bps)?;

    let authority = ctx.accounts.authority.key();
    let submitter = submitter.unwrap_or_default();
    require!(submitter != authority, MarketError::InvalidInput);

    let now = Clock::get()?.unix_timestamp;
    let pool = &mut ctx.accounts.reward_pool;
    advance_emission(pool, now)?;

    let provider = &mut ctx.accounts.provider;
    provider.authority = authority;
    provider.submitter = submitter;
    provider.state = ProviderState::Null;
    provider.min_self_stake = min_self_stake;
    provider.total_raw_shares = 0;
    provider.pending_raw_shares = 0;
    provider.self_raw_shares = 0;
    provider.scale = PRECISION;
    provider.staker_count = 0;
    provider.commission_bps = commission_bps;
    provider.emission_commission_bps = emission_commission_bps;
    provider.acc_reward_per_share = 0;
    provider.banked_commission = 0;
    provider.total_slashed = 0;
    provider.stats = StatsBucket::default();
    provider.registered_at = now;
    provider.bump = ctx.bumps.provider;
    transition_provider(provider, ProviderState::Active)?;
    rebaseline_emission(provider, pool);

    emit!(ProviderRegistered {
        provider: provider.key(),
        authority,
        submitter,
        min_self_stake,
        commission_bps,
        emission_commission_bps,
        timestamp: now,
    });

    Ok(())
}
