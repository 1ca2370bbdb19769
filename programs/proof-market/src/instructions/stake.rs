//! Deposit stake with a provider

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::MarketError;
use crate::events::StakeDeposited;
use crate::instructions::ledger_helpers::{accepts_delegation, credit_shares, emission_weight};
use crate::instructions::reward_helpers::{reweight_active_stake, sync_provider_emission};
use crate::instructions::token_helpers::{pull_tokens, validate_token_account};
use crate::state::{ProtocolConfig, ProviderAccount, RewardPool, StakePosition};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct Stake<'info> {
    #[account(
        mut,
        seeds = [b"provider", provider.authority.as_ref()],
        bump = provider.bump
    )]
    pub provider: Box<Account<'info, ProviderAccount>>,

    #[account(
        init_if_needed,
        payer = staker,
        space = StakePosition::SIZE,
        seeds = [b"stake", provider.key().as_ref(), staker.key().as_ref()],
        bump
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

    #[account(mut)]
    pub staker: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// The provider's authority staking with itself builds self stake and is
/// always accepted. Anyone else is a delegator and needs an Active provider
/// that meets its own self-stake pledge.
pub fn handler(ctx: Context<Stake>, amount: u64) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    require!(amount > 0, MarketError::ZeroAmount);
    validate_token_account(
        &ctx.accounts.staker_token_account,
        &config.stake_mint,
        Some(&ctx.accounts.staker.key()),
    )?;

    let now = Clock::get()?.unix_timestamp;
    let provider_key = ctx.accounts.provider.key();
    let staker = ctx.accounts.staker.key();
    let provider = &mut ctx.accounts.provider;
    let is_self = staker == provider.authority;

    if !is_self && !accepts_delegation(provider)? {
        msg!(
            "Provider {} not accepting delegation in state {:?}",
            provider_key,
            provider.state
        );
        return Err(MarketError::DelegationNotAccepted.into());
    }

    let position = &mut ctx.accounts.position;
    if position.provider == Pubkey::default() {
        position.provider = provider_key;
        position.staker = staker;
        position.bump = ctx.bumps.position;
    }

    let pool = &mut ctx.accounts.reward_pool;
    let weight_before = sync_provider_emission(provider_key, provider, pool, now)?;
    let minted = credit_shares(provider, position, amount, is_self)?;
    reweight_active_stake(pool, weight_before, emission_weight(provider)?)?;

    let total_raw_shares = provider.total_raw_shares;

    pull_tokens(
        &ctx.accounts.staker_token_account,
        &ctx.accounts.vault,
        &ctx.accounts.staker,
        amount,
        &ctx.accounts.token_program,
    )?;

    emit!(StakeDeposited {
        provider: provider_key,
        staker,
        amount,
        raw_shares: minted,
        total_raw_shares,
        timestamp: now,
    });

    Ok(())
}
