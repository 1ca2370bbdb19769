//! Penalise a winner that let its request expire

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::MarketError;
use crate::events::{ProviderSlashed, ProviderStateChanged, RequestSlashed};
use crate::instructions::auction_helpers::{slash_terms, transition_request};
use crate::instructions::ledger_helpers::{emission_weight, slash_by_amount};
use crate::instructions::reward_helpers::{reweight_active_stake, sync_provider_emission};
use crate::instructions::token_helpers::push_tokens;
use crate::state::{
    ProofRequest, ProtocolConfig, ProviderAccount, ProviderState, RequestStatus, RewardPool,
};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct SlashRequest<'info> {
    #[account(
        mut,
        seeds = [b"request", request.request_id.as_ref()],
        bump = request.bump
    )]
    pub request: Box<Account<'info, ProofRequest>>,

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

    #[account(
        mut,
        constraint = treasury.key() == protocol_config.treasury @ MarketError::InvalidTokenAccount
    )]
    pub treasury: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

/// Permissionless within the slash window. The penalty is capped per call,
/// and the request is terminal afterwards even if nothing could be slashed.
pub fn handler(ctx: Context<SlashRequest>) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    let max_slash_bps = config.max_slash_bps;
    let now = Clock::get()?.unix_timestamp;

    let provider_key = ctx.accounts.provider.key();
    let request = &mut ctx.accounts.request;
    let (winner, penalty) = slash_terms(request, now)?;
    require!(winner.provider == provider_key, MarketError::ProviderNotFound);

    let provider = &mut ctx.accounts.provider;
    let pool = &mut ctx.accounts.reward_pool;
    let weight_before = sync_provider_emission(provider_key, provider, pool, now)?;
    let outcome = slash_by_amount(provider, penalty, max_slash_bps)?;
    reweight_active_stake(pool, weight_before, emission_weight(provider)?)?;
    provider.total_slashed = provider
        .total_slashed
        .checked_add(outcome.slashed)
        .ok_or(MarketError::ArithmeticOverflow)?;

    transition_request(request, RequestStatus::Slashed)?;
    request.slashed_amount = outcome.slashed;
    request.resolved_at = now;
    let request_id = request.request_id;

    push_tokens(
        &ctx.accounts.vault,
        &ctx.accounts.treasury,
        &ctx.accounts.protocol_config,
        outcome.slashed,
        &ctx.accounts.token_program,
    )?;

    emit!(RequestSlashed {
        request_id,
        provider: provider_key,
        penalty,
        slashed: outcome.slashed,
        timestamp: now,
    });
    emit!(ProviderSlashed {
        provider: provider_key,
        amount: outcome.slashed,
        old_scale: outcome.old_scale,
        new_scale: outcome.new_scale,
        deactivated: outcome.deactivated,
        timestamp: now,
    });
    if outcome.deactivated {
        emit!(ProviderStateChanged {
            provider: provider_key,
            old_state: ProviderState::Active as u8,
            new_state: ProviderState::Deactivated as u8,
            timestamp: now,
        });
    }

    Ok(())
}
