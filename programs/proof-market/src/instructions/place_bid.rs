//! Place or replace a sealed bid

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::BidPlaced;
use crate::instructions::auction_helpers::require_bidding_open;
use crate::instructions::ledger_helpers::{require_eligible, resolve_effective_provider};
use crate::instructions::stats_helpers::{record_activity, StatsEvent};
use crate::state::{
    EpochSchedule, GlobalStats, ProofRequest, ProtocolConfig, ProviderAccount, SealedBid,
};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct PlaceBid<'info> {
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
        init_if_needed,
        payer = caller,
        space = SealedBid::SIZE,
        seeds = [b"bid", request.key().as_ref(), provider.key().as_ref()],
        bump
    )]
    pub bid: Box<Account<'info, SealedBid>>,

    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Box<Account<'info, ProtocolConfig>>,

    #[account(
        mut,
        seeds = [b"stats"],
        bump = global_stats.bump
    )]
    pub global_stats: Box<Account<'info, GlobalStats>>,

    #[account(
        seeds = [b"epochs"],
        bump = epoch_schedule.bump
    )]
    pub epoch_schedule: Box<Account<'info, EpochSchedule>>,

    /// Provider authority or its registered submitter
    #[account(mut)]
    pub caller: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Only the commitment is stored; fee and salt stay private until reveal.
/// Re-bidding overwrites the previous commitment.
pub fn handler(ctx: Context<PlaceBid>, commitment: [u8; 32]) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    require!(commitment != [0u8; 32], MarketError::InvalidInput);

    let now = Clock::get()?.unix_timestamp;
    let request_key = ctx.accounts.request.key();
    let provider_key = ctx.accounts.provider.key();
    let request = &mut ctx.accounts.request;
    let provider = &mut ctx.accounts.provider;

    require_bidding_open(request, now)?;
    resolve_effective_provider(provider, &ctx.accounts.caller.key())?;
    require_eligible(provider, request.min_stake, config.min_self_stake_floor)?;

    let bid = &mut ctx.accounts.bid;
    let first_bid = bid.provider == Pubkey::default();
    if first_bid {
        bid.request = request_key;
        bid.provider = provider_key;
        bid.bump = ctx.bumps.bid;
        request.bidder_count = request
            .bidder_count
            .checked_add(1)
            .ok_or(MarketError::ArithmeticOverflow)?;
    }
    bid.commitment = commitment;
    bid.revealed = false;
    bid.revealed_fee = 0;
    bid.placed_at = now;

    let schedule = &ctx.accounts.epoch_schedule;
    record_activity(provider_key, &mut provider.stats, schedule, StatsEvent::Bid, now);
    let global_key = ctx.accounts.global_stats.key();
    record_activity(
        global_key,
        &mut ctx.accounts.global_stats.stats,
        schedule,
        StatsEvent::Bid,
        now,
    );

    emit!(BidPlaced {
        request_id: request.request_id,
        provider: provider_key,
        first_bid,
        bidder_count: request.bidder_count,
        timestamp: now,
    });

    Ok(())
}
