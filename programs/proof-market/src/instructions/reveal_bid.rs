//! Reveal a sealed bid and rank it

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::BidRevealed;
use crate::instructions::auction_helpers::{
    bid_commitment, rank_revealed_bid, require_reveal_open, RankOutcome,
};
use crate::instructions::ledger_helpers::{require_eligible, resolve_effective_provider};
use crate::instructions::stats_helpers::{record_activity, StatsEvent};
use crate::state::{
    EpochSchedule, GlobalStats, ProofRequest, ProtocolConfig, ProviderAccount, SealedBid,
};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct RevealBid<'info> {
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
        mut,
        seeds = [b"bid", request.key().as_ref(), provider.key().as_ref()],
        bump = bid.bump,
        constraint = bid.request == request.key() && bid.provider == provider.key() @ MarketError::BidNotFound
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

    pub caller: Signer<'info>,
}

pub fn handler(ctx: Context<RevealBid>, fee: u64, salt: [u8; 32]) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;

    let now = Clock::get()?.unix_timestamp;
    let provider_key = ctx.accounts.provider.key();
    let request = &mut ctx.accounts.request;
    let provider = &mut ctx.accounts.provider;
    let bid = &mut ctx.accounts.bid;

    require_reveal_open(request, now)?;
    resolve_effective_provider(provider, &ctx.accounts.caller.key())?;
    require!(!bid.revealed, MarketError::BidAlreadyRevealed);
    require!(
        bid_commitment(&request.request_id, &provider_key, fee, &salt) == bid.commitment,
        MarketError::CommitmentMismatch
    );
    require!(fee <= request.fee_ceiling, MarketError::FeeAboveCeiling);
    // Stake may have moved since the bid was placed
    require_eligible(provider, request.min_stake, config.min_self_stake_floor)?;

    bid.revealed = true;
    bid.revealed_fee = fee;
    let rank = match rank_revealed_bid(request, provider_key, fee) {
        RankOutcome::Winner => 0,
        RankOutcome::RunnerUp => 1,
        RankOutcome::Unranked => 2,
    };

    let schedule = &ctx.accounts.epoch_schedule;
    record_activity(provider_key, &mut provider.stats, schedule, StatsEvent::Reveal, now);
    let global_key = ctx.accounts.global_stats.key();
    record_activity(
        global_key,
        &mut ctx.accounts.global_stats.stats,
        schedule,
        StatsEvent::Reveal,
        now,
    );

    emit!(BidRevealed {
        request_id: request.request_id,
        provider: provider_key,
        fee,
        rank,
        timestamp: now,
    });

    Ok(())
}
