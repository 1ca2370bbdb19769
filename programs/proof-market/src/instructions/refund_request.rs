//! Return a request's escrow once it can no longer be fulfilled

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::MarketError;
use crate::events::RequestRefunded;
use crate::instructions::auction_helpers::{refund_reason, transition_request};
use crate::instructions::stats_helpers::{record_activity, StatsEvent};
use crate::instructions::token_helpers::push_tokens;
use crate::state::{
    EpochSchedule, GlobalStats, ProofRequest, ProtocolConfig, ProviderAccount, RequestStatus,
};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct RefundRequest<'info> {
    #[account(
        mut,
        seeds = [b"request", request.request_id.as_ref()],
        bump = request.bump
    )]
    pub request: Box<Account<'info, ProofRequest>>,

    /// Winner that missed the deadline; required when the request has one
    #[account(mut)]
    pub winner_provider: Option<Box<Account<'info, ProviderAccount>>>,

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

    #[account(
        mut,
        seeds = [b"vault"],
        bump = protocol_config.vault_bump
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = requester_token_account.owner == request.requester @ MarketError::InvalidTokenAccount,
        constraint = requester_token_account.mint == protocol_config.stake_mint @ MarketError::InvalidTokenAccount
    )]
    pub requester_token_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

/// Permissionless: the escrow can only go back to the requester.
pub fn handler(ctx: Context<RefundRequest>) -> Result<()> {
    require_market_open(&ctx.accounts.protocol_config)?;
    let now = Clock::get()?.unix_timestamp;

    let request = &mut ctx.accounts.request;
    let reason = refund_reason(request, now)?;
    transition_request(request, RequestStatus::Refunded)?;
    request.resolved_at = now;
    let amount = request.fee_ceiling;
    let missed_provider = request.winner.map(|winner| winner.provider);

    let schedule = &ctx.accounts.epoch_schedule;
    if let Some(expected) = missed_provider {
        let provider = ctx
            .accounts
            .winner_provider
            .as_mut()
            .ok_or(MarketError::ProviderNotFound)?;
        require!(provider.key() == expected, MarketError::ProviderNotFound);
        msg!("Provider {} missed the deadline", expected);
        record_activity(expected, &mut provider.stats, schedule, StatsEvent::Missed, now);
    }
    let global_key = ctx.accounts.global_stats.key();
    record_activity(
        global_key,
        &mut ctx.accounts.global_stats.stats,
        schedule,
        StatsEvent::Refunded,
        now,
    );

    push_tokens(
        &ctx.accounts.vault,
        &ctx.accounts.requester_token_account,
        &ctx.accounts.protocol_config,
        amount,
        &ctx.accounts.token_program,
    )?;

    emit!(RequestRefunded {
        request_id: ctx.accounts.request.request_id,
        requester: ctx.accounts.request.requester,
        amount,
        reason: reason as u8,
        missed_provider,
        timestamp: now,
    });

    Ok(())
}
