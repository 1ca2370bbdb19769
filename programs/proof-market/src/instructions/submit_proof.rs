//! Submit the winning provider's proof and settle the request

use anchor_lang::prelude::*;
use solana_sha256_hasher::hash;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::MarketError;
use crate::events::ProofSubmitted;
use crate::instructions::auction_helpers::{
    calculate_settlement, require_submission_open, transition_request,
};
use crate::instructions::ledger_helpers::resolve_effective_provider;
use crate::instructions::reward_helpers::{
    distribute_rewards, emit_rewards_deposited, sweep_dust, REWARD_SOURCE_SETTLEMENT,
};
use crate::instructions::stats_helpers::{record_activity, StatsEvent};
use crate::instructions::token_helpers::push_tokens;
use crate::instructions::verifier::verify_proof;
use crate::state::{
    EpochSchedule, GlobalStats, ProofRequest, ProtocolConfig, ProviderAccount, RequestStatus,
    RewardPool,
};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct SubmitProof<'info> {
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

    /// Receives the rebate
    #[account(
        mut,
        constraint = requester_token_account.owner == request.requester @ MarketError::InvalidTokenAccount,
        constraint = requester_token_account.mint == protocol_config.stake_mint @ MarketError::InvalidTokenAccount
    )]
    pub requester_token_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = treasury.key() == protocol_config.treasury @ MarketError::InvalidTokenAccount
    )]
    pub treasury: Box<Account<'info, TokenAccount>>,

    /// CHECK: Must match protocol_config.verifier_program
    #[account(
        constraint = verifier_program.key() == protocol_config.verifier_program @ MarketError::InvalidVerifier
    )]
    pub verifier_program: UncheckedAccount<'info>,

    /// Provider authority or its registered submitter
    pub caller: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

/// Verify the proof, then settle at the second price. A rejected proof
/// leaves the request untouched so the winner can retry before the deadline.
pub fn handler(ctx: Context<SubmitProof>, proof: Vec<u8>) -> Result<()> {
    require_market_open(&ctx.accounts.protocol_config)?;
    let now = Clock::get()?.unix_timestamp;
    let provider_key = ctx.accounts.provider.key();

    {
        let request = &ctx.accounts.request;
        require_submission_open(request, now)?;
        let winner = request.winner.ok_or(MarketError::NoWinner)?;
        require!(winner.provider == provider_key, MarketError::NotWinner);
        resolve_effective_provider(&ctx.accounts.provider, &ctx.accounts.caller.key())?;

        verify_proof(
            &ctx.accounts.verifier_program.to_account_info(),
            &request.verification_key,
            &request.public_values_digest,
            &proof,
        )?;
    }

    let request = &mut ctx.accounts.request;
    let settlement = calculate_settlement(request)?;
    transition_request(request, RequestStatus::Fulfilled)?;
    request.proof_digest = hash(&proof).to_bytes();
    request.settled_price = settlement.price;
    request.resolved_at = now;

    let provider = &mut ctx.accounts.provider;
    let commission_bps = provider.commission_bps;
    let split = distribute_rewards(provider, settlement.provider_reward, commission_bps)?;
    sweep_dust(&mut ctx.accounts.reward_pool, split.dust)?;

    let schedule = &ctx.accounts.epoch_schedule;
    let event = StatsEvent::Fulfilled {
        fee: settlement.price,
    };
    record_activity(provider_key, &mut provider.stats, schedule, event, now);
    let global_key = ctx.accounts.global_stats.key();
    record_activity(
        global_key,
        &mut ctx.accounts.global_stats.stats,
        schedule,
        event,
        now,
    );

    let config = &mut ctx.accounts.protocol_config;
    config.fulfilled_requests = config
        .fulfilled_requests
        .checked_add(1)
        .ok_or(MarketError::ArithmeticOverflow)?;
    config.total_value_settled = config
        .total_value_settled
        .checked_add(settlement.price)
        .ok_or(MarketError::ArithmeticOverflow)?;

    // Token movements after all state updates
    push_tokens(
        &ctx.accounts.vault,
        &ctx.accounts.requester_token_account,
        &ctx.accounts.protocol_config,
        settlement.rebate,
        &ctx.accounts.token_program,
    )?;
    push_tokens(
        &ctx.accounts.vault,
        &ctx.accounts.treasury,
        &ctx.accounts.protocol_config,
        settlement.protocol_fee,
        &ctx.accounts.token_program,
    )?;

    emit!(ProofSubmitted {
        request_id: ctx.accounts.request.request_id,
        provider: provider_key,
        price: settlement.price,
        protocol_fee: settlement.protocol_fee,
        provider_reward: settlement.provider_reward,
        rebate: settlement.rebate,
        proof_digest: ctx.accounts.request.proof_digest,
        timestamp: now,
    });
    emit_rewards_deposited(provider_key, REWARD_SOURCE_SETTLEMENT, split, now);

    Ok(())
}
