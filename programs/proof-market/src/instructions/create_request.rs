//! Accept a proof request and escrow its fee ceiling

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::MarketError;
use crate::events::RequestAccepted;
use crate::instructions::auction_helpers::{
    derive_request_id, open_request, validate_request_terms, RequestTerms,
};
use crate::instructions::token_helpers::{pull_tokens, validate_token_account};
use crate::state::{ProofRequest, ProtocolConfig};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
#[instruction(request_id: [u8; 32])]
pub struct CreateRequest<'info> {
    #[account(
        init,
        payer = requester,
        space = ProofRequest::SIZE,
        seeds = [b"request", request_id.as_ref()],
        bump
    )]
    pub request: Box<Account<'info, ProofRequest>>,

    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Box<Account<'info, ProtocolConfig>>,

    #[account(
        mut,
        seeds = [b"vault"],
        bump = protocol_config.vault_bump
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub requester_token_account: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub requester: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// Create a request identified by its content. `request_id` must match the
/// id derived from `nonce`, the verification key and the public values;
/// re-submitting the same content fails because the account exists.
#[allow(clippy::too_many_arguments)]
pub fn handler(
    ctx: Context<CreateRequest>,
    request_id: [u8; 32],
    nonce: u64,
    verification_key: [u8; 32],
    public_values_digest: [u8; 32],
    program_uri: String,
    fee_ceiling: u64,
    min_stake: u64,
    deadline: i64,
) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    require!(
        derive_request_id(nonce, &verification_key, &public_values_digest) == request_id,
        MarketError::InvalidRequestId
    );
    validate_token_account(
        &ctx.accounts.requester_token_account,
        &config.stake_mint,
        Some(&ctx.accounts.requester.key()),
    )?;

    let now = Clock::get()?.unix_timestamp;
    let terms = RequestTerms {
        nonce,
        verification_key,
        public_values_digest,
        program_uri,
        fee_ceiling,
        min_stake,
        deadline,
    };
    validate_request_terms(config, &terms, now)?;

    let request = &mut ctx.accounts.request;
    open_request(
        request,
        config,
        request_id,
        ctx.accounts.requester.key(),
        terms,
        now,
    )?;
    request.bump = ctx.bumps.request;

    let config = &mut ctx.accounts.protocol_config;
    config.total_requests = config
        .total_requests
        .checked_add(1)
        .ok_or(MarketError::ArithmeticOverflow)?;

    pull_tokens(
        &ctx.accounts.requester_token_account,
        &ctx.accounts.vault,
        &ctx.accounts.requester,
        fee_ceiling,
        &ctx.accounts.token_program,
    )?;

    let request = &ctx.accounts.request;
    emit!(RequestAccepted {
        request_id,
        requester: request.requester,
        fee_ceiling,
        min_stake,
        bidding_end: request.bidding_end,
        reveal_end: request.reveal_end,
        deadline,
        timestamp: now,
    });

    Ok(())
}
