//! Withdraw a provider's banked commission

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::MarketError;
use crate::events::CommissionWithdrawn;
use crate::instructions::reward_helpers::{sync_provider_emission, take_banked_commission};
use crate::instructions::token_helpers::{push_tokens, validate_token_account};
use crate::state::{ProtocolConfig, ProviderAccount, RewardPool};
use crate::utils::version::require_market_open;

#[derive(Accounts)]
pub struct WithdrawCommission<'info> {
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
    pub reward_pool: Box<Account<'info, RewardPool>>,

    #[account(
        mut,
        seeds = [b"vault"],
        bump = protocol_config.vault_bump
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub authority_token_account: Box<Account<'info, TokenAccount>>,

    pub authority: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<WithdrawCommission>) -> Result<()> {
    let config = &ctx.accounts.protocol_config;
    require_market_open(config)?;
    validate_token_account(
        &ctx.accounts.authority_token_account,
        &config.stake_mint,
        Some(&ctx.accounts.authority.key()),
    )?;

    let now = Clock::get()?.unix_timestamp;
    let provider_key = ctx.accounts.provider.key();
    let provider = &mut ctx.accounts.provider;

    sync_provider_emission(provider_key, provider, &mut ctx.accounts.reward_pool, now)?;
    let amount = take_banked_commission(provider)?;

    push_tokens(
        &ctx.accounts.vault,
        &ctx.accounts.authority_token_account,
        &ctx.accounts.protocol_config,
        amount,
        &ctx.accounts.token_program,
    )?;

    emit!(CommissionWithdrawn {
        provider: provider_key,
        authority: ctx.accounts.authority.key(),
        amount,
        timestamp: now,
    });

    Ok(())
}
