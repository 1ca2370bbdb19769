//! Initialize protocol configuration, the vault and the global accounts

use crate::errors::MarketError;
use crate::events::ProtocolInitialized;
use crate::instructions::validation::{validate_protocol_params, ProtocolParams};
use crate::state::{
    EpochSchedule, GlobalStats, ProtocolConfig, RewardPool, CURRENT_PROTOCOL_VERSION,
    MIN_SUPPORTED_VERSION,
};
use crate::utils::multisig::{count_owner_approvals, validate_multisig_owners};
use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

#[derive(Accounts)]
pub struct InitializeProtocol<'info> {
    #[account(
        init,
        payer = authority,
        space = ProtocolConfig::SIZE,
        seeds = [b"protocol"],
        bump
    )]
    pub protocol_config: Box<Account<'info, ProtocolConfig>>,

    #[account(
        init,
        payer = authority,
        seeds = [b"vault"],
        bump,
        token::mint = stake_mint,
        token::authority = protocol_config,
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(
        init,
        payer = authority,
        space = RewardPool::SIZE,
        seeds = [b"reward_pool"],
        bump
    )]
    pub reward_pool: Box<Account<'info, RewardPool>>,

    #[account(
        init,
        payer = authority,
        space = GlobalStats::SIZE,
        seeds = [b"stats"],
        bump
    )]
    pub global_stats: Box<Account<'info, GlobalStats>>,

    #[account(
        init,
        payer = authority,
        space = EpochSchedule::SIZE,
        seeds = [b"epochs"],
        bump
    )]
    pub epoch_schedule: Box<Account<'info, EpochSchedule>>,

    pub stake_mint: Account<'info, Mint>,

    /// Treasury token account receiving protocol cuts and penalties
    #[account(
        constraint = treasury.mint == stake_mint.key() @ MarketError::InvalidTokenAccount
    )]
    pub treasury: Account<'info, TokenAccount>,

    /// CHECK: Must be an executable program; invoked to verify proofs
    #[account(constraint = verifier_program.executable @ MarketError::InvalidVerifier)]
    pub verifier_program: UncheckedAccount<'info>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

pub fn handler(
    ctx: Context<InitializeProtocol>,
    params: ProtocolParams,
    multisig_threshold: u8,
    multisig_owners: Vec<Pubkey>,
) -> Result<()> {
    // Validate everything before any config is written
    validate_protocol_params(&params)?;
    validate_multisig_owners(&multisig_owners)?;
    require!(
        multisig_threshold > 0 && (multisig_threshold as usize) <= multisig_owners.len(),
        MarketError::MultisigInvalidThreshold
    );

    let signers: Vec<Pubkey> = ctx
        .remaining_accounts
        .iter()
        .filter(|acc| acc.is_signer)
        .map(|acc| *acc.key)
        .collect();
    require!(
        count_owner_approvals(&multisig_owners, &signers)? >= multisig_threshold as usize,
        MarketError::MultisigNotEnoughSigners
    );

    let now = Clock::get()?.unix_timestamp;

    let config = &mut ctx.accounts.protocol_config;
    config.authority = ctx.accounts.authority.key();
    config.treasury = ctx.accounts.treasury.key();
    config.stake_mint = ctx.accounts.stake_mint.key();
    config.vault = ctx.accounts.vault.key();
    config.verifier_program = ctx.accounts.verifier_program.key();
    config.min_fee = params.min_fee;
    config.bidding_window = params.bidding_window;
    config.reveal_window = params.reveal_window;
    config.protocol_fee_bps = params.protocol_fee_bps;
    config.slash_bps = params.slash_bps;
    config.slash_window = params.slash_window;
    config.max_slash_bps = params.max_slash_bps;
    config.min_self_stake_floor = params.min_self_stake_floor;
    config.unstake_delay = params.unstake_delay;
    config.paused = false;
    config.total_requests = 0;
    config.fulfilled_requests = 0;
    config.total_value_settled = 0;
    config.bump = ctx.bumps.protocol_config;
    config.vault_bump = ctx.bumps.vault;
    config.multisig_threshold = multisig_threshold;
    config.multisig_owners_len = multisig_owners.len() as u8;
    config.protocol_version = CURRENT_PROTOCOL_VERSION;
    config.min_supported_version = MIN_SUPPORTED_VERSION;
    config._padding = [0u8; 2];
    config.multisig_owners = [Pubkey::default(); ProtocolConfig::MAX_MULTISIG_OWNERS];
    for (index, owner) in multisig_owners.iter().enumerate() {
        config.multisig_owners[index] = *owner;
    }

    let pool = &mut ctx.accounts.reward_pool;
    pool.last_update = now;
    pool.bump = ctx.bumps.reward_pool;

    ctx.accounts.global_stats.bump = ctx.bumps.global_stats;

    let schedule = &mut ctx.accounts.epoch_schedule;
    schedule.last_id = 0;
    schedule.first_id = 1;
    schedule.starts = Vec::new();
    schedule.bump = ctx.bumps.epoch_schedule;

    emit!(ProtocolInitialized {
        authority: config.authority,
        treasury: config.treasury,
        stake_mint: config.stake_mint,
        verifier_program: config.verifier_program,
        protocol_fee_bps: config.protocol_fee_bps,
        timestamp: now,
    });

    Ok(())
}
