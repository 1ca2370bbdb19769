//! Set the streaming emission rate (multisig gated)

use anchor_lang::prelude::*;

use crate::events::EmissionConfigured;
use crate::instructions::reward_helpers::advance_emission;
use crate::state::{ProtocolConfig, RewardPool};
use crate::utils::multisig::{first_signer, require_multisig};

#[derive(Accounts)]
pub struct ConfigureEmission<'info> {
    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(
        mut,
        seeds = [b"reward_pool"],
        bump = reward_pool.bump
    )]
    pub reward_pool: Account<'info, RewardPool>,
}

/// The old rate applies up to now; the new rate from now on.
pub fn handler(ctx: Context<ConfigureEmission>, emission_rate: u64) -> Result<()> {
    require_multisig(&ctx.accounts.protocol_config, ctx.remaining_accounts)?;
    let now = Clock::get()?.unix_timestamp;

    let pool = &mut ctx.accounts.reward_pool;
    advance_emission(pool, now)?;
    let old_rate = pool.emission_rate;
    pool.emission_rate = emission_rate;

    emit!(EmissionConfigured {
        old_rate,
        new_rate: emission_rate,
        updated_by: first_signer(ctx.remaining_accounts),
        timestamp: now,
    });

    Ok(())
}
