//! Update staking parameters (multisig gated)

use anchor_lang::prelude::*;

use crate::events::StakingParamsUpdated;
use crate::instructions::validation::validate_staking_params;
use crate::state::ProtocolConfig;
use crate::utils::multisig::{first_signer, require_multisig};

#[derive(Accounts)]
pub struct UpdateStakingParams<'info> {
    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,
}

/// A raised floor makes providers below it ineligible until they raise
/// their own `min_self_stake`.
pub fn handler(
    ctx: Context<UpdateStakingParams>,
    min_self_stake_floor: u64,
    unstake_delay: i64,
) -> Result<()> {
    validate_staking_params(unstake_delay)?;
    require_multisig(&ctx.accounts.protocol_config, ctx.remaining_accounts)?;

    let config = &mut ctx.accounts.protocol_config;
    config.min_self_stake_floor = min_self_stake_floor;
    config.unstake_delay = unstake_delay;

    emit!(StakingParamsUpdated {
        min_self_stake_floor,
        unstake_delay,
        updated_by: first_signer(ctx.remaining_accounts),
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
