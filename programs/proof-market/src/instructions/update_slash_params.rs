//! Update slash parameters (multisig gated)

use anchor_lang::prelude::*;

use crate::events::SlashParamsUpdated;
use crate::instructions::validation::validate_slash_params;
use crate::state::ProtocolConfig;
use crate::utils::multisig::{first_signer, require_multisig};

#[derive(Accounts)]
pub struct UpdateSlashParams<'info> {
    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,
}

pub fn handler(
    ctx: Context<UpdateSlashParams>,
    slash_bps: u16,
    slash_window: i64,
    max_slash_bps: u16,
) -> Result<()> {
    validate_slash_params(slash_bps, slash_window, max_slash_bps)?;
    require_multisig(&ctx.accounts.protocol_config, ctx.remaining_accounts)?;

    let config = &mut ctx.accounts.protocol_config;
    config.slash_bps = slash_bps;
    config.slash_window = slash_window;
    config.max_slash_bps = max_slash_bps;

    emit!(SlashParamsUpdated {
        slash_bps,
        slash_window,
        max_slash_bps,
        updated_by: first_signer(ctx.remaining_accounts),
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
