//! Update protocol fee (multisig gated)

use anchor_lang::prelude::*;

use crate::events::ProtocolFeeUpdated;
use crate::instructions::validation::validate_protocol_fee;
use crate::state::ProtocolConfig;
use crate::utils::multisig::{first_signer, require_multisig};

#[derive(Accounts)]
pub struct UpdateProtocolFee<'info> {
    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,
}

pub fn handler(ctx: Context<UpdateProtocolFee>, protocol_fee_bps: u16) -> Result<()> {
    validate_protocol_fee(protocol_fee_bps)?;
    require_multisig(&ctx.accounts.protocol_config, ctx.remaining_accounts)?;

    let config = &mut ctx.accounts.protocol_config;
    let old_fee_bps = config.protocol_fee_bps;
    config.protocol_fee_bps = protocol_fee_bps;

    emit!(ProtocolFeeUpdated {
        old_fee_bps,
        new_fee_bps: protocol_fee_bps,
        updated_by: first_signer(ctx.remaining_accounts),
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
