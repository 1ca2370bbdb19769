//! Pause or resume the market (multisig gated)

use anchor_lang::prelude::*;

use crate::events::ProtocolPaused;
use crate::state::ProtocolConfig;
use crate::utils::multisig::{first_signer, require_multisig};

#[derive(Accounts)]
pub struct SetPaused<'info> {
    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,
}

pub fn handler(ctx: Context<SetPaused>, paused: bool) -> Result<()> {
    require_multisig(&ctx.accounts.protocol_config, ctx.remaining_accounts)?;

    ctx.accounts.protocol_config.paused = paused;
    msg!("Market paused: {}", paused);

    emit!(ProtocolPaused {
        paused,
        updated_by: first_signer(ctx.remaining_accounts),
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
