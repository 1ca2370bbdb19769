//! Remove the last epoch boundary before it starts (multisig gated)

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::EpochPopped;
use crate::instructions::stats_helpers::pop_epoch_boundary;
use crate::state::{EpochRecord, EpochSchedule, ProtocolConfig};
use crate::utils::multisig::require_multisig;

#[derive(Accounts)]
pub struct PopEpoch<'info> {
    #[account(
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(
        mut,
        seeds = [b"epochs"],
        bump = epoch_schedule.bump
    )]
    pub epoch_schedule: Account<'info, EpochSchedule>,

    #[account(
        mut,
        close = recipient,
        seeds = [b"epoch", epoch_schedule.last_id.to_le_bytes().as_ref()],
        bump = epoch.bump
    )]
    pub epoch: Account<'info, EpochRecord>,

    /// Record reopened by the pop; absent when popping the first epoch
    #[account(mut)]
    pub previous_epoch: Option<Account<'info, EpochRecord>>,

    /// CHECK: Receives the closed record's rent
    #[account(mut)]
    pub recipient: UncheckedAccount<'info>,
}

pub fn handler(ctx: Context<PopEpoch>) -> Result<()> {
    require_multisig(&ctx.accounts.protocol_config, ctx.remaining_accounts)?;
    let now = Clock::get()?.unix_timestamp;

    let (epoch_id, start) = pop_epoch_boundary(&mut ctx.accounts.epoch_schedule, now)?;
    require!(ctx.accounts.epoch.id == epoch_id, MarketError::EpochNotFound);

    let previous_id = ctx.accounts.epoch_schedule.last_id;
    if previous_id > 0 {
        let previous = ctx
            .accounts
            .previous_epoch
            .as_mut()
            .ok_or(MarketError::EpochNotFound)?;
        require!(previous.id == previous_id, MarketError::EpochNotFound);
        previous.end = 0;
    }

    emit!(EpochPopped {
        epoch_id,
        start,
        timestamp: now,
    });

    Ok(())
}
