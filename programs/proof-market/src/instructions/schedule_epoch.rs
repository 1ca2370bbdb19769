//! Schedule the next epoch boundary (multisig gated)

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::EpochScheduled;
use crate::instructions::stats_helpers::schedule_epoch_boundary;
use crate::state::{EpochRecord, EpochSchedule, ProtocolConfig};
use crate::utils::multisig::require_multisig;

#[derive(Accounts)]
pub struct ScheduleEpoch<'info> {
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

    /// Record of the currently last epoch; absent before the first boundary
    #[account(mut)]
    pub previous_epoch: Option<Account<'info, EpochRecord>>,

    #[account(
        init,
        payer = payer,
        space = EpochRecord::SIZE,
        seeds = [b"epoch", (epoch_schedule.last_id + 1).to_le_bytes().as_ref()],
        bump
    )]
    pub epoch: Account<'info, EpochRecord>,

    #[account(mut)]
    pub payer: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<ScheduleEpoch>, start: i64) -> Result<()> {
    require_multisig(&ctx.accounts.protocol_config, ctx.remaining_accounts)?;
    let now = Clock::get()?.unix_timestamp;

    let schedule = &mut ctx.accounts.epoch_schedule;
    let previous_id = schedule.last_id;
    let id = schedule_epoch_boundary(schedule, start, now)?;

    if previous_id > 0 {
        let previous = ctx
            .accounts
            .previous_epoch
            .as_mut()
            .ok_or(MarketError::EpochNotFound)?;
        require!(previous.id == previous_id, MarketError::EpochNotFound);
        previous.end = start;
    }

    let epoch = &mut ctx.accounts.epoch;
    epoch.id = id;
    epoch.start = start;
    epoch.end = 0;
    epoch.bump = ctx.bumps.epoch;

    emit!(EpochScheduled {
        epoch_id: id,
        start,
        timestamp: now,
    });

    Ok(())
}
