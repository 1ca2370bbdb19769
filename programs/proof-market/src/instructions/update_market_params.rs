//! Update the fee floor and auction phase durations (multisig gated)

use anchor_lang::prelude::*;

use crate::events::MarketParamsUpdated;
use crate::instructions::validation::validate_market_params;
use crate::state::ProtocolConfig;
use crate::utils::multisig::{first_signer, require_multisig};

#[derive(Accounts)]
pub struct UpdateMarketParams<'info> {
    #[account(
        mut,
        seeds = [b"protocol"],
        bump = protocol_config.bump
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,
}

/// Open requests keep the windows they were accepted with.
pub fn handler(
    ctx: Context<UpdateMarketParams>,
    min_fee: u64,
    bidding_window: i64,
    reveal_window: i64,
) -> Result<()> {
    validate_market_params(bidding_window, reveal_window)?;
    require_multisig(&ctx.accounts.protocol_config, ctx.remaining_accounts)?;

    let config = &mut ctx.accounts.protocol_config;
    config.min_fee = min_fee;
    config.bidding_window = bidding_window;
    config.reveal_window = reveal_window;

    emit!(MarketParamsUpdated {
        min_fee,
        bidding_window,
        reveal_window,
        updated_by: first_signer(ctx.remaining_accounts),
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
