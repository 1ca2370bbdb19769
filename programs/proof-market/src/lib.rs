#![allow(unexpected_cfgs)]
//! Proof Market
//!
//! A settlement engine for verifiable computation. Requesters escrow a fee
//! ceiling for a proof, staked providers compete in a sealed-bid reverse
//! auction, and the winner is paid the second price once its proof
//! verifies. Provider stake backs eligibility and absorbs penalties through
//! a scale factor, and rewards reach stakers through lazy accumulators.

use anchor_lang::prelude::*;

declare_id!("HYHjf9k4XaR4cc6WMbVtMwmwMr8LSCfRtnedCnhqnjr9");

pub mod errors;
pub mod events;
pub mod instructions;
pub mod state;
pub mod utils;

use instructions::validation::ProtocolParams;
use instructions::*;

#[program]
pub mod proof_market {
    use super::*;

    // ========================================================================
    // Administration
    // ========================================================================

    /// Initialize the protocol config, the token vault, the reward pool,
    /// the global stats bucket and the epoch schedule.
    ///
    /// # Arguments
    /// * `ctx` - Context with the global PDAs, stake mint and treasury
    /// * `params` - Market, slash and staking parameters
    /// * `multisig_threshold` - Owner signatures required by admin instructions
    /// * `multisig_owners` - Up to five distinct owner keys
    ///
    /// The threshold of owners must sign via remaining accounts.
    pub fn initialize_protocol(
        ctx: Context<InitializeProtocol>,
        params: ProtocolParams,
        multisig_threshold: u8,
        multisig_owners: Vec<Pubkey>,
    ) -> Result<()> {
        instructions::initialize_protocol::handler(
            ctx,
            params,
            multisig_threshold,
            multisig_owners,
        )
    }

    /// Update the fee floor and auction phase durations.
    pub fn update_market_params(
        ctx: Context<UpdateMarketParams>,
        min_fee: u64,
        bidding_window: i64,
        reveal_window: i64,
    ) -> Result<()> {
        instructions::update_market_params::handler(ctx, min_fee, bidding_window, reveal_window)
    }

    /// Update the protocol's cut of settled prices.
    pub fn update_protocol_fee(ctx: Context<UpdateProtocolFee>, protocol_fee_bps: u16) -> Result<()> {
        instructions::update_protocol_fee::handler(ctx, protocol_fee_bps)
    }

    pub fn update_slash_params(
        ctx: Context<UpdateSlashParams>,
        slash_bps: u16,
        slash_window: i64,
        max_slash_bps: u16,
    ) -> Result<()> {
        instructions::update_slash_params::handler(ctx, slash_bps, slash_window, max_slash_bps)
    }

    pub fn update_staking_params(
        ctx: Context<UpdateStakingParams>,
        min_self_stake_floor: u64,
        unstake_delay: i64,
    ) -> Result<()> {
        instructions::update_staking_params::handler(ctx, min_self_stake_floor, unstake_delay)
    }

    /// Pause or resume every non-admin instruction.
    pub fn set_paused(ctx: Context<SetPaused>, paused: bool) -> Result<()> {
        instructions::set_paused::handler(ctx, paused)
    }

    /// Schedule the next epoch boundary. `start` must be in the future and
    /// after the last scheduled boundary.
    pub fn schedule_epoch(ctx: Context<ScheduleEpoch>, start: i64) -> Result<()> {
        instructions::schedule_epoch::handler(ctx, start)
    }

    /// Remove the last scheduled boundary before it starts.
    pub fn pop_epoch(ctx: Context<PopEpoch>) -> Result<()> {
        instructions::pop_epoch::handler(ctx)
    }

    /// Set the streaming emission rate in tokens per second.
    pub fn configure_emission(ctx: Context<ConfigureEmission>, emission_rate: u64) -> Result<()> {
        instructions::configure_emission::handler(ctx, emission_rate)
    }

    /// Add tokens to the emission budget. Open to anyone.
    pub fn fund_emission(ctx: Context<FundEmission>, amount: u64) -> Result<()> {
        instructions::fund_emission::handler(ctx, amount)
    }

    pub fn withdraw_dust(ctx: Context<WithdrawDust>, amount: u64) -> Result<()> {
        instructions::withdraw_dust::handler(ctx, amount)
    }

    /// Jail a provider, or release a jailed provider into Retired.
    pub fn set_provider_jailed(ctx: Context<SetProviderJailed>, jailed: bool) -> Result<()> {
        instructions::set_provider_jailed::handler(ctx, jailed)
    }

    // ========================================================================
    // Providers and stake
    // ========================================================================

    /// Register the signer as a provider.
    ///
    /// # Arguments
    /// * `min_self_stake` - Own stake the provider pledges to keep
    /// * `commission_bps` - Commission on deposited and settlement rewards
    /// * `emission_commission_bps` - Commission on streaming emission
    /// * `submitter` - Optional delegate key that may bid and submit proofs
    pub fn register_provider(
        ctx: Context<RegisterProvider>,
        min_self_stake: u64,
        commission_bps: u16,
        emission_commission_bps: u16,
        submitter: Option<Pubkey>,
    ) -> Result<()> {
        instructions::register_provider::handler(
            ctx,
            min_self_stake,
            commission_bps,
            emission_commission_bps,
            submitter,
        )
    }

    pub fn update_provider(
        ctx: Context<UpdateProvider>,
        min_self_stake: Option<u64>,
        commission_bps: Option<u16>,
        emission_commission_bps: Option<u16>,
        submitter: Option<Pubkey>,
    ) -> Result<()> {
        instructions::update_provider::handler(
            ctx,
            min_self_stake,
            commission_bps,
            emission_commission_bps,
            submitter,
        )
    }

    pub fn retire_provider(ctx: Context<RetireProvider>) -> Result<()> {
        instructions::retire_provider::handler(ctx)
    }

    /// Return a Retired or Deactivated provider to the Active set.
    /// A provider that fully exited restarts at an unslashed scale.
    pub fn reactivate_provider(ctx: Context<ReactivateProvider>) -> Result<()> {
        instructions::reactivate_provider::handler(ctx)
    }

    /// Stake tokens with a provider, minting raw shares at the current scale.
    pub fn stake(ctx: Context<Stake>, amount: u64) -> Result<()> {
        instructions::stake::handler(ctx, amount)
    }

    /// Burn raw shares into the unstake queue. They stay slashable until paid.
    pub fn request_unstake(ctx: Context<RequestUnstake>, raw_shares: u128) -> Result<()> {
        instructions::request_unstake::handler(ctx, raw_shares)
    }

    pub fn complete_unstake(ctx: Context<CompleteUnstake>) -> Result<()> {
        instructions::complete_unstake::handler(ctx)
    }

    // ========================================================================
    // Rewards
    // ========================================================================

    pub fn claim_rewards(ctx: Context<ClaimRewards>) -> Result<()> {
        instructions::claim_rewards::handler(ctx)
    }

    pub fn withdraw_commission(ctx: Context<WithdrawCommission>) -> Result<()> {
        instructions::withdraw_commission::handler(ctx)
    }

    /// Deposit rewards for a provider's stakers, net of its commission.
    pub fn deposit_rewards(ctx: Context<DepositRewards>, amount: u64) -> Result<()> {
        instructions::deposit_rewards::handler(ctx, amount)
    }

    // ========================================================================
    // Auction
    // ========================================================================

    /// Accept a proof request and escrow its fee ceiling.
    ///
    /// # Arguments
    /// * `ctx` - Context with the request PDA and the requester's token account
    /// * `request_id` - Must equal the id derived from the next three arguments
    /// * `nonce` - Requester-chosen nonce distinguishing identical work
    /// * `verification_key` - Key the proof must verify against
    /// * `public_values_digest` - Digest of the expected public outputs
    /// * `program_uri` - Reference to the program and its inputs
    /// * `fee_ceiling` - Most the requester will pay
    /// * `min_stake` - Active stake a provider needs to bid
    /// * `deadline` - Unix timestamp by which the proof must land
    #[allow(clippy::too_many_arguments)]
    pub fn create_request(
        ctx: Context<CreateRequest>,
        request_id: [u8; 32],
        nonce: u64,
        verification_key: [u8; 32],
        public_values_digest: [u8; 32],
        program_uri: String,
        fee_ceiling: u64,
        min_stake: u64,
        deadline: i64,
    ) -> Result<()> {
        instructions::create_request::handler(
            ctx,
            request_id,
            nonce,
            verification_key,
            public_values_digest,
            program_uri,
            fee_ceiling,
            min_stake,
            deadline,
        )
    }

    /// Place or replace a sealed bid during the bidding phase.
    pub fn place_bid(ctx: Context<PlaceBid>, commitment: [u8; 32]) -> Result<()> {
        instructions::place_bid::handler(ctx, commitment)
    }

    /// Open a sealed bid during the reveal phase.
    pub fn reveal_bid(ctx: Context<RevealBid>, fee: u64, salt: [u8; 32]) -> Result<()> {
        instructions::reveal_bid::handler(ctx, fee, salt)
    }

    /// Submit the winner's proof and settle at the second price.
    pub fn submit_proof(ctx: Context<SubmitProof>, proof: Vec<u8>) -> Result<()> {
        instructions::submit_proof::handler(ctx, proof)
    }

    pub fn refund_request(ctx: Context<RefundRequest>) -> Result<()> {
        instructions::refund_request::handler(ctx)
    }

    /// Penalise a winner that missed the deadline of a refunded request.
    pub fn slash_request(ctx: Context<SlashRequest>) -> Result<()> {
        instructions::slash_request::handler(ctx)
    }
}
