//! Events emitted by the proof market
//!
//! Indexers and provers subscribe to these to follow auctions, stake
//! movements and reward flows.

use anchor_lang::prelude::*;

// ============================================================================
// Protocol administration
// ============================================================================

/// Emitted when the protocol is initialized
#[event]
pub struct ProtocolInitialized {
    pub authority: Pubkey,
    pub treasury: Pubkey,
    pub stake_mint: Pubkey,
    pub verifier_program: Pubkey,
    pub protocol_fee_bps: u16,
    pub timestamp: i64,
}

/// Emitted when the fee floor or phase durations change
#[event]
pub struct MarketParamsUpdated {
    pub min_fee: u64,
    pub bidding_window: i64,
    pub reveal_window: i64,
    pub updated_by: Pubkey,
    pub timestamp: i64,
}

/// Emitted when the protocol fee changes
#[event]
pub struct ProtocolFeeUpdated {
    pub old_fee_bps: u16,
    pub new_fee_bps: u16,
    pub updated_by: Pubkey,
    pub timestamp: i64,
}

/// Emitted when slash parameters change
#[event]
pub struct SlashParamsUpdated {
    pub slash_bps: u16,
    pub slash_window: i64,
    pub max_slash_bps: u16,
    pub updated_by: Pubkey,
    pub timestamp: i64,
}

/// Emitted when staking parameters change
#[event]
pub struct StakingParamsUpdated {
    pub min_self_stake_floor: u64,
    pub unstake_delay: i64,
    pub updated_by: Pubkey,
    pub timestamp: i64,
}

/// Emitted when the market is paused or resumed
#[event]
pub struct ProtocolPaused {
    pub paused: bool,
    pub updated_by: Pubkey,
    pub timestamp: i64,
}

// ============================================================================
// Epochs
// ============================================================================

#[event]
pub struct EpochScheduled {
    pub epoch_id: u64,
    pub start: i64,
    pub timestamp: i64,
}

#[event]
pub struct EpochPopped {
    pub epoch_id: u64,
    pub start: i64,
    pub timestamp: i64,
}

/// Emitted when a stats bucket resets its recent window
#[event]
pub struct EpochRolledOver {
    /// Provider account, or the global stats account
    pub owner: Pubkey,
    pub from_epoch: u64,
    pub to_epoch: u64,
    pub timestamp: i64,
}

// ============================================================================
// Auction
// ============================================================================

/// Emitted when a proof request is accepted
#[event]
pub struct RequestAccepted {
    pub request_id: [u8; 32],
    pub requester: Pubkey,
    pub fee_ceiling: u64,
    pub min_stake: u64,
    pub bidding_end: i64,
    pub reveal_end: i64,
    pub deadline: i64,
    pub timestamp: i64,
}

/// Emitted when a sealed bid is placed or replaced
#[event]
pub struct BidPlaced {
    pub request_id: [u8; 32],
    pub provider: Pubkey,
    pub first_bid: bool,
    pub bidder_count: u32,
    pub timestamp: i64,
}

/// Emitted when a bid is revealed
#[event]
pub struct BidRevealed {
    pub request_id: [u8; 32],
    pub provider: Pubkey,
    pub fee: u64,
    /// 0 = winner, 1 = runner-up, 2 = unranked
    pub rank: u8,
    pub timestamp: i64,
}

/// Emitted when the winner's proof is accepted and the request settles
#[event]
pub struct ProofSubmitted {
    pub request_id: [u8; 32],
    pub provider: Pubkey,
    pub price: u64,
    pub protocol_fee: u64,
    pub provider_reward: u64,
    pub rebate: u64,
    pub proof_digest: [u8; 32],
    pub timestamp: i64,
}

/// Emitted when a request's escrow is returned
#[event]
pub struct RequestRefunded {
    pub request_id: [u8; 32],
    pub requester: Pubkey,
    pub amount: u64,
    /// 0 = deadline missed, 1 = no bids, 2 = no reveals
    pub reason: u8,
    /// Winner that failed to deliver, if any
    pub missed_provider: Option<Pubkey>,
    pub timestamp: i64,
}

/// Emitted when a winner is penalised for a missed deadline
#[event]
pub struct RequestSlashed {
    pub request_id: [u8; 32],
    pub provider: Pubkey,
    pub penalty: u64,
    pub slashed: u64,
    pub timestamp: i64,
}

// ============================================================================
// Providers and stake
// ============================================================================

#[event]
pub struct ProviderRegistered {
    pub provider: Pubkey,
    pub authority: Pubkey,
    pub submitter: Pubkey,
    pub min_self_stake: u64,
    pub commission_bps: u16,
    pub emission_commission_bps: u16,
    pub timestamp: i64,
}

#[event]
pub struct ProviderUpdated {
    pub provider: Pubkey,
    pub submitter: Pubkey,
    pub min_self_stake: u64,
    pub commission_bps: u16,
    pub emission_commission_bps: u16,
    pub timestamp: i64,
}

#[event]
pub struct ProviderStateChanged {
    pub provider: Pubkey,
    pub old_state: u8,
    pub new_state: u8,
    pub timestamp: i64,
}

/// Emitted when a provider's scale factor is cut
#[event]
pub struct ProviderSlashed {
    pub provider: Pubkey,
    pub amount: u64,
    pub old_scale: u128,
    pub new_scale: u128,
    pub deactivated: bool,
    pub timestamp: i64,
}

#[event]
pub struct StakeDeposited {
    pub provider: Pubkey,
    pub staker: Pubkey,
    pub amount: u64,
    pub raw_shares: u128,
    pub total_raw_shares: u128,
    pub timestamp: i64,
}

#[event]
pub struct UnstakeRequested {
    pub provider: Pubkey,
    pub staker: Pubkey,
    pub raw_shares: u128,
    /// Value at the time of the request; the payout uses the scale at completion
    pub value: u64,
    pub matures_at: i64,
    pub timestamp: i64,
}

#[event]
pub struct UnstakeCompleted {
    pub provider: Pubkey,
    pub staker: Pubkey,
    pub raw_shares: u128,
    pub amount: u64,
    pub timestamp: i64,
}

// ============================================================================
// Rewards
// ============================================================================

/// Emitted whenever rewards enter a provider's accumulator
#[event]
pub struct RewardsDeposited {
    pub provider: Pubkey,
    /// 0 = direct deposit, 1 = proof settlement, 2 = emission
    pub source: u8,
    pub amount: u64,
    pub commission: u64,
    pub to_stakers: u64,
    pub dust: u64,
    pub timestamp: i64,
}

#[event]
pub struct RewardsClaimed {
    pub provider: Pubkey,
    pub staker: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct CommissionWithdrawn {
    pub provider: Pubkey,
    pub authority: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct EmissionConfigured {
    pub old_rate: u64,
    pub new_rate: u64,
    pub updated_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct EmissionFunded {
    pub funder: Pubkey,
    pub amount: u64,
    pub remaining_budget: u64,
    pub timestamp: i64,
}

#[event]
pub struct DustWithdrawn {
    pub recipient: Pubkey,
    pub amount: u64,
    pub remaining: u64,
    pub timestamp: i64,
}
