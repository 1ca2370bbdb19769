//! Account state structures for the proof market

use anchor_lang::prelude::*;

use crate::instructions::constants::PRECISION;

// ============================================================================
// Size Constants
// ============================================================================

/// Size of cryptographic hashes and IDs (SHA256, Pubkey bytes)
pub const HASH_SIZE: usize = 32;

/// Maximum length of the program/input reference stored on a request
pub const MAX_PROGRAM_URI_LEN: usize = 128;

/// Maximum queued unstake entries per position
pub const MAX_PENDING_UNSTAKES: usize = 8;

/// Maximum epoch boundaries kept in the schedule (latest started + future)
pub const MAX_SCHEDULED_EPOCHS: usize = 32;

/// Current protocol version
pub const CURRENT_PROTOCOL_VERSION: u8 = 1;

/// Minimum protocol version this program still accepts
pub const MIN_SUPPORTED_VERSION: u8 = 1;

/// Proof request status
#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace,
)]
#[repr(u8)]
pub enum RequestStatus {
    #[default]
    Pending = 0,
    Fulfilled = 1,
    Refunded = 2,
    Slashed = 3,
}

impl RequestStatus {
    /// Validates whether a status transition is allowed.
    ///
    /// Valid transitions:
    /// - Pending → Fulfilled (winning provider submitted a valid proof)
    /// - Pending → Refunded (deadline passed, no bidders or no winner)
    /// - Refunded → Slashed (winner missed the deadline and was penalised)
    ///
    /// Fulfilled and Slashed are terminal.
    pub fn can_transition_to(&self, new_status: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, new_status),
            (Pending, Fulfilled) | (Pending, Refunded) | (Refunded, Slashed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Fulfilled | RequestStatus::Slashed)
    }
}

/// Provider lifecycle state
#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace,
)]
#[repr(u8)]
pub enum ProviderState {
    #[default]
    Null = 0,
    Active = 1,
    Retired = 2,
    Deactivated = 3,
    Jailed = 4,
}

impl ProviderState {
    /// Validates whether a provider state transition is allowed.
    ///
    /// - Null → Active (registration)
    /// - Active → Retired (voluntary exit)
    /// - Active → Deactivated (scale fell to the soft threshold)
    /// - Retired | Deactivated → Active (reactivation)
    /// - any registered state → Jailed (administrative)
    /// - Jailed → Retired (administrative release)
    pub fn can_transition_to(&self, new_state: ProviderState) -> bool {
        use ProviderState::*;
        matches!(
            (self, new_state),
            (Null, Active)
                | (Active, Retired)
                | (Active, Deactivated)
                | (Retired, Active)
                | (Deactivated, Active)
                | (Active, Jailed)
                | (Retired, Jailed)
                | (Deactivated, Jailed)
                | (Jailed, Retired)
        )
    }
}

/// Protocol configuration account
/// PDA seeds: ["protocol"]
#[account]
#[derive(InitSpace)]
pub struct ProtocolConfig {
    /// Protocol authority
    pub authority: Pubkey,
    /// Token account receiving protocol cuts and slashed stake
    pub treasury: Pubkey,
    /// Mint of the token used for fees, stake and rewards
    pub stake_mint: Pubkey,
    /// Program vault token account, owned by this config PDA
    pub vault: Pubkey,
    /// Program invoked to verify proofs
    pub verifier_program: Pubkey,
    /// Minimum fee ceiling a request must escrow
    pub min_fee: u64,
    /// Bidding phase length in seconds
    pub bidding_window: i64,
    /// Reveal phase length in seconds
    pub reveal_window: i64,
    /// Protocol cut of the settled price in basis points
    pub protocol_fee_bps: u16,
    /// Penalty as basis points of the request's minimum stake
    pub slash_bps: u16,
    /// Seconds after the deadline during which a refunded request can be slashed
    pub slash_window: i64,
    /// Per-call cap on a slash, in basis points of the provider's effective stake
    pub max_slash_bps: u16,
    /// Lowest minimum self stake a provider may declare
    pub min_self_stake_floor: u64,
    /// Delay in seconds between an unstake request and its payout
    pub unstake_delay: i64,
    /// Blocks every non-admin instruction when set
    pub paused: bool,
    /// Total requests accepted
    pub total_requests: u64,
    /// Total requests fulfilled
    pub fulfilled_requests: u64,
    /// Total value settled to providers and the treasury
    pub total_value_settled: u64,
    /// Bump seed for PDA
    pub bump: u8,
    /// Bump seed for the vault PDA
    pub vault_bump: u8,
    /// Multisig threshold
    pub multisig_threshold: u8,
    /// Length of configured multisig owners
    pub multisig_owners_len: u8,
    /// Current protocol version (for upgrades)
    pub protocol_version: u8,
    /// Minimum supported version for backward compatibility
    pub min_supported_version: u8,
    /// Reserved
    pub _padding: [u8; 2],
    /// Multisig owners, immutable after init.
    /// Only the first `multisig_owners_len` entries are valid.
    pub multisig_owners: [Pubkey; ProtocolConfig::MAX_MULTISIG_OWNERS],
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            authority: Pubkey::default(),
            treasury: Pubkey::default(),
            stake_mint: Pubkey::default(),
            vault: Pubkey::default(),
            verifier_program: Pubkey::default(),
            min_fee: 0,
            bidding_window: ProtocolConfig::DEFAULT_BIDDING_WINDOW,
            reveal_window: ProtocolConfig::DEFAULT_REVEAL_WINDOW,
            protocol_fee_bps: 100,
            slash_bps: ProtocolConfig::DEFAULT_SLASH_BPS,
            slash_window: ProtocolConfig::DEFAULT_SLASH_WINDOW,
            max_slash_bps: ProtocolConfig::DEFAULT_MAX_SLASH_BPS,
            min_self_stake_floor: 0,
            unstake_delay: ProtocolConfig::DEFAULT_UNSTAKE_DELAY,
            paused: false,
            total_requests: 0,
            fulfilled_requests: 0,
            total_value_settled: 0,
            bump: 0,
            vault_bump: 0,
            multisig_threshold: 0,
            multisig_owners_len: 0,
            protocol_version: CURRENT_PROTOCOL_VERSION,
            min_supported_version: MIN_SUPPORTED_VERSION,
            _padding: [0u8; 2],
            multisig_owners: [Pubkey::default(); ProtocolConfig::MAX_MULTISIG_OWNERS],
        }
    }
}

impl ProtocolConfig {
    pub const MAX_MULTISIG_OWNERS: usize = 5;
    pub const DEFAULT_BIDDING_WINDOW: i64 = 5 * 60; // 5 minutes
    pub const DEFAULT_REVEAL_WINDOW: i64 = 5 * 60; // 5 minutes
    pub const DEFAULT_SLASH_BPS: u16 = 1000; // 10% of the request's min stake
    pub const DEFAULT_SLASH_WINDOW: i64 = 7 * 24 * 60 * 60; // 7 days
    pub const DEFAULT_MAX_SLASH_BPS: u16 = 5000; // 50% per call
    pub const DEFAULT_UNSTAKE_DELAY: i64 = 7 * 24 * 60 * 60; // 7 days
    pub const SIZE: usize = 8 + // discriminator
        32 + // authority
        32 + // treasury
        32 + // stake_mint
        32 + // vault
        32 + // verifier_program
        8 +  // min_fee
        8 +  // bidding_window
        8 +  // reveal_window
        2 +  // protocol_fee_bps
        2 +  // slash_bps
        8 +  // slash_window
        2 +  // max_slash_bps
        8 +  // min_self_stake_floor
        8 +  // unstake_delay
        1 +  // paused
        8 +  // total_requests
        8 +  // fulfilled_requests
        8 +  // total_value_settled
        1 +  // bump
        1 +  // vault_bump
        1 +  // multisig_threshold
        1 +  // multisig_owners_len
        1 +  // protocol_version
        1 +  // min_supported_version
        2 +  // _padding
        (32 * Self::MAX_MULTISIG_OWNERS); // multisig_owners
}

/// A revealed bid held in one of the two ranked slots of a request
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
pub struct RankedBid {
    /// Provider account (PDA) that revealed the bid
    pub provider: Pubkey,
    pub fee: u64,
}

/// A proof request and its auction state
/// PDA seeds: ["request", request_id]
#[account]
#[derive(InitSpace, Default)]
pub struct ProofRequest {
    /// Content-derived request identifier
    pub request_id: [u8; 32],
    /// Requester-chosen nonce mixed into the id
    pub nonce: u64,
    pub requester: Pubkey,
    /// Verification key of the program to prove
    pub verification_key: [u8; 32],
    /// Digest of the expected public values
    pub public_values_digest: [u8; 32],
    /// Reference to the program and its inputs
    #[max_len(MAX_PROGRAM_URI_LEN)]
    pub program_uri: String,
    /// Amount escrowed by the requester; the most the market will pay
    pub fee_ceiling: u64,
    /// Minimum active stake a provider needs to bid
    pub min_stake: u64,
    pub deadline: i64,
    pub accepted_at: i64,
    pub bidding_end: i64,
    pub reveal_end: i64,
    /// Fee and slash parameters captured at acceptance
    pub protocol_fee_bps: u16,
    pub slash_bps: u16,
    pub slash_window: i64,
    pub status: RequestStatus,
    /// Number of distinct providers that placed a bid
    pub bidder_count: u32,
    /// Lowest revealed bid
    pub winner: Option<RankedBid>,
    /// Second-lowest revealed bid
    pub runner_up: Option<RankedBid>,
    /// SHA256 of the accepted proof (zero until fulfilled)
    pub proof_digest: [u8; 32],
    /// Price paid to the market on fulfilment
    pub settled_price: u64,
    /// Stake actually slashed from the winner
    pub slashed_amount: u64,
    /// Timestamp of fulfilment or refund
    pub resolved_at: i64,
    pub bump: u8,
}

impl ProofRequest {
    pub const SIZE: usize = 8 + // discriminator
        32 + // request_id
        8 +  // nonce
        32 + // requester
        32 + // verification_key
        32 + // public_values_digest
        (4 + MAX_PROGRAM_URI_LEN) + // program_uri
        8 +  // fee_ceiling
        8 +  // min_stake
        8 +  // deadline
        8 +  // accepted_at
        8 +  // bidding_end
        8 +  // reveal_end
        2 +  // protocol_fee_bps
        2 +  // slash_bps
        8 +  // slash_window
        1 +  // status
        4 +  // bidder_count
        (1 + 40) + // winner
        (1 + 40) + // runner_up
        32 + // proof_digest
        8 +  // settled_price
        8 +  // slashed_amount
        8 +  // resolved_at
        1; // bump
}

/// Sealed bid slot, one per (request, provider)
/// PDA seeds: ["bid", request, provider]
#[account]
#[derive(InitSpace, Default)]
pub struct SealedBid {
    pub request: Pubkey,
    pub provider: Pubkey,
    /// Domain-separated hash of (request, provider, fee, salt)
    pub commitment: [u8; 32],
    pub revealed: bool,
    pub revealed_fee: u64,
    pub placed_at: i64,
    pub bump: u8,
}

impl SealedBid {
    pub const SIZE: usize = 8 + 32 + 32 + 32 + 1 + 8 + 8 + 1;
}

/// Activity counters kept per bucket
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
pub struct StatsCounters {
    pub bids: u64,
    pub reveals: u64,
    pub fulfilled: u64,
    /// For a provider, refunds of requests it won but never fulfilled
    pub refunded: u64,
    pub missed: u64,
    pub fees_received: u64,
    pub last_active: i64,
}

/// Lifetime counters plus a window that resets at each epoch boundary
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
pub struct StatsBucket {
    pub lifetime: StatsCounters,
    pub recent: StatsCounters,
    /// Epoch the recent window belongs to
    pub epoch_id: u64,
}

/// Provider registration, share ledger and reward ledger
/// PDA seeds: ["provider", authority]
#[account]
#[derive(InitSpace)]
pub struct ProviderAccount {
    pub authority: Pubkey,
    /// Delegate allowed to bid and submit on the provider's behalf
    /// (`Pubkey::default()` = none)
    pub submitter: Pubkey,
    pub state: ProviderState,
    /// Self stake the provider commits to keep
    pub min_self_stake: u64,
    /// Active raw shares across all positions
    pub total_raw_shares: u128,
    /// Raw shares burned into unstake queues, still slashable
    pub pending_raw_shares: u128,
    /// Active raw shares of the authority's own position
    pub self_raw_shares: u128,
    /// Share price, PRECISION = unslashed
    pub scale: u128,
    /// Positions holding active or pending shares
    pub staker_count: u32,
    /// Commission on direct reward deposits (bps)
    pub commission_bps: u16,
    /// Commission on streaming emission (bps)
    pub emission_commission_bps: u16,
    /// Rewards per raw share, scaled by PRECISION
    pub acc_reward_per_share: u128,
    /// Commission owed to the provider authority
    pub banked_commission: u64,
    /// Emission accumulator value at the last settlement
    pub emission_baseline: u128,
    /// Total stake slashed from this provider
    pub total_slashed: u64,
    pub stats: StatsBucket,
    pub registered_at: i64,
    pub bump: u8,
}

impl Default for ProviderAccount {
    fn default() -> Self {
        Self {
            authority: Pubkey::default(),
            submitter: Pubkey::default(),
            state: ProviderState::Null,
            min_self_stake: 0,
            total_raw_shares: 0,
            pending_raw_shares: 0,
            self_raw_shares: 0,
            scale: PRECISION,
            staker_count: 0,
            commission_bps: 0,
            emission_commission_bps: 0,
            acc_reward_per_share: 0,
            banked_commission: 0,
            emission_baseline: 0,
            total_slashed: 0,
            stats: StatsBucket::default(),
            registered_at: 0,
            bump: 0,
        }
    }
}

impl ProviderAccount {
    pub const SIZE: usize = 8 + // discriminator
        32 + // authority
        32 + // submitter
        1 +  // state
        8 +  // min_self_stake
        16 + // total_raw_shares
        16 + // pending_raw_shares
        16 + // self_raw_shares
        16 + // scale
        4 +  // staker_count
        2 +  // commission_bps
        2 +  // emission_commission_bps
        16 + // acc_reward_per_share
        8 +  // banked_commission
        16 + // emission_baseline
        8 +  // total_slashed
        120 + // stats
        8 +  // registered_at
        1; // bump

    pub fn has_submitter(&self) -> bool {
        self.submitter != Pubkey::default()
    }

    pub fn is_active(&self) -> bool {
        self.state == ProviderState::Active
    }
}

/// A queued unstake, paid out once `requested_at + unstake_delay` has passed
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
pub struct UnstakeEntry {
    pub raw_shares: u128,
    pub requested_at: i64,
}

/// A staker's position with one provider
/// PDA seeds: ["stake", provider, staker]
#[account]
#[derive(InitSpace, Default)]
pub struct StakePosition {
    pub provider: Pubkey,
    pub staker: Pubkey,
    pub raw_shares: u128,
    /// raw_shares × acc_reward_per_share / PRECISION at the last settlement
    pub reward_debt: u128,
    /// Settled rewards not yet claimed
    pub banked_rewards: u64,
    /// FIFO unstake queue, oldest first
    #[max_len(MAX_PENDING_UNSTAKES)]
    pub pending: Vec<UnstakeEntry>,
    pub bump: u8,
}

impl StakePosition {
    pub const SIZE: usize = 8 + // discriminator
        32 + // provider
        32 + // staker
        16 + // raw_shares
        16 + // reward_debt
        8 +  // banked_rewards
        (4 + 24 * MAX_PENDING_UNSTAKES) + // pending
        1; // bump

    /// No active shares and nothing queued
    pub fn is_empty(&self) -> bool {
        self.raw_shares == 0 && self.pending.is_empty()
    }
}

/// Streaming emission state and the protocol dust pool
/// PDA seeds: ["reward_pool"]
#[account]
#[derive(InitSpace, Default)]
pub struct RewardPool {
    /// Tokens emitted per second
    pub emission_rate: u64,
    /// Tokens still available for emission
    pub remaining_budget: u64,
    /// Emission per unit of active effective stake, scaled by PRECISION
    pub acc_per_effective_stake: u128,
    pub last_update: i64,
    /// Sum of effective stake over Active providers
    pub total_active_stake: u64,
    /// Rounding remainders swept from reward distribution
    pub dust_pool: u64,
    /// Total taken from the emission budget
    pub total_emitted: u64,
    /// Emission not yet assigned to any provider, scaled by PRECISION.
    /// Always below one token.
    pub emission_carry: u128,
    pub bump: u8,
}

impl RewardPool {
    pub const SIZE: usize = 8 + 8 + 8 + 16 + 8 + 8 + 8 + 8 + 16 + 1;
}

/// Protocol-wide activity counters
/// PDA seeds: ["stats"]
#[account]
#[derive(InitSpace, Default)]
pub struct GlobalStats {
    pub stats: StatsBucket,
    pub bump: u8,
}

impl GlobalStats {
    pub const SIZE: usize = 8 + 120 + 1;
}

/// Ordered epoch boundaries
/// PDA seeds: ["epochs"]
///
/// `starts[i]` is the start of epoch `first_id + i`. Only the latest started
/// boundary and future boundaries are kept. Epoch 0 is the period before the
/// first boundary.
#[account]
#[derive(InitSpace)]
pub struct EpochSchedule {
    /// Id of the last scheduled epoch (0 = none)
    pub last_id: u64,
    /// Id of `starts[0]`
    pub first_id: u64,
    #[max_len(MAX_SCHEDULED_EPOCHS)]
    pub starts: Vec<i64>,
    pub bump: u8,
}

impl Default for EpochSchedule {
    fn default() -> Self {
        Self {
            last_id: 0,
            first_id: 1,
            starts: Vec::new(),
            bump: 0,
        }
    }
}

impl EpochSchedule {
    pub const SIZE: usize = 8 + 8 + 8 + (4 + 8 * MAX_SCHEDULED_EPOCHS) + 1;
}

/// Historical epoch record
/// PDA seeds: ["epoch", id_le]
#[account]
#[derive(InitSpace, Default)]
pub struct EpochRecord {
    pub id: u64,
    pub start: i64,
    /// Start of the next epoch, 0 while open
    pub end: i64,
    pub bump: u8,
}

impl EpochRecord {
    pub const SIZE: usize = 8 + 8 + 8 + 8 + 1;

    pub fn is_open(&self) -> bool {
        self.end == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_size_constant {
        ($struct:ty) => {
            assert_eq!(
                <$struct>::SIZE,
                <$struct as anchor_lang::Space>::INIT_SPACE + 8,
                concat!(stringify!($struct), "::SIZE mismatch with INIT_SPACE")
            );
        };
    }

    #[test]
    fn test_protocol_config_size() {
        test_size_constant!(ProtocolConfig);
    }

    #[test]
    fn test_proof_request_size() {
        test_size_constant!(ProofRequest);
    }

    #[test]
    fn test_sealed_bid_size() {
        test_size_constant!(SealedBid);
    }

    #[test]
    fn test_provider_account_size() {
        test_size_constant!(ProviderAccount);
    }

    #[test]
    fn test_stake_position_size() {
        test_size_constant!(StakePosition);
    }

    #[test]
    fn test_reward_pool_size() {
        test_size_constant!(RewardPool);
    }

    #[test]
    fn test_global_stats_size() {
        test_size_constant!(GlobalStats);
    }

    #[test]
    fn test_epoch_schedule_size() {
        test_size_constant!(EpochSchedule);
    }

    #[test]
    fn test_epoch_record_size() {
        test_size_constant!(EpochRecord);
    }

    mod request_status_transitions {
        use super::*;

        #[test]
        fn test_pending_transitions() {
            let s = RequestStatus::Pending;
            assert!(s.can_transition_to(RequestStatus::Fulfilled));
            assert!(s.can_transition_to(RequestStatus::Refunded));
            assert!(!s.can_transition_to(RequestStatus::Slashed));
            assert!(!s.can_transition_to(RequestStatus::Pending));
        }

        #[test]
        fn test_refunded_only_to_slashed() {
            let s = RequestStatus::Refunded;
            assert!(s.can_transition_to(RequestStatus::Slashed));
            assert!(!s.can_transition_to(RequestStatus::Fulfilled));
            assert!(!s.can_transition_to(RequestStatus::Pending));
        }

        #[test]
        fn test_terminal_states() {
            for terminal in [RequestStatus::Fulfilled, RequestStatus::Slashed] {
                assert!(terminal.is_terminal());
                for next in [
                    RequestStatus::Pending,
                    RequestStatus::Fulfilled,
                    RequestStatus::Refunded,
                    RequestStatus::Slashed,
                ] {
                    assert!(!terminal.can_transition_to(next));
                }
            }
            assert!(!RequestStatus::Refunded.is_terminal());
        }
    }

    mod provider_state_transitions {
        use super::*;

        #[test]
        fn test_registration() {
            assert!(ProviderState::Null.can_transition_to(ProviderState::Active));
            assert!(!ProviderState::Null.can_transition_to(ProviderState::Retired));
        }

        #[test]
        fn test_reactivation_sources() {
            assert!(ProviderState::Retired.can_transition_to(ProviderState::Active));
            assert!(ProviderState::Deactivated.can_transition_to(ProviderState::Active));
            assert!(!ProviderState::Jailed.can_transition_to(ProviderState::Active));
        }

        #[test]
        fn test_jail_release_goes_to_retired() {
            assert!(ProviderState::Jailed.can_transition_to(ProviderState::Retired));
            assert!(!ProviderState::Jailed.can_transition_to(ProviderState::Deactivated));
        }
    }

    #[test]
    fn test_provider_default_is_unslashed() {
        let provider = ProviderAccount::default();
        assert_eq!(provider.scale, PRECISION);
        assert_eq!(provider.state, ProviderState::Null);
        assert!(!provider.has_submitter());
    }

    #[test]
    fn test_position_is_empty() {
        let mut position = StakePosition::default();
        assert!(position.is_empty());
        position.pending.push(UnstakeEntry {
            raw_shares: 1,
            requested_at: 0,
        });
        assert!(!position.is_empty());
    }
}
