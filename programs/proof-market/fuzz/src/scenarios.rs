//! Multi-step simulations driving the program's own state-machine helpers
//!
//! Each simulation applies a sequence of operations to real account structs
//! and checks the invariants from `invariants.rs` after every step.

use anchor_lang::prelude::Pubkey;
use proof_market::instructions::auction_helpers::{
    calculate_settlement, derive_request_id, open_request, rank_revealed_bid, refund_reason,
    require_bidding_open, require_reveal_open, require_submission_open, slash_terms,
    transition_request, RefundReason, RequestTerms,
};
use proof_market::instructions::constants::{PRECISION, SCALE_SOFT_THRESHOLD};
use proof_market::instructions::ledger_helpers::{
    accepts_delegation, credit_shares, effective_amount, emission_weight, queue_unstake,
    shares_for_amount, slash_by_amount, slash_by_fraction, sweep_matured_unstakes,
};
use proof_market::instructions::reward_helpers::{
    advance_emission, distribute_rewards, reweight_active_stake, settle_position,
    settle_provider_emission, take_banked_rewards,
};
use proof_market::instructions::stats_helpers::{
    current_epoch_id, pop_epoch_boundary, record_stats, schedule_epoch_boundary, StatsEvent,
};
use proof_market::state::{
    EpochSchedule, ProofRequest, ProtocolConfig, ProviderAccount, ProviderState, RequestStatus,
    RewardPool, StakePosition, StatsBucket,
};

use crate::arbitrary::{
    AuctionInput, EmissionInput, EpochInput, EpochOp, LedgerInput, LedgerOp, LifecycleInput,
    LifecycleOp, MAX_EMITTERS, MAX_STAKERS,
};
use crate::invariants::*;

/// Bidding and reveal windows used by simulated requests
pub const SIM_WINDOW: i64 = 100;

/// Maximum distinct bidders in a lifecycle simulation
pub const MAX_BIDDERS: usize = 8;

/// Result of a simulated instruction sequence
#[derive(Debug, Clone)]
pub enum SimulationResult {
    Success,
    Error(String),
    InvariantViolation(String),
}

impl SimulationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SimulationResult::Success)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SimulationResult::Error(_))
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, SimulationResult::InvariantViolation(_))
    }
}

/// Return the violation alongside the simulated state unless `$check`
/// yields `$valid`.
macro_rules! ensure_valid {
    ($check:expr, $valid:path, $($state:expr),+) => {{
        let result = $check;
        if result != $valid {
            return (
                SimulationResult::InvariantViolation(format!("{:?}", result)),
                $($state),+
            );
        }
    }};
}

pub fn sim_key(index: usize) -> Pubkey {
    Pubkey::new_from_array([index as u8 + 1; 32])
}

/// A freshly accepted request at time 0 with both windows `SIM_WINDOW` long.
pub fn simulated_request(
    fee_ceiling: u64,
    min_stake: u64,
    protocol_fee_bps: u16,
    slash_bps: u16,
    slash_window: i64,
    deadline_slack: i64,
) -> ProofRequest {
    let config = ProtocolConfig {
        bidding_window: SIM_WINDOW,
        reveal_window: SIM_WINDOW,
        protocol_fee_bps,
        slash_bps,
        slash_window,
        ..ProtocolConfig::default()
    };
    let terms = RequestTerms {
        nonce: 0,
        verification_key: [1u8; 32],
        public_values_digest: [2u8; 32],
        program_uri: String::new(),
        fee_ceiling,
        min_stake,
        deadline: 2 * SIM_WINDOW + deadline_slack.max(1),
    };
    let request_id = derive_request_id(terms.nonce, &terms.verification_key, &terms.public_values_digest);
    let mut request = ProofRequest::default();
    open_request(&mut request, &config, request_id, sim_key(200), terms, 0)
        .expect("simulated request terms are valid");
    request
}

/// Active provider with scale 1.0 and no stake.
pub fn simulated_provider(min_self_stake: u64, commission_bps: u16) -> ProviderAccount {
    ProviderAccount {
        authority: sim_key(0),
        state: ProviderState::Active,
        min_self_stake,
        commission_bps,
        emission_commission_bps: commission_bps,
        scale: PRECISION,
        ..ProviderAccount::default()
    }
}

// ============================================================================
// Auction ranking and settlement
// ============================================================================

/// Reveal every fee in order, checking the ranking after each, then settle.
pub fn simulate_auction(input: &AuctionInput) -> (SimulationResult, ProofRequest) {
    let mut request = simulated_request(input.fee_ceiling, 0, input.protocol_fee_bps, 0, 0, 1);

    for (index, fee) in input.reveals.iter().enumerate() {
        rank_revealed_bid(&mut request, sim_key(index), *fee);
        let revealed = &input.reveals[..=index];
        let result = check_ranking(&request, revealed);
        if result != AuctionInvariantResult::Valid {
            return (SimulationResult::InvariantViolation(format!("{:?}", result)), request);
        }

        // Ties never displace: the winner is the earliest minimal reveal
        let minimum = revealed.iter().copied().min().unwrap_or_default();
        let first = revealed.iter().position(|f| *f == minimum).unwrap_or_default();
        if request.winner.map(|w| w.provider) != Some(sim_key(first)) {
            return (
                SimulationResult::InvariantViolation(format!(
                    "tie displaced earlier reveal: winner {:?}, expected index {}",
                    request.winner, first
                )),
                request,
            );
        }
    }

    let result = match calculate_settlement(&request) {
        Ok(settlement) => {
            if request.winner.is_none() {
                SimulationResult::InvariantViolation("settled without a winner".to_string())
            } else {
                match check_settlement(&request, &settlement) {
                    AuctionInvariantResult::Valid => SimulationResult::Success,
                    violation => SimulationResult::InvariantViolation(format!("{:?}", violation)),
                }
            }
        }
        Err(e) if request.winner.is_none() => SimulationResult::Error(format!("{:?}", e)),
        Err(e) => SimulationResult::InvariantViolation(format!("settlement failed: {:?}", e)),
    };
    (result, request)
}

// ============================================================================
// Request lifecycle
// ============================================================================

/// Drive a request through an arbitrary sequence of bids, reveals,
/// submissions, refunds, slashes and clock advances.
pub fn simulate_request_lifecycle(input: &LifecycleInput) -> (SimulationResult, ProofRequest) {
    let mut request = simulated_request(
        input.fee_ceiling,
        input.min_stake,
        100,
        input.slash_bps,
        input.slash_window,
        input.deadline_slack,
    );
    let mut now = 0i64;
    let mut revealed = [false; MAX_BIDDERS];

    for op in input.ops.iter() {
        let before = request.status;

        match *op {
            LifecycleOp::Bid => {
                if require_bidding_open(&request, now).is_ok()
                    && (request.bidder_count as usize) < MAX_BIDDERS
                {
                    request.bidder_count += 1;
                }
            }
            LifecycleOp::Reveal { fee } => {
                let next = (0..request.bidder_count as usize).find(|i| !revealed[*i]);
                if let Some(index) = next {
                    if require_reveal_open(&request, now).is_ok() && fee <= request.fee_ceiling {
                        rank_revealed_bid(&mut request, sim_key(index), fee);
                        revealed[index] = true;
                    }
                }
            }
            LifecycleOp::Submit => {
                if require_submission_open(&request, now).is_ok() && request.winner.is_some() {
                    let settlement = match calculate_settlement(&request) {
                        Ok(settlement) => settlement,
                        Err(e) => {
                            return (
                                SimulationResult::InvariantViolation(format!(
                                    "winner present but settlement failed: {:?}",
                                    e
                                )),
                                request,
                            )
                        }
                    };
                    ensure_valid!(
                        check_settlement(&request, &settlement),
                        AuctionInvariantResult::Valid,
                        request
                    );
                    if transition_request(&mut request, RequestStatus::Fulfilled).is_err() {
                        return (
                            SimulationResult::InvariantViolation(
                                "submission window open but fulfil rejected".to_string(),
                            ),
                            request,
                        );
                    }
                    request.settled_price = settlement.price;
                }
            }
            LifecycleOp::Refund => {
                if let Ok(reason) = refund_reason(&request, now) {
                    let consistent = match reason {
                        RefundReason::DeadlineMissed => now > request.deadline,
                        RefundReason::NoBids => {
                            request.bidder_count == 0 && now > request.bidding_end
                        }
                        RefundReason::NoReveals => {
                            request.winner.is_none() && now > request.reveal_end
                        }
                    };
                    if !consistent {
                        return (
                            SimulationResult::InvariantViolation(format!(
                                "refund {:?} granted at {} for {:?}",
                                reason, now, request.status
                            )),
                            request,
                        );
                    }
                    // A winner can still deliver until the deadline
                    if request.winner.is_some() && now <= request.deadline {
                        return (
                            SimulationResult::InvariantViolation(
                                "refund pre-empted a live winner".to_string(),
                            ),
                            request,
                        );
                    }
                    let _ = transition_request(&mut request, RequestStatus::Refunded);
                }
            }
            LifecycleOp::Slash => {
                if let Ok((winner, penalty)) = slash_terms(&request, now) {
                    if Some(winner) != request.winner || penalty > request.min_stake {
                        return (
                            SimulationResult::InvariantViolation(format!(
                                "slash terms {:?} {} inconsistent",
                                winner, penalty
                            )),
                            request,
                        );
                    }
                    if now > request.deadline + request.slash_window {
                        return (
                            SimulationResult::InvariantViolation(
                                "slash allowed after its window".to_string(),
                            ),
                            request,
                        );
                    }
                    let _ = transition_request(&mut request, RequestStatus::Slashed);
                }
            }
            LifecycleOp::Advance { seconds } => now += seconds,
        }

        ensure_valid!(
            check_status_transition(before, request.status),
            RequestInvariantResult::Valid,
            request
        );
        if let (Some(winner), Some(runner_up)) = (request.winner, request.runner_up) {
            if winner.fee > runner_up.fee {
                return (
                    SimulationResult::InvariantViolation(format!(
                        "winner {} above runner-up {}",
                        winner.fee, runner_up.fee
                    )),
                    request,
                );
            }
        }
    }

    (SimulationResult::Success, request)
}

// ============================================================================
// Stake ledger and rewards
// ============================================================================

/// Vault-side bookkeeping of a ledger simulation
#[derive(Debug, Clone, Default)]
pub struct LedgerTotals {
    /// Stake tokens held for stakers
    pub held: u64,
    pub slashed: u64,
    pub paid_out: u64,
    /// Reward tokens routed to stakers, net of dust
    pub rewards_available: u128,
    pub rewards_claimed: u128,
}

fn new_positions() -> Vec<StakePosition> {
    (0..MAX_STAKERS as usize)
        .map(|index| StakePosition {
            provider: sim_key(100),
            staker: sim_key(index),
            ..StakePosition::default()
        })
        .collect()
}

/// Apply an arbitrary sequence of stake, unstake, slash and reward
/// operations to one provider.
pub fn simulate_ledger(
    input: &LedgerInput,
) -> (SimulationResult, ProviderAccount, Vec<StakePosition>, LedgerTotals) {
    let mut provider = simulated_provider(input.min_self_stake, input.commission_bps);
    let mut positions = new_positions();
    let mut totals = LedgerTotals::default();
    let mut now = 0i64;

    macro_rules! violation {
        ($($arg:tt)*) => {
            return (
                SimulationResult::InvariantViolation(format!($($arg)*)),
                provider,
                positions,
                totals,
            )
        };
    }

    for op in input.ops.iter() {
        let old_scale = provider.scale;
        let old_acc = provider.acc_reward_per_share;
        // A failed instruction reverts every account it touched
        let snapshot = (provider.clone(), positions.clone());
        let mut reverted = false;

        match *op {
            LedgerOp::Stake { staker, amount } => {
                let is_self = staker == 0;
                let accepted = is_self || accepts_delegation(&provider).unwrap_or(false);
                let position = &mut positions[staker as usize];
                if accepted && credit_shares(&mut provider, position, amount, is_self).is_ok() {
                    totals.held += amount;
                } else {
                    reverted = true;
                }
            }
            LedgerOp::Unstake {
                staker,
                fraction_bps,
            } => {
                let position = &mut positions[staker as usize];
                let raw = position.raw_shares * fraction_bps as u128 / 10_000;
                if queue_unstake(&mut provider, position, raw, staker == 0, now).is_err() {
                    reverted = true;
                }
            }
            LedgerOp::Complete { staker } => {
                let position = &mut positions[staker as usize];
                let queued_before = position.pending.len();
                match sweep_matured_unstakes(&mut provider, position, input.unstake_delay, now) {
                    Ok(sweep) => {
                        if sweep.entries == 0 || sweep.entries > queued_before {
                            violation!("sweep removed {} of {}", sweep.entries, queued_before);
                        }
                        if sweep.amount > totals.held {
                            violation!("payout {} exceeds held {}", sweep.amount, totals.held);
                        }
                        totals.held -= sweep.amount;
                        totals.paid_out += sweep.amount;
                    }
                    Err(_) => reverted = true,
                }
            }
            LedgerOp::Slash { fraction_bps } => {
                let was_active = provider.is_active();
                match slash_by_fraction(&mut provider, fraction_bps, input.max_slash_bps) {
                    Ok(outcome) => {
                        if outcome.slashed > totals.held {
                            violation!("slashed {} exceeds held {}", outcome.slashed, totals.held);
                        }
                        totals.held -= outcome.slashed;
                        totals.slashed += outcome.slashed;
                        let expect_deactivated =
                            was_active && outcome.new_scale <= SCALE_SOFT_THRESHOLD;
                        if outcome.deactivated != expect_deactivated {
                            violation!("deactivation mismatch at scale {}", outcome.new_scale);
                        }
                    }
                    Err(_) => {
                        if provider.scale != old_scale {
                            violation!("rejected slash changed scale");
                        }
                    }
                }
            }
            LedgerOp::SlashAmount { amount } => {
                match slash_by_amount(&mut provider, amount, input.max_slash_bps) {
                    Ok(outcome) => {
                        if outcome.slashed > amount {
                            violation!("slashed {} above requested {}", outcome.slashed, amount);
                        }
                        if outcome.slashed > totals.held {
                            violation!("slashed {} exceeds held {}", outcome.slashed, totals.held);
                        }
                        totals.held -= outcome.slashed;
                        totals.slashed += outcome.slashed;
                    }
                    Err(_) => {
                        if provider.scale != old_scale {
                            violation!("rejected slash changed scale");
                        }
                    }
                }
            }
            LedgerOp::Deposit { amount } => {
                let commission_bps = provider.commission_bps;
                match distribute_rewards(&mut provider, amount, commission_bps) {
                    Ok(split) => {
                        if split.commission + split.to_stakers != amount {
                            violation!("split {:?} does not sum to {}", split, amount);
                        }
                        totals.rewards_available += (split.to_stakers - split.dust) as u128;
                    }
                    Err(_) => reverted = true,
                }
            }
            LedgerOp::Claim { staker } => {
                let position = &mut positions[staker as usize];
                let claimed = settle_position(&provider, position)
                    .and_then(|_| take_banked_rewards(position));
                match claimed {
                    Ok(amount) => totals.rewards_claimed += amount as u128,
                    Err(_) => reverted = true,
                }
            }
            LedgerOp::Advance { seconds } => now += seconds,
        }

        if reverted {
            (provider, positions) = snapshot;
        }

        ensure_valid!(
            check_share_conservation(&provider, &positions),
            LedgerInvariantResult::Valid,
            provider,
            positions,
            totals
        );
        ensure_valid!(
            check_scale(old_scale, provider.scale, false),
            LedgerInvariantResult::Valid,
            provider,
            positions,
            totals
        );
        ensure_valid!(
            check_accumulator_monotonic(old_acc, provider.acc_reward_per_share),
            RewardInvariantResult::Valid,
            provider,
            positions,
            totals
        );
        let owed = match effective_amount(
            provider.total_raw_shares + provider.pending_raw_shares,
            provider.scale,
        ) {
            Ok(owed) => owed,
            Err(e) => violation!("valuation overflowed: {:?}", e),
        };
        ensure_valid!(
            check_value_backed(owed, totals.held),
            LedgerInvariantResult::Valid,
            provider,
            positions,
            totals
        );
        let banked: u128 = positions.iter().map(|p| p.banked_rewards as u128).sum();
        ensure_valid!(
            check_rewards_bounded(totals.rewards_claimed + banked, totals.rewards_available),
            RewardInvariantResult::Valid,
            provider,
            positions,
            totals
        );
    }

    (SimulationResult::Success, provider, positions, totals)
}

/// Apply successive fraction slashes to a staked provider.
pub fn simulate_slashing(
    stake: u64,
    fractions: &[u16],
    max_slash_bps: u16,
) -> (SimulationResult, ProviderAccount) {
    let mut provider = simulated_provider(0, 0);
    let mut position = StakePosition::default();
    if credit_shares(&mut provider, &mut position, stake, true).is_err() {
        return (SimulationResult::Error("stake rejected".to_string()), provider);
    }

    for fraction_bps in fractions {
        let old_scale = provider.scale;
        let old_value = effective_amount(provider.total_raw_shares, old_scale).unwrap_or_default();
        match slash_by_fraction(&mut provider, *fraction_bps, max_slash_bps) {
            Ok(outcome) => {
                ensure_valid!(
                    check_scale(old_scale, outcome.new_scale, false),
                    LedgerInvariantResult::Valid,
                    provider
                );
                let new_value =
                    effective_amount(provider.total_raw_shares, provider.scale).unwrap_or_default();
                if old_value - new_value != outcome.slashed {
                    return (
                        SimulationResult::InvariantViolation(format!(
                            "value dropped {} but reported {}",
                            old_value - new_value,
                            outcome.slashed
                        )),
                        provider,
                    );
                }
                let cap = old_value as u128 * max_slash_bps as u128 / 10_000;
                if outcome.slashed as u128 > cap + 2 {
                    return (
                        SimulationResult::InvariantViolation(format!(
                            "slashed {} above per-call cap {}",
                            outcome.slashed, cap
                        )),
                        provider,
                    );
                }
            }
            Err(_) => {
                if provider.scale != old_scale {
                    return (
                        SimulationResult::InvariantViolation(
                            "rejected slash changed scale".to_string(),
                        ),
                        provider,
                    );
                }
            }
        }
    }

    (SimulationResult::Success, provider)
}

// ============================================================================
// Streaming emission
// ============================================================================

/// Advance emission over arbitrary time steps while several providers'
/// active stake changes. Every provider settles after each advance, so the
/// emitted total must be exactly split between providers and dust.
pub fn simulate_emission(input: &EmissionInput) -> (SimulationResult, RewardPool) {
    let mut pool = RewardPool {
        emission_rate: input.emission_rate,
        remaining_budget: input.budget,
        ..RewardPool::default()
    };
    let mut providers: Vec<ProviderAccount> = (0..MAX_EMITTERS)
        .map(|_| simulated_provider(0, 1_000))
        .collect();
    let mut now = 0i64;
    let mut credited = 0u64;
    // Deposit-level dust swept while routing emission into providers
    let mut deposit_dust = 0u64;

    for (seconds, index, stake) in input.steps.iter() {
        now += seconds;
        let old_acc = pool.acc_per_effective_stake;
        if let Err(e) = advance_emission(&mut pool, now) {
            return (SimulationResult::Error(format!("{:?}", e)), pool);
        }
        ensure_valid!(
            check_accumulator_monotonic(old_acc, pool.acc_per_effective_stake),
            RewardInvariantResult::Valid,
            pool
        );

        for provider in providers.iter_mut() {
            match settle_provider_emission(provider, &mut pool) {
                Ok(split) => {
                    credited += split.commission + split.to_stakers;
                    deposit_dust += split.dust;
                }
                Err(e) => return (SimulationResult::Error(format!("{:?}", e)), pool),
            }
        }

        if pool.total_emitted + pool.remaining_budget != input.budget {
            return (
                SimulationResult::InvariantViolation(format!(
                    "emitted {} + remaining {} != budget {}",
                    pool.total_emitted, pool.remaining_budget, input.budget
                )),
                pool,
            );
        }
        ensure_valid!(
            check_emission_conserved(
                credited,
                pool.dust_pool - deposit_dust,
                pool.remaining_budget,
                input.budget
            ),
            RewardInvariantResult::Valid,
            pool
        );
        if pool.emission_carry != 0 {
            return (
                SimulationResult::InvariantViolation(format!(
                    "carry {} left after every provider settled",
                    pool.emission_carry
                )),
                pool,
            );
        }

        let provider = &mut providers[*index as usize];
        let before = emission_weight(provider).unwrap_or_default();
        provider.total_raw_shares = shares_for_amount(*stake, provider.scale).unwrap_or_default();
        let after = emission_weight(provider).unwrap_or_default();
        if let Err(e) = reweight_active_stake(&mut pool, before, after) {
            return (
                SimulationResult::InvariantViolation(format!("reweight failed: {:?}", e)),
                pool,
            );
        }
    }

    (SimulationResult::Success, pool)
}

// ============================================================================
// Epochs and stats
// ============================================================================

fn stats_event(kind: u8, fee: u64) -> StatsEvent {
    match kind {
        0 => StatsEvent::Bid,
        1 => StatsEvent::Reveal,
        2 => StatsEvent::Fulfilled { fee },
        3 => StatsEvent::Refunded,
        _ => StatsEvent::Missed,
    }
}

/// Interleave epoch scheduling, pops and activity recording over time.
pub fn simulate_epochs(input: &EpochInput) -> (SimulationResult, EpochSchedule, StatsBucket) {
    let mut schedule = EpochSchedule::default();
    let mut bucket = StatsBucket::default();
    let mut now = 1_000i64;
    let mut observed_epoch = 0u64;

    macro_rules! violation {
        ($($arg:tt)*) => {
            return (
                SimulationResult::InvariantViolation(format!($($arg)*)),
                schedule,
                bucket,
            )
        };
    }

    for op in input.ops.iter() {
        let epoch_before = current_epoch_id(&schedule, now);
        match *op {
            EpochOp::Schedule { offset } => {
                let base = schedule.starts.last().copied().unwrap_or(now).max(now);
                let last_id = schedule.last_id;
                let snapshot = schedule.clone();
                match schedule_epoch_boundary(&mut schedule, base + offset, now) {
                    Ok(id) => {
                        if id != last_id + 1 {
                            violation!("scheduled id {} after {}", id, last_id);
                        }
                    }
                    Err(_) => {
                        if schedule.last_id != last_id {
                            violation!("rejected schedule changed last id");
                        }
                        schedule = snapshot;
                    }
                }
            }
            EpochOp::Pop => {
                let last_id = schedule.last_id;
                if let Ok((id, start)) = pop_epoch_boundary(&mut schedule, now) {
                    if id != last_id || start <= now {
                        violation!("popped epoch {} starting {} at {}", id, start, now);
                    }
                }
            }
            EpochOp::Record { kind, fee } => {
                let before = bucket;
                let epoch = current_epoch_id(&schedule, now);
                let rolled = record_stats(&mut bucket, stats_event(kind, fee), epoch, now);
                ensure_valid!(
                    check_stats_bucket(&before, &bucket),
                    StatsInvariantResult::Valid,
                    schedule,
                    bucket
                );
                if rolled.is_some() != (epoch > before.epoch_id) {
                    violation!("rollover {:?} from {} to {}", rolled, before.epoch_id, epoch);
                }
                if rolled.is_some() && bucket.recent.last_active != now {
                    violation!("rolled bucket lost the new event");
                }
            }
            EpochOp::Advance { seconds } => now += seconds,
        }

        // Schedule changes only touch future boundaries
        let epoch_after = current_epoch_id(&schedule, now);
        if !matches!(op, EpochOp::Advance { .. }) && epoch_after != epoch_before {
            violation!("epoch at {} moved from {} to {}", now, epoch_before, epoch_after);
        }
        if epoch_after < observed_epoch {
            violation!("epoch went backwards from {} to {}", observed_epoch, epoch_after);
        }
        observed_epoch = epoch_after;
    }

    (SimulationResult::Success, schedule, bucket)
}
