//! Market invariant checking for fuzz testing

use proof_market::instructions::auction_helpers::Settlement;
use proof_market::instructions::constants::SCALE_HARD_FLOOR;
use proof_market::state::{ProofRequest, ProviderAccount, RequestStatus, StakePosition, StatsBucket};

/// Auction invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionInvariantResult {
    Valid,
    RankingOrderViolation { winner: u64, runner_up: u64 },
    WinnerNotMinimum { winner: u64, minimum: u64 },
    PriceAboveCeiling { price: u64, ceiling: u64 },
    PriceBelowWinnerFee { price: u64, winner: u64 },
    SettlementNotConserved { price: u64, rebate: u64, ceiling: u64 },
    SplitNotConserved { protocol_fee: u64, provider_reward: u64, price: u64 },
}

/// Request status invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestInvariantResult {
    Valid,
    InvalidStateTransition { from: u8, to: u8 },
    TerminalStateModified { status: u8 },
}

/// Stake ledger invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerInvariantResult {
    Valid,
    ShareConservation { positions: u128, provider: u128 },
    PendingConservation { positions: u128, provider: u128 },
    SelfSharesExceedTotal { self_shares: u128, total: u128 },
    ScaleIncreased { old_scale: u128, new_scale: u128 },
    ScaleAtFloor { scale: u128 },
    ValueCreated { owed: u64, held: u64 },
}

/// Reward accumulator invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardInvariantResult {
    Valid,
    AccumulatorDecreased { old: u128, new: u128 },
    OverDistributed { claimed: u128, available: u128 },
    EmissionNotConserved { emitted: u64, dust: u64, remaining: u64, budget: u64 },
}

/// Stats bucket invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsInvariantResult {
    Valid,
    RecentExceedsLifetime { field: &'static str, recent: u64, lifetime: u64 },
    LifetimeDecreased { field: &'static str, old: u64, new: u64 },
    EpochWentBackwards { old: u64, new: u64 },
}

// ============================================================================
// Auction
// ============================================================================

/// `winner.fee <= runner_up.fee` once both exist, and the winner holds the
/// lowest fee revealed so far.
pub fn check_ranking(request: &ProofRequest, revealed: &[u64]) -> AuctionInvariantResult {
    let winner = match request.winner {
        Some(winner) => winner,
        None => return AuctionInvariantResult::Valid,
    };
    if let Some(runner_up) = request.runner_up {
        if winner.fee > runner_up.fee {
            return AuctionInvariantResult::RankingOrderViolation {
                winner: winner.fee,
                runner_up: runner_up.fee,
            };
        }
    }
    if let Some(minimum) = revealed.iter().copied().min() {
        if winner.fee != minimum {
            return AuctionInvariantResult::WinnerNotMinimum {
                winner: winner.fee,
                minimum,
            };
        }
    }
    AuctionInvariantResult::Valid
}

/// Settlement pays at most the ceiling, never below the winning fee, and
/// splits the escrow exactly.
pub fn check_settlement(request: &ProofRequest, settlement: &Settlement) -> AuctionInvariantResult {
    let winner_fee = request.winner.map(|w| w.fee).unwrap_or_default();
    if settlement.price > request.fee_ceiling {
        return AuctionInvariantResult::PriceAboveCeiling {
            price: settlement.price,
            ceiling: request.fee_ceiling,
        };
    }
    if settlement.price < winner_fee {
        return AuctionInvariantResult::PriceBelowWinnerFee {
            price: settlement.price,
            winner: winner_fee,
        };
    }
    if settlement.price as u128 + settlement.rebate as u128 != request.fee_ceiling as u128 {
        return AuctionInvariantResult::SettlementNotConserved {
            price: settlement.price,
            rebate: settlement.rebate,
            ceiling: request.fee_ceiling,
        };
    }
    if settlement.protocol_fee as u128 + settlement.provider_reward as u128
        != settlement.price as u128
    {
        return AuctionInvariantResult::SplitNotConserved {
            protocol_fee: settlement.protocol_fee,
            provider_reward: settlement.provider_reward,
            price: settlement.price,
        };
    }
    AuctionInvariantResult::Valid
}

// ============================================================================
// Request status
// ============================================================================

pub fn check_status_transition(from: RequestStatus, to: RequestStatus) -> RequestInvariantResult {
    if from == to {
        return RequestInvariantResult::Valid;
    }
    if from.is_terminal() {
        return RequestInvariantResult::TerminalStateModified { status: from as u8 };
    }
    let allowed = matches!(
        (from, to),
        (RequestStatus::Pending, RequestStatus::Fulfilled)
            | (RequestStatus::Pending, RequestStatus::Refunded)
            | (RequestStatus::Refunded, RequestStatus::Slashed)
    );
    if allowed {
        RequestInvariantResult::Valid
    } else {
        RequestInvariantResult::InvalidStateTransition {
            from: from as u8,
            to: to as u8,
        }
    }
}

// ============================================================================
// Stake ledger
// ============================================================================

/// Position raw shares and queued shares sum to the provider's totals.
pub fn check_share_conservation(
    provider: &ProviderAccount,
    positions: &[StakePosition],
) -> LedgerInvariantResult {
    let active: u128 = positions.iter().map(|p| p.raw_shares).sum();
    if active != provider.total_raw_shares {
        return LedgerInvariantResult::ShareConservation {
            positions: active,
            provider: provider.total_raw_shares,
        };
    }
    let pending: u128 = positions
        .iter()
        .flat_map(|p| p.pending.iter())
        .map(|entry| entry.raw_shares)
        .sum();
    if pending != provider.pending_raw_shares {
        return LedgerInvariantResult::PendingConservation {
            positions: pending,
            provider: provider.pending_raw_shares,
        };
    }
    if provider.self_raw_shares > provider.total_raw_shares {
        return LedgerInvariantResult::SelfSharesExceedTotal {
            self_shares: provider.self_raw_shares,
            total: provider.total_raw_shares,
        };
    }
    LedgerInvariantResult::Valid
}

/// Scale only falls, except the full-exit reset, and never reaches the floor.
pub fn check_scale(old_scale: u128, new_scale: u128, reset_allowed: bool) -> LedgerInvariantResult {
    if new_scale <= SCALE_HARD_FLOOR {
        return LedgerInvariantResult::ScaleAtFloor { scale: new_scale };
    }
    if new_scale > old_scale && !reset_allowed {
        return LedgerInvariantResult::ScaleIncreased {
            old_scale,
            new_scale,
        };
    }
    LedgerInvariantResult::Valid
}

/// Tokens owed to stakers never exceed the tokens the vault holds for them.
pub fn check_value_backed(owed: u64, held: u64) -> LedgerInvariantResult {
    if owed > held {
        LedgerInvariantResult::ValueCreated { owed, held }
    } else {
        LedgerInvariantResult::Valid
    }
}

// ============================================================================
// Rewards
// ============================================================================

pub fn check_accumulator_monotonic(old: u128, new: u128) -> RewardInvariantResult {
    if new < old {
        RewardInvariantResult::AccumulatorDecreased { old, new }
    } else {
        RewardInvariantResult::Valid
    }
}

/// Claims and banked amounts never exceed what was routed to stakers.
pub fn check_rewards_bounded(claimed: u128, available: u128) -> RewardInvariantResult {
    if claimed > available {
        RewardInvariantResult::OverDistributed { claimed, available }
    } else {
        RewardInvariantResult::Valid
    }
}

/// Everything taken from the budget is either credited or swept as dust.
pub fn check_emission_conserved(
    emitted: u64,
    dust: u64,
    remaining: u64,
    budget: u64,
) -> RewardInvariantResult {
    if emitted as u128 + dust as u128 + remaining as u128 != budget as u128 {
        RewardInvariantResult::EmissionNotConserved {
            emitted,
            dust,
            remaining,
            budget,
        }
    } else {
        RewardInvariantResult::Valid
    }
}

// ============================================================================
// Stats
// ============================================================================

fn counter_pairs(bucket: &StatsBucket) -> [(&'static str, u64, u64); 6] {
    [
        ("bids", bucket.recent.bids, bucket.lifetime.bids),
        ("reveals", bucket.recent.reveals, bucket.lifetime.reveals),
        ("fulfilled", bucket.recent.fulfilled, bucket.lifetime.fulfilled),
        ("refunded", bucket.recent.refunded, bucket.lifetime.refunded),
        ("missed", bucket.recent.missed, bucket.lifetime.missed),
        (
            "fees_received",
            bucket.recent.fees_received,
            bucket.lifetime.fees_received,
        ),
    ]
}

/// Recent counters never exceed lifetime counters; lifetime counters and
/// the cached epoch never go backwards.
pub fn check_stats_bucket(before: &StatsBucket, after: &StatsBucket) -> StatsInvariantResult {
    if after.epoch_id < before.epoch_id {
        return StatsInvariantResult::EpochWentBackwards {
            old: before.epoch_id,
            new: after.epoch_id,
        };
    }
    for ((field, _, old), (_, recent, lifetime)) in
        counter_pairs(before).into_iter().zip(counter_pairs(after))
    {
        if recent > lifetime {
            return StatsInvariantResult::RecentExceedsLifetime {
                field,
                recent,
                lifetime,
            };
        }
        if lifetime < old {
            return StatsInvariantResult::LifetimeDecreased {
                field,
                old,
                new: lifetime,
            };
        }
    }
    StatsInvariantResult::Valid
}
