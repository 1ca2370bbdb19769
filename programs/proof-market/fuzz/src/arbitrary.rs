//! Arbitrary input generators for fuzz testing
//!
//! Generates random but well-formed inputs for the market's state machines.

use proptest::prelude::*;

/// Arbitrary token amount with edge cases
pub fn arb_amount() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        Just(1u64),
        Just(u64::MAX / 4),
        1_000u64..1_000_000u64,
        1_000_000u64..1_000_000_000_000u64,
        1_000_000_000_000u64..1_000_000_000_000_000_000u64,
    ]
}

/// Non-zero stake deposit, bounded so sums cannot overflow u64
pub fn arb_stake_amount() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(1u64),
        Just(1_000_000_000u64),
        1u64..1_000u64,
        1_000u64..1_000_000_000_000u64,
    ]
}

/// Arbitrary basis points (0-10000)
pub fn arb_bps() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(0u16),
        Just(1u16),
        Just(5000u16),
        Just(10000u16),
        0u16..=10000u16,
    ]
}

/// Protocol fee within the configurable range (0-1000)
pub fn arb_protocol_fee_bps() -> impl Strategy<Value = u16> {
    prop_oneof![Just(0u16), Just(1000u16), 0u16..=1000u16]
}

/// Arbitrary 32-byte value (salt, key material)
pub fn arb_bytes32() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

/// Seconds to advance the clock between operations
pub fn arb_time_step() -> impl Strategy<Value = i64> {
    prop_oneof![Just(0i64), Just(1i64), 1i64..1_000i64, 1_000i64..1_000_000i64]
}

/// Input for auction ranking and settlement
#[derive(Debug, Clone)]
pub struct AuctionInput {
    pub fee_ceiling: u64,
    pub protocol_fee_bps: u16,
    /// Revealed fees in reveal order
    pub reveals: Vec<u64>,
}

impl Arbitrary for AuctionInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            1u64..=u64::MAX / 2,
            arb_protocol_fee_bps(),
            prop::collection::vec(any::<u64>(), 0..16),
        )
            .prop_map(|(fee_ceiling, protocol_fee_bps, raw)| AuctionInput {
                fee_ceiling,
                protocol_fee_bps,
                // Reveals above the ceiling are rejected before ranking
                reveals: raw.into_iter().map(|fee| fee % (fee_ceiling + 1)).collect(),
            })
            .boxed()
    }
}

/// One step of a request's life
#[derive(Debug, Clone, Copy)]
pub enum LifecycleOp {
    Bid,
    Reveal { fee: u64 },
    Submit,
    Refund,
    Slash,
    Advance { seconds: i64 },
}

fn arb_lifecycle_op() -> impl Strategy<Value = LifecycleOp> {
    prop_oneof![
        Just(LifecycleOp::Bid),
        (0u64..2_000u64).prop_map(|fee| LifecycleOp::Reveal { fee }),
        Just(LifecycleOp::Submit),
        Just(LifecycleOp::Refund),
        Just(LifecycleOp::Slash),
        (1i64..200i64).prop_map(|seconds| LifecycleOp::Advance { seconds }),
    ]
}

/// Input for request lifecycle fuzzing
#[derive(Debug, Clone)]
pub struct LifecycleInput {
    pub fee_ceiling: u64,
    pub min_stake: u64,
    pub slash_bps: u16,
    pub slash_window: i64,
    pub deadline_slack: i64,
    pub ops: Vec<LifecycleOp>,
}

impl Arbitrary for LifecycleInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            1_000u64..2_000u64,
            0u64..1_000_000u64,
            arb_bps(),
            0i64..500i64,
            0i64..500i64,
            prop::collection::vec(arb_lifecycle_op(), 1..40),
        )
            .prop_map(
                |(fee_ceiling, min_stake, slash_bps, slash_window, deadline_slack, ops)| {
                    LifecycleInput {
                        fee_ceiling,
                        min_stake,
                        slash_bps,
                        slash_window,
                        deadline_slack,
                        ops,
                    }
                },
            )
            .boxed()
    }
}

/// One step against a provider's stake ledger
#[derive(Debug, Clone, Copy)]
pub enum LedgerOp {
    Stake { staker: u8, amount: u64 },
    Unstake { staker: u8, fraction_bps: u16 },
    Complete { staker: u8 },
    Slash { fraction_bps: u16 },
    SlashAmount { amount: u64 },
    Deposit { amount: u64 },
    Claim { staker: u8 },
    Advance { seconds: i64 },
}

/// Stakers per simulated provider; staker 0 is the provider's authority
pub const MAX_STAKERS: u8 = 4;

fn arb_ledger_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        (0..MAX_STAKERS, arb_stake_amount())
            .prop_map(|(staker, amount)| LedgerOp::Stake { staker, amount }),
        (0..MAX_STAKERS, 1u16..=10000u16)
            .prop_map(|(staker, fraction_bps)| LedgerOp::Unstake { staker, fraction_bps }),
        (0..MAX_STAKERS).prop_map(|staker| LedgerOp::Complete { staker }),
        arb_bps().prop_map(|fraction_bps| LedgerOp::Slash { fraction_bps }),
        arb_stake_amount().prop_map(|amount| LedgerOp::SlashAmount { amount }),
        arb_stake_amount().prop_map(|amount| LedgerOp::Deposit { amount }),
        (0..MAX_STAKERS).prop_map(|staker| LedgerOp::Claim { staker }),
        arb_time_step().prop_map(|seconds| LedgerOp::Advance { seconds }),
    ]
}

/// Input for stake ledger fuzzing
#[derive(Debug, Clone)]
pub struct LedgerInput {
    pub min_self_stake: u64,
    pub commission_bps: u16,
    pub max_slash_bps: u16,
    pub unstake_delay: i64,
    pub ops: Vec<LedgerOp>,
}

impl Arbitrary for LedgerInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            0u64..1_000_000u64,
            arb_bps(),
            1u16..=10000u16,
            0i64..10_000i64,
            prop::collection::vec(arb_ledger_op(), 1..60),
        )
            .prop_map(
                |(min_self_stake, commission_bps, max_slash_bps, unstake_delay, ops)| LedgerInput {
                    min_self_stake,
                    commission_bps,
                    max_slash_bps,
                    unstake_delay,
                    ops,
                },
            )
            .boxed()
    }
}

/// Input for streaming emission fuzzing
#[derive(Debug, Clone)]
pub struct EmissionInput {
    pub emission_rate: u64,
    pub budget: u64,
    /// (seconds elapsed, provider index, new active stake) per step
    pub steps: Vec<(i64, u8, u64)>,
}

/// Providers sharing one emission stream
pub const MAX_EMITTERS: u8 = 3;

impl Arbitrary for EmissionInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            prop_oneof![Just(0u64), 1u64..1_000u64, 1_000u64..1_000_000_000u64],
            arb_amount(),
            prop::collection::vec(
                (arb_time_step(), 0..MAX_EMITTERS, arb_stake_amount()),
                1..30,
            ),
        )
            .prop_map(|(emission_rate, budget, steps)| EmissionInput {
                emission_rate,
                budget,
                steps,
            })
            .boxed()
    }
}

/// One step against the epoch schedule and a stats bucket
#[derive(Debug, Clone, Copy)]
pub enum EpochOp {
    Schedule { offset: i64 },
    Pop,
    Record { kind: u8, fee: u64 },
    Advance { seconds: i64 },
}

fn arb_epoch_op() -> impl Strategy<Value = EpochOp> {
    prop_oneof![
        (1i64..500i64).prop_map(|offset| EpochOp::Schedule { offset }),
        Just(EpochOp::Pop),
        (0u8..5u8, 0u64..1_000_000u64).prop_map(|(kind, fee)| EpochOp::Record { kind, fee }),
        (0i64..300i64).prop_map(|seconds| EpochOp::Advance { seconds }),
    ]
}

/// Input for epoch stats fuzzing
#[derive(Debug, Clone)]
pub struct EpochInput {
    pub ops: Vec<EpochOp>,
}

impl Arbitrary for EpochInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop::collection::vec(arb_epoch_op(), 1..80)
            .prop_map(|ops| EpochInput { ops })
            .boxed()
    }
}
