//! Fuzz target for the stake share ledger
//!
//! Tests invariants:
//! - position raw shares sum to the provider's active and queued totals
//! - value owed to stakers is always backed by tokens held
//! - rewards claimed never exceed rewards routed to stakers
//!
//! Run with: cargo test --release -p proof-market-fuzz share_conservation

use crate::*;
use proof_market::instructions::ledger_helpers::effective_amount;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Arbitrary stake, unstake, slash, deposit and claim sequences
    #[test]
    fn fuzz_share_conservation(input in any::<LedgerInput>()) {
        let (result, provider, positions, totals) = simulate_ledger(&input);

        prop_assert!(!result.is_invariant_violation(),
            "Invariant violation: {:?}\nInput: {:?}", result, input);

        let staked: u64 = input
            .ops
            .iter()
            .filter_map(|op| match op {
                LedgerOp::Stake { amount, .. } => Some(*amount),
                _ => None,
            })
            .sum();
        prop_assert!(totals.held + totals.slashed + totals.paid_out <= staked);

        let self_shares = positions[0].raw_shares;
        prop_assert_eq!(self_shares, provider.self_raw_shares);
        prop_assert!(effective_amount(provider.self_raw_shares, provider.scale).is_ok());
    }

    /// With no slashing, a full unstake returns at most the deposit
    #[test]
    fn fuzz_unstake_round_trip(amount in arb_stake_amount(), delay in 0i64..1_000i64) {
        let input = LedgerInput {
            min_self_stake: 0,
            commission_bps: 0,
            max_slash_bps: 10_000,
            unstake_delay: delay,
            ops: vec![
                LedgerOp::Stake { staker: 0, amount },
                LedgerOp::Unstake { staker: 0, fraction_bps: 10_000 },
                LedgerOp::Advance { seconds: delay },
                LedgerOp::Complete { staker: 0 },
            ],
        };
        let (result, provider, _, totals) = simulate_ledger(&input);
        prop_assert!(result.is_success(), "{:?}", result);
        prop_assert_eq!(totals.paid_out, amount);
        prop_assert_eq!(provider.total_raw_shares, 0);
        prop_assert_eq!(provider.pending_raw_shares, 0);
    }
}
