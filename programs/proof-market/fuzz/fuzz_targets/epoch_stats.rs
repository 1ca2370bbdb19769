//! Fuzz target for the epoch schedule and stats buckets
//!
//! Tests invariants:
//! - epoch ids are assigned in order and never go backwards in time
//! - scheduling and popping never move the epoch already in effect
//! - recent counters never exceed lifetime counters
//!
//! Run with: cargo test --release -p proof-market-fuzz epoch_stats

use crate::*;
use proof_market::instructions::stats_helpers::current_epoch_id;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Arbitrary schedules, pops and recorded activity
    #[test]
    fn fuzz_epoch_stats(input in any::<EpochInput>()) {
        let (result, schedule, bucket) = simulate_epochs(&input);

        prop_assert!(!result.is_invariant_violation(),
            "Invariant violation: {:?}\nInput: {:?}", result, input);

        prop_assert!(schedule.starts.windows(2).all(|w| w[0] < w[1]),
            "boundaries out of order: {:?}", schedule.starts);
        prop_assert!(bucket.epoch_id <= schedule.last_id);
        prop_assert!(bucket.recent.bids <= bucket.lifetime.bids);
    }

    /// Before any boundary starts the epoch is 0
    #[test]
    fn fuzz_epoch_zero_before_first_boundary(offset in 1i64..1_000_000i64, now in 0i64..1_000i64) {
        let input = EpochInput { ops: vec![EpochOp::Schedule { offset }] };
        let (result, schedule, _) = simulate_epochs(&input);
        prop_assert!(result.is_success(), "{:?}", result);
        prop_assert_eq!(current_epoch_id(&schedule, now), 0);
    }
}
