//! Fuzz target for the request lifecycle
//!
//! Tests invariants:
//! - only Pending -> Fulfilled, Pending -> Refunded and Refunded -> Slashed
//! - Fulfilled and Slashed are terminal
//! - refunds never pre-empt a winner before the deadline
//! - slashing only inside the slash window
//!
//! Run with: cargo test --release -p proof-market-fuzz request_lifecycle

use crate::*;
use proof_market::state::RequestStatus;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Arbitrary interleavings of bids, reveals, submissions, refunds,
    /// slashes and clock advances
    #[test]
    fn fuzz_request_lifecycle(input in any::<LifecycleInput>()) {
        let (result, request) = simulate_request_lifecycle(&input);

        prop_assert!(!result.is_invariant_violation(),
            "Invariant violation: {:?}\nInput: {:?}", result, input);

        match request.status {
            RequestStatus::Fulfilled => {
                prop_assert!(request.winner.is_some());
                prop_assert!(request.settled_price <= request.fee_ceiling);
                prop_assert!(request.settled_price >= request.winner.unwrap().fee);
            }
            RequestStatus::Slashed => {
                prop_assert!(request.winner.is_some(), "slashed without a winner");
            }
            _ => {}
        }
    }

    /// A request nobody bid on is always refundable once bidding closes
    #[test]
    fn fuzz_no_bid_refund(slack in 1i64..1_000i64, wait in 1i64..10_000i64) {
        let input = LifecycleInput {
            fee_ceiling: 1_000,
            min_stake: 0,
            slash_bps: 0,
            slash_window: 0,
            deadline_slack: slack,
            ops: vec![
                LifecycleOp::Advance { seconds: SIM_WINDOW + wait },
                LifecycleOp::Refund,
            ],
        };
        let (result, request) = simulate_request_lifecycle(&input);
        prop_assert!(result.is_success(), "{:?}", result);
        prop_assert_eq!(request.status, RequestStatus::Refunded);
    }
}
