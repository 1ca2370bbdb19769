//! Fuzz target for bid ranking and second-price settlement
//!
//! Tests invariants:
//! - winner.fee <= runner_up.fee after every reveal
//! - the winner is the earliest reveal of the minimum fee
//! - price + rebate == fee ceiling, protocol fee + reward == price
//!
//! Run with: cargo test --release -p proof-market-fuzz auction_ranking

use crate::*;
use proof_market::instructions::auction_helpers::{
    bid_commitment, calculate_settlement, rank_revealed_bid, RankOutcome,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Reveal arbitrary fees in arbitrary order and settle
    #[test]
    fn fuzz_auction_ranking(input in any::<AuctionInput>()) {
        let (result, request) = simulate_auction(&input);

        prop_assert!(!result.is_invariant_violation(),
            "Invariant violation: {:?}\nInput: {:?}", result, input);

        if result.is_success() {
            let settlement = calculate_settlement(&request).unwrap();
            let minimum = input.reveals.iter().copied().min().unwrap();
            prop_assert_eq!(request.winner.unwrap().fee, minimum);
            if input.reveals.len() == 1 {
                prop_assert_eq!(settlement.price, minimum);
            }
            prop_assert!(settlement.protocol_fee as u128
                <= settlement.price as u128 * input.protocol_fee_bps as u128 / 10_000);
        } else {
            prop_assert!(input.reveals.is_empty());
        }
    }

    /// Price equals the second-lowest fee when two or more bids revealed
    #[test]
    fn fuzz_second_price(fees in prop::collection::vec(0u64..1_000_000u64, 2..12)) {
        let input = AuctionInput {
            fee_ceiling: 1_000_000,
            protocol_fee_bps: 0,
            reveals: fees.clone(),
        };
        let (result, request) = simulate_auction(&input);
        prop_assert!(result.is_success(), "{:?}", result);

        let mut sorted = fees;
        sorted.sort_unstable();
        let settlement = calculate_settlement(&request).unwrap();
        prop_assert_eq!(settlement.price, sorted[1]);
        prop_assert_eq!(settlement.rebate, 1_000_000 - sorted[1]);
    }

    /// A tie with the current winner never displaces it
    #[test]
    fn fuzz_tie_keeps_first(fee in 0u64..1_000u64) {
        let mut request = simulated_request(1_000, 0, 0, 0, 0, 1);
        let first = sim_key(0);
        let second = sim_key(1);

        prop_assert_eq!(rank_revealed_bid(&mut request, first, fee), RankOutcome::Winner);
        prop_assert_eq!(rank_revealed_bid(&mut request, second, fee), RankOutcome::RunnerUp);
        prop_assert_eq!(request.winner.unwrap().provider, first);
        prop_assert_eq!(request.runner_up.unwrap().provider, second);
    }

    /// A commitment binds every field it covers
    #[test]
    fn fuzz_commitment_binding(
        request_id in arb_bytes32(),
        salt in arb_bytes32(),
        fee in any::<u64>(),
        other_fee in any::<u64>(),
    ) {
        let provider = sim_key(3);
        let commitment = bid_commitment(&request_id, &provider, fee, &salt);
        prop_assert_eq!(commitment, bid_commitment(&request_id, &provider, fee, &salt));
        if other_fee != fee {
            prop_assert_ne!(commitment, bid_commitment(&request_id, &provider, other_fee, &salt));
        }
        prop_assert_ne!(commitment, bid_commitment(&request_id, &sim_key(4), fee, &salt));
    }
}
