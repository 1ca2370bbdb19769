//! Fuzz target for scale-factor slashing
//!
//! Tests invariants:
//! - the scale only falls and never reaches the hard floor
//! - a rejected slash leaves the scale untouched
//! - reported slashed amounts match the drop in stake value
//! - deactivation happens exactly when an Active provider crosses the
//!   soft threshold
//!
//! Run with: cargo test --release -p proof-market-fuzz slashing_scale

use crate::*;
use proof_market::instructions::constants::{PRECISION, SCALE_HARD_FLOOR, SCALE_SOFT_THRESHOLD};
use proof_market::instructions::ledger_helpers::{credit_shares, reactivate_provider, slash_by_fraction};
use proof_market::state::{ProviderState, StakePosition};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Successive slashes of arbitrary fractions
    #[test]
    fn fuzz_slashing_sequence(
        stake in arb_stake_amount(),
        fractions in prop::collection::vec(arb_bps(), 1..20),
        max_slash_bps in 1u16..=10_000u16,
    ) {
        let (result, provider) = simulate_slashing(stake, &fractions, max_slash_bps);

        prop_assert!(!result.is_invariant_violation(),
            "Invariant violation: {:?}", result);

        prop_assert!(provider.scale > SCALE_HARD_FLOOR);
        prop_assert!(provider.scale <= PRECISION);
        if provider.scale <= SCALE_SOFT_THRESHOLD {
            prop_assert_eq!(provider.state, ProviderState::Deactivated);
        } else {
            prop_assert_eq!(provider.state, ProviderState::Active);
        }
    }

    /// A provider that fully exits and reactivates starts unslashed
    #[test]
    fn fuzz_full_exit_resets_scale(fraction_bps in 1u16..8_000u16) {
        let mut provider = simulated_provider(0, 0);
        let mut position = StakePosition::default();
        credit_shares(&mut provider, &mut position, 1_000_000, true).unwrap();
        slash_by_fraction(&mut provider, fraction_bps, 10_000).unwrap();

        provider.total_raw_shares = 0;
        provider.self_raw_shares = 0;
        provider.state = ProviderState::Retired;

        reactivate_provider(&mut provider).unwrap();
        prop_assert_eq!(provider.scale, PRECISION);
        prop_assert_eq!(provider.state, ProviderState::Active);
    }
}
