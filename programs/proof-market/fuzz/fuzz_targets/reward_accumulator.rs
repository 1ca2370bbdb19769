//! Fuzz target for reward distribution and streaming emission
//!
//! Tests invariants:
//! - accumulators never decrease
//! - commission + stakers' share == deposit, dust is never negative
//! - credited + emission dust + remaining budget == funded budget once
//!   every provider has settled
//! - repeated deposits never sweep a unit that stakers can still claim
//!
//! Run with: cargo test --release -p proof-market-fuzz reward_accumulator

use crate::*;
use proof_market::instructions::ledger_helpers::credit_shares;
use proof_market::instructions::reward_helpers::{distribute_rewards, settle_position};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Emission over arbitrary time steps and stake changes
    #[test]
    fn fuzz_emission(input in any::<EmissionInput>()) {
        let (result, pool) = simulate_emission(&input);

        prop_assert!(!result.is_invariant_violation(),
            "Invariant violation: {:?}\nInput: {:?}", result, input);
        prop_assert!(pool.remaining_budget <= input.budget);
        prop_assert_eq!(pool.total_emitted + pool.remaining_budget, input.budget);
        prop_assert!(pool.emission_carry < proof_market::instructions::constants::PRECISION);
    }

    /// Swept dust plus what the single staker can claim equals every deposit
    #[test]
    fn fuzz_repeated_deposits(
        stake in arb_stake_amount(),
        amounts in prop::collection::vec(1u64..1_000u64, 1..20),
    ) {
        let mut provider = simulated_provider(0, 0);
        let mut position = proof_market::state::StakePosition::default();
        credit_shares(&mut provider, &mut position, stake, true).unwrap();

        let mut dust = 0u64;
        for amount in amounts.iter() {
            dust += distribute_rewards(&mut provider, *amount, 0).unwrap().dust;
        }
        let accrued = settle_position(&provider, &mut position).unwrap();
        prop_assert_eq!(accrued + dust, amounts.iter().sum::<u64>());
    }

    /// A single deposit splits exactly into commission, rewards and dust
    #[test]
    fn fuzz_deposit_split(
        total_raw_shares in 1u128..1_000_000_000_000_000u128,
        amount in arb_amount(),
        commission_bps in arb_bps(),
    ) {
        let mut provider = simulated_provider(0, commission_bps);
        provider.total_raw_shares = total_raw_shares;

        let split = distribute_rewards(&mut provider, amount, commission_bps).unwrap();
        prop_assert_eq!(split.commission + split.to_stakers, amount);
        prop_assert!(split.dust <= split.to_stakers);
        prop_assert_eq!(provider.banked_commission, split.commission);

        let distributed = total_raw_shares * provider.acc_reward_per_share
            / proof_market::instructions::constants::PRECISION;
        prop_assert_eq!(distributed + split.dust as u128, split.to_stakers as u128);
    }
}
