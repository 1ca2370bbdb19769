//! Reward accumulator: commission split, per-share accrual, dust and
//! streaming emission.

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::RewardsDeposited;
use crate::instructions::constants::{BASIS_POINTS_DIVISOR, PRECISION};
use crate::instructions::ledger_helpers::emission_weight;
use crate::state::{ProviderAccount, RewardPool, StakePosition};

/// `RewardsDeposited::source` values
pub const REWARD_SOURCE_DIRECT: u8 = 0;
pub const REWARD_SOURCE_SETTLEMENT: u8 = 1;
pub const REWARD_SOURCE_EMISSION: u8 = 2;

/// How a reward deposit was divided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewardSplit {
    pub commission: u64,
    /// Amount routed to stakers, including `dust`
    pub to_stakers: u64,
    /// Part of `to_stakers` lost to per-share rounding
    pub dust: u64,
}

/// Rewards a position of `raw_shares` has accrued at accumulator `acc`.
pub fn accrued_rewards(raw_shares: u128, acc: u128) -> Result<u128> {
    Ok(raw_shares
        .checked_mul(acc)
        .ok_or(MarketError::ArithmeticOverflow)?
        / PRECISION)
}

/// Reward debt of a position of `raw_shares` joining at accumulator `acc`.
///
/// Rounded up, so a position never claims more than its exact share of any
/// later deposit.
pub fn reward_debt_for(raw_shares: u128, acc: u128) -> Result<u128> {
    let scaled = raw_shares
        .checked_mul(acc)
        .ok_or(MarketError::ArithmeticOverflow)?;
    Ok(scaled.div_ceil(PRECISION))
}

/// Deposit `amount` into a provider's accumulator.
///
/// Commission is taken first. With no raw shares outstanding the whole
/// deposit is commission. Dust is what the current share supply cannot
/// claim of this deposit, measured against the whole-token total it could
/// claim before and after, so fractions that later add up to a claimable
/// unit are never swept.
pub fn distribute_rewards(
    provider: &mut ProviderAccount,
    amount: u64,
    commission_bps: u16,
) -> Result<RewardSplit> {
    if amount == 0 {
        return Ok(RewardSplit::default());
    }

    if provider.total_raw_shares == 0 {
        provider.banked_commission = provider
            .banked_commission
            .checked_add(amount)
            .ok_or(MarketError::ArithmeticOverflow)?;
        return Ok(RewardSplit {
            commission: amount,
            to_stakers: 0,
            dust: 0,
        });
    }

    let commission = (amount as u128)
        .checked_mul(commission_bps as u128)
        .ok_or(MarketError::ArithmeticOverflow)?
        .checked_div(BASIS_POINTS_DIVISOR as u128)
        .ok_or(MarketError::ArithmeticOverflow)? as u64;
    let remainder = amount
        .checked_sub(commission)
        .ok_or(MarketError::ArithmeticOverflow)?;

    let increment = (remainder as u128)
        .checked_mul(PRECISION)
        .ok_or(MarketError::ArithmeticOverflow)?
        / provider.total_raw_shares;
    let acc_before = provider.acc_reward_per_share;
    let acc_after = acc_before
        .checked_add(increment)
        .ok_or(MarketError::ArithmeticOverflow)?;
    let claimable = accrued_rewards(provider.total_raw_shares, acc_after)?
        .checked_sub(accrued_rewards(provider.total_raw_shares, acc_before)?)
        .ok_or(MarketError::ArithmeticOverflow)?;
    let dust = (remainder as u128)
        .checked_sub(claimable)
        .ok_or(MarketError::ArithmeticOverflow)? as u64;

    provider.acc_reward_per_share = acc_after;
    provider.banked_commission = provider
        .banked_commission
        .checked_add(commission)
        .ok_or(MarketError::ArithmeticOverflow)?;

    Ok(RewardSplit {
        commission,
        to_stakers: remainder,
        dust,
    })
}

/// Bank whatever the position accrued since its last settlement.
/// Must run before any change to the position's raw shares.
pub fn settle_position(provider: &ProviderAccount, position: &mut StakePosition) -> Result<u64> {
    let accrued = accrued_rewards(position.raw_shares, provider.acc_reward_per_share)?;
    // The rounded-up debt may sit above the floored accrual until the next deposit
    if accrued <= position.reward_debt {
        return Ok(0);
    }
    let delta = u64::try_from(accrued - position.reward_debt)
        .map_err(|_| MarketError::ArithmeticOverflow)?;

    position.banked_rewards = position
        .banked_rewards
        .checked_add(delta)
        .ok_or(MarketError::ArithmeticOverflow)?;
    position.reward_debt = accrued;
    Ok(delta)
}

/// Recompute the reward debt after the position's raw shares changed.
pub fn sync_reward_debt(provider: &ProviderAccount, position: &mut StakePosition) -> Result<()> {
    position.reward_debt = reward_debt_for(position.raw_shares, provider.acc_reward_per_share)?;
    Ok(())
}

/// Advance the global emission accumulator to `now`.
///
/// Emission is capped by the remaining budget. Time with no active stake
/// emits nothing. The part of each advance the per-stake increment cannot
/// represent is carried in `emission_carry` and reaches the dust pool once
/// it adds up to whole tokens. Returns the amount taken from the budget.
pub fn advance_emission(pool: &mut RewardPool, now: i64) -> Result<u64> {
    if now <= pool.last_update {
        return Ok(0);
    }
    let elapsed = (now - pool.last_update) as u64;
    pool.last_update = now;

    if pool.total_active_stake == 0 || pool.emission_rate == 0 || pool.remaining_budget == 0 {
        return Ok(0);
    }

    let emitted = elapsed
        .saturating_mul(pool.emission_rate)
        .min(pool.remaining_budget);
    let scaled = (emitted as u128)
        .checked_mul(PRECISION)
        .ok_or(MarketError::ArithmeticOverflow)?;
    let total_active_stake = pool.total_active_stake as u128;
    let increment = scaled / total_active_stake;
    let unassigned = scaled % total_active_stake;

    pool.acc_per_effective_stake = pool
        .acc_per_effective_stake
        .checked_add(increment)
        .ok_or(MarketError::ArithmeticOverflow)?;
    pool.remaining_budget -= emitted;
    pool.total_emitted = pool
        .total_emitted
        .checked_add(emitted)
        .ok_or(MarketError::ArithmeticOverflow)?;
    carry_emission_remainder(pool, unassigned)?;

    Ok(emitted)
}

/// Add a sub-token emission remainder, scaled by PRECISION, and move every
/// whole token it completes into the dust pool.
fn carry_emission_remainder(pool: &mut RewardPool, scaled: u128) -> Result<()> {
    let carry = pool
        .emission_carry
        .checked_add(scaled)
        .ok_or(MarketError::ArithmeticOverflow)?;
    let whole = u64::try_from(carry / PRECISION).map_err(|_| MarketError::ArithmeticOverflow)?;
    pool.emission_carry = carry % PRECISION;
    sweep_dust(pool, whole)
}

/// Route the emission a provider earned since its baseline into its
/// accumulator. Only Active providers accrue; others keep a frozen baseline.
/// Call `advance_emission` first.
pub fn settle_provider_emission(
    provider: &mut ProviderAccount,
    pool: &mut RewardPool,
) -> Result<RewardSplit> {
    if !provider.is_active() {
        return Ok(RewardSplit::default());
    }

    let delta = pool
        .acc_per_effective_stake
        .checked_sub(provider.emission_baseline)
        .ok_or(MarketError::ArithmeticOverflow)?;
    let exact = (emission_weight(provider)? as u128)
        .checked_mul(delta)
        .ok_or(MarketError::ArithmeticOverflow)?;
    let owed = u64::try_from(exact / PRECISION).map_err(|_| MarketError::ArithmeticOverflow)?;
    carry_emission_remainder(pool, exact % PRECISION)?;
    provider.emission_baseline = pool.acc_per_effective_stake;

    let commission_bps = provider.emission_commission_bps;
    let split = distribute_rewards(provider, owed, commission_bps)?;
    sweep_dust(pool, split.dust)?;
    Ok(split)
}

/// Advance emission to `now` and settle what the provider earned, before
/// any change to its stake or state. Returns the provider's emission weight
/// prior to the change, for `reweight_active_stake`.
pub fn sync_provider_emission(
    provider_key: Pubkey,
    provider: &mut ProviderAccount,
    pool: &mut RewardPool,
    now: i64,
) -> Result<u64> {
    advance_emission(pool, now)?;
    let split = settle_provider_emission(provider, pool)?;
    if split.commission > 0 || split.to_stakers > 0 {
        emit_rewards_deposited(provider_key, REWARD_SOURCE_EMISSION, split, now);
    }
    emission_weight(provider)
}

pub fn emit_rewards_deposited(provider: Pubkey, source: u8, split: RewardSplit, now: i64) {
    emit!(RewardsDeposited {
        provider,
        source,
        amount: split.commission.saturating_add(split.to_stakers),
        commission: split.commission,
        to_stakers: split.to_stakers,
        dust: split.dust,
        timestamp: now,
    });
}

/// Start accruing emission from the current accumulator value.
pub fn rebaseline_emission(provider: &mut ProviderAccount, pool: &RewardPool) {
    provider.emission_baseline = pool.acc_per_effective_stake;
}

/// Replace a provider's contribution to the active stake total.
pub fn reweight_active_stake(pool: &mut RewardPool, before: u64, after: u64) -> Result<()> {
    pool.total_active_stake = pool
        .total_active_stake
        .checked_sub(before)
        .ok_or(MarketError::ArithmeticOverflow)?
        .checked_add(after)
        .ok_or(MarketError::ArithmeticOverflow)?;
    Ok(())
}

pub fn sweep_dust(pool: &mut RewardPool, dust: u64) -> Result<()> {
    pool.dust_pool = pool
        .dust_pool
        .checked_add(dust)
        .ok_or(MarketError::ArithmeticOverflow)?;
    Ok(())
}

/// Take the banked rewards of a position, leaving it at zero.
pub fn take_banked_rewards(position: &mut StakePosition) -> Result<u64> {
    let amount = position.banked_rewards;
    require!(amount > 0, MarketError::NothingToWithdraw);
    position.banked_rewards = 0;
    Ok(amount)
}

/// Take the provider's banked commission, leaving it at zero.
pub fn take_banked_commission(provider: &mut ProviderAccount) -> Result<u64> {
    let amount = provider.banked_commission;
    require!(amount > 0, MarketError::NothingToWithdraw);
    provider.banked_commission = 0;
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::ledger_helpers::{credit_shares, queue_unstake};
    use crate::state::ProviderState;

    fn create_test_provider(total_raw_shares: u128) -> ProviderAccount {
        ProviderAccount {
            authority: Pubkey::new_unique(),
            state: ProviderState::Active,
            total_raw_shares,
            ..ProviderAccount::default()
        }
    }

    fn create_test_pool(rate: u64, budget: u64, total_active_stake: u64) -> RewardPool {
        RewardPool {
            emission_rate: rate,
            remaining_budget: budget,
            total_active_stake,
            ..RewardPool::default()
        }
    }

    mod distribute_rewards_tests {
        use super::*;

        #[test]
        fn test_commission_and_dust() {
            let mut provider = create_test_provider(333);
            let split = distribute_rewards(&mut provider, 1000, 1000).unwrap();

            let increment = 900 * PRECISION / 333;
            assert_eq!(split.commission, 100);
            assert_eq!(split.to_stakers, 900);
            assert_eq!(provider.acc_reward_per_share, increment);
            assert_eq!(split.dust as u128, 900 - increment * 333 / PRECISION);
            assert_eq!(split.dust, 1);
            assert_eq!(provider.banked_commission, 100);
        }

        #[test]
        fn test_zero_amount_is_noop() {
            let mut provider = create_test_provider(10);
            let split = distribute_rewards(&mut provider, 0, 500).unwrap();
            assert_eq!(split, RewardSplit::default());
            assert_eq!(provider.acc_reward_per_share, 0);
            assert_eq!(provider.banked_commission, 0);
        }

        #[test]
        fn test_no_shares_all_commission() {
            let mut provider = create_test_provider(0);
            let split = distribute_rewards(&mut provider, 777, 0).unwrap();
            assert_eq!(split.commission, 777);
            assert_eq!(split.to_stakers, 0);
            assert_eq!(provider.banked_commission, 777);
            assert_eq!(provider.acc_reward_per_share, 0);
        }

        #[test]
        fn test_full_commission() {
            let mut provider = create_test_provider(100);
            let split = distribute_rewards(&mut provider, 500, 10000).unwrap();
            assert_eq!(split.commission, 500);
            assert_eq!(split.to_stakers, 0);
            assert_eq!(provider.acc_reward_per_share, 0);
        }

        #[test]
        fn test_accumulator_monotonic() {
            let mut provider = create_test_provider(7);
            let mut last = 0;
            for amount in [0u64, 1, 13, 1_000, 5] {
                distribute_rewards(&mut provider, amount, 250).unwrap();
                assert!(provider.acc_reward_per_share >= last);
                last = provider.acc_reward_per_share;
            }
        }
    }

    mod settlement_tests {
        use super::*;

        #[test]
        fn test_rewards_split_by_shares() {
            let mut provider = create_test_provider(0);
            let mut alice = StakePosition::default();
            let mut bob = StakePosition::default();
            credit_shares(&mut provider, &mut alice, 300, false).unwrap();
            credit_shares(&mut provider, &mut bob, 100, false).unwrap();

            distribute_rewards(&mut provider, 400, 0).unwrap();

            assert_eq!(settle_position(&provider, &mut alice).unwrap(), 300);
            assert_eq!(settle_position(&provider, &mut bob).unwrap(), 100);
            // Settling twice pays nothing new
            assert_eq!(settle_position(&provider, &mut alice).unwrap(), 0);
        }

        #[test]
        fn test_late_staker_earns_nothing_retroactively() {
            let mut provider = create_test_provider(0);
            let mut early = StakePosition::default();
            credit_shares(&mut provider, &mut early, 100, false).unwrap();
            distribute_rewards(&mut provider, 100, 0).unwrap();

            let mut late = StakePosition::default();
            credit_shares(&mut provider, &mut late, 100, false).unwrap();
            assert_eq!(settle_position(&provider, &mut late).unwrap(), 0);
            assert_eq!(settle_position(&provider, &mut early).unwrap(), 100);
        }

        #[test]
        fn test_queued_shares_stop_earning() {
            let mut provider = create_test_provider(0);
            let mut position = StakePosition::default();
            credit_shares(&mut provider, &mut position, 100, false).unwrap();
            distribute_rewards(&mut provider, 50, 0).unwrap();
            queue_unstake(&mut provider, &mut position, 100, false, 0).unwrap();
            assert_eq!(position.banked_rewards, 50);

            // No active shares left: the next deposit is all commission
            let split = distribute_rewards(&mut provider, 50, 0).unwrap();
            assert_eq!(split.commission, 50);
            assert_eq!(settle_position(&provider, &mut position).unwrap(), 0);
        }

        #[test]
        fn test_repeated_tiny_deposits_sweep_dust_once() {
            let mut provider = create_test_provider(0);
            let mut position = StakePosition::default();
            credit_shares(&mut provider, &mut position, 3, false).unwrap();

            let first = distribute_rewards(&mut provider, 1, 0).unwrap();
            let second = distribute_rewards(&mut provider, 1, 0).unwrap();
            assert_eq!(first.dust, 1);
            assert_eq!(second.dust, 0);

            let accrued = settle_position(&provider, &mut position).unwrap();
            assert_eq!(accrued, 1);
            assert_eq!(accrued + first.dust + second.dust, 2);
        }

        #[test]
        fn test_many_deposits_over_large_supply_conserved() {
            let mut provider = create_test_provider(0);
            let mut position = StakePosition::default();
            credit_shares(&mut provider, &mut position, 1_000_000_001, false).unwrap();

            let mut dust = 0;
            for _ in 0..8 {
                dust += distribute_rewards(&mut provider, 1, 0).unwrap().dust;
            }
            let accrued = settle_position(&provider, &mut position).unwrap();
            assert_eq!(accrued + dust, 8);
        }

        #[test]
        fn test_joining_debt_rounds_up() {
            let mut provider = create_test_provider(0);
            let mut alice = StakePosition::default();
            credit_shares(&mut provider, &mut alice, 3, false).unwrap();
            let first = distribute_rewards(&mut provider, 1, 0).unwrap();

            let mut bob = StakePosition::default();
            credit_shares(&mut provider, &mut bob, 1, false).unwrap();
            assert_eq!(bob.reward_debt, 1);
            // Debt above the floored accrual settles to nothing
            assert_eq!(settle_position(&provider, &mut bob).unwrap(), 0);

            let second = distribute_rewards(&mut provider, 4, 0).unwrap();
            let paid = settle_position(&provider, &mut alice).unwrap()
                + settle_position(&provider, &mut bob).unwrap();
            assert!(paid + first.dust + second.dust <= 5);
        }

        #[test]
        fn test_take_banked() {
            let mut position = StakePosition {
                banked_rewards: 42,
                ..StakePosition::default()
            };
            assert_eq!(take_banked_rewards(&mut position).unwrap(), 42);
            assert!(take_banked_rewards(&mut position).is_err());

            let mut provider = create_test_provider(0);
            provider.banked_commission = 7;
            assert_eq!(take_banked_commission(&mut provider).unwrap(), 7);
            assert!(take_banked_commission(&mut provider).is_err());
        }
    }

    mod emission_tests {
        use super::*;

        #[test]
        fn test_advance_capped_by_budget() {
            let mut pool = create_test_pool(10, 25, 100);
            let emitted = advance_emission(&mut pool, 5).unwrap();
            assert_eq!(emitted, 25);
            assert_eq!(pool.remaining_budget, 0);
            assert_eq!(pool.acc_per_effective_stake, 25 * PRECISION / 100);
            assert_eq!(advance_emission(&mut pool, 10).unwrap(), 0);
        }

        #[test]
        fn test_no_stake_no_emission() {
            let mut pool = create_test_pool(10, 1_000, 0);
            assert_eq!(advance_emission(&mut pool, 50).unwrap(), 0);
            assert_eq!(pool.remaining_budget, 1_000);
            assert_eq!(pool.last_update, 50);
        }

        #[test]
        fn test_rounding_remainder_carried_until_settled() {
            let mut pool = create_test_pool(10, 1_000, 3);
            advance_emission(&mut pool, 1).unwrap();
            assert_eq!(pool.total_emitted, 10);
            assert_eq!(pool.emission_carry, 10 * PRECISION % 3);
            assert_eq!(pool.dust_pool, 0);

            let mut provider = create_test_provider(3);
            let split = settle_provider_emission(&mut provider, &mut pool).unwrap();
            assert_eq!(split.to_stakers, 9);
            assert_eq!(split.dust, 0);
            assert_eq!(pool.dust_pool, 1);
            assert_eq!(pool.emission_carry, 0);
        }

        #[test]
        fn test_unsettled_advances_never_double_count() {
            let mut pool = create_test_pool(1, 1_000, 3);
            advance_emission(&mut pool, 1).unwrap();
            advance_emission(&mut pool, 2).unwrap();
            assert_eq!(pool.total_emitted, 2);
            assert_eq!(pool.dust_pool, 0);

            let mut provider = create_test_provider(3);
            let split = settle_provider_emission(&mut provider, &mut pool).unwrap();
            let credited = split.commission + split.to_stakers;
            let emission_dust = pool.dust_pool - split.dust;
            assert_eq!(credited, 1);
            assert_eq!(credited + emission_dust, pool.total_emitted);
            assert_eq!(pool.emission_carry, 0);
        }

        #[test]
        fn test_provider_fractions_reach_dust() {
            let mut pool = create_test_pool(2, 1_000, 3);
            advance_emission(&mut pool, 1).unwrap();

            let mut credited = 0;
            for _ in 0..3 {
                let mut provider = create_test_provider(1);
                let split = settle_provider_emission(&mut provider, &mut pool).unwrap();
                credited += split.commission + split.to_stakers;
            }
            assert_eq!(credited, 0);
            assert_eq!(pool.dust_pool, 2);
            assert_eq!(pool.emission_carry, 0);
            assert_eq!(credited + pool.dust_pool, pool.total_emitted);
        }

        #[test]
        fn test_time_going_backwards_ignored() {
            let mut pool = create_test_pool(10, 1_000, 10);
            pool.last_update = 100;
            assert_eq!(advance_emission(&mut pool, 90).unwrap(), 0);
            assert_eq!(pool.last_update, 100);
        }

        #[test]
        fn test_provider_emission_through_commission() {
            let mut provider = create_test_provider(0);
            let mut position = StakePosition::default();
            credit_shares(&mut provider, &mut position, 100, false).unwrap();
            provider.emission_commission_bps = 1000;

            let mut pool = create_test_pool(10, 1_000, 100);
            advance_emission(&mut pool, 10).unwrap();

            let split = settle_provider_emission(&mut provider, &mut pool).unwrap();
            assert_eq!(split.commission, 10);
            assert_eq!(split.to_stakers, 90);
            assert_eq!(provider.emission_baseline, pool.acc_per_effective_stake);
            assert_eq!(settle_position(&provider, &mut position).unwrap(), 90);

            // Settling again without time passing owes nothing
            let again = settle_provider_emission(&mut provider, &mut pool).unwrap();
            assert_eq!(again, RewardSplit::default());
        }

        #[test]
        fn test_inactive_provider_frozen() {
            let mut provider = create_test_provider(100);
            provider.state = ProviderState::Retired;
            let mut pool = create_test_pool(10, 1_000, 100);
            advance_emission(&mut pool, 10).unwrap();

            let split = settle_provider_emission(&mut provider, &mut pool).unwrap();
            assert_eq!(split, RewardSplit::default());
            assert_eq!(provider.emission_baseline, 0);

            rebaseline_emission(&mut provider, &pool);
            assert_eq!(provider.emission_baseline, pool.acc_per_effective_stake);
        }

        #[test]
        fn test_reweight() {
            let mut pool = create_test_pool(0, 0, 100);
            reweight_active_stake(&mut pool, 40, 70).unwrap();
            assert_eq!(pool.total_active_stake, 130);
            assert!(reweight_active_stake(&mut pool, 131, 0).is_err());
        }
    }
}
