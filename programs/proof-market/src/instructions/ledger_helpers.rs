//! Stake ledger: raw shares, the scale factor, eligibility and slashing.
//!
//! A provider's stakers own raw shares. The value of a raw share is
//! `scale / PRECISION` tokens, so a slash rescales every position at once by
//! lowering `scale`. Raw shares only change on stake and unstake.

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::instructions::constants::{
    BASIS_POINTS_DIVISOR, PRECISION, SCALE_HARD_FLOOR, SCALE_SOFT_THRESHOLD,
};
use crate::instructions::reward_helpers::{settle_position, sync_reward_debt};
use crate::state::{
    ProviderAccount, ProviderState, StakePosition, UnstakeEntry, MAX_PENDING_UNSTAKES,
};

/// Raw shares minted for `amount` tokens at the current scale.
pub fn shares_for_amount(amount: u64, scale: u128) -> Result<u128> {
    require!(scale > 0, MarketError::ArithmeticOverflow);
    (amount as u128)
        .checked_mul(PRECISION)
        .ok_or(MarketError::ArithmeticOverflow)?
        .checked_div(scale)
        .ok_or(MarketError::ArithmeticOverflow.into())
}

/// Token value of `raw_shares` at `scale`, rounded down.
pub fn effective_amount(raw_shares: u128, scale: u128) -> Result<u64> {
    let value = raw_shares
        .checked_mul(scale)
        .ok_or(MarketError::ArithmeticOverflow)?
        / PRECISION;
    u64::try_from(value).map_err(|_| MarketError::ArithmeticOverflow.into())
}

/// Effective value of the provider's active shares.
pub fn active_stake(provider: &ProviderAccount) -> Result<u64> {
    effective_amount(provider.total_raw_shares, provider.scale)
}

/// Effective value of the authority's own active shares.
pub fn self_stake(provider: &ProviderAccount) -> Result<u64> {
    effective_amount(provider.self_raw_shares, provider.scale)
}

/// Effective value of everything a slash can reach: active plus queued shares.
pub fn slashable_stake(provider: &ProviderAccount) -> Result<u64> {
    let raw = provider
        .total_raw_shares
        .checked_add(provider.pending_raw_shares)
        .ok_or(MarketError::ArithmeticOverflow)?;
    effective_amount(raw, provider.scale)
}

/// Stake counted toward streaming emission (zero unless Active).
pub fn emission_weight(provider: &ProviderAccount) -> Result<u64> {
    if provider.is_active() {
        active_stake(provider)
    } else {
        Ok(0)
    }
}

/// Outcome of the eligibility predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    pub eligible: bool,
    pub current_stake: u64,
}

/// Whether a provider may take work requiring `required` active stake.
pub fn check_eligibility(
    provider: &ProviderAccount,
    required: u64,
    min_self_stake_floor: u64,
) -> Result<Eligibility> {
    let current_stake = active_stake(provider)?;
    let eligible = provider.is_active()
        && provider.min_self_stake >= min_self_stake_floor
        && current_stake >= required
        && self_stake(provider)? >= provider.min_self_stake;

    Ok(Eligibility {
        eligible,
        current_stake,
    })
}

/// Fails with `ProviderNotActive` outside the Active state and with
/// `InsufficientStake` when an Active provider is short of stake.
pub fn require_eligible(
    provider: &ProviderAccount,
    required: u64,
    min_self_stake_floor: u64,
) -> Result<u64> {
    if !provider.is_active() {
        msg!(
            "Provider {} is {:?}, not Active",
            provider.authority,
            provider.state
        );
        return Err(MarketError::ProviderNotActive.into());
    }
    let eligibility = check_eligibility(provider, required, min_self_stake_floor)?;
    if !eligibility.eligible {
        msg!(
            "Provider {} ineligible: state {:?}, stake {} required {}",
            provider.authority,
            provider.state,
            eligibility.current_stake,
            required
        );
        return Err(MarketError::InsufficientStake.into());
    }
    Ok(eligibility.current_stake)
}

/// Delegated deposits need an Active provider meeting its own self-stake pledge.
pub fn accepts_delegation(provider: &ProviderAccount) -> Result<bool> {
    Ok(provider.is_active() && self_stake(provider)? >= provider.min_self_stake)
}

/// Resolve a signer to the provider it acts for: the authority or its submitter.
pub fn resolve_effective_provider(provider: &ProviderAccount, caller: &Pubkey) -> Result<()> {
    let is_authority = provider.authority == *caller;
    let is_submitter = provider.has_submitter() && provider.submitter == *caller;
    require!(
        is_authority || is_submitter,
        MarketError::UnauthorizedProvider
    );
    Ok(())
}

/// Move a provider to `new_state` if the lifecycle allows it.
pub fn transition_provider(provider: &mut ProviderAccount, new_state: ProviderState) -> Result<()> {
    if !provider.state.can_transition_to(new_state) {
        msg!(
            "Provider {} cannot move from {:?} to {:?}",
            provider.authority,
            provider.state,
            new_state
        );
        return Err(MarketError::InvalidProviderTransition.into());
    }
    provider.state = new_state;
    Ok(())
}

/// Reactivate a Retired or Deactivated provider.
///
/// A provider that fully exited (no active and no queued shares) restarts at
/// an unslashed scale. Otherwise the scale must still be above the soft
/// threshold, which rules out a Deactivated provider that kept its stake.
pub fn reactivate_provider(provider: &mut ProviderAccount) -> Result<()> {
    require!(
        matches!(
            provider.state,
            ProviderState::Retired | ProviderState::Deactivated
        ),
        MarketError::InvalidProviderTransition
    );

    let fully_exited = provider.total_raw_shares == 0 && provider.pending_raw_shares == 0;
    if fully_exited {
        provider.scale = PRECISION;
    } else {
        require!(
            provider.state == ProviderState::Retired && provider.scale > SCALE_SOFT_THRESHOLD,
            MarketError::ProviderNotFullyExited
        );
    }

    transition_provider(provider, ProviderState::Active)
}

/// Mint shares for a deposit of `amount` into `position`.
///
/// Rewards are settled before the share change and the debt is resynced
/// after it. Returns the raw shares minted.
pub fn credit_shares(
    provider: &mut ProviderAccount,
    position: &mut StakePosition,
    amount: u64,
    is_self: bool,
) -> Result<u128> {
    require!(amount > 0, MarketError::ZeroAmount);

    let minted = shares_for_amount(amount, provider.scale)?;
    require!(minted > 0, MarketError::ZeroAmount);

    settle_position(provider, position)?;

    if position.is_empty() {
        provider.staker_count = provider
            .staker_count
            .checked_add(1)
            .ok_or(MarketError::ArithmeticOverflow)?;
    }

    position.raw_shares = position
        .raw_shares
        .checked_add(minted)
        .ok_or(MarketError::ArithmeticOverflow)?;
    provider.total_raw_shares = provider
        .total_raw_shares
        .checked_add(minted)
        .ok_or(MarketError::ArithmeticOverflow)?;
    if is_self {
        provider.self_raw_shares = provider
            .self_raw_shares
            .checked_add(minted)
            .ok_or(MarketError::ArithmeticOverflow)?;
    }

    sync_reward_debt(provider, position)?;
    Ok(minted)
}

/// Burn `raw_shares` from a position and queue them for delayed payout.
///
/// The burned shares stop earning immediately but remain slashable until
/// they are paid out.
pub fn queue_unstake(
    provider: &mut ProviderAccount,
    position: &mut StakePosition,
    raw_shares: u128,
    is_self: bool,
    now: i64,
) -> Result<()> {
    require!(raw_shares > 0, MarketError::ZeroAmount);
    require!(
        raw_shares <= position.raw_shares,
        MarketError::InsufficientShares
    );
    require!(
        position.pending.len() < MAX_PENDING_UNSTAKES,
        MarketError::UnstakeQueueFull
    );

    settle_position(provider, position)?;

    position.raw_shares -= raw_shares;
    provider.total_raw_shares = provider
        .total_raw_shares
        .checked_sub(raw_shares)
        .ok_or(MarketError::ArithmeticOverflow)?;
    if is_self {
        provider.self_raw_shares = provider
            .self_raw_shares
            .checked_sub(raw_shares)
            .ok_or(MarketError::ArithmeticOverflow)?;
    }
    provider.pending_raw_shares = provider
        .pending_raw_shares
        .checked_add(raw_shares)
        .ok_or(MarketError::ArithmeticOverflow)?;

    position.pending.push(UnstakeEntry {
        raw_shares,
        requested_at: now,
    });

    sync_reward_debt(provider, position)
}

/// Matured unstake entries removed from a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnstakeSweep {
    pub entries: usize,
    pub raw_shares: u128,
    pub amount: u64,
}

/// Pop matured entries from the head of the queue and value them at the
/// current scale. Stops at the first entry that has not matured.
pub fn sweep_matured_unstakes(
    provider: &mut ProviderAccount,
    position: &mut StakePosition,
    unstake_delay: i64,
    now: i64,
) -> Result<UnstakeSweep> {
    let mut sweep = UnstakeSweep::default();

    for entry in position.pending.iter() {
        let matures_at = entry
            .requested_at
            .checked_add(unstake_delay)
            .ok_or(MarketError::ArithmeticOverflow)?;
        if matures_at > now {
            break;
        }
        sweep.entries += 1;
        sweep.raw_shares = sweep
            .raw_shares
            .checked_add(entry.raw_shares)
            .ok_or(MarketError::ArithmeticOverflow)?;
    }

    require!(sweep.entries > 0, MarketError::NothingToWithdraw);

    position.pending.drain(..sweep.entries);
    provider.pending_raw_shares = provider
        .pending_raw_shares
        .checked_sub(sweep.raw_shares)
        .ok_or(MarketError::ArithmeticOverflow)?;
    sweep.amount = effective_amount(sweep.raw_shares, provider.scale)?;

    if position.is_empty() {
        provider.staker_count = provider.staker_count.saturating_sub(1);
    }

    Ok(sweep)
}

/// Result of a slash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashOutcome {
    /// Tokens removed from the provider's stakers
    pub slashed: u64,
    pub old_scale: u128,
    pub new_scale: u128,
    /// The slash moved an Active provider to Deactivated
    pub deactivated: bool,
}

fn apply_scale(provider: &mut ProviderAccount, new_scale: u128) -> Result<bool> {
    if new_scale <= SCALE_HARD_FLOOR {
        msg!(
            "Slash rejected: scale {} would reach the floor {}",
            new_scale,
            SCALE_HARD_FLOOR
        );
        return Err(MarketError::ScaleBelowFloor.into());
    }

    provider.scale = new_scale;

    if provider.is_active() && new_scale <= SCALE_SOFT_THRESHOLD {
        msg!(
            "Provider {} deactivated at scale {}",
            provider.authority,
            new_scale
        );
        provider.state = ProviderState::Deactivated;
        return Ok(true);
    }
    Ok(false)
}

/// Slash a fraction of every position, capped at `max_slash_bps` per call.
pub fn slash_by_fraction(
    provider: &mut ProviderAccount,
    fraction_bps: u16,
    max_slash_bps: u16,
) -> Result<SlashOutcome> {
    require!(
        (fraction_bps as u64) <= BASIS_POINTS_DIVISOR,
        MarketError::InvalidSlashParams
    );
    let bps = fraction_bps.min(max_slash_bps) as u128;

    let old_scale = provider.scale;
    let before = slashable_stake(provider)?;
    let new_scale = old_scale
        .checked_mul(BASIS_POINTS_DIVISOR as u128 - bps)
        .ok_or(MarketError::ArithmeticOverflow)?
        / BASIS_POINTS_DIVISOR as u128;

    let deactivated = apply_scale(provider, new_scale)?;
    let after = slashable_stake(provider)?;

    Ok(SlashOutcome {
        slashed: before.saturating_sub(after),
        old_scale,
        new_scale,
        deactivated,
    })
}

/// Slash `amount` tokens, converted to a fraction of the slashable stake
/// and capped at `max_slash_bps` of it. Returns the amount actually slashed.
pub fn slash_by_amount(
    provider: &mut ProviderAccount,
    amount: u64,
    max_slash_bps: u16,
) -> Result<SlashOutcome> {
    let old_scale = provider.scale;
    let total = slashable_stake(provider)?;

    if amount == 0 || total == 0 {
        return Ok(SlashOutcome {
            slashed: 0,
            old_scale,
            new_scale: old_scale,
            deactivated: false,
        });
    }

    let cap = (total as u128)
        .checked_mul(max_slash_bps as u128)
        .ok_or(MarketError::ArithmeticOverflow)?
        / BASIS_POINTS_DIVISOR as u128;
    let slashed = (amount as u128).min(cap);

    let new_scale = old_scale
        .checked_mul(total as u128 - slashed)
        .ok_or(MarketError::ArithmeticOverflow)?
        / total as u128;

    let deactivated = apply_scale(provider, new_scale)?;

    Ok(SlashOutcome {
        slashed: slashed as u64,
        old_scale,
        new_scale,
        deactivated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: u128 = PRECISION;

    fn create_test_provider(state: ProviderState, total_raw_shares: u128, scale: u128) -> ProviderAccount {
        ProviderAccount {
            authority: Pubkey::new_unique(),
            state,
            total_raw_shares,
            self_raw_shares: total_raw_shares,
            scale,
            ..ProviderAccount::default()
        }
    }

    fn create_test_position(provider: &ProviderAccount) -> StakePosition {
        StakePosition {
            provider: provider.authority,
            staker: Pubkey::new_unique(),
            ..StakePosition::default()
        }
    }

    mod share_math {
        use super::*;

        #[test]
        fn test_shares_at_unit_scale() {
            assert_eq!(shares_for_amount(333, ONE).unwrap(), 333);
        }

        #[test]
        fn test_shares_after_slash_buy_more() {
            // At scale 0.8, 80 tokens buy 100 raw shares
            assert_eq!(shares_for_amount(80, ONE * 8 / 10).unwrap(), 100);
        }

        #[test]
        fn test_effective_rounds_down() {
            // 3 shares at 0.5 = 1.5 -> 1
            assert_eq!(effective_amount(3, ONE / 2).unwrap(), 1);
        }

        #[test]
        fn test_effective_non_decreasing_in_scale() {
            let raw = 1_000_003u128;
            let mut last = 0;
            for tenth in 1..=10u128 {
                let value = effective_amount(raw, ONE * tenth / 10).unwrap();
                assert!(value >= last);
                last = value;
            }
        }

        #[test]
        fn test_effective_overflow_is_error() {
            assert!(effective_amount(u128::MAX, ONE).is_err());
        }
    }

    mod eligibility {
        use super::*;

        #[test]
        fn test_active_with_enough_stake() {
            let mut provider = create_test_provider(ProviderState::Active, 1_000, ONE);
            provider.min_self_stake = 500;
            let result = check_eligibility(&provider, 1_000, 100).unwrap();
            assert!(result.eligible);
            assert_eq!(result.current_stake, 1_000);
        }

        #[test]
        fn test_reports_current_stake_when_short() {
            let provider = create_test_provider(ProviderState::Active, 999, ONE);
            let result = check_eligibility(&provider, 1_000, 0).unwrap();
            assert!(!result.eligible);
            assert_eq!(result.current_stake, 999);
            assert!(require_eligible(&provider, 1_000, 0).is_err());
        }

        #[test]
        fn test_inactive_states_ineligible() {
            for state in [
                ProviderState::Null,
                ProviderState::Retired,
                ProviderState::Deactivated,
                ProviderState::Jailed,
            ] {
                let provider = create_test_provider(state, 10_000, ONE);
                assert!(!check_eligibility(&provider, 0, 0).unwrap().eligible);
                assert_eq!(
                    require_eligible(&provider, 0, 0).unwrap_err(),
                    MarketError::ProviderNotActive.into()
                );
            }
        }

        #[test]
        fn test_min_self_stake_below_floor() {
            let mut provider = create_test_provider(ProviderState::Active, 10_000, ONE);
            provider.min_self_stake = 99;
            assert!(!check_eligibility(&provider, 0, 100).unwrap().eligible);
        }

        #[test]
        fn test_self_stake_below_pledge_after_slash() {
            let mut provider = create_test_provider(ProviderState::Active, 1_000, ONE);
            provider.min_self_stake = 1_000;
            assert!(check_eligibility(&provider, 0, 0).unwrap().eligible);
            provider.scale = ONE * 9 / 10;
            assert!(!check_eligibility(&provider, 0, 0).unwrap().eligible);
        }

        #[test]
        fn test_delegation_gate() {
            let mut provider = create_test_provider(ProviderState::Active, 100, ONE);
            provider.min_self_stake = 100;
            assert!(accepts_delegation(&provider).unwrap());

            provider.self_raw_shares = 99;
            assert!(!accepts_delegation(&provider).unwrap());

            provider.self_raw_shares = 100;
            provider.state = ProviderState::Retired;
            assert!(!accepts_delegation(&provider).unwrap());
        }
    }

    mod identity {
        use super::*;

        #[test]
        fn test_authority_and_submitter_resolve() {
            let mut provider = create_test_provider(ProviderState::Active, 0, ONE);
            let submitter = Pubkey::new_unique();
            provider.submitter = submitter;
            assert!(resolve_effective_provider(&provider, &provider.authority.clone()).is_ok());
            assert!(resolve_effective_provider(&provider, &submitter).is_ok());
            assert!(resolve_effective_provider(&provider, &Pubkey::new_unique()).is_err());
        }

        #[test]
        fn test_default_submitter_never_matches() {
            let provider = create_test_provider(ProviderState::Active, 0, ONE);
            assert!(resolve_effective_provider(&provider, &Pubkey::default()).is_err());
        }
    }

    mod slashing {
        use super::*;

        #[test]
        fn test_fraction_sequence() {
            let mut provider = create_test_provider(ProviderState::Active, 1_000_000, ONE);

            let first = slash_by_fraction(&mut provider, 2000, 10000).unwrap();
            assert_eq!(first.new_scale, ONE * 8 / 10);
            assert_eq!(first.slashed, 200_000);

            let second = slash_by_fraction(&mut provider, 5000, 10000).unwrap();
            assert_eq!(second.new_scale, ONE * 4 / 10);
            assert!(!second.deactivated);

            let third = slash_by_fraction(&mut provider, 7500, 10000);
            assert!(third.is_err());
            assert_eq!(provider.scale, ONE * 4 / 10);
        }

        #[test]
        fn test_soft_threshold_deactivates() {
            let mut provider = create_test_provider(ProviderState::Active, 1_000, ONE * 4 / 10);
            let outcome = slash_by_fraction(&mut provider, 5000, 10000).unwrap();
            assert_eq!(outcome.new_scale, SCALE_SOFT_THRESHOLD);
            assert!(outcome.deactivated);
            assert_eq!(provider.state, ProviderState::Deactivated);
        }

        #[test]
        fn test_soft_threshold_leaves_retired_alone() {
            let mut provider = create_test_provider(ProviderState::Retired, 1_000, ONE * 4 / 10);
            let outcome = slash_by_fraction(&mut provider, 5000, 10000).unwrap();
            assert!(!outcome.deactivated);
            assert_eq!(provider.state, ProviderState::Retired);
        }

        #[test]
        fn test_fraction_capped_per_call() {
            let mut provider = create_test_provider(ProviderState::Active, 1_000, ONE);
            let outcome = slash_by_fraction(&mut provider, 9000, 1000).unwrap();
            assert_eq!(outcome.new_scale, ONE * 9 / 10);
            assert_eq!(outcome.slashed, 100);
        }

        #[test]
        fn test_amount_converted_to_fraction() {
            let mut provider = create_test_provider(ProviderState::Active, 10_000, ONE);
            let outcome = slash_by_amount(&mut provider, 2_500, 10000).unwrap();
            assert_eq!(outcome.slashed, 2_500);
            assert_eq!(outcome.new_scale, ONE * 3 / 4);
            assert_eq!(active_stake(&provider).unwrap(), 7_500);
        }

        #[test]
        fn test_amount_includes_pending_shares() {
            let mut provider = create_test_provider(ProviderState::Active, 5_000, ONE);
            provider.pending_raw_shares = 5_000;
            let outcome = slash_by_amount(&mut provider, 1_000, 10000).unwrap();
            assert_eq!(outcome.new_scale, ONE * 9 / 10);
            assert_eq!(slashable_stake(&provider).unwrap(), 9_000);
        }

        #[test]
        fn test_amount_capped() {
            let mut provider = create_test_provider(ProviderState::Active, 10_000, ONE);
            let outcome = slash_by_amount(&mut provider, 9_000, 5000).unwrap();
            assert_eq!(outcome.slashed, 5_000);
            assert_eq!(outcome.new_scale, ONE / 2);
        }

        #[test]
        fn test_amount_on_empty_provider_is_noop() {
            let mut provider = create_test_provider(ProviderState::Active, 0, ONE);
            let outcome = slash_by_amount(&mut provider, 1_000, 10000).unwrap();
            assert_eq!(outcome.slashed, 0);
            assert_eq!(provider.scale, ONE);
        }

        #[test]
        fn test_full_amount_hits_floor() {
            let mut provider = create_test_provider(ProviderState::Active, 1_000, ONE);
            assert!(slash_by_amount(&mut provider, 1_000, 10000).is_err());
            assert_eq!(provider.scale, ONE);
        }

        #[test]
        fn test_slash_never_increases_value() {
            let mut provider = create_test_provider(ProviderState::Active, 7_777, ONE);
            let before = slashable_stake(&provider).unwrap();
            let outcome = slash_by_amount(&mut provider, 1_234, 10000).unwrap();
            let after = slashable_stake(&provider).unwrap();
            assert!(after <= before - outcome.slashed);
        }
    }

    mod reactivation {
        use super::*;

        #[test]
        fn test_full_exit_resets_scale() {
            let mut provider = create_test_provider(ProviderState::Deactivated, 0, ONE / 5);
            reactivate_provider(&mut provider).unwrap();
            assert_eq!(provider.scale, ONE);
            assert_eq!(provider.state, ProviderState::Active);
        }

        #[test]
        fn test_deactivated_with_shares_rejected() {
            let mut provider = create_test_provider(ProviderState::Deactivated, 10, ONE / 5);
            assert!(reactivate_provider(&mut provider).is_err());
            assert_eq!(provider.state, ProviderState::Deactivated);
        }

        #[test]
        fn test_pending_shares_block_reset() {
            let mut provider = create_test_provider(ProviderState::Deactivated, 0, ONE / 5);
            provider.pending_raw_shares = 1;
            assert!(reactivate_provider(&mut provider).is_err());
            assert_eq!(provider.scale, ONE / 5);
        }

        #[test]
        fn test_retired_keeps_scale() {
            let mut provider = create_test_provider(ProviderState::Retired, 10, ONE / 2);
            reactivate_provider(&mut provider).unwrap();
            assert_eq!(provider.scale, ONE / 2);
        }

        #[test]
        fn test_active_and_jailed_cannot_reactivate() {
            for state in [ProviderState::Active, ProviderState::Jailed, ProviderState::Null] {
                let mut provider = create_test_provider(state, 0, ONE);
                assert!(reactivate_provider(&mut provider).is_err());
            }
        }
    }

    mod unstaking {
        use super::*;

        #[test]
        fn test_credit_then_queue_conserves_shares() {
            let mut provider = create_test_provider(ProviderState::Active, 0, ONE);
            let mut position = create_test_position(&provider);

            let minted = credit_shares(&mut provider, &mut position, 1_000, false).unwrap();
            assert_eq!(minted, 1_000);
            assert_eq!(provider.staker_count, 1);

            queue_unstake(&mut provider, &mut position, 400, false, 100).unwrap();
            assert_eq!(position.raw_shares, 600);
            assert_eq!(provider.total_raw_shares, 600);
            assert_eq!(provider.pending_raw_shares, 400);
            assert_eq!(position.pending.len(), 1);
        }

        #[test]
        fn test_self_shares_tracked() {
            let mut provider = create_test_provider(ProviderState::Active, 0, ONE);
            let mut position = create_test_position(&provider);
            credit_shares(&mut provider, &mut position, 500, true).unwrap();
            assert_eq!(provider.self_raw_shares, 500);
            queue_unstake(&mut provider, &mut position, 200, true, 0).unwrap();
            assert_eq!(provider.self_raw_shares, 300);
        }

        #[test]
        fn test_queue_bounds() {
            let mut provider = create_test_provider(ProviderState::Active, 0, ONE);
            let mut position = create_test_position(&provider);
            credit_shares(&mut provider, &mut position, 100, false).unwrap();

            assert!(queue_unstake(&mut provider, &mut position, 101, false, 0).is_err());
            assert!(queue_unstake(&mut provider, &mut position, 0, false, 0).is_err());

            for i in 0..MAX_PENDING_UNSTAKES {
                queue_unstake(&mut provider, &mut position, 1, false, i as i64).unwrap();
            }
            assert!(queue_unstake(&mut provider, &mut position, 1, false, 99).is_err());
        }

        #[test]
        fn test_sweep_stops_at_first_immature() {
            let mut provider = create_test_provider(ProviderState::Active, 0, ONE);
            let mut position = create_test_position(&provider);
            credit_shares(&mut provider, &mut position, 300, false).unwrap();

            queue_unstake(&mut provider, &mut position, 100, false, 0).unwrap();
            queue_unstake(&mut provider, &mut position, 100, false, 50).unwrap();
            queue_unstake(&mut provider, &mut position, 100, false, 10).unwrap();

            // Delay 100: entries mature at 100, 150, 110. At t=120 only the
            // head is swept, the third waits behind the second.
            let sweep = sweep_matured_unstakes(&mut provider, &mut position, 100, 120).unwrap();
            assert_eq!(sweep.entries, 1);
            assert_eq!(sweep.amount, 100);
            assert_eq!(position.pending.len(), 2);

            let sweep = sweep_matured_unstakes(&mut provider, &mut position, 100, 150).unwrap();
            assert_eq!(sweep.entries, 2);
            assert_eq!(sweep.amount, 200);
            assert_eq!(provider.pending_raw_shares, 0);
            assert_eq!(provider.staker_count, 0);
        }

        #[test]
        fn test_sweep_nothing_matured() {
            let mut provider = create_test_provider(ProviderState::Active, 0, ONE);
            let mut position = create_test_position(&provider);
            credit_shares(&mut provider, &mut position, 10, false).unwrap();
            queue_unstake(&mut provider, &mut position, 10, false, 0).unwrap();
            assert!(sweep_matured_unstakes(&mut provider, &mut position, 100, 99).is_err());
        }

        #[test]
        fn test_pending_shares_take_the_slash() {
            let mut provider = create_test_provider(ProviderState::Active, 0, ONE);
            let mut position = create_test_position(&provider);
            credit_shares(&mut provider, &mut position, 1_000, false).unwrap();
            queue_unstake(&mut provider, &mut position, 1_000, false, 0).unwrap();

            slash_by_fraction(&mut provider, 5000, 10000).unwrap();

            let sweep = sweep_matured_unstakes(&mut provider, &mut position, 10, 10).unwrap();
            assert_eq!(sweep.amount, 500);
        }
    }
}
