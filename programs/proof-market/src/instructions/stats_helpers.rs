//! Epoch schedule and lazily rolled activity counters

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::events::EpochRolledOver;
use crate::state::{EpochSchedule, StatsBucket, StatsCounters, MAX_SCHEDULED_EPOCHS};

/// Activity recorded into a stats bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsEvent {
    Bid,
    Reveal,
    Fulfilled { fee: u64 },
    Refunded,
    /// Refund of a request whose winner never submitted. Counts as a refund
    /// and a missed assignment.
    Missed,
}

/// Epoch id in effect at `now`. Epoch 0 is the period before any boundary.
pub fn current_epoch_id(schedule: &EpochSchedule, now: i64) -> u64 {
    let started = schedule.starts.iter().take_while(|start| **start <= now).count() as u64;
    if started == 0 {
        schedule.first_id.saturating_sub(1)
    } else {
        schedule.first_id + started - 1
    }
}

/// Append a boundary starting at `start`. Returns the new epoch id.
///
/// Boundaries that already started are pruned, keeping only the latest one
/// so `current_epoch_id` stays correct.
pub fn schedule_epoch_boundary(schedule: &mut EpochSchedule, start: i64, now: i64) -> Result<u64> {
    require!(start > now, MarketError::EpochAlreadyStarted);
    if let Some(last) = schedule.starts.last() {
        require!(start > *last, MarketError::EpochNotIncreasing);
    }

    let started = schedule.starts.iter().take_while(|s| **s <= now).count();
    if started > 1 {
        schedule.starts.drain(..started - 1);
        schedule.first_id += (started - 1) as u64;
    }

    require!(
        schedule.starts.len() < MAX_SCHEDULED_EPOCHS,
        MarketError::EpochScheduleFull
    );

    let id = schedule
        .last_id
        .checked_add(1)
        .ok_or(MarketError::ArithmeticOverflow)?;
    if schedule.starts.is_empty() {
        schedule.first_id = id;
    }
    schedule.starts.push(start);
    schedule.last_id = id;
    Ok(id)
}

/// Remove the last boundary if it has not started. Returns its id and start.
pub fn pop_epoch_boundary(schedule: &mut EpochSchedule, now: i64) -> Result<(u64, i64)> {
    let start = *schedule.starts.last().ok_or(MarketError::EpochNotFound)?;
    require!(start > now, MarketError::EpochAlreadyStarted);

    schedule.starts.pop();
    let id = schedule.last_id;
    schedule.last_id -= 1;
    if schedule.starts.is_empty() {
        schedule.first_id = schedule.last_id + 1;
    }
    Ok((id, start))
}

/// Reset the recent window if `epoch_id` moved past the bucket's epoch.
/// Returns the epoch the bucket rolled over from.
pub fn roll_bucket(bucket: &mut StatsBucket, epoch_id: u64) -> Option<u64> {
    if epoch_id <= bucket.epoch_id {
        return None;
    }
    let from = bucket.epoch_id;
    bucket.recent = StatsCounters::default();
    bucket.epoch_id = epoch_id;
    Some(from)
}

fn apply_event(counters: &mut StatsCounters, event: StatsEvent, now: i64) {
    match event {
        StatsEvent::Bid => counters.bids = counters.bids.saturating_add(1),
        StatsEvent::Reveal => counters.reveals = counters.reveals.saturating_add(1),
        StatsEvent::Fulfilled { fee } => {
            counters.fulfilled = counters.fulfilled.saturating_add(1);
            counters.fees_received = counters.fees_received.saturating_add(fee);
        }
        StatsEvent::Refunded => counters.refunded = counters.refunded.saturating_add(1),
        StatsEvent::Missed => {
            counters.refunded = counters.refunded.saturating_add(1);
            counters.missed = counters.missed.saturating_add(1);
        }
    }
    counters.last_active = now;
}

/// Record `event` in both windows, rolling the recent window first.
pub fn record_stats(bucket: &mut StatsBucket, event: StatsEvent, epoch_id: u64, now: i64) -> Option<u64> {
    let rolled = roll_bucket(bucket, epoch_id);
    apply_event(&mut bucket.lifetime, event, now);
    apply_event(&mut bucket.recent, event, now);
    rolled
}

/// `record_stats` for an on-chain bucket, announcing any rollover.
pub fn record_activity(
    owner: Pubkey,
    bucket: &mut StatsBucket,
    schedule: &EpochSchedule,
    event: StatsEvent,
    now: i64,
) {
    let epoch_id = current_epoch_id(schedule, now);
    if let Some(from_epoch) = record_stats(bucket, event, epoch_id, now) {
        emit!(EpochRolledOver {
            owner,
            from_epoch,
            to_epoch: epoch_id,
            timestamp: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule_with(starts: &[i64]) -> EpochSchedule {
        let mut schedule = EpochSchedule::default();
        for start in starts {
            schedule_epoch_boundary(&mut schedule, *start, 0).unwrap();
        }
        schedule
    }

    mod schedule_tests {
        use super::*;

        #[test]
        fn test_epoch_zero_before_first_boundary() {
            let schedule = EpochSchedule::default();
            assert_eq!(current_epoch_id(&schedule, 1_000), 0);

            let schedule = schedule_with(&[100]);
            assert_eq!(current_epoch_id(&schedule, 99), 0);
            assert_eq!(current_epoch_id(&schedule, 100), 1);
        }

        #[test]
        fn test_ids_follow_boundaries() {
            let schedule = schedule_with(&[100, 200, 300]);
            assert_eq!(current_epoch_id(&schedule, 150), 1);
            assert_eq!(current_epoch_id(&schedule, 200), 2);
            assert_eq!(current_epoch_id(&schedule, 10_000), 3);
        }

        #[test]
        fn test_start_must_be_future_and_increasing() {
            let mut schedule = schedule_with(&[100]);
            assert!(schedule_epoch_boundary(&mut schedule, 50, 60).is_err());
            assert!(schedule_epoch_boundary(&mut schedule, 100, 0).is_err());
            assert!(schedule_epoch_boundary(&mut schedule, 99, 0).is_err());
            assert_eq!(schedule_epoch_boundary(&mut schedule, 101, 0).unwrap(), 2);
        }

        #[test]
        fn test_prune_keeps_latest_started() {
            let mut schedule = schedule_with(&[100, 200, 300]);
            let id = schedule_epoch_boundary(&mut schedule, 400, 250).unwrap();
            assert_eq!(id, 4);
            assert_eq!(schedule.starts, vec![200, 300, 400]);
            assert_eq!(schedule.first_id, 2);
            assert_eq!(current_epoch_id(&schedule, 250), 2);
            assert_eq!(current_epoch_id(&schedule, 450), 4);
        }

        #[test]
        fn test_capacity() {
            let mut schedule = EpochSchedule::default();
            for i in 0..MAX_SCHEDULED_EPOCHS as i64 {
                schedule_epoch_boundary(&mut schedule, 100 + i, 0).unwrap();
            }
            assert!(schedule_epoch_boundary(&mut schedule, 10_000, 0).is_err());
            // Once most have started they are pruned and room frees up
            assert!(schedule_epoch_boundary(&mut schedule, 10_000, 500).is_ok());
        }

        #[test]
        fn test_pop_future_only() {
            let mut schedule = schedule_with(&[100, 200]);
            assert!(pop_epoch_boundary(&mut schedule, 250).is_err());

            assert_eq!(pop_epoch_boundary(&mut schedule, 150).unwrap(), (2, 200));
            assert_eq!(schedule.last_id, 1);
            assert_eq!(current_epoch_id(&schedule, 1_000), 1);

            assert_eq!(pop_epoch_boundary(&mut schedule, 50).unwrap(), (1, 100));
            assert_eq!(current_epoch_id(&schedule, 1_000), 0);
            assert!(pop_epoch_boundary(&mut schedule, 0).is_err());

            assert_eq!(schedule_epoch_boundary(&mut schedule, 300, 0).unwrap(), 1);
        }
    }

    mod bucket_tests {
        use super::*;

        #[test]
        fn test_same_epoch_accumulates() {
            let mut bucket = StatsBucket::default();
            assert_eq!(record_stats(&mut bucket, StatsEvent::Bid, 0, 10), None);
            assert_eq!(record_stats(&mut bucket, StatsEvent::Bid, 0, 11), None);
            assert_eq!(bucket.recent.bids, 2);
            assert_eq!(bucket.lifetime.bids, 2);
            assert_eq!(bucket.recent.last_active, 11);
        }

        #[test]
        fn test_rollover_resets_recent_only() {
            let mut bucket = StatsBucket::default();
            record_stats(&mut bucket, StatsEvent::Fulfilled { fee: 500 }, 1, 10);
            let rolled = record_stats(&mut bucket, StatsEvent::Fulfilled { fee: 200 }, 2, 20);
            assert_eq!(rolled, Some(1));
            assert_eq!(bucket.recent.fulfilled, 1);
            assert_eq!(bucket.recent.fees_received, 200);
            assert_eq!(bucket.lifetime.fulfilled, 2);
            assert_eq!(bucket.lifetime.fees_received, 700);
        }

        #[test]
        fn test_rollover_across_many_boundaries() {
            let schedule = schedule_with(&[100, 200, 300, 400]);
            let mut bucket = StatsBucket::default();
            record_stats(&mut bucket, StatsEvent::Missed, current_epoch_id(&schedule, 150), 150);
            assert_eq!(bucket.epoch_id, 1);

            let rolled = record_stats(
                &mut bucket,
                StatsEvent::Refunded,
                current_epoch_id(&schedule, 450),
                450,
            );
            assert_eq!(rolled, Some(1));
            assert_eq!(bucket.epoch_id, 4);
            assert_eq!(bucket.recent.missed, 0);
            assert_eq!(bucket.recent.refunded, 1);
            assert_eq!(bucket.lifetime.missed, 1);
        }

        #[test]
        fn test_missed_assignment_counts_as_refund() {
            let mut bucket = StatsBucket::default();
            record_stats(&mut bucket, StatsEvent::Missed, 0, 10);
            record_stats(&mut bucket, StatsEvent::Refunded, 0, 20);
            assert_eq!(bucket.lifetime.refunded, 2);
            assert_eq!(bucket.lifetime.missed, 1);
            assert_eq!(bucket.recent.refunded, 2);
            assert_eq!(bucket.recent.missed, 1);
            assert_eq!(bucket.lifetime.last_active, 20);
        }

        #[test]
        fn test_older_epoch_does_not_roll_back() {
            let mut bucket = StatsBucket::default();
            record_stats(&mut bucket, StatsEvent::Reveal, 3, 10);
            assert_eq!(record_stats(&mut bucket, StatsEvent::Reveal, 2, 11), None);
            assert_eq!(bucket.epoch_id, 3);
            assert_eq!(bucket.recent.reveals, 2);
        }
    }
}
