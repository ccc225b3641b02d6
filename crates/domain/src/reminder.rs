use chrono::{DateTime, Utc};
use thiserror::Error;

pub const DEFAULT_REMINDER_OFFSETS: [u32; 3] = [60, 30, 15];
pub const DEFAULT_REMINDER_TOLERANCE: u32 = 5;
/// Offsets are persisted as signed 32 bit integers
pub const MAX_REMINDER_OFFSET: u32 = i32::MAX as u32;

#[derive(Error, Debug, PartialEq)]
pub enum InvalidTiersError {
    #[error("At least one positive reminder offset is required")]
    Empty,
}

/// The minutes before an `Event` at which `User`s should be reminded,
/// together with the tolerance band shared by all of them.
///
/// Offsets are kept distinct and sorted descending so that tier
/// selection always considers the coarsest tier first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderTiers {
    offsets: Vec<u32>,
    tolerance: u32,
}

impl ReminderTiers {
    pub fn new(
        offsets: impl IntoIterator<Item = u32>,
        tolerance: u32,
    ) -> Result<Self, InvalidTiersError> {
        let mut offsets = offsets
            .into_iter()
            .filter(|offset| *offset > 0 && *offset <= MAX_REMINDER_OFFSET)
            .collect::<Vec<_>>();
        offsets.sort_unstable_by(|a, b| b.cmp(a));
        offsets.dedup();
        if offsets.is_empty() {
            return Err(InvalidTiersError::Empty);
        }

        Ok(Self { offsets, tolerance })
    }

    /// Legacy configuration with a single lead time
    pub fn single(lead_minutes: u32, tolerance: u32) -> Result<Self, InvalidTiersError> {
        Self::new(vec![lead_minutes], tolerance)
    }

    /// Parses a comma separated list like `60,30,15`. Entries that are not
    /// positive integers are ignored.
    pub fn parse_offsets(raw: &str) -> Vec<u32> {
        raw.split(',')
            .filter_map(|value| value.trim().parse::<u32>().ok())
            .filter(|value| *value > 0)
            .collect()
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    /// The smallest tier. Once sent, no more tiered reminders follow.
    pub fn finest(&self) -> u32 {
        // Constructor guarantees at least one offset
        self.offsets[self.offsets.len() - 1]
    }

    /// A sweep running every `sweep_interval_minutes` observes every tier
    /// window at least once only if the interval does not exceed the
    /// tolerance.
    pub fn is_sweep_interval_safe(&self, sweep_interval_minutes: u32) -> bool {
        sweep_interval_minutes <= self.tolerance
    }

    /// Selects the coarsest tier whose window `[tier - tolerance, tier]`
    /// contains `minutes_left` and which is strictly finer than
    /// `last_offset_minutes`.
    pub fn select(&self, minutes_left: i64, last_offset_minutes: Option<u32>) -> Option<u32> {
        self.offsets.iter().copied().find(|tier| {
            let upper = i64::from(*tier);
            let lower = upper - i64::from(self.tolerance);
            let in_window = minutes_left <= upper && minutes_left >= lower;
            let finer_than_sent = match last_offset_minutes {
                Some(last) => *tier < last,
                None => true,
            };
            in_window && finer_than_sent
        })
    }
}

impl Default for ReminderTiers {
    fn default() -> Self {
        Self {
            offsets: DEFAULT_REMINDER_OFFSETS.to_vec(),
            tolerance: DEFAULT_REMINDER_TOLERANCE,
        }
    }
}

/// Whole minutes until `start_time`, rounded half up and never below 1
pub fn minutes_left(start_time: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (start_time - now).num_milliseconds();
    let minutes = (millis + 30_000).div_euclid(60_000);
    minutes.max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingStartTime,
    AlreadyStarted,
    NoTierDue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderDecision {
    Send { tier_minutes: u32, minutes_left: i64 },
    Skip(SkipReason),
}

/// Decides whether a reminder for an event starting at `start_time`
/// should be sent at `now`.
pub fn decide_reminder(
    tiers: &ReminderTiers,
    start_time: Option<DateTime<Utc>>,
    last_offset_minutes: Option<u32>,
    now: DateTime<Utc>,
) -> ReminderDecision {
    let start_time = match start_time {
        Some(start_time) => start_time,
        None => return ReminderDecision::Skip(SkipReason::MissingStartTime),
    };
    if start_time < now {
        return ReminderDecision::Skip(SkipReason::AlreadyStarted);
    }

    let minutes_left = minutes_left(start_time, now);
    match tiers.select(minutes_left, last_offset_minutes) {
        Some(tier_minutes) => ReminderDecision::Send {
            tier_minutes,
            minutes_left,
        },
        None => ReminderDecision::Skip(SkipReason::NoTierDue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn sorts_and_dedups_offsets() {
        let tiers = ReminderTiers::new(vec![15, 60, 30, 60, 0], 5).unwrap();
        assert_eq!(tiers.offsets(), &[60, 30, 15]);
        assert_eq!(tiers.finest(), 15);
        assert_eq!(
            ReminderTiers::new(vec![0], 5),
            Err(InvalidTiersError::Empty)
        );
    }

    #[test]
    fn drops_offsets_that_cannot_be_stored() {
        let tiers = ReminderTiers::new(vec![MAX_REMINDER_OFFSET + 1, 30], 5).unwrap();
        assert_eq!(tiers.offsets(), &[30]);
        assert_eq!(
            ReminderTiers::new(vec![u32::MAX], 5),
            Err(InvalidTiersError::Empty)
        );
    }

    #[test]
    fn parses_offset_lists() {
        assert_eq!(ReminderTiers::parse_offsets("60,30,15"), vec![60, 30, 15]);
        assert_eq!(
            ReminderTiers::parse_offsets(" 15, abc ,-3, 0,45 "),
            vec![15, 45]
        );
        assert!(ReminderTiers::parse_offsets("").is_empty());
    }

    #[test]
    fn legacy_lead_time_is_a_single_tier() {
        let tiers = ReminderTiers::single(30, 5).unwrap();
        assert_eq!(tiers.offsets(), &[30]);
        assert_eq!(tiers.select(27, None), Some(30));
    }

    #[test]
    fn selects_tier_whose_window_contains_minutes_left() {
        let tiers = ReminderTiers::default();
        assert_eq!(tiers.select(58, None), Some(60));
        assert_eq!(tiers.select(29, None), Some(30));
        assert_eq!(tiers.select(12, None), Some(15));
        assert_eq!(tiers.select(16, Some(30)), None);
        assert_eq!(tiers.select(40, None), None);
        assert_eq!(tiers.select(61, None), None);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let tiers = ReminderTiers::default();
        assert_eq!(tiers.select(60, None), Some(60));
        assert_eq!(tiers.select(55, None), Some(60));
        assert_eq!(tiers.select(54, None), None);
        assert_eq!(tiers.select(10, None), Some(15));
        assert_eq!(tiers.select(9, None), None);
    }

    #[test]
    fn never_selects_a_tier_that_is_not_finer_than_the_last_one() {
        let tiers = ReminderTiers::default();
        assert_eq!(tiers.select(58, Some(60)), None);
        assert_eq!(tiers.select(29, Some(60)), Some(30));
        assert_eq!(tiers.select(29, Some(30)), None);
        assert_eq!(tiers.select(12, Some(15)), None);
    }

    #[test]
    fn prefers_coarsest_tier_when_windows_overlap() {
        let tiers = ReminderTiers::new(vec![20, 18], 5).unwrap();
        assert_eq!(tiers.select(17, None), Some(20));
        assert_eq!(tiers.select(17, Some(20)), Some(18));
    }

    #[test]
    fn terminal_tier_stops_all_further_reminders() {
        let tiers = ReminderTiers::default();
        for minutes in 1..=120 {
            assert_eq!(tiers.select(minutes, Some(tiers.finest())), None);
        }
    }

    #[test]
    fn minutes_left_rounds_and_clamps() {
        assert_eq!(minutes_left(now() + Duration::minutes(58), now()), 58);
        assert_eq!(minutes_left(now() + Duration::seconds(89), now()), 1);
        assert_eq!(minutes_left(now() + Duration::seconds(90), now()), 2);
        assert_eq!(minutes_left(now() + Duration::seconds(10), now()), 1);
        assert_eq!(minutes_left(now(), now()), 1);
    }

    #[test]
    fn decide_skips_unusable_events() {
        let tiers = ReminderTiers::default();
        assert_eq!(
            decide_reminder(&tiers, None, None, now()),
            ReminderDecision::Skip(SkipReason::MissingStartTime)
        );
        assert_eq!(
            decide_reminder(&tiers, Some(now() - Duration::minutes(1)), None, now()),
            ReminderDecision::Skip(SkipReason::AlreadyStarted)
        );
        assert_eq!(
            decide_reminder(&tiers, Some(now() + Duration::minutes(45)), None, now()),
            ReminderDecision::Skip(SkipReason::NoTierDue)
        );
    }

    #[test]
    fn decide_sends_finest_tier_for_event_starting_now() {
        let tiers = ReminderTiers::default();
        assert_eq!(
            decide_reminder(&tiers, Some(now()), None, now()),
            ReminderDecision::Skip(SkipReason::NoTierDue)
        );
        let tiers = ReminderTiers::new(vec![30, 5], 5).unwrap();
        assert_eq!(
            decide_reminder(&tiers, Some(now()), None, now()),
            ReminderDecision::Send {
                tier_minutes: 5,
                minutes_left: 1
            }
        );
    }

    // Simulates sweeps every `interval` minutes, starting at different
    // phases, and checks that each tier is sent exactly once and in order.
    fn simulate(tiers: &ReminderTiers, interval: i64, phase_seconds: i64) -> Vec<u32> {
        let start_time = now() + Duration::minutes(180);
        let mut last = None;
        let mut sent = Vec::new();
        let mut at = now() + Duration::seconds(phase_seconds);
        while at <= start_time {
            if let ReminderDecision::Send { tier_minutes, .. } =
                decide_reminder(tiers, Some(start_time), last, at)
            {
                sent.push(tier_minutes);
                last = Some(tier_minutes);
            }
            at = at + Duration::minutes(interval);
        }
        sent
    }

    #[test]
    fn sweep_interval_within_tolerance_never_misses_a_window() {
        for tolerance in 1..=10u32 {
            let tiers = ReminderTiers::new(vec![90, 60, 30, 15], tolerance).unwrap();
            for interval in 1..=i64::from(tolerance) {
                assert!(tiers.is_sweep_interval_safe(interval as u32));
                for phase in (0..interval * 60).step_by(7) {
                    assert_eq!(
                        simulate(&tiers, interval, phase),
                        vec![90, 60, 30, 15],
                        "tolerance {} interval {} phase {}s",
                        tolerance,
                        interval,
                        phase
                    );
                }
            }
        }
    }

    #[test]
    fn sweep_interval_above_tolerance_can_miss_a_window() {
        let tiers = ReminderTiers::default();
        assert!(!tiers.is_sweep_interval_safe(10));
        let missed = (0..600)
            .step_by(7)
            .any(|phase| simulate(&tiers, 10, phase) != vec![60, 30, 15]);
        assert!(missed);
    }
}
