//! Nag timing and priority policy.
//!
//! The clock ticks once per second; a nag fires on the ticks where the elapsed
//! time is an exact multiple of the configured delay. Anything under five
//! minutes is left alone, and the priority climbs as the gap grows.

use chrono::{DateTime, Duration, TimeZone};
use serde::{Deserialize, Serialize};

/// Gaps shorter than this never nag
pub const PRIORITY_LOW_MINUTES: i64 = 5;
pub const PRIORITY_HIGH_MINUTES: i64 = 15;
pub const PRIORITY_VERY_HIGH_MINUTES: i64 = 30;

const SECONDS_PER_DAY: i64 = 86_400;

/// GNTP priority values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Normal,
    High,
    Emergency,
}

impl Priority {
    pub fn as_gntp(self) -> i8 {
        match self {
            Priority::Normal => 0,
            Priority::High => 1,
            Priority::Emergency => 2,
        }
    }
}

/// Whether a nag is suppressed outright because the gap is still short
pub fn below_floor(elapsed: Duration) -> bool {
    elapsed < Duration::minutes(PRIORITY_LOW_MINUTES)
}

pub fn should_nag(elapsed: Duration, delay: std::time::Duration) -> bool {
    // an interval too large for i64 never comes around
    let Ok(delay) = i64::try_from(delay.as_secs()) else {
        return false;
    };
    if delay == 0 || below_floor(elapsed) {
        return false;
    }
    elapsed.num_seconds() % delay == 0
}

pub fn priority_for(elapsed: Duration) -> Priority {
    if elapsed > Duration::minutes(PRIORITY_VERY_HIGH_MINUTES) {
        Priority::Emergency
    } else if elapsed > Duration::minutes(PRIORITY_HIGH_MINUTES) {
        Priority::High
    } else {
        Priority::Normal
    }
}

/// Priority to nag with on this tick, or `None` to stay quiet
pub fn decide(elapsed: Duration, delay: std::time::Duration) -> Option<Priority> {
    should_nag(elapsed, delay).then(|| priority_for(elapsed))
}

fn split_days(elapsed: Duration) -> (i64, i64) {
    let total = elapsed.num_seconds();
    (
        total.div_euclid(SECONDS_PER_DAY),
        total.rem_euclid(SECONDS_PER_DAY),
    )
}

/// `H:MM:SS`, prefixed with `N day(s), ` once the span crosses a day
pub fn format_elapsed(elapsed: Duration) -> String {
    let (days, rest) = split_days(elapsed);
    let clock = format!(
        "{}:{:02}:{:02}",
        rest / 3600,
        (rest % 3600) / 60,
        rest % 60
    );
    if days == 0 {
        clock
    } else {
        let plural = if days.abs() == 1 { "" } else { "s" };
        format!("{} day{}, {}", days, plural, clock)
    }
}

/// Status label; collapses to the infinity sign past a day to keep it short
pub fn title_label(elapsed: Duration) -> String {
    let (days, _) = split_days(elapsed);
    if days != 0 {
        "⏳∞".to_string()
    } else {
        format!("⏳{}", format_elapsed(elapsed))
    }
}

/// Time left until the next midnight in `now`'s timezone
pub fn remaining_today<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let tomorrow = now.date_naive().succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0));
    match tomorrow.and_then(|t| now.timezone().from_local_datetime(&t).earliest()) {
        Some(midnight) => midnight.signed_duration_since(now.clone()),
        None => Duration::zero(),
    }
}
