//! Quest deadline computation

use chrono::{DateTime, TimeZone, Timelike};

use super::definition::{QuestDefinition, TimeLimit};

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// Absolute expiry (unix seconds) for a quest granted at `now`; 0 when the
/// quest never expires.
///
/// Recurring windows are evaluated against `now`'s own wall-clock time, so
/// pass a local time to get server-local boundaries. A boundary equal to the
/// current second rolls over to the next cycle.
pub fn compute_deadline<Tz: TimeZone>(quest: &QuestDefinition, now: &DateTime<Tz>) -> i64 {
    let timestamp = now.timestamp();

    match quest.time_limit {
        TimeLimit::None => 0,
        TimeLimit::Duration(secs) => timestamp + i64::from(secs),
        TimeLimit::Recurring(window) => {
            let minute_secs = i64::from(window.minute_of_hour) * 60;

            let until_boundary = match window.hour_of_day {
                Some(hour) => {
                    let elapsed = i64::from(now.num_seconds_from_midnight());
                    let target = i64::from(hour) * SECONDS_PER_HOUR + minute_secs;
                    seconds_until(elapsed, target, SECONDS_PER_DAY)
                }
                None => {
                    let elapsed = i64::from(now.minute() * 60 + now.second());
                    seconds_until(elapsed, minute_secs, SECONDS_PER_HOUR)
                }
            };

            timestamp + window.day_offset_secs() + until_boundary
        }
    }
}

/// Seconds from `elapsed` to `target` within a cycle of `period` seconds
fn seconds_until(elapsed: i64, target: i64, period: i64) -> i64 {
    if elapsed < target {
        target - elapsed
    } else {
        target + period - elapsed
    }
}

/// Whether a deadline has passed; 0 never expires
pub fn is_expired(deadline: i64, now: i64) -> bool {
    deadline != 0 && now >= deadline
}
