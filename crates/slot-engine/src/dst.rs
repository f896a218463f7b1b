//! Wall-clock to instant resolution across DST transitions.

use chrono::{Duration, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// Attach `tz` to a local wall-clock time.
///
/// - Unique local times map directly.
/// - Ambiguous times (clocks falling back) resolve to the earlier instant.
/// - Times inside a spring-forward gap shift forward, in 15-minute steps, to the
///   first valid local time after the gap.
pub fn localize(tz: &Tz, local: NaiveDateTime) -> chrono::DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => shift_past_gap(tz, local),
    }
}

fn shift_past_gap(tz: &Tz, local: NaiveDateTime) -> chrono::DateTime<Tz> {
    // Real-world gaps are at most a couple of hours; probe in 15-minute steps.
    for step in 1..=12 {
        let shift = Duration::minutes(15 * step);
        if let Some(dt) = tz.from_local_datetime(&(local + shift)).earliest() {
            return dt;
        }
    }
    // Unreachable for IANA zones; fall back to reading the wall clock as UTC.
    tz.from_utc_datetime(&local)
}
