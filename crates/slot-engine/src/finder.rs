//! Two-calendar meeting slot search.
//!
//! Both parties' events are merged into one busy set, converted to the
//! configured timezone's wall clock, and swept day by day. Each day's sweep
//! walks a cursor from the start of the business window past every busy
//! interval attributed to that day, proposing a slot of exactly the requested
//! duration at the start of each gap that is long enough.
//!
//! The day sequence is lazy: callers that only want the first few slots never
//! sweep the remaining days.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::config::{SearchConfig, LUNCH_HOURS, MAX_SLOTS};
use crate::dst::localize;
use crate::event::Event;

/// A proposed meeting time, serialized as RFC 3339 with an explicit offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl Slot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// A busy interval on the configured timezone's wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LocalInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl LocalInterval {
    /// Attributed to `day` when either endpoint falls on it. An event spanning
    /// midnight therefore counts on both boundary days, unclipped.
    fn touches(&self, day: NaiveDate) -> bool {
        self.start.date() == day || self.end.date() == day
    }
}

/// Lazily yield every slot the search finds, day-ascending then in cursor order.
///
/// The sequence is finite (bounded by the date range) and restartable: calling
/// this again with the same inputs yields the same slots. It is not capped;
/// [`find_available_slots`] applies [`MAX_SLOTS`].
pub fn available_slots<'a>(
    events: &[Event],
    config: &'a SearchConfig,
) -> impl Iterator<Item = Slot> + 'a {
    let busy: Vec<LocalInterval> = events
        .iter()
        .map(|event| LocalInterval {
            start: event.start.with_timezone(&config.timezone).naive_local(),
            end: event.end.with_timezone(&config.timezone).naive_local(),
        })
        .collect();

    config
        .date_range
        .days()
        .flat_map(move |day| day_slots(day, &busy, config))
}

/// Find up to [`MAX_SLOTS`] meeting slots free in both calendars.
///
/// `events_a` and `events_b` are merged without distinction. Slots are returned
/// in the order discovered, each exactly `config.duration` long and lying
/// inside the day's business window, clear of every busy
/// interval attributed to that day (including the lunch block when
/// `config.exclude_lunch` is set).
pub fn find_available_slots(
    events_a: &[Event],
    events_b: &[Event],
    config: &SearchConfig,
) -> Vec<Slot> {
    let merged: Vec<Event> = events_a.iter().chain(events_b).copied().collect();
    available_slots(&merged, config).take(MAX_SLOTS).collect()
}

/// Sweep one day. Returns at most [`MAX_SLOTS`] slots.
fn day_slots(day: NaiveDate, busy: &[LocalInterval], config: &SearchConfig) -> Vec<Slot> {
    if config.hours.is_empty() {
        return Vec::new();
    }

    let window_start = day.and_time(config.hours.start);
    let window_end = day.and_time(config.hours.end);

    let mut day_busy: Vec<LocalInterval> =
        busy.iter().filter(|i| i.touches(day)).copied().collect();
    if config.exclude_lunch {
        day_busy.push(lunch_block(day));
    }
    // Stable: equal starts keep input order, lunch last.
    day_busy.sort_by_key(|i| i.start);

    let mut slots = Vec::new();
    let mut cursor = window_start;

    for interval in &day_busy {
        if interval.start > cursor {
            let gap_end = interval.start.min(window_end);
            if let Some(slot) = fit(cursor, gap_end, config) {
                slots.push(slot);
                if slots.len() >= MAX_SLOTS {
                    return slots;
                }
            }
        }
        cursor = cursor.max(interval.end);
    }

    if cursor < window_end {
        if let Some(slot) = fit(cursor, window_end, config) {
            slots.push(slot);
        }
    }

    slots
}

/// A slot at the start of `[cursor, gap_end)` if the gap holds the duration.
///
/// Length is measured between real instants, so a slot crossing a DST
/// transition still lasts exactly `config.duration` (its wall-clock span
/// differs by the shift).
fn fit(cursor: NaiveDateTime, gap_end: NaiveDateTime, config: &SearchConfig) -> Option<Slot> {
    if gap_end <= cursor {
        return None;
    }
    let tz = &config.timezone;
    let start = localize(tz, cursor);
    let end = start
        .checked_add_signed(config.duration)?
        .with_timezone(tz);
    if end > localize(tz, gap_end) {
        return None;
    }
    Some(Slot {
        start: start.fixed_offset(),
        end: end.fixed_offset(),
    })
}

fn lunch_block(day: NaiveDate) -> LocalInterval {
    let (start_hour, end_hour) = LUNCH_HOURS;
    LocalInterval {
        start: day.and_time(hour(start_hour)),
        end: day.and_time(hour(end_hour)),
    }
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN)
}
