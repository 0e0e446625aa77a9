//! Slot availability over a business's weekly operating hours.
//!
//! Timezone policy: calendar dates and "HH:MM" wall-clock times are civil
//! values. The weekday of a date is taken from the calendar date itself,
//! and date+time pairs are combined into UTC instants. "Now" always comes
//! from an injected [`crate::clock::Clock`].

use crate::types::{BusinessHours, TIME_REGEX};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidDate,
    EndBeforeOrEqualStart,
    StartNotInFuture,
    OutOfScheduleWindow,
    PeopleCountOutOfRange,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ValidationError::InvalidDate => "Date or time could not be parsed",
            ValidationError::EndBeforeOrEqualStart => "End time must be after the start time",
            ValidationError::StartNotInFuture => "Start time must be in the future",
            ValidationError::OutOfScheduleWindow => {
                "Requested window is outside the business hours for that day"
            }
            ValidationError::PeopleCountOutOfRange => "Number of people must be between 1 and 8",
        };
        write!(f, "{message}")
    }
}

/// A validated reservation window, ready to hand to the reservation sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub number_of_people: u32,
}

/// Day-of-week index (0=Sunday..6=Saturday) of a "YYYY-MM-DD" date, or
/// `None` when the date does not parse.
pub fn day_index_for_date(date: &str) -> Option<u32> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(parsed.weekday().num_days_from_sunday())
}

/// Single gate for slot generation: a missing entry, an explicit closed
/// flag, or an absent bound all mean "no slots today".
pub fn is_day_closed(entry: Option<&BusinessHours>) -> bool {
    match entry {
        None => true,
        Some(entry) => entry.is_closed || entry.open_time.is_none() || entry.close_time.is_none(),
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    if !TIME_REGEX.is_match(value) {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

fn minutes_of(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) / 60
}

fn time_from_minutes(minutes: i64) -> Option<NaiveTime> {
    let minutes = u32::try_from(minutes).ok()?;
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// The open window in minutes-from-midnight, or `None` when the day is
/// closed or a bound is malformed.
fn open_window(entry: Option<&BusinessHours>) -> Option<(i64, i64)> {
    if is_day_closed(entry) {
        return None;
    }
    let entry = entry?;
    let open = parse_time(entry.open_time.as_deref()?)?;
    let close = parse_time(entry.close_time.as_deref()?)?;
    Some((minutes_of(open), minutes_of(close)))
}

/// Bookable start times for the day, ascending: from `open_time`, stepping
/// by `interval`, each strictly before `close_time`. Empty on closed days.
pub fn list_start_times(entry: Option<&BusinessHours>, interval: Duration) -> Vec<NaiveTime> {
    let step = interval.num_minutes();
    let Some((open, close)) = open_window(entry) else {
        return vec![];
    };
    if step <= 0 {
        return vec![];
    }

    let mut times = vec![];
    let mut minutes = open;
    while minutes < close {
        if let Some(time) = time_from_minutes(minutes) {
            times.push(time);
        }
        minutes += step;
    }
    times
}

/// Bookable end times for a chosen start, ascending: from
/// `chosen_start + interval`, stepping by `interval`, each at most
/// `close_time`. A reservation may run exactly to closing, so the right
/// bound is inclusive. Empty when the day is closed or no start is chosen.
pub fn list_end_times(
    entry: Option<&BusinessHours>,
    chosen_start: Option<NaiveTime>,
    interval: Duration,
) -> Vec<NaiveTime> {
    let step = interval.num_minutes();
    let Some((_, close)) = open_window(entry) else {
        return vec![];
    };
    let Some(start) = chosen_start else {
        return vec![];
    };
    if step <= 0 {
        return vec![];
    }

    let mut times = vec![];
    let mut minutes = minutes_of(start) + step;
    while minutes <= close {
        if let Some(time) = time_from_minutes(minutes) {
            times.push(time);
        }
        minutes += step;
    }
    times
}

/// Validates a fully specified reservation window against the day's
/// schedule and `now`. Unlike the interactive flow, which only ever offers
/// values from the enumerated lists, this re-checks membership explicitly
/// so a caller cannot slip in an off-grid or out-of-hours window.
pub fn validate_reservation_window(
    entry: Option<&BusinessHours>,
    date: &str,
    start_time: &str,
    end_time: &str,
    number_of_people: u32,
    now: DateTime<Utc>,
    interval: Duration,
) -> Result<ValidatedWindow, ValidationError> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate)?;
    let start = parse_time(start_time).ok_or(ValidationError::InvalidDate)?;
    let end = parse_time(end_time).ok_or(ValidationError::InvalidDate)?;

    let start_instant = day.and_time(start).and_utc();
    let end_instant = day.and_time(end).and_utc();

    if end_instant <= start_instant {
        return Err(ValidationError::EndBeforeOrEqualStart);
    }
    if start_instant <= now {
        return Err(ValidationError::StartNotInFuture);
    }
    if !list_start_times(entry, interval).contains(&start)
        || !list_end_times(entry, Some(start), interval).contains(&end)
    {
        return Err(ValidationError::OutOfScheduleWindow);
    }
    if !(1..=8).contains(&number_of_people) {
        return Err(ValidationError::PeopleCountOutOfRange);
    }

    Ok(ValidatedWindow {
        start: start_instant,
        end: end_instant,
        number_of_people,
    })
}
