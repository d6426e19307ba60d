//! Conversion between period-index ranges and wall-clock ranges.

use super::calendar::{PeriodCalendar, ToSchoolDay};
use super::clock::format_clock;
use super::error::{Result, TimetableError};
use chrono::NaiveTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    #[serde(with = "super::clock::hhmm")]
    pub start: NaiveTime,
    #[serde(with = "super::clock::hhmm")]
    pub end: NaiveTime,
}

/// Start of period `start_index` to end of period `end_index`.
pub fn periods_to_time_range(
    calendar: &PeriodCalendar,
    weekday: impl ToSchoolDay,
    start_index: u32,
    end_index: u32,
) -> Result<TimeRange> {
    let day = weekday.to_school_day()?;
    let table = calendar.day(day);
    let invalid = || TimetableError::InvalidPeriodRange {
        weekday: day.to_string(),
        start: start_index,
        end: end_index,
    };
    if start_index > end_index {
        return Err(invalid());
    }
    let first = table.period(start_index).ok_or_else(invalid)?;
    let last = table.period(end_index).ok_or_else(invalid)?;
    Ok(TimeRange {
        start: first.start,
        end: last.end,
    })
}

/// Indices of every period lying entirely inside `[start, end]`.
///
/// Periods straddling either edge are left out. An empty result is not an
/// error: stored ranges that no longer line up with the table resolve to
/// nothing and the caller decides what that means.
pub fn time_range_to_periods(
    calendar: &PeriodCalendar,
    weekday: impl ToSchoolDay,
    start: NaiveTime,
    end: NaiveTime,
) -> Result<Vec<u32>> {
    let day = weekday.to_school_day()?;
    Ok(calendar
        .day(day)
        .periods()
        .iter()
        .filter(|p| p.start >= start && p.end <= end)
        .map(|p| p.index)
        .collect())
}

/// Strict check for ranges about to be stored: `start` must open a period,
/// `end` must close one, and the range must not be inverted.
pub fn aligned_range(
    calendar: &PeriodCalendar,
    weekday: impl ToSchoolDay,
    start: NaiveTime,
    end: NaiveTime,
) -> Result<TimeRange> {
    let day = weekday.to_school_day()?;
    let table = calendar.day(day);
    let first = table.period_starting_at(start);
    let last = table.period_ending_at(end);
    match (first, last) {
        (Some(a), Some(b)) if a <= b => Ok(TimeRange { start, end }),
        _ => Err(TimetableError::UnalignedRange {
            weekday: day.to_string(),
            start: format_clock(start),
            end: format_clock(end),
        }),
    }
}
