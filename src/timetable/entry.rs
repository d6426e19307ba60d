use super::calendar::{PeriodCalendar, SchoolDay};
use super::clock::hhmm;
use super::error::Result;
use super::resolver::{aligned_range, periods_to_time_range, time_range_to_periods, TimeRange};
use chrono::NaiveTime;
use serde::Serialize;

/// One teacher teaching one class one subject over a contiguous range of
/// periods on one day. Overlap with other entries is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    pub teacher_id: String,
    pub weekday: SchoolDay,
    pub class_id: String,
    pub subject: String,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl ScheduleEntry {
    /// Periods this entry covers. Empty when the stored range has drifted
    /// off the period table.
    pub fn periods(&self, calendar: &PeriodCalendar) -> Vec<u32> {
        time_range_to_periods(calendar, self.weekday, self.start, self.end).unwrap_or_default()
    }
}

/// How the editing surface places an entry on its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Periods { start: u32, end: u32 },
    Times { start: NaiveTime, end: NaiveTime },
}

impl Placement {
    pub fn resolve(&self, calendar: &PeriodCalendar, day: SchoolDay) -> Result<TimeRange> {
        match *self {
            Placement::Periods { start, end } => periods_to_time_range(calendar, day, start, end),
            Placement::Times { start, end } => aligned_range(calendar, day, start, end),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub teacher_id: String,
    pub weekday: SchoolDay,
    pub class_id: String,
    pub subject: String,
    pub placement: Placement,
}

impl EntryDraft {
    pub fn into_entry(self, id: String, calendar: &PeriodCalendar) -> Result<ScheduleEntry> {
        let range = self.placement.resolve(calendar, self.weekday)?;
        Ok(ScheduleEntry {
            id,
            teacher_id: self.teacher_id,
            weekday: self.weekday,
            class_id: self.class_id,
            subject: self.subject,
            start: range.start,
            end: range.end,
        })
    }
}
