//! Consecutive-entry merging into teaching blocks.
//!
//! One left-to-right pass. An item joins the open block when it is on the
//! same day, for the same class and subject, and starts exactly where the
//! block ends. Otherwise the block is closed and never reopened. Input must
//! already be sorted by start time.

use super::calendar::{PeriodCalendar, SchoolDay};
use super::clock::{hhmm, range_label};
use super::entry::ScheduleEntry;
use super::resolver::time_range_to_periods;
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;

/// Something the merger can fold into a block.
pub trait Mergeable {
    fn weekday(&self) -> SchoolDay;
    fn class_id(&self) -> &str;
    fn subject(&self) -> &str;
    fn start(&self) -> NaiveTime;
    fn end(&self) -> NaiveTime;
    /// Session numbers carried by this item at 1-based input `position`.
    fn session_numbers(&self, position: usize) -> Vec<usize>;
}

impl Mergeable for ScheduleEntry {
    fn weekday(&self) -> SchoolDay {
        self.weekday
    }
    fn class_id(&self) -> &str {
        &self.class_id
    }
    fn subject(&self) -> &str {
        &self.subject
    }
    fn start(&self) -> NaiveTime {
        self.start
    }
    fn end(&self) -> NaiveTime {
        self.end
    }
    fn session_numbers(&self, position: usize) -> Vec<usize> {
        vec![position]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBlock {
    pub weekday: SchoolDay,
    pub class_id: String,
    pub subject: String,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub period_indices: Vec<u32>,
    pub session_count: usize,
    pub session_numbers: Vec<usize>,
}

impl ScheduleBlock {
    fn open<T: Mergeable>(item: &T, position: usize) -> Self {
        let session_numbers = item.session_numbers(position);
        Self {
            weekday: item.weekday(),
            class_id: item.class_id().to_string(),
            subject: item.subject().to_string(),
            start: item.start(),
            end: item.end(),
            period_indices: Vec::new(),
            session_count: session_numbers.len(),
            session_numbers,
        }
    }

    fn accepts<T: Mergeable>(&self, item: &T) -> bool {
        item.weekday() == self.weekday
            && item.class_id() == self.class_id
            && item.subject() == self.subject
            && item.start() == self.end
    }

    fn close(mut self, calendar: &PeriodCalendar) -> Self {
        self.period_indices =
            time_range_to_periods(calendar, self.weekday, self.start, self.end).unwrap_or_default();
        self
    }

    /// `2 JP (3-4)`, `1 JP (5)`; the clock range when the block sits off the
    /// period table.
    pub fn label(&self) -> String {
        match self.period_indices.as_slice() {
            [] => range_label(self.start, self.end),
            [only] => format!("1 JP ({})", only),
            [first, .., last] => format!(
                "{} JP ({}-{})",
                self.period_indices.len(),
                first,
                last
            ),
        }
    }

    pub fn time_label(&self) -> String {
        range_label(self.start, self.end)
    }
}

impl Mergeable for ScheduleBlock {
    fn weekday(&self) -> SchoolDay {
        self.weekday
    }
    fn class_id(&self) -> &str {
        &self.class_id
    }
    fn subject(&self) -> &str {
        &self.subject
    }
    fn start(&self) -> NaiveTime {
        self.start
    }
    fn end(&self) -> NaiveTime {
        self.end
    }
    fn session_numbers(&self, _position: usize) -> Vec<usize> {
        self.session_numbers.clone()
    }
}

pub fn merge_consecutive<T: Mergeable>(
    calendar: &PeriodCalendar,
    items: &[T],
) -> Vec<ScheduleBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<ScheduleBlock> = None;

    for (i, item) in items.iter().enumerate() {
        let position = i + 1;
        if let Some(block) = current.as_mut().filter(|b| b.accepts(item)) {
            block.end = item.end();
            block.session_numbers.extend(item.session_numbers(position));
            block.session_count = block.session_numbers.len();
            continue;
        }
        if let Some(done) = current.take() {
            blocks.push(done.close(calendar));
        }
        current = Some(ScheduleBlock::open(item, position));
    }
    if let Some(done) = current {
        blocks.push(done.close(calendar));
    }
    blocks
}

/// Blocks for one day of a teacher's listing, in clock order.
pub fn blocks_for_day(
    calendar: &PeriodCalendar,
    entries: &[ScheduleEntry],
    day: SchoolDay,
) -> Vec<ScheduleBlock> {
    let mut todays: Vec<&ScheduleEntry> = entries.iter().filter(|e| e.weekday == day).collect();
    todays.sort_by_key(|e| e.start);
    let todays: Vec<ScheduleEntry> = todays.into_iter().cloned().collect();
    merge_consecutive(calendar, &todays)
}

/// The dashboard's "today" listing. Weekends have no blocks.
pub fn todays_blocks(
    calendar: &PeriodCalendar,
    entries: &[ScheduleEntry],
    date: NaiveDate,
) -> Vec<ScheduleBlock> {
    match SchoolDay::try_from(date.weekday()) {
        Ok(day) => blocks_for_day(calendar, entries, day),
        Err(_) => Vec::new(),
    }
}
