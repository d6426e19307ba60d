//! Weekday × period projection of one teacher's entries.
//!
//! Cells start empty; each entry marks every period its range fully covers.
//! The ceremony slot fills its cell only when no entry is there. The grid is
//! rebuilt from scratch on every read; there is no incremental update.

use super::calendar::{BreakWindow, PeriodCalendar, PeriodDefinition, SchoolDay, ToSchoolDay};
use super::entry::ScheduleEntry;
use super::error::{Result, TimetableError};
use super::resolver::time_range_to_periods;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_FIXED_SLOT_LABEL: &str = "Upacara Bendera";

/// A recurring institution-wide event pinned to one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedSlot {
    pub weekday: SchoolDay,
    pub period: u32,
    pub label: String,
}

impl FixedSlot {
    /// Monday, first period.
    pub fn flag_ceremony(label: impl Into<String>) -> Self {
        Self {
            weekday: SchoolDay::Monday,
            period: 1,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridCell<'a> {
    Empty,
    Fixed(&'a FixedSlot),
    Entry(&'a ScheduleEntry),
}

impl GridCell<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            GridCell::Empty => "empty",
            GridCell::Fixed(_) => "fixed",
            GridCell::Entry(_) => "entry",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, GridCell::Empty)
    }
}

/// One line of the export layout: a period with its cell, or a recess.
#[derive(Debug, Clone, Copy)]
pub enum GridRow<'a> {
    Period {
        period: &'a PeriodDefinition,
        cell: GridCell<'a>,
    },
    Break(&'a BreakWindow),
}

#[derive(Debug, Clone)]
pub struct ScheduleGrid<'a> {
    calendar: &'a PeriodCalendar,
    cells: BTreeMap<SchoolDay, Vec<GridCell<'a>>>,
    unplaced: Vec<&'a ScheduleEntry>,
}

pub fn build_grid<'a>(
    calendar: &'a PeriodCalendar,
    entries: &'a [ScheduleEntry],
    fixed: Option<&'a FixedSlot>,
) -> ScheduleGrid<'a> {
    let mut cells: BTreeMap<SchoolDay, Vec<GridCell<'a>>> = calendar
        .days()
        .map(|d| (d.day(), vec![GridCell::Empty; d.period_count() as usize]))
        .collect();
    let mut unplaced = Vec::new();

    for entry in entries {
        let periods = time_range_to_periods(calendar, entry.weekday, entry.start, entry.end)
            .unwrap_or_default();
        if periods.is_empty() {
            unplaced.push(entry);
            continue;
        }
        let Some(row) = cells.get_mut(&entry.weekday) else {
            continue;
        };
        for p in periods {
            // Later entries win where stored entries overlap.
            if let Some(cell) = row.get_mut(p as usize - 1) {
                *cell = GridCell::Entry(entry);
            }
        }
    }

    if let Some(slot) = fixed {
        if let Some(cell) = cells
            .get_mut(&slot.weekday)
            .and_then(|row| row.get_mut((slot.period as usize).checked_sub(1)?))
        {
            if cell.is_available() {
                *cell = GridCell::Fixed(slot);
            }
        }
    }

    ScheduleGrid {
        calendar,
        cells,
        unplaced,
    }
}

impl<'a> ScheduleGrid<'a> {
    pub fn row(&self, day: SchoolDay) -> &[GridCell<'a>] {
        self.cells.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cell(&self, weekday: impl ToSchoolDay, period: u32) -> Result<GridCell<'a>> {
        let day = weekday.to_school_day()?;
        period
            .checked_sub(1)
            .and_then(|i| self.row(day).get(i as usize))
            .copied()
            .ok_or_else(|| TimetableError::PeriodNotFound {
                weekday: day.to_string(),
                index: period,
            })
    }

    /// The entry a delete on this cell would remove. Fixed cells refuse.
    pub fn deletable_entry(
        &self,
        weekday: impl ToSchoolDay,
        period: u32,
    ) -> Result<Option<&'a ScheduleEntry>> {
        let day = weekday.to_school_day()?;
        match self.cell(day, period)? {
            GridCell::Empty => Ok(None),
            GridCell::Entry(e) => Ok(Some(e)),
            GridCell::Fixed(slot) => Err(TimetableError::FixedSlot {
                weekday: day.to_string(),
                period,
                label: slot.label.clone(),
            }),
        }
    }

    /// Entries whose stored range covers no period of their day.
    pub fn unplaced(&self) -> &[&'a ScheduleEntry] {
        &self.unplaced
    }

    /// Periods and recesses of `day` in clock order, for exporters.
    pub fn layout(&self, day: SchoolDay) -> Vec<GridRow<'a>> {
        let table = self.calendar.day(day);
        let row = self.row(day);
        let mut out = Vec::with_capacity(table.periods().len() + table.breaks().len());
        for (period, cell) in table.periods().iter().zip(row.iter()) {
            out.push(GridRow::Period {
                period,
                cell: *cell,
            });
            if let Some(b) = table.break_after(period.index) {
                out.push(GridRow::Break(b));
            }
        }
        out
    }
}
