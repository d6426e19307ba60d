//! Weekly teaching-period engine. Everything here is pure and synchronous;
//! storage and transport live in `db` and `ipc`.

pub mod calendar;
pub mod clock;
pub mod entry;
pub mod error;
pub mod grid;
pub mod merge;
pub mod resolver;

pub use calendar::{CalendarConfig, PeriodCalendar, SchoolDay};
pub use entry::{EntryDraft, Placement, ScheduleEntry};
pub use error::TimetableError;
pub use grid::{build_grid, GridCell, GridRow};
pub use merge::{blocks_for_day, todays_blocks, ScheduleBlock};
