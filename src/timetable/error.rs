use thiserror::Error;

pub type Result<T> = std::result::Result<T, TimetableError>;

/// Errors raised by the period calendar, the resolver and the grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimetableError {
    /// A weekday outside Monday..Friday (or unrecognised text) was requested.
    #[error("unknown school day: {0}")]
    UnknownWeekday(String),

    #[error("period {index} does not exist on {weekday}")]
    PeriodNotFound { weekday: String, index: u32 },

    /// Inverted or out-of-bounds start/end period selection.
    #[error("invalid period range {start}..{end} on {weekday}")]
    InvalidPeriodRange {
        weekday: String,
        start: u32,
        end: u32,
    },

    /// A raw time range that does not start on a period start and end on a period end.
    #[error("time range {start}-{end} does not align to the periods of {weekday}")]
    UnalignedRange {
        weekday: String,
        start: String,
        end: String,
    },

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("{label} on {weekday} period {period} is a fixed slot")]
    FixedSlot {
        weekday: String,
        period: u32,
        label: String,
    },

    #[error("invalid calendar: {0}")]
    InvalidCalendar(String),
}

impl TimetableError {
    /// Stable error code reported over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            TimetableError::UnknownWeekday(_) => "unknown_weekday",
            TimetableError::PeriodNotFound { .. } => "period_not_found",
            TimetableError::InvalidPeriodRange { .. } => "invalid_period_range",
            TimetableError::UnalignedRange { .. } => "unaligned_range",
            TimetableError::InvalidTime(_) => "bad_time",
            TimetableError::FixedSlot { .. } => "fixed_slot",
            TimetableError::InvalidCalendar(_) => "invalid_calendar",
        }
    }
}
