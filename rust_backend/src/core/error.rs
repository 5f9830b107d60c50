//! Error types for calendar engine operations.
//!
//! Expected astronomical edge cases (a twilight tier that never occurs, polar
//! exhaustion, an empty dawn search horizon) are *not* errors: they come back
//! as `None` or as a tagged [`DayCount`](super::domain::DayCount). The
//! variants below cover the conditions a caller has to act on.

use chrono::{DateTime, Utc};
use std::fmt;

/// Result type for calendar engine operations
pub type CalendarResult<T> = Result<T, CalendarError>;

/// Which reference table an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    FullMoons,
    NewYears,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKind::FullMoons => write!(f, "full-moon"),
            SeriesKind::NewYears => write!(f, "new-year"),
        }
    }
}

/// Error type for calendar engine operations
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("{series} table does not cover {instant}: tabulated range is {first} .. {last}")]
    OutOfRange {
        series: SeriesKind,
        instant: DateTime<Utc>,
        first: DateTime<Utc>,
        last: DateTime<Utc>,
    },

    #[error("new-year table has no complete year cycle for {start_year}..={end_year}")]
    YearsNotCovered { start_year: i32, end_year: i32 },

    #[error("{0} table is empty")]
    EmptySeries(SeriesKind),

    #[error("{series} table is not strictly ascending at entry {index}")]
    NotAscending { series: SeriesKind, index: usize },

    #[error("Invalid year range: {start_year} > {end_year}")]
    InvalidYearRange { start_year: i32, end_year: i32 },

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("Calendar computation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl CalendarError {
    /// True for errors that mean the reference tables need regenerating,
    /// as opposed to bad caller input.
    pub fn is_data_coverage(&self) -> bool {
        matches!(
            self,
            CalendarError::OutOfRange { .. }
                | CalendarError::YearsNotCovered { .. }
                | CalendarError::EmptySeries(_)
        )
    }
}
