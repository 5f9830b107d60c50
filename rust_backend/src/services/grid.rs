//! Month labels and the 6×7 month grid.
//!
//! A month page has six rows of seven cells. The first row carries the month
//! label across its first six cells and day 1 in the last one; rows two to
//! five hold days 2 to 29; the sixth row holds day 30 in its first cell when
//! the month has one.

use serde::Serialize;

use crate::core::domain::DayCount;

pub const GRID_ROWS: usize = 6;
pub const GRID_COLUMNS: usize = 7;

/// One rendered month page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub label: String,
    pub day_count: DayCount,
    /// Empty when the day count is not a regular month length
    pub grid: Vec<[Option<u32>; GRID_COLUMNS]>,
}

impl MonthGrid {
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Days in reading order.
    pub fn days(&self) -> impl Iterator<Item = u32> + '_ {
        self.grid.iter().flat_map(|row| row.iter().flatten().copied())
    }
}

/// English ordinal: 1st, 2nd, 3rd, 4th, ..., 11th, 12th, 13th, 21st.
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// "1st Month", "2nd Month", ... for a 1-based month index.
pub fn month_label(index: usize) -> String {
    format!("{} Month", ordinal(index))
}

/// Lay out a month of `day_count` days.
///
/// Only valid counts (29 or 30) get cells; anything else comes back with an
/// empty grid and the count kept so the caller can flag it.
pub fn month_grid(day_count: DayCount, label: &str) -> MonthGrid {
    let grid = match day_count.days() {
        Some(days) => layout(days),
        None => {
            log::warn!("No grid for {}: day count {:?}", label, day_count);
            Vec::new()
        }
    };
    MonthGrid {
        label: label.to_string(),
        day_count,
        grid,
    }
}

fn layout(days: u32) -> Vec<[Option<u32>; GRID_COLUMNS]> {
    let mut rows = vec![[None; GRID_COLUMNS]; GRID_ROWS];
    rows[0][GRID_COLUMNS - 1] = Some(1);

    let mut day = 2;
    for row in rows.iter_mut().take(GRID_ROWS - 1).skip(1) {
        for cell in row.iter_mut() {
            if day <= days.min(29) {
                *cell = Some(day);
                day += 1;
            }
        }
    }

    if days == 30 {
        rows[GRID_ROWS - 1][0] = Some(30);
    }
    rows
}
