//! Year and month anchors from the reference tables.
//!
//! A year cycle runs from one new-year full moon to the next; its months are
//! the full moons in between. Everything here is a binary search over the
//! immutable [`ReferenceData`].

use chrono::{DateTime, Datelike, Utc};

use crate::core::error::{CalendarError, CalendarResult};
use crate::core::reference::{ReferenceData, ReferenceSeries};

/// One year cycle's bounding anchors, `[anchor, next_anchor)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorPair {
    pub anchor: DateTime<Utc>,
    pub next_anchor: DateTime<Utc>,
}

impl AnchorPair {
    /// UTC year of the opening anchor, used as the cycle's year number.
    pub fn year(&self) -> i32 {
        self.anchor.year()
    }
}

/// Lookups over the full-moon and new-year tables.
#[derive(Debug, Clone, Copy)]
pub struct AnchorResolver<'a> {
    reference: &'a ReferenceData,
}

impl<'a> AnchorResolver<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self { reference }
    }

    /// New-year anchors around `now`: greatest `<= now`, least `> now`.
    pub fn bracket_year(&self, now: DateTime<Utc>) -> CalendarResult<AnchorPair> {
        let (anchor, next_anchor) = bracket_logged(&self.reference.new_years, now)?;
        Ok(AnchorPair { anchor, next_anchor })
    }

    /// Full moons around `now`: greatest `<= now`, least `> now`.
    pub fn bracket_full_moon(&self, now: DateTime<Utc>) -> CalendarResult<(DateTime<Utc>, DateTime<Utc>)> {
        bracket_logged(&self.reference.full_moons, now)
    }

    /// Full moons with `start <= t < end`, ascending.
    pub fn full_moons_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &'a [DateTime<Utc>] {
        self.reference.full_moons.range(start, end)
    }

    /// Anchors whose UTC year is in `[start_year, end_year + 1]`; the extra
    /// year supplies the closing anchor of the last cycle.
    pub fn anchors_for_years(&self, start_year: i32, end_year: i32) -> &'a [DateTime<Utc>] {
        self.reference
            .new_years
            .in_years(start_year, end_year.saturating_add(1))
    }

    /// Consecutive anchor pairs opening in `[start_year, end_year]`.
    ///
    /// Returns [`CalendarError::YearsNotCovered`] when no pair exists and logs
    /// a warning when only part of the range is covered.
    pub fn year_pairs(&self, start_year: i32, end_year: i32) -> CalendarResult<Vec<AnchorPair>> {
        if start_year > end_year {
            return Err(CalendarError::InvalidYearRange {
                start_year,
                end_year,
            });
        }

        let pairs: Vec<AnchorPair> = self
            .anchors_for_years(start_year, end_year)
            .windows(2)
            .map(|w| AnchorPair {
                anchor: w[0],
                next_anchor: w[1],
            })
            .filter(|pair| pair.year() <= end_year)
            .collect();

        if pairs.is_empty() {
            let err = CalendarError::YearsNotCovered {
                start_year,
                end_year,
            };
            log::error!("{}", err);
            return Err(err);
        }

        let missing: Vec<i32> = (start_year..=end_year)
            .filter(|year| !pairs.iter().any(|p| p.year() == *year))
            .collect();
        if !missing.is_empty() {
            log::warn!(
                "New-year table covers {} of {} requested years; missing {:?}",
                pairs.len(),
                end_year - start_year + 1,
                missing
            );
        }

        Ok(pairs)
    }
}

fn bracket_logged(
    series: &ReferenceSeries,
    now: DateTime<Utc>,
) -> CalendarResult<(DateTime<Utc>, DateTime<Utc>)> {
    series.bracket(now).map_err(|e| {
        log::error!("{}", e);
        e
    })
}
