//! Tabulated reference instants (full moons and new-year anchors).
//!
//! Both tables are produced offline and loaded once. A [`ReferenceSeries`]
//! can only be built from strictly ascending instants, so every lookup here
//! can rely on binary search.

use chrono::{DateTime, Datelike, Utc};

use super::error::{CalendarError, CalendarResult, SeriesKind};

/// Immutable, strictly ascending sequence of UTC instants.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSeries {
    kind: SeriesKind,
    instants: Vec<DateTime<Utc>>,
}

impl ReferenceSeries {
    /// Builds a series, rejecting duplicates and out-of-order entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use dawn_calendar::core::error::SeriesKind;
    /// use dawn_calendar::core::reference::ReferenceSeries;
    ///
    /// let a = Utc.with_ymd_and_hms(2024, 1, 25, 17, 54, 0).unwrap();
    /// let b = Utc.with_ymd_and_hms(2024, 2, 24, 12, 30, 0).unwrap();
    /// assert!(ReferenceSeries::new(SeriesKind::FullMoons, vec![a, b]).is_ok());
    /// assert!(ReferenceSeries::new(SeriesKind::FullMoons, vec![b, a]).is_err());
    /// ```
    pub fn new(kind: SeriesKind, instants: Vec<DateTime<Utc>>) -> CalendarResult<Self> {
        if instants.is_empty() {
            return Err(CalendarError::EmptySeries(kind));
        }
        if let Some(index) = instants.windows(2).position(|w| w[0] >= w[1]) {
            return Err(CalendarError::NotAscending {
                series: kind,
                index: index + 1,
            });
        }
        Ok(Self { kind, instants })
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, DateTime<Utc>> {
        self.instants.iter()
    }

    pub fn first(&self) -> DateTime<Utc> {
        self.instants[0]
    }

    pub fn last(&self) -> DateTime<Utc> {
        self.instants[self.instants.len() - 1]
    }

    /// Greatest entry `<= instant` and least entry `> instant`.
    ///
    /// Instants before the first entry or at/after the last one have no
    /// bracket and are reported as [`CalendarError::OutOfRange`].
    pub fn bracket(&self, instant: DateTime<Utc>) -> CalendarResult<(DateTime<Utc>, DateTime<Utc>)> {
        let split = self.instants.partition_point(|t| *t <= instant);
        if split == 0 || split == self.instants.len() {
            return Err(CalendarError::OutOfRange {
                series: self.kind,
                instant,
                first: self.first(),
                last: self.last(),
            });
        }
        Ok((self.instants[split - 1], self.instants[split]))
    }

    /// Entries in the half-open range `[start, end)`.
    pub fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[DateTime<Utc>] {
        let lo = self.instants.partition_point(|t| *t < start);
        let hi = self.instants.partition_point(|t| *t < end);
        if lo >= hi {
            return &[];
        }
        &self.instants[lo..hi]
    }

    /// Entries whose UTC calendar year lies in `[start_year, end_year]`.
    pub fn in_years(&self, start_year: i32, end_year: i32) -> &[DateTime<Utc>] {
        let lo = self.instants.partition_point(|t| t.year() < start_year);
        let hi = self.instants.partition_point(|t| t.year() <= end_year);
        if lo >= hi {
            return &[];
        }
        &self.instants[lo..hi]
    }
}

/// Both reference tables plus a fingerprint of their source content.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceData {
    pub full_moons: ReferenceSeries,
    pub new_years: ReferenceSeries,
    /// SHA-256 over both source tables, hex encoded; empty for in-memory data
    pub fingerprint: String,
}

impl ReferenceData {
    pub fn new(full_moons: ReferenceSeries, new_years: ReferenceSeries) -> Self {
        Self {
            full_moons,
            new_years,
            fingerprint: String::new(),
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: String) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Builds both series from raw instant lists.
    pub fn from_instants(
        full_moons: Vec<DateTime<Utc>>,
        new_years: Vec<DateTime<Utc>>,
    ) -> CalendarResult<Self> {
        Ok(Self::new(
            ReferenceSeries::new(SeriesKind::FullMoons, full_moons)?,
            ReferenceSeries::new(SeriesKind::NewYears, new_years)?,
        ))
    }
}
