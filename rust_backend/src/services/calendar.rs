//! Year and month calendar assembly.
//!
//! [`CalendarEngine`] owns the reference tables and a dawn search and turns
//! anchor pairs into [`YearCycle`]s: month `j` of a year starts at the first
//! dawn after its full moon and ends at the first dawn after the next full
//! moon (or after the next new-year anchor for the last month). A month whose
//! boundary dawn cannot be resolved gets [`DayCount::Unknown`]; the rest of
//! the year is unaffected.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::config::{CalendarConfig, SearchSettings};
use crate::core::domain::{AstronomicalEvent, Confidence, DayCount, EventKind, Location, LunarMonth, YearCycle};
use crate::core::error::CalendarResult;
use crate::core::reference::ReferenceData;
use crate::services::anchors::{AnchorPair, AnchorResolver};
use crate::services::dawn::{CancellationFlag, DawnSearch};
use crate::services::grid::{month_grid, month_label, MonthGrid};
use crate::services::sun_events::{sun_events_for_date, DailySunEvents};
use crate::services::twilight::{SpaTwilight, TwilightResolver, TwilightSource};

/// Where an instant falls inside a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarPosition {
    /// 1-based month index
    pub month: usize,
    /// 1-based day of the month
    pub day: u32,
    /// True when the instant lay outside every resolved month interval and
    /// the position was clamped to the nearest end
    pub clamped: bool,
}

/// The year cycle containing an instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentYear {
    pub now: DateTime<Utc>,
    pub cycle: YearCycle,
    /// `None` only when the cycle has no months
    pub position: Option<CalendarPosition>,
}

/// The lunar month containing an instant, bounded by full moons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentMonth {
    pub now: DateTime<Utc>,
    pub previous_full_moon: DateTime<Utc>,
    pub next_full_moon: DateTime<Utc>,
    pub dawn_after_previous: Option<AstronomicalEvent>,
    pub dawn_after_next: Option<AstronomicalEvent>,
    pub day_count: DayCount,
    /// `None` when either boundary dawn is missing
    pub current_day: Option<u32>,
}

/// Calendar computations over one set of reference tables.
#[derive(Debug, Clone)]
pub struct CalendarEngine<S = SpaTwilight> {
    reference: Arc<ReferenceData>,
    dawns: DawnSearch<S>,
}

impl CalendarEngine<SpaTwilight> {
    /// SPA-backed engine with the configured search bounds and ΔT.
    pub fn from_config(reference: Arc<ReferenceData>, config: &CalendarConfig) -> Self {
        Self {
            reference,
            dawns: DawnSearch::new(TwilightResolver::from_config(config), config.search),
        }
    }
}

impl<S: TwilightSource> CalendarEngine<S> {
    pub fn new(reference: Arc<ReferenceData>, source: S, settings: SearchSettings) -> Self {
        Self {
            reference,
            dawns: DawnSearch::new(TwilightResolver::new(source, &settings), settings),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.dawns = self.dawns.with_cancellation(cancel);
        self
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn anchors(&self) -> AnchorResolver<'_> {
        AnchorResolver::new(&self.reference)
    }

    pub fn dawn_search(&self) -> &DawnSearch<S> {
        &self.dawns
    }

    /// Dawn or dusk on a civil date through the tier chain.
    pub fn resolve_event(
        &self,
        kind: EventKind,
        location: &Location,
        date: NaiveDate,
    ) -> CalendarResult<Option<AstronomicalEvent>> {
        location.validate()?;
        Ok(self.dawns.resolver().resolve_event(kind, location, date))
    }

    pub fn first_dawn_after(
        &self,
        instant: DateTime<Utc>,
        location: &Location,
    ) -> CalendarResult<Option<AstronomicalEvent>> {
        location.validate()?;
        self.dawns.first_dawn_after(instant, location)
    }

    pub fn count_dawn_cycles(
        &self,
        start: &AstronomicalEvent,
        end: &AstronomicalEvent,
        location: &Location,
    ) -> CalendarResult<u32> {
        location.validate()?;
        self.dawns.count_dawn_cycles(start, end, location)
    }

    /// Dawn, sunrise, sunset and dusk for one civil date.
    pub fn sun_events_for_date(&self, location: &Location, date: NaiveDate) -> CalendarResult<DailySunEvents> {
        location.validate()?;
        Ok(sun_events_for_date(self.dawns.resolver(), location, date))
    }

    /// Build one year cycle from its anchor pair.
    pub fn build_year(&self, pair: AnchorPair, location: &Location) -> CalendarResult<YearCycle> {
        location.validate()?;
        let moons = self.anchors().full_moons_in_range(pair.anchor, pair.next_anchor);
        if moons.is_empty() {
            log::warn!(
                "No full moons between anchors {} and {}; year {} has no months",
                pair.anchor,
                pair.next_anchor,
                pair.year()
            );
        }

        // Boundary j is day 1 of month j; the extra one closes the last month
        let mut boundaries = Vec::with_capacity(moons.len() + 1);
        for moon in moons.iter().copied().chain(std::iter::once(pair.next_anchor)) {
            boundaries.push(self.dawns.first_dawn_after(moon, location)?);
        }

        let mut months = Vec::with_capacity(moons.len());
        for (j, moon) in moons.iter().enumerate() {
            let start = boundaries[j].clone();
            let end = boundaries[j + 1].clone();
            let index = j + 1;
            let label = month_label(index);

            let day_count = match (&start, &end) {
                (Some(s), Some(e)) => DayCount::from_cycles(self.dawns.count_dawn_cycles(s, e, location)?),
                _ => DayCount::Unknown,
            };
            match day_count {
                DayCount::Valid(_) => {}
                DayCount::Anomalous(n) => {
                    log::warn!("{} of {} counts {} days", label, pair.year(), n)
                }
                DayCount::Unknown => {
                    log::warn!("{} of {} has no boundary dawn; length unknown", label, pair.year())
                }
            }

            months.push(LunarMonth {
                index,
                label,
                confidence: Confidence::of(start.as_ref()),
                start,
                end,
                day_count,
                anchor_full_moon: *moon,
            });
        }

        Ok(YearCycle {
            year: pair.year(),
            anchor: pair.anchor,
            next_anchor: pair.next_anchor,
            months,
        })
    }

    /// Year cycles opening in `[start_year, end_year]`.
    ///
    /// Years missing from the new-year table are left out with a warning; a
    /// range with no covered year is a data coverage error.
    pub fn build_multi_year_calendar(
        &self,
        start_year: i32,
        end_year: i32,
        location: &Location,
    ) -> CalendarResult<Vec<YearCycle>> {
        location.validate()?;
        let pairs = self.anchors().year_pairs(start_year, end_year)?;
        log::info!(
            "Building {} year cycles for {}..={} at ({}, {})",
            pairs.len(),
            start_year,
            end_year,
            location.latitude,
            location.longitude
        );
        pairs
            .into_iter()
            .map(|pair| self.build_year(pair, location))
            .collect()
    }

    /// The year cycle containing `now`, with `now` located in it.
    pub fn current_year(&self, now: DateTime<Utc>, location: &Location) -> CalendarResult<CurrentYear> {
        location.validate()?;
        let pair = self.anchors().bracket_year(now)?;
        let cycle = self.build_year(pair, location)?;
        let position = self.locate(&cycle, now, location)?;
        Ok(CurrentYear { now, cycle, position })
    }

    /// The full-moon month containing `now`.
    pub fn current_month(&self, now: DateTime<Utc>, location: &Location) -> CalendarResult<CurrentMonth> {
        location.validate()?;
        let (previous_full_moon, next_full_moon) = self.anchors().bracket_full_moon(now)?;
        let dawn_after_previous = self.dawns.first_dawn_after(previous_full_moon, location)?;
        let dawn_after_next = self.dawns.first_dawn_after(next_full_moon, location)?;

        let (day_count, current_day) = match (&dawn_after_previous, &dawn_after_next) {
            (Some(start), Some(end)) => {
                let dawns = self.dawns.dawns_between(start, end, location)?;
                let day_count = DayCount::from_cycles(dawns.len().saturating_sub(1) as u32);
                (day_count, Some(day_within(&dawns, now).0))
            }
            _ => (DayCount::Unknown, None),
        };

        Ok(CurrentMonth {
            now,
            previous_full_moon,
            next_full_moon,
            dawn_after_previous,
            dawn_after_next,
            day_count,
            current_day,
        })
    }

    /// Grid pages for every month of a cycle.
    pub fn month_grids(&self, cycle: &YearCycle) -> Vec<MonthGrid> {
        cycle
            .months
            .iter()
            .map(|m| month_grid(m.day_count, &m.label))
            .collect()
    }

    /// Month and day of `now` within `cycle`.
    ///
    /// Before the first resolved month start the position is month 1 day 1.
    /// Otherwise, outside every resolved interval, it is the last day of the
    /// latest month that started before `now`: its day count, or the number
    /// of dawns resolved up to `now` when the count is unknown.
    fn locate(
        &self,
        cycle: &YearCycle,
        now: DateTime<Utc>,
        location: &Location,
    ) -> CalendarResult<Option<CalendarPosition>> {
        if cycle.months.is_empty() {
            return Ok(None);
        }

        if let Some(month) = cycle.months.iter().find(|m| m.contains(now)) {
            if let (Some(start), Some(end)) = (&month.start, &month.end) {
                let dawns = self.dawns.dawns_between(start, end, location)?;
                let (day, clamped) = day_within(&dawns, now);
                return Ok(Some(CalendarPosition {
                    month: month.index,
                    day,
                    clamped,
                }));
            }
        }

        let latest_started = cycle
            .months
            .iter()
            .rev()
            .find_map(|m| m.start.as_ref().filter(|s| s.utc() <= now).map(|s| (m, s)));

        let Some((month, start)) = latest_started else {
            return Ok(Some(CalendarPosition {
                month: 1,
                day: 1,
                clamped: true,
            }));
        };

        let day = match month.day_count.raw() {
            Some(days) => days.max(1),
            None => self.resolved_days(start, now, location)?,
        };
        Ok(Some(CalendarPosition {
            month: month.index,
            day,
            clamped: true,
        }))
    }

    /// 1 + the dawns after `start` that are not later than `now`.
    fn resolved_days(&self, start: &AstronomicalEvent, now: DateTime<Utc>, location: &Location) -> CalendarResult<u32> {
        let mut days = 1;
        for dawn in self.dawns.series_after(location, start) {
            if dawn?.utc() > now {
                break;
            }
            days += 1;
        }
        Ok(days)
    }
}

/// 1-based day of `now` among consecutive dawn boundaries, clamped to the
/// first or last day; the flag reports clamping.
fn day_within(dawns: &[AstronomicalEvent], now: DateTime<Utc>) -> (u32, bool) {
    if let Some(k) = dawns
        .windows(2)
        .position(|w| w[0].utc() <= now && now < w[1].utc())
    {
        return ((k + 1) as u32, false);
    }
    match dawns.first() {
        Some(first) if now < first.utc() => (1, true),
        _ => (dawns.len().saturating_sub(1).max(1) as u32, true),
    }
}
