//! Dawn search and dawn-to-dawn cycle counting.
//!
//! A day of the calendar runs from one dawn to the next, so the length of a
//! month is the number of dawn-to-dawn cycles between its first dawn and the
//! first dawn of the following month. [`DawnSeries`] walks civil days one at
//! a time and yields each day's dawn; [`DawnSearch`] builds the month-level
//! queries on top of it.
//!
//! Every loop here is bounded: the first-dawn search by the configured
//! horizon, the series by `max_cycle_days`. Both check a
//! [`CancellationFlag`] once per day.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::SearchSettings;
use crate::core::domain::{AstronomicalEvent, Location};
use crate::core::error::{CalendarError, CalendarResult};
use crate::services::twilight::{SpaTwilight, TwilightResolver, TwilightSource};
use crate::time::local_date;

/// Shared stop signal for long computations.
///
/// Clones share the same flag, so a caller can keep one and hand another to
/// the engine.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> CalendarResult<()> {
        if self.is_cancelled() {
            Err(CalendarError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Lazy sequence of daily dawns, one civil day per step.
///
/// Yields strictly increasing events: a dawn that is not later than the
/// previous one is skipped. The series ends at the first day without a
/// resolvable dawn, after `max_days` days, or with a single
/// `Err(Cancelled)` item.
pub struct DawnSeries<'a, S> {
    resolver: &'a TwilightResolver<S>,
    location: &'a Location,
    cancel: &'a CancellationFlag,
    next_date: Option<NaiveDate>,
    last: Option<DateTime<Utc>>,
    days_walked: u32,
    max_days: u32,
}

impl<'a, S: TwilightSource> DawnSeries<'a, S> {
    pub fn days_walked(&self) -> u32 {
        self.days_walked
    }

    fn finish(&mut self) {
        self.next_date = None;
    }
}

impl<S: TwilightSource> Iterator for DawnSeries<'_, S> {
    type Item = CalendarResult<AstronomicalEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let date = self.next_date?;
            if self.days_walked >= self.max_days {
                self.finish();
                return None;
            }
            if self.cancel.is_cancelled() {
                self.finish();
                return Some(Err(CalendarError::Cancelled));
            }

            self.days_walked += 1;
            self.next_date = date.succ_opt();

            let Some(dawn) = self.resolver.resolve_dawn(self.location, date) else {
                log::debug!("Dawn series stops at {}: no dawn resolved", date);
                self.finish();
                return None;
            };

            match self.last {
                Some(last) if dawn.utc() <= last => {
                    log::debug!("Skipping non-increasing dawn {} on {}", dawn.instant, date);
                }
                _ => {
                    self.last = Some(dawn.utc());
                    return Some(Ok(dawn));
                }
            }
        }
    }
}

/// Dawn queries over a twilight resolver.
#[derive(Debug, Clone)]
pub struct DawnSearch<S = SpaTwilight> {
    resolver: TwilightResolver<S>,
    settings: SearchSettings,
    cancel: CancellationFlag,
}

impl<S: TwilightSource> DawnSearch<S> {
    pub fn new(resolver: TwilightResolver<S>, settings: SearchSettings) -> Self {
        Self {
            resolver,
            settings,
            cancel: CancellationFlag::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn resolver(&self) -> &TwilightResolver<S> {
        &self.resolver
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    /// Dawns from `date` onward.
    pub fn series_from<'a>(&'a self, location: &'a Location, date: NaiveDate) -> DawnSeries<'a, S> {
        DawnSeries {
            resolver: &self.resolver,
            location,
            cancel: &self.cancel,
            next_date: Some(date),
            last: None,
            days_walked: 0,
            max_days: self.settings.max_cycle_days,
        }
    }

    /// Dawns on the civil days after `start`, each later than `start`.
    pub fn series_after<'a>(&'a self, location: &'a Location, start: &AstronomicalEvent) -> DawnSeries<'a, S> {
        DawnSeries {
            resolver: &self.resolver,
            location,
            cancel: &self.cancel,
            next_date: start.local_date().succ_opt(),
            last: Some(start.utc()),
            days_walked: 0,
            max_days: self.settings.max_cycle_days,
        }
    }

    /// First dawn strictly later than `instant`.
    ///
    /// Probes the instant's civil date and the following days up to the
    /// search horizon. Days without a dawn are passed over. `Ok(None)` when
    /// the horizon runs out.
    pub fn first_dawn_after(
        &self,
        instant: DateTime<Utc>,
        location: &Location,
    ) -> CalendarResult<Option<AstronomicalEvent>> {
        let mut date = local_date(instant, location.timezone());
        for _ in 0..self.settings.dawn_horizon_days {
            self.cancel.check()?;
            if let Some(dawn) = self.resolver.resolve_dawn(location, date) {
                if dawn.utc() > instant {
                    return Ok(Some(dawn));
                }
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        log::warn!(
            "No dawn found within {} days after {} at ({}, {})",
            self.settings.dawn_horizon_days,
            instant,
            location.latitude,
            location.longitude
        );
        Ok(None)
    }

    /// Dawn boundaries from `start` up to `end`, both included.
    ///
    /// Walks daily dawns while they are not later than `end`. If the walk
    /// stops short, `end` is appended as the closing boundary, so the list
    /// always runs from `start` to `end` when `end` is not before `start`.
    pub fn dawns_between(
        &self,
        start: &AstronomicalEvent,
        end: &AstronomicalEvent,
        location: &Location,
    ) -> CalendarResult<Vec<AstronomicalEvent>> {
        let end_utc = end.utc();
        let mut dawns = vec![start.clone()];
        let mut passed_end = false;

        let mut series = self.series_after(location, start);
        for dawn in series.by_ref() {
            let dawn = dawn?;
            if dawn.utc() > end_utc {
                passed_end = true;
                break;
            }
            dawns.push(dawn);
        }

        let reached = dawns.last().map_or(false, |last| last.utc() >= end_utc);
        if !reached {
            if !passed_end {
                log::warn!(
                    "Dawn series from {} ended after {} days short of {}",
                    start.instant,
                    series.days_walked(),
                    end.instant
                );
            }
            dawns.push(end.clone());
        }
        Ok(dawns)
    }

    /// Number of dawn-to-dawn cycles from `start` to `end`.
    pub fn count_dawn_cycles(
        &self,
        start: &AstronomicalEvent,
        end: &AstronomicalEvent,
        location: &Location,
    ) -> CalendarResult<u32> {
        let dawns = self.dawns_between(start, end, location)?;
        Ok(dawns.len().saturating_sub(1) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{Confidence, EventKind};
    use crate::services::twilight::TwilightHorizon;
    use crate::time::utc_midnight;
    use chrono::{Duration, TimeZone};

    /// Dawn at a fixed UTC hour every day, on every tier.
    struct DailySource {
        hour: i64,
    }

    impl TwilightSource for DailySource {
        fn event_utc(
            &self,
            kind: EventKind,
            _latitude: f64,
            _longitude: f64,
            utc_date: NaiveDate,
            _horizon: TwilightHorizon,
        ) -> Option<DateTime<Utc>> {
            match kind {
                EventKind::Dawn => Some(utc_midnight(utc_date) + Duration::hours(self.hour)),
                EventKind::Dusk => None,
            }
        }
    }

    /// Never produces an event.
    struct DarkSource;

    impl TwilightSource for DarkSource {
        fn event_utc(
            &self,
            _kind: EventKind,
            _latitude: f64,
            _longitude: f64,
            _utc_date: NaiveDate,
            _horizon: TwilightHorizon,
        ) -> Option<DateTime<Utc>> {
            None
        }
    }

    fn search<S: TwilightSource>(source: S) -> DawnSearch<S> {
        let settings = SearchSettings::default();
        DawnSearch::new(TwilightResolver::new(source, &settings), settings)
    }

    fn utc_location() -> Location {
        Location::new(30.0, 0.0, "UTC").unwrap()
    }

    fn dawn_on(y: i32, m: u32, d: u32) -> AstronomicalEvent {
        AstronomicalEvent {
            instant: Utc.with_ymd_and_hms(y, m, d, 5, 0, 0).unwrap().fixed_offset(),
            kind: EventKind::Dawn,
            confidence: Confidence::Astronomical,
            latitude: 30.0,
        }
    }

    #[test]
    fn test_first_dawn_after_same_day() {
        let search = search(DailySource { hour: 5 });
        let instant = Utc.with_ymd_and_hms(2024, 1, 11, 3, 0, 0).unwrap();
        let dawn = search.first_dawn_after(instant, &utc_location()).unwrap().unwrap();
        assert_eq!(dawn.utc(), Utc.with_ymd_and_hms(2024, 1, 11, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_first_dawn_after_is_strictly_later() {
        let search = search(DailySource { hour: 5 });
        let instant = Utc.with_ymd_and_hms(2024, 1, 11, 5, 0, 0).unwrap();
        let dawn = search.first_dawn_after(instant, &utc_location()).unwrap().unwrap();
        assert_eq!(dawn.utc(), Utc.with_ymd_and_hms(2024, 1, 12, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_first_dawn_after_horizon_exhausted() {
        let search = search(DarkSource);
        let instant = Utc.with_ymd_and_hms(2024, 1, 11, 5, 0, 0).unwrap();
        assert!(search.first_dawn_after(instant, &utc_location()).unwrap().is_none());
    }

    #[test]
    fn test_count_cycles_over_thirty_days() {
        let search = search(DailySource { hour: 5 });
        let start = dawn_on(2024, 1, 12);
        let end = dawn_on(2024, 2, 11);
        assert_eq!(search.count_dawn_cycles(&start, &end, &utc_location()).unwrap(), 30);
    }

    #[test]
    fn test_dawns_between_is_strictly_increasing() {
        let search = search(DailySource { hour: 5 });
        let start = dawn_on(2024, 1, 12);
        let end = dawn_on(2024, 2, 10);
        let dawns = search.dawns_between(&start, &end, &utc_location()).unwrap();
        assert_eq!(dawns.len(), 30);
        assert!(dawns.windows(2).all(|w| w[0].utc() < w[1].utc()));
        assert_eq!(dawns.last().unwrap().utc(), end.utc());
    }

    #[test]
    fn test_end_appended_when_series_stops() {
        let search = search(DarkSource);
        let start = dawn_on(2024, 1, 12);
        let end = dawn_on(2024, 2, 10);
        let dawns = search.dawns_between(&start, &end, &utc_location()).unwrap();
        assert_eq!(dawns.len(), 2);
        assert_eq!(search.count_dawn_cycles(&start, &end, &utc_location()).unwrap(), 1);
    }

    #[test]
    fn test_end_before_start_counts_zero() {
        let search = search(DailySource { hour: 5 });
        let start = dawn_on(2024, 2, 10);
        let end = dawn_on(2024, 1, 12);
        assert_eq!(search.count_dawn_cycles(&start, &end, &utc_location()).unwrap(), 0);
    }

    #[test]
    fn test_series_is_bounded() {
        let settings = SearchSettings {
            max_cycle_days: 40,
            ..SearchSettings::default()
        };
        let search = DawnSearch::new(
            TwilightResolver::new(DailySource { hour: 5 }, &settings),
            settings,
        );
        let location = utc_location();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(search.series_from(&location, date).count(), 40);
    }

    #[test]
    fn test_cancellation_stops_work() {
        let flag = CancellationFlag::new();
        let search = search(DailySource { hour: 5 }).with_cancellation(flag.clone());
        flag.cancel();

        let instant = Utc.with_ymd_and_hms(2024, 1, 11, 3, 0, 0).unwrap();
        assert!(matches!(
            search.first_dawn_after(instant, &utc_location()),
            Err(CalendarError::Cancelled)
        ));

        let start = dawn_on(2024, 1, 12);
        let end = dawn_on(2024, 2, 10);
        assert!(matches!(
            search.count_dawn_cycles(&start, &end, &utc_location()),
            Err(CalendarError::Cancelled)
        ));
    }
}
