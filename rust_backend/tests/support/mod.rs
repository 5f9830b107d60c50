//! Shared fixtures for the integration tests: synthetic reference tables and
//! deterministic twilight sources.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use dawn_calendar::config::SearchSettings;
use dawn_calendar::core::{EventKind, Location, ReferenceData};
use dawn_calendar::services::{CalendarEngine, TwilightHorizon, TwilightSource};
use dawn_calendar::time::utc_midnight;

/// Mean synodic month in days.
pub const SYNODIC_DAYS: f64 = 29.530588;

/// Full-moon indices opening the synthetic years 2023, 2024, 2025, 2026
/// and 2027.
pub const NEW_YEAR_INDICES: [usize; 5] = [2, 15, 27, 40, 51];

pub const FULL_MOON_COUNT: usize = 52;

// ==================== Reference Tables ====================

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Full moons on a mean synodic cadence from 2023-01-06T23:08Z.
pub fn synthetic_full_moons() -> Vec<DateTime<Utc>> {
    let base = utc(2023, 1, 6, 23, 8);
    (0..FULL_MOON_COUNT)
        .map(|i| {
            let millis = (i as f64 * SYNODIC_DAYS * 86_400_000.0).round() as i64;
            base + Duration::milliseconds(millis)
        })
        .collect()
}

pub fn synthetic_reference() -> ReferenceData {
    let moons = synthetic_full_moons();
    let new_years = NEW_YEAR_INDICES.iter().map(|&i| moons[i]).collect();
    ReferenceData::from_instants(moons, new_years).unwrap()
}

pub fn london() -> Location {
    Location::new(51.5074, -0.1278, "Europe/London").unwrap()
}

// ==================== Twilight Sources ====================

/// Dawn at 05:00 UTC and dusk at 19:00 UTC every day, on every tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailySource;

impl TwilightSource for DailySource {
    fn event_utc(
        &self,
        kind: EventKind,
        _latitude: f64,
        _longitude: f64,
        utc_date: NaiveDate,
        _horizon: TwilightHorizon,
    ) -> Option<DateTime<Utc>> {
        let hour = match kind {
            EventKind::Dawn => 5,
            EventKind::Dusk => 19,
        };
        Some(utc_midnight(utc_date) + Duration::hours(hour))
    }
}

/// [`DailySource`] with no events at all on the UTC dates `[from, to]`.
#[derive(Debug, Clone, Copy)]
pub struct BlackoutSource {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl TwilightSource for BlackoutSource {
    fn event_utc(
        &self,
        kind: EventKind,
        latitude: f64,
        longitude: f64,
        utc_date: NaiveDate,
        horizon: TwilightHorizon,
    ) -> Option<DateTime<Utc>> {
        if (self.from..=self.to).contains(&utc_date) {
            return None;
        }
        DailySource.event_utc(kind, latitude, longitude, utc_date, horizon)
    }
}

// ==================== Engines ====================

pub fn daily_engine() -> CalendarEngine<DailySource> {
    CalendarEngine::new(Arc::new(synthetic_reference()), DailySource, SearchSettings::default())
}

pub fn blackout_engine(from: NaiveDate, to: NaiveDate) -> CalendarEngine<BlackoutSource> {
    CalendarEngine::new(
        Arc::new(synthetic_reference()),
        BlackoutSource { from, to },
        SearchSettings::default(),
    )
}
