//! Domain models for dawn-anchored lunar months and years.
//!
//! This module provides the value objects the engine produces: observer
//! locations, resolved twilight events with their confidence tag, month
//! lengths, lunar months and year cycles. All of them are built per query and
//! discarded; none is persisted.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::error::{CalendarError, CalendarResult};

/// Geographic observer location with its IANA time zone.
///
/// The time zone decides what a "civil day" is for the location, which in
/// turn decides which dawn belongs to which date.
///
/// # Examples
///
/// ```
/// use dawn_calendar::core::domain::Location;
///
/// let greenwich = Location::new(51.4769, 0.0, "Europe/London").unwrap();
/// assert_eq!(greenwich.timezone().name(), "Europe/London");
/// assert!(Location::new(91.0, 0.0, "UTC").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Tz,
}

impl Location {
    /// Creates a validated location from an IANA zone name.
    pub fn new(latitude: f64, longitude: f64, tz_name: &str) -> CalendarResult<Self> {
        let timezone: Tz = tz_name
            .parse()
            .map_err(|_| CalendarError::UnknownTimeZone(tz_name.to_string()))?;
        Self::with_timezone(latitude, longitude, timezone)
    }

    /// Creates a validated location from an already parsed zone.
    pub fn with_timezone(latitude: f64, longitude: f64, timezone: Tz) -> CalendarResult<Self> {
        let location = Self {
            latitude,
            longitude,
            timezone,
        };
        location.validate()?;
        Ok(location)
    }

    /// Checks coordinate ranges. Deserialized locations skip the constructor,
    /// so the engine calls this before using one.
    pub fn validate(&self) -> CalendarResult<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CalendarError::InvalidLocation(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CalendarError::InvalidLocation(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

/// Twilight event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Dawn,
    Dusk,
}

/// Which fallback tier produced an event.
///
/// This is a provenance label, not an error bound: `Migrated` means the event
/// was computed at a latitude closer to the equator than the one requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Astronomical,
    Nautical,
    Civil,
    SunriseOrSunset,
    Migrated,
    NotFound,
}

impl Confidence {
    /// Wire tag for an event of the given kind (`sunrise` for dawn,
    /// `sunset` for dusk on the horizon tier).
    pub fn tag(self, kind: EventKind) -> &'static str {
        match (self, kind) {
            (Confidence::Astronomical, _) => "astronomical",
            (Confidence::Nautical, _) => "nautical",
            (Confidence::Civil, _) => "civil",
            (Confidence::SunriseOrSunset, EventKind::Dawn) => "sunrise",
            (Confidence::SunriseOrSunset, EventKind::Dusk) => "sunset",
            (Confidence::Migrated, _) => "migrated",
            (Confidence::NotFound, _) => "not_found",
        }
    }

    /// Confidence of an optional resolution; a missing event is `NotFound`.
    pub fn of(event: Option<&AstronomicalEvent>) -> Self {
        event.map_or(Confidence::NotFound, |e| e.confidence)
    }

    /// True when the event was computed at the requested latitude by a
    /// regular twilight tier.
    pub fn is_primary_tier(self) -> bool {
        !matches!(self, Confidence::Migrated | Confidence::NotFound)
    }
}

/// A resolved dawn or dusk.
#[derive(Debug, Clone, PartialEq)]
pub struct AstronomicalEvent {
    /// Event time in the location's civil zone
    pub instant: DateTime<FixedOffset>,
    pub kind: EventKind,
    pub confidence: Confidence,
    /// Latitude the event was computed at; differs from the requested one
    /// only for migrated events
    pub latitude: f64,
}

impl AstronomicalEvent {
    pub fn utc(&self) -> DateTime<Utc> {
        self.instant.with_timezone(&Utc)
    }

    /// Civil date of the event in its own zone.
    pub fn local_date(&self) -> NaiveDate {
        self.instant.date_naive()
    }
}

impl Serialize for AstronomicalEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AstronomicalEvent", 4)?;
        state.serialize_field("instant", &self.instant)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("confidence", self.confidence.tag(self.kind))?;
        state.serialize_field("latitude", &self.latitude)?;
        state.end()
    }
}

/// Number of dawn-to-dawn cycles in a month.
///
/// Only 29 and 30 are regular month lengths. Anything else is kept as
/// `Anomalous` so callers can show "unknown" instead of a wrong length.
///
/// # Examples
///
/// ```
/// use dawn_calendar::core::domain::DayCount;
///
/// assert_eq!(DayCount::from_cycles(30).days(), Some(30));
/// assert_eq!(DayCount::from_cycles(31), DayCount::Anomalous(31));
/// assert_eq!(DayCount::from_cycles(31).days(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "days", rename_all = "snake_case")]
pub enum DayCount {
    Valid(u32),
    Anomalous(u32),
    Unknown,
}

impl DayCount {
    pub fn from_cycles(cycles: u32) -> Self {
        match cycles {
            29 | 30 => DayCount::Valid(cycles),
            other => DayCount::Anomalous(other),
        }
    }

    /// Month length fit for display, `None` unless valid.
    pub fn days(self) -> Option<u32> {
        match self {
            DayCount::Valid(days) => Some(days),
            _ => None,
        }
    }

    /// Counted cycles, valid or not.
    pub fn raw(self) -> Option<u32> {
        match self {
            DayCount::Valid(n) | DayCount::Anomalous(n) => Some(n),
            DayCount::Unknown => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, DayCount::Valid(_))
    }
}

fn serialize_dawn_tag<S: Serializer>(confidence: &Confidence, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(confidence.tag(EventKind::Dawn))
}

/// One lunar month: from the first dawn after its full moon to the first
/// dawn after the next one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LunarMonth {
    /// 1-based position in the year
    pub index: usize,
    pub label: String,
    /// Day-1 dawn
    pub start: Option<AstronomicalEvent>,
    /// Day-1 dawn of the following month
    pub end: Option<AstronomicalEvent>,
    pub day_count: DayCount,
    /// Tier of the day-1 dawn
    #[serde(serialize_with = "serialize_dawn_tag")]
    pub confidence: Confidence,
    pub anchor_full_moon: DateTime<Utc>,
}

impl LunarMonth {
    /// Half-open `[start, end)` check; false when either boundary is missing.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => start.utc() <= instant && instant < end.utc(),
            _ => false,
        }
    }
}

/// One year cycle, from a new-year anchor to the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearCycle {
    /// UTC year of the opening anchor
    pub year: i32,
    pub anchor: DateTime<Utc>,
    pub next_anchor: DateTime<Utc>,
    pub months: Vec<LunarMonth>,
}

impl YearCycle {
    pub fn month_count(&self) -> usize {
        self.months.len()
    }

    /// Months whose length could not be established.
    pub fn unresolved_months(&self) -> impl Iterator<Item = &LunarMonth> {
        self.months.iter().filter(|m| !m.day_count.is_valid())
    }
}
