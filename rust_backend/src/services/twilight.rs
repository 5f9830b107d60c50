//! Twilight event resolution with tier fallback and latitude migration.
//!
//! A dawn (or dusk) for a civil date is looked up through an ordered chain of
//! solar depression angles: astronomical (18°), nautical (12°), civil (6°) and
//! the plain horizon. When none of them occurs on the date (polar day or
//! night) the latitude is walked toward the equator one step at a time and
//! the astronomical tier is retried there; such events are tagged
//! [`Confidence::Migrated`].
//!
//! The ephemeris itself sits behind [`TwilightSource`]. The default source,
//! [`SpaTwilight`], uses the NREL SPA implementation from `solar-positioning`.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use qtty::Degrees;
use solar_positioning::{spa, Horizon, SunriseResult};

use crate::config::{CalendarConfig, SearchSettings};
use crate::core::domain::{AstronomicalEvent, Confidence, EventKind, Location};
use crate::time::{hours_after_utc_midnight, local_date, to_local};

const ASTRONOMICAL_DEPRESSION: Degrees = Degrees::new(18.0);
const NAUTICAL_DEPRESSION: Degrees = Degrees::new(12.0);
const CIVIL_DEPRESSION: Degrees = Degrees::new(6.0);

/// Sun altitude an event is defined against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TwilightHorizon {
    /// Sun centre this far below the horizon
    Depression(Degrees),
    /// Upper limb on the refracted horizon (sunrise/sunset)
    Geometric,
}

/// One rung of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Astronomical,
    Nautical,
    Civil,
    Horizon,
}

/// Tiers tried at the requested latitude, in order.
pub const TIERS: [Tier; 4] = [Tier::Astronomical, Tier::Nautical, Tier::Civil, Tier::Horizon];

impl Tier {
    pub fn horizon(self) -> TwilightHorizon {
        match self {
            Tier::Astronomical => TwilightHorizon::Depression(ASTRONOMICAL_DEPRESSION),
            Tier::Nautical => TwilightHorizon::Depression(NAUTICAL_DEPRESSION),
            Tier::Civil => TwilightHorizon::Depression(CIVIL_DEPRESSION),
            Tier::Horizon => TwilightHorizon::Geometric,
        }
    }

    pub fn confidence(self) -> Confidence {
        match self {
            Tier::Astronomical => Confidence::Astronomical,
            Tier::Nautical => Confidence::Nautical,
            Tier::Civil => Confidence::Civil,
            Tier::Horizon => Confidence::SunriseOrSunset,
        }
    }
}

/// Ephemeris primitive: when does the sun cross `horizon` on a UTC date.
///
/// Implementations return `None` when the crossing does not happen that day
/// and must not panic; any internal failure is a miss.
pub trait TwilightSource {
    fn event_utc(
        &self,
        kind: EventKind,
        latitude: f64,
        longitude: f64,
        utc_date: NaiveDate,
        horizon: TwilightHorizon,
    ) -> Option<DateTime<Utc>>;
}

impl<T: TwilightSource + ?Sized> TwilightSource for &T {
    fn event_utc(
        &self,
        kind: EventKind,
        latitude: f64,
        longitude: f64,
        utc_date: NaiveDate,
        horizon: TwilightHorizon,
    ) -> Option<DateTime<Utc>> {
        (**self).event_utc(kind, latitude, longitude, utc_date, horizon)
    }
}

/// SPA-based ephemeris source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaTwilight {
    /// TT − UT1 in seconds
    pub delta_t: f64,
}

impl Default for SpaTwilight {
    fn default() -> Self {
        Self { delta_t: 69.0 }
    }
}

impl TwilightSource for SpaTwilight {
    fn event_utc(
        &self,
        kind: EventKind,
        latitude: f64,
        longitude: f64,
        utc_date: NaiveDate,
        horizon: TwilightHorizon,
    ) -> Option<DateTime<Utc>> {
        let (year, month, day) = (utc_date.year(), utc_date.month(), utc_date.day());
        let result = match horizon {
            TwilightHorizon::Depression(angle) => spa::sunrise_sunset_utc(
                year,
                month,
                day,
                latitude,
                longitude,
                self.delta_t,
                -angle.value(),
            ),
            TwilightHorizon::Geometric => spa::sunrise_sunset_utc_for_horizon(
                year,
                month,
                day,
                latitude,
                longitude,
                self.delta_t,
                Horizon::SunriseSunset,
            ),
        };

        match result {
            Ok(SunriseResult::RegularDay {
                sunrise, sunset, ..
            }) => {
                let hours = match kind {
                    EventKind::Dawn => sunrise.hours(),
                    EventKind::Dusk => sunset.hours(),
                };
                hours_after_utc_midnight(utc_date, hours)
            }
            Ok(_) => None,
            Err(e) => {
                log::trace!("SPA failed for {} at ({}, {}): {}", utc_date, latitude, longitude, e);
                None
            }
        }
    }
}

/// Position of the fallback state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ResolveState {
    /// Trying `TIERS[i]` at the requested latitude
    Tier(usize),
    /// Trying the astronomical tier at a latitude moved toward the equator
    Migrating { step: u32, latitude: f64 },
    Exhausted,
}

/// Resolves dawn/dusk for a civil date through the tier chain.
#[derive(Debug, Clone)]
pub struct TwilightResolver<S = SpaTwilight> {
    source: S,
    migration_step_deg: f64,
    max_migration_steps: u32,
}

impl TwilightResolver<SpaTwilight> {
    /// Resolver over the SPA source with the configured ΔT and search bounds.
    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(
            SpaTwilight {
                delta_t: config.ephemeris.delta_t_seconds,
            },
            &config.search,
        )
    }
}

impl<S: TwilightSource> TwilightResolver<S> {
    pub fn new(source: S, settings: &SearchSettings) -> Self {
        Self {
            source,
            migration_step_deg: settings.migration_step_deg,
            max_migration_steps: settings.max_migration_steps,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// First event of `kind` on the civil `date` at `location`.
    ///
    /// Walks the tiers, then migrates latitude; `None` means even the
    /// equator produced nothing. Pure in its inputs, so repeated calls give
    /// the same answer.
    pub fn resolve_event(&self, kind: EventKind, location: &Location, date: NaiveDate) -> Option<AstronomicalEvent> {
        let mut state = ResolveState::Tier(0);
        loop {
            state = match state {
                ResolveState::Tier(i) if i < TIERS.len() => {
                    let tier = TIERS[i];
                    if let Some(instant) =
                        self.event_on_local_date(kind, location, location.latitude, date, tier.horizon())
                    {
                        return Some(AstronomicalEvent {
                            instant,
                            kind,
                            confidence: tier.confidence(),
                            latitude: location.latitude,
                        });
                    }
                    ResolveState::Tier(i + 1)
                }
                ResolveState::Tier(_) => {
                    if location.latitude == 0.0 {
                        ResolveState::Exhausted
                    } else {
                        ResolveState::Migrating {
                            step: 1,
                            latitude: self.toward_equator(location.latitude),
                        }
                    }
                }
                ResolveState::Migrating { step, latitude } => {
                    let horizon = Tier::Astronomical.horizon();
                    if let Some(instant) = self.event_on_local_date(kind, location, latitude, date, horizon) {
                        log::debug!(
                            "{:?} on {} at lat {} resolved at migrated lat {}",
                            kind,
                            date,
                            location.latitude,
                            latitude
                        );
                        return Some(AstronomicalEvent {
                            instant,
                            kind,
                            confidence: Confidence::Migrated,
                            latitude,
                        });
                    }
                    if latitude == 0.0 || step >= self.max_migration_steps {
                        ResolveState::Exhausted
                    } else {
                        ResolveState::Migrating {
                            step: step + 1,
                            latitude: self.toward_equator(latitude),
                        }
                    }
                }
                ResolveState::Exhausted => {
                    log::debug!(
                        "No {:?} on {} at ({}, {}) after latitude migration",
                        kind,
                        date,
                        location.latitude,
                        location.longitude
                    );
                    return None;
                }
            };
        }
    }

    pub fn resolve_dawn(&self, location: &Location, date: NaiveDate) -> Option<AstronomicalEvent> {
        self.resolve_event(EventKind::Dawn, location, date)
    }

    pub fn resolve_dusk(&self, location: &Location, date: NaiveDate) -> Option<AstronomicalEvent> {
        self.resolve_event(EventKind::Dusk, location, date)
    }

    /// Plain sunrise (dawn) or sunset (dusk) with no fallback.
    pub fn horizon_event(&self, kind: EventKind, location: &Location, date: NaiveDate) -> Option<DateTime<FixedOffset>> {
        self.event_on_local_date(kind, location, location.latitude, date, TwilightHorizon::Geometric)
    }

    /// Earliest crossing whose civil date in the location's zone is `date`.
    ///
    /// The source works in UTC days, and a civil day overlaps three of them.
    fn event_on_local_date(
        &self,
        kind: EventKind,
        location: &Location,
        latitude: f64,
        date: NaiveDate,
        horizon: TwilightHorizon,
    ) -> Option<DateTime<FixedOffset>> {
        let tz = location.timezone();
        [date.pred_opt(), Some(date), date.succ_opt()]
            .into_iter()
            .flatten()
            .filter_map(|utc_date| {
                self.source
                    .event_utc(kind, latitude, location.longitude, utc_date, horizon)
            })
            .filter(|instant| local_date(*instant, tz) == date)
            .min()
            .map(|instant| to_local(instant, tz))
    }

    fn toward_equator(&self, latitude: f64) -> f64 {
        if latitude > 0.0 {
            (latitude - self.migration_step_deg).max(0.0)
        } else {
            (latitude + self.migration_step_deg).min(0.0)
        }
    }
}
