//! Daily sun event summary: dawn, sunrise, sunset and dusk for one date.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::core::domain::{AstronomicalEvent, Confidence, EventKind, Location};
use crate::services::twilight::{TwilightResolver, TwilightSource};
use crate::time::format_hhmm;

/// Shown when the caller has no name for the location.
pub const DEFAULT_LOCATION_NAME: &str = "Greenwich, England";

/// Sun events of one civil date at one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySunEvents {
    pub date: NaiveDate,
    pub location: Location,
    /// Tiered dawn
    pub dawn: Option<AstronomicalEvent>,
    /// Plain horizon events, no fallback
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
    /// Tiered dusk
    pub dusk: Option<AstronomicalEvent>,
}

impl DailySunEvents {
    /// Plain-text summary, one event per line.
    ///
    /// ```text
    /// Location: Greenwich, England
    /// Dawn: 05:58
    /// Sunrise: 07:58
    /// Sunset: 16:14
    /// Dusk: 18:14 (secondary: nautical)
    /// ```
    pub fn render_text(&self, location_name: Option<&str>) -> String {
        [
            format!("Location: {}", location_name.unwrap_or(DEFAULT_LOCATION_NAME)),
            event_line("Dawn", EventKind::Dawn, self.dawn.as_ref()),
            format!("Sunrise: {}", format_hhmm(self.sunrise.as_ref())),
            format!("Sunset: {}", format_hhmm(self.sunset.as_ref())),
            event_line("Dusk", EventKind::Dusk, self.dusk.as_ref()),
        ]
        .join("\n")
    }
}

fn event_line(name: &str, kind: EventKind, event: Option<&AstronomicalEvent>) -> String {
    match event {
        Some(e) if e.confidence == Confidence::Astronomical => {
            format!("{}: {}", name, format_hhmm(Some(&e.instant)))
        }
        Some(e) => format!(
            "{}: {} (secondary: {})",
            name,
            format_hhmm(Some(&e.instant)),
            e.confidence.tag(kind)
        ),
        None => format!("{}: --:-- (not found)", name),
    }
}

/// Resolve the four daily events.
pub fn sun_events_for_date<S: TwilightSource>(
    resolver: &TwilightResolver<S>,
    location: &Location,
    date: NaiveDate,
) -> DailySunEvents {
    DailySunEvents {
        date,
        location: location.clone(),
        dawn: resolver.resolve_dawn(location, date),
        sunrise: resolver.horizon_event(EventKind::Dawn, location, date),
        sunset: resolver.horizon_event(EventKind::Dusk, location, date),
        dusk: resolver.resolve_dusk(location, date),
    }
}
