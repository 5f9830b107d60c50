//! Selection of each year's new-year full moon.
//!
//! The new-year table is derived offline from three tabulated series: full
//! moons, Moon/Spica conjunctions and (optionally) the Sun's crossing of
//! Hamal. Within each UTC calendar year the full moon lying closest to a
//! Spica crossing opens the year. Two selection rules exist; see
//! [`NewYearRule`].

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

/// How a full moon is matched with a Spica crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NewYearRule {
    /// Latest crossing strictly before the full moon; the choice must also
    /// precede the year's Sun/Hamal crossing, stepping back one full moon
    /// if it does not.
    #[default]
    PrecedingCrossing,
    /// Nearest crossing before the full moon or at most 12 hours after it;
    /// no Hamal constraint.
    NearestCrossing,
}

/// Longest delay after a full moon at which a crossing still counts.
const LATE_CROSSING_WINDOW_HOURS: i64 = 12;

/// One year's selected anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewYearAnchor {
    pub year: i32,
    pub full_moon: DateTime<Utc>,
    /// Gap between the full moon and its matched crossing, before any Hamal
    /// adjustment
    #[serde(skip)]
    pub gap: Duration,
    /// True when the Hamal constraint moved the choice back one full moon
    pub stepped_back: bool,
}

/// Pick each year's new-year full moon.
///
/// Years are those of the full-moon table. A year with no usable crossing,
/// or whose choice cannot be placed before the Hamal crossing, yields no
/// anchor. Output is one anchor per year at most, in ascending order.
pub fn derive_new_year_anchors(
    full_moons: &[DateTime<Utc>],
    spica_crossings: &[DateTime<Utc>],
    sun_hamal: &[DateTime<Utc>],
    rule: NewYearRule,
) -> Vec<NewYearAnchor> {
    let moons_by_year = group_by_year(full_moons);
    let crossings_by_year = group_by_year(spica_crossings);
    let hamal_by_year = group_by_year(sun_hamal);

    let mut anchors = Vec::with_capacity(moons_by_year.len());
    for (year, moons) in &moons_by_year {
        let crossings = crossings_by_year.get(year).map(Vec::as_slice).unwrap_or_default();
        let Some((index, gap)) = closest_full_moon(moons, crossings, rule) else {
            log::debug!("No Spica crossing matches a full moon in {}", year);
            continue;
        };

        let anchor = match rule {
            NewYearRule::NearestCrossing => Some(NewYearAnchor {
                year: *year,
                full_moon: moons[index],
                gap,
                stepped_back: false,
            }),
            NewYearRule::PrecedingCrossing => {
                let hamal = hamal_by_year.get(year).and_then(|h| h.first()).copied();
                apply_hamal_constraint(*year, moons, index, gap, hamal)
            }
        };

        match anchor {
            Some(anchor) => anchors.push(anchor),
            None => log::warn!("No full moon before the Sun/Hamal crossing in {}", year),
        }
    }

    log::info!("Derived {} new-year anchors ({:?})", anchors.len(), rule);
    anchors
}

/// Instants of the derived anchors, ready to build a new-year series from.
pub fn anchor_instants(anchors: &[NewYearAnchor]) -> Vec<DateTime<Utc>> {
    anchors.iter().map(|a| a.full_moon).collect()
}

fn group_by_year(instants: &[DateTime<Utc>]) -> BTreeMap<i32, Vec<DateTime<Utc>>> {
    let mut groups: BTreeMap<i32, Vec<DateTime<Utc>>> = BTreeMap::new();
    for instant in instants {
        groups.entry(instant.year()).or_default().push(*instant);
    }
    for group in groups.values_mut() {
        group.sort();
    }
    groups
}

/// Index of the full moon with the smallest crossing gap, and that gap.
/// Ties keep the earlier full moon.
fn closest_full_moon(
    moons: &[DateTime<Utc>],
    crossings: &[DateTime<Utc>],
    rule: NewYearRule,
) -> Option<(usize, Duration)> {
    let mut best: Option<(usize, Duration)> = None;
    for (i, moon) in moons.iter().enumerate() {
        let Some(gap) = crossing_gap(*moon, crossings, rule) else {
            continue;
        };
        if best.map_or(true, |(_, best_gap)| gap < best_gap) {
            best = Some((i, gap));
        }
    }
    best
}

fn crossing_gap(moon: DateTime<Utc>, crossings: &[DateTime<Utc>], rule: NewYearRule) -> Option<Duration> {
    match rule {
        NewYearRule::PrecedingCrossing => crossings
            .iter()
            .filter(|c| **c < moon)
            .max()
            .map(|c| moon - *c),
        NewYearRule::NearestCrossing => {
            let window = Duration::hours(LATE_CROSSING_WINDOW_HOURS);
            crossings
                .iter()
                .filter(|c| **c < moon || **c - moon <= window)
                .map(|c| (moon - *c).abs())
                .min()
        }
    }
}

fn apply_hamal_constraint(
    year: i32,
    moons: &[DateTime<Utc>],
    index: usize,
    gap: Duration,
    hamal: Option<DateTime<Utc>>,
) -> Option<NewYearAnchor> {
    let Some(hamal) = hamal else {
        log::debug!("No Sun/Hamal crossing in {}; keeping closest full moon", year);
        return Some(NewYearAnchor {
            year,
            full_moon: moons[index],
            gap,
            stepped_back: false,
        });
    };

    let (index, stepped_back) = if moons[index] >= hamal && index > 0 {
        (index - 1, true)
    } else {
        (index, false)
    };

    (moons[index] < hamal).then(|| NewYearAnchor {
        year,
        full_moon: moons[index],
        gap,
        stepped_back,
    })
}
