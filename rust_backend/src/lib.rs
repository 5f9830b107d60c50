//! Dawn Calendar - lunar calendar engine anchored on dawns and full moons.
//!
//! Days run from dawn to dawn, months from the first dawn after a full moon
//! to the first dawn after the next one, and years from one tabulated
//! new-year full moon to the next.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dawn_calendar::config::CalendarConfig;
//! use dawn_calendar::io::ReferenceLoader;
//! use dawn_calendar::services::CalendarEngine;
//!
//! let config = CalendarConfig::default();
//! let loaded = ReferenceLoader::load_from_settings(&config.data).unwrap();
//! let engine = CalendarEngine::from_config(Arc::new(loaded.data), &config);
//! let location = config.location.to_location().unwrap();
//! let years = engine.build_multi_year_calendar(2024, 2025, &location).unwrap();
//! println!("{} year cycles", years.len());
//! ```

pub mod config;
pub mod core;
pub mod io;
pub mod parsing;
pub mod services;
pub mod time;

pub use crate::config::CalendarConfig;
pub use crate::core::{
    AstronomicalEvent, CalendarError, CalendarResult, Confidence, DayCount, EventKind, Location, LunarMonth,
    ReferenceData, ReferenceSeries, YearCycle,
};
pub use crate::services::CalendarEngine;
