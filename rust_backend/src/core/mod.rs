//! Core domain models for the dawn calendar.
//!
//! This module defines the value types shared by every service: locations,
//! resolved twilight events, month and year structures, the tabulated
//! reference series and the engine's error type.

pub mod domain;
pub mod error;
pub mod reference;

pub use domain::{AstronomicalEvent, Confidence, DayCount, EventKind, Location, LunarMonth, YearCycle};
pub use error::{CalendarError, CalendarResult, SeriesKind};
pub use reference::{ReferenceData, ReferenceSeries};
