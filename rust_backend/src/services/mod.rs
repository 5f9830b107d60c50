//! Service layer for calendar computations.
//!
//! This module contains the engine proper: twilight resolution with tier
//! fallback, dawn searches and cycle counting, anchor lookups in the
//! reference tables, and the year/month assembly built on them.

pub mod anchors;
pub mod calendar;
pub mod dawn;
pub mod grid;
pub mod new_year;
pub mod sun_events;
pub mod twilight;

pub use anchors::{AnchorPair, AnchorResolver};
pub use calendar::{CalendarEngine, CalendarPosition, CurrentMonth, CurrentYear};
pub use dawn::{CancellationFlag, DawnSearch, DawnSeries};
pub use grid::{month_grid, month_label, MonthGrid};
pub use new_year::{derive_new_year_anchors, NewYearAnchor, NewYearRule};
pub use sun_events::{sun_events_for_date, DailySunEvents};
pub use twilight::{SpaTwilight, Tier, TwilightHorizon, TwilightResolver, TwilightSource};
