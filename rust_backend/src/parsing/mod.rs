//! Parsers for the tabulated reference series.
//!
//! Full-moon and new-year tables (and the conjunction tables used to derive
//! new-year anchors) are one UTC timestamp per record. This module reads them
//! from CSV or JSON and keeps only rows that preserve strict ascending order.
//!
//! # Example
//!
//! ```no_run
//! use dawn_calendar::core::error::SeriesKind;
//! use dawn_calendar::parsing::reference_parser::parse_reference_file;
//! use std::path::Path;
//!
//! let table = parse_reference_file(Path::new("data/full_moon_times.csv"))
//!     .expect("Failed to parse table");
//! let series = table.into_series(SeriesKind::FullMoons).expect("Empty table");
//! ```

pub mod reference_parser;

#[cfg(test)]
mod reference_parser_tests;

pub use reference_parser::{ParsedTable, SkipReason, SkippedRow};
