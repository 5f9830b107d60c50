//! Reference data loading utilities.
//!
//! This module combines the table parsers with validation and fingerprinting
//! and produces the immutable [`ReferenceData`](crate::core::ReferenceData)
//! the engine is built on. Tables are loaded once at startup.
//!
//! # Example
//!
//! ```no_run
//! use dawn_calendar::io::loaders::ReferenceLoader;
//! use std::path::Path;
//!
//! let result = ReferenceLoader::load_from_files(
//!     Path::new("data/full_moon_times.csv"),
//!     Path::new("data/new_years_day.csv"),
//! )
//! .expect("Failed to load");
//! println!("Loaded {} full moons", result.data.full_moons.len());
//! ```

pub mod checksum;
pub mod loaders;

#[cfg(test)]
mod loaders_tests;

pub use loaders::{write_reference_csv, ReferenceLoadResult, ReferenceLoader, TableStats};
