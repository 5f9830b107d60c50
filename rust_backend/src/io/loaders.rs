use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::config::DataSettings;
use crate::core::error::SeriesKind;
use crate::core::reference::{ReferenceData, ReferenceSeries};
use crate::io::checksum::fingerprint_tables;
use crate::parsing::reference_parser::{self, ParsedTable};

/// Per-table load statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub accepted: usize,
    pub skipped: usize,
}

/// Result of loading both reference tables
#[derive(Debug)]
pub struct ReferenceLoadResult {
    pub data: ReferenceData,
    pub full_moons: TableStats,
    pub new_years: TableStats,
}

/// Unified interface for loading the full-moon and new-year tables
pub struct ReferenceLoader;

impl ReferenceLoader {
    /// Load both tables from the paths in the configuration
    pub fn load_from_settings(settings: &DataSettings) -> Result<ReferenceLoadResult> {
        Self::load_from_files(&settings.full_moons, &settings.new_years)
    }

    /// Load both tables from files (CSV or JSON, by extension)
    pub fn load_from_files(full_moons: &Path, new_years: &Path) -> Result<ReferenceLoadResult> {
        let full_content = read_table(full_moons)?;
        let new_year_content = read_table(new_years)?;

        let full_table = reference_parser::parse_reference_content(&full_content, extension(full_moons))
            .with_context(|| format!("Failed to parse full-moon table {}", full_moons.display()))?;
        let new_year_table =
            reference_parser::parse_reference_content(&new_year_content, extension(new_years))
                .with_context(|| format!("Failed to parse new-year table {}", new_years.display()))?;

        let result = Self::assemble(full_table, new_year_table, &full_content, &new_year_content)?;
        log::info!(
            "Loaded {} full moons ({} skipped) from {} and {} new-year anchors ({} skipped) from {}",
            result.full_moons.accepted,
            result.full_moons.skipped,
            full_moons.display(),
            result.new_years.accepted,
            result.new_years.skipped,
            new_years.display()
        );
        Ok(result)
    }

    /// Load both tables from CSV strings
    pub fn load_from_csv_strs(full_moons_csv: &str, new_years_csv: &str) -> Result<ReferenceLoadResult> {
        let full_table = reference_parser::parse_reference_csv_str(full_moons_csv)
            .context("Failed to parse full-moon CSV")?;
        let new_year_table = reference_parser::parse_reference_csv_str(new_years_csv)
            .context("Failed to parse new-year CSV")?;

        Self::assemble(full_table, new_year_table, full_moons_csv, new_years_csv)
    }

    /// Load a single table of instants without building a series (used for
    /// the conjunction tables the new-year derivation reads)
    pub fn load_instants(path: &Path) -> Result<Vec<DateTime<Utc>>> {
        let table = reference_parser::parse_reference_file(path)?;
        log::info!(
            "Loaded {} instants ({} skipped) from {}",
            table.instants.len(),
            table.skipped.len(),
            path.display()
        );
        Ok(table.instants)
    }

    fn assemble(
        full_table: ParsedTable,
        new_year_table: ParsedTable,
        full_content: &str,
        new_year_content: &str,
    ) -> Result<ReferenceLoadResult> {
        let full_stats = stats(&full_table);
        let new_year_stats = stats(&new_year_table);

        let full_series = full_table.into_series(SeriesKind::FullMoons)?;
        let new_year_series = new_year_table.into_series(SeriesKind::NewYears)?;
        warn_on_uncovered_anchors(&full_series, &new_year_series);

        let fingerprint = fingerprint_tables(&[full_content, new_year_content]);
        log::debug!("Reference data fingerprint {}", fingerprint);

        Ok(ReferenceLoadResult {
            data: ReferenceData::new(full_series, new_year_series).with_fingerprint(fingerprint),
            full_moons: full_stats,
            new_years: new_year_stats,
        })
    }
}

/// Write instants as a one-column reference table in the layout the loader
/// reads back (`2024-03-25 07:00:00.000000`).
pub fn write_reference_csv<W: std::io::Write>(
    instants: &[DateTime<Utc>],
    header: &str,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([header])?;
    for instant in instants {
        csv_writer.write_record([instant.format(TABLE_TIME_FORMAT).to_string()])?;
    }
    csv_writer.flush().context("Failed to flush reference table")?;
    Ok(())
}

/// Timestamp layout of the precomputed tables
pub const TABLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn read_table(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reference table: {}", path.display()))
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|ext| ext.to_str()).unwrap_or_default()
}

fn stats(table: &ParsedTable) -> TableStats {
    TableStats {
        accepted: table.instants.len(),
        skipped: table.skipped.len(),
    }
}

/// New-year anchors outside the full-moon table yield years with no months.
fn warn_on_uncovered_anchors(full_moons: &ReferenceSeries, new_years: &ReferenceSeries) {
    let uncovered = new_years
        .iter()
        .filter(|anchor| **anchor < full_moons.first() || **anchor > full_moons.last())
        .count();
    if uncovered > 0 {
        log::warn!(
            "{} new-year anchors fall outside the full-moon table ({} .. {})",
            uncovered,
            full_moons.first(),
            full_moons.last()
        );
    }
}
