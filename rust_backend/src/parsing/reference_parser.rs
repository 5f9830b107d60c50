use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;

use crate::core::error::SeriesKind;
use crate::core::reference::ReferenceSeries;
use crate::time::parse_reference_timestamp;

/// Header names that may hold the timestamp column, most specific first
const TIME_COLUMNS: &[&str] = &[
    "Full Moon Time (UTC)",
    "Time (UTC)",
    "time_utc",
    "timeUtc",
    "timestamp",
    "time",
    "instant",
    "utc",
];

/// Candidate keys for the list of instants in a JSON payload
const LIST_KEYS: &[&str] = &["full_moons", "fullMoons", "new_years", "newYears", "anchors", "times", "instants"];

/// Why a row was left out of the series
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Not a timestamp in any accepted layout
    Malformed,
    /// Equal to the previously accepted instant
    Duplicate,
    /// Earlier than the previously accepted instant
    OutOfOrder,
}

/// A row that was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based data row (header excluded)
    pub row: usize,
    pub raw: String,
    pub reason: SkipReason,
}

/// Outcome of parsing a reference table
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub instants: Vec<DateTime<Utc>>,
    pub skipped: Vec<SkippedRow>,
}

impl ParsedTable {
    /// Accepts one raw value, keeping the instants strictly ascending.
    fn push_raw(&mut self, row: usize, raw: &str) {
        let Some(instant) = parse_reference_timestamp(raw) else {
            self.skip(row, raw, SkipReason::Malformed);
            return;
        };
        match self.instants.last() {
            Some(last) if instant == *last => self.skip(row, raw, SkipReason::Duplicate),
            Some(last) if instant < *last => self.skip(row, raw, SkipReason::OutOfOrder),
            _ => self.instants.push(instant),
        }
    }

    fn skip(&mut self, row: usize, raw: &str, reason: SkipReason) {
        log::warn!("Skipping reference row {}: {:?} ({:?})", row, raw, reason);
        self.skipped.push(SkippedRow {
            row,
            raw: raw.to_string(),
            reason,
        });
    }

    /// Validate into an immutable series.
    pub fn into_series(self, kind: SeriesKind) -> Result<ReferenceSeries> {
        ReferenceSeries::new(kind, self.instants)
            .with_context(|| format!("Invalid {} reference table", kind))
    }
}

/// Parse a reference table file (CSV or JSON, by extension)
pub fn parse_reference_file(path: &Path) -> Result<ParsedTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reference table: {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    parse_reference_content(&content, extension)
        .with_context(|| format!("Failed to parse reference table: {}", path.display()))
}

/// Parse table content given the file extension it came from
pub fn parse_reference_content(content: &str, extension: &str) -> Result<ParsedTable> {
    match extension.to_lowercase().as_str() {
        "json" => parse_reference_json_str(content),
        "csv" | "txt" | "" => parse_reference_csv_str(content),
        other => anyhow::bail!("Unsupported reference table format: {}", other),
    }
}

/// Parse a CSV reference table.
///
/// The timestamp column is picked by header name; without a known header the
/// first column is used.
pub fn parse_reference_csv_str(content: &str) -> Result<ParsedTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let column = TIME_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
        .unwrap_or(0);

    // A header-less file has a timestamp where the header should be
    let mut table = ParsedTable::default();
    let mut row = 0;
    if let Some(first) = headers.get(column) {
        if parse_reference_timestamp(first).is_some() {
            row += 1;
            table.push_raw(row, first);
        }
    }

    for record in reader.records() {
        row += 1;
        let record = record.with_context(|| format!("Failed to read CSV row {}", row))?;
        match record.get(column) {
            Some(raw) if !raw.is_empty() => table.push_raw(row, raw),
            _ => table.skip(row, "", SkipReason::Malformed),
        }
    }

    Ok(table)
}

/// Parse a JSON reference table: an array of timestamps, an array of
/// objects holding one, or an object wrapping such an array.
pub fn parse_reference_json_str(content: &str) -> Result<ParsedTable> {
    let value: Value = serde_json::from_str(content).context("Failed to parse reference JSON")?;

    let entries = find_list(&value).context("Could not find a list of instants in JSON")?;

    let mut table = ParsedTable::default();
    for (i, entry) in entries.iter().enumerate() {
        let row = i + 1;
        match entry_text(entry) {
            Some(raw) => table.push_raw(row, &raw),
            None => table.skip(row, &entry.to_string(), SkipReason::Malformed),
        }
    }

    Ok(table)
}

fn find_list(payload: &Value) -> Option<&Vec<Value>> {
    if let Some(arr) = payload.as_array() {
        return Some(arr);
    }

    let obj = payload.as_object()?;
    LIST_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))
        .or_else(|| obj.values().find_map(Value::as_array))
}

/// Text of a timestamp entry, looking inside objects by the column names.
fn entry_text(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => TIME_COLUMNS
            .iter()
            .find_map(|key| obj.get(*key))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_raw_keeps_order() {
        let mut table = ParsedTable::default();
        table.push_raw(1, "2024-01-25 17:54:00");
        table.push_raw(2, "2024-01-25 17:54:00");
        table.push_raw(3, "2023-12-27 00:33:00");
        table.push_raw(4, "2024-02-24 12:30:00");
        assert_eq!(table.instants.len(), 2);
        assert_eq!(table.skipped[0].reason, SkipReason::Duplicate);
        assert_eq!(table.skipped[1].reason, SkipReason::OutOfOrder);
        assert_eq!(table.skipped[1].row, 3);
    }

    #[test]
    fn test_entry_text_from_object() {
        let value = serde_json::json!({"Time (UTC)": "2024-01-01 00:00:00"});
        assert_eq!(entry_text(&value).as_deref(), Some("2024-01-01 00:00:00"));
        assert!(entry_text(&serde_json::json!(61771.0)).is_none());
    }
}
