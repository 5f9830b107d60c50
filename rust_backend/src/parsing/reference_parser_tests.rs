#[cfg(test)]
mod tests {
    use crate::core::error::SeriesKind;
    use crate::parsing::reference_parser::{
        parse_reference_csv_str, parse_reference_file, parse_reference_json_str, SkipReason,
    };
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::Builder;

    const FULL_MOON_CSV: &str = "Full Moon Time (UTC)\n\
        2024-01-25 17:54:00.000000\n\
        2024-02-24 12:30:00.000000\n\
        2024-03-25 07:00:00.000000\n";

    /// Test parsing the table layout written by the precompute scripts
    #[test]
    fn test_parse_full_moon_csv() {
        let table = parse_reference_csv_str(FULL_MOON_CSV).unwrap();
        assert_eq!(table.instants.len(), 3);
        assert!(table.skipped.is_empty());
        assert_eq!(
            table.instants[0],
            Utc.with_ymd_and_hms(2024, 1, 25, 17, 54, 0).unwrap()
        );
    }

    /// Test that the time column is found by header name
    #[test]
    fn test_parse_csv_picks_named_column() {
        let csv = "Year,Time (UTC),Note\n\
            2024,2024-03-25 07:00:00,spring\n\
            2025,2025-04-13 00:22:00,spring\n";
        let table = parse_reference_csv_str(csv).unwrap();
        assert_eq!(table.instants.len(), 2);
    }

    /// Test a table without any header row
    #[test]
    fn test_parse_csv_without_header() {
        let csv = "2024-01-25 17:54:00\n2024-02-24 12:30:00\n";
        let table = parse_reference_csv_str(csv).unwrap();
        assert_eq!(table.instants.len(), 2);
        assert!(table.skipped.is_empty());
    }

    /// Test that malformed and misordered rows are skipped, not reordered
    #[test]
    fn test_parse_csv_skips_bad_rows() {
        let csv = "Full Moon Time (UTC)\n\
            2024-01-25 17:54:00\n\
            not a date\n\
            2024-01-25 17:54:00\n\
            2023-12-27 00:33:00\n\
            \n\
            2024-02-24 12:30:00\n";
        let table = parse_reference_csv_str(csv).unwrap();

        assert_eq!(table.instants.len(), 2);
        let reasons: Vec<&SkipReason> = table.skipped.iter().map(|s| &s.reason).collect();
        assert!(reasons.contains(&&SkipReason::Malformed));
        assert!(reasons.contains(&&SkipReason::Duplicate));
        assert!(reasons.contains(&&SkipReason::OutOfOrder));
        assert!(table.instants.windows(2).all(|w| w[0] < w[1]));
    }

    /// Test parsing a plain JSON array
    #[test]
    fn test_parse_json_array() {
        let json = r#"["2024-01-25T17:54:00Z", "2024-02-24T12:30:00Z"]"#;
        let table = parse_reference_json_str(json).unwrap();
        assert_eq!(table.instants.len(), 2);
    }

    /// Test parsing a wrapped JSON payload with object entries
    #[test]
    fn test_parse_json_wrapped_objects() {
        let json = r#"{
            "new_years": [
                {"Full Moon Time (UTC)": "2024-03-25 07:00:00.000000"},
                {"Full Moon Time (UTC)": "2025-04-13 00:22:00.000000"},
                {"other": 1}
            ]
        }"#;
        let table = parse_reference_json_str(json).unwrap();
        assert_eq!(table.instants.len(), 2);
        assert_eq!(table.skipped.len(), 1);
        assert_eq!(table.skipped[0].row, 3);
    }

    /// Test that a JSON payload without any list fails
    #[test]
    fn test_parse_json_without_list() {
        let result = parse_reference_json_str(r#"{"count": 3}"#);
        assert!(result.is_err());
    }

    /// Test conversion into a validated series
    #[test]
    fn test_into_series_rejects_empty_table() {
        let table = parse_reference_csv_str("Full Moon Time (UTC)\n").unwrap();
        assert!(table.into_series(SeriesKind::FullMoons).is_err());

        let table = parse_reference_csv_str(FULL_MOON_CSV).unwrap();
        let series = table.into_series(SeriesKind::FullMoons).unwrap();
        assert_eq!(series.len(), 3);
    }

    /// Test reading from files with extension detection
    #[test]
    fn test_parse_reference_file_by_extension() {
        let mut csv_file = Builder::new().suffix(".csv").tempfile().unwrap();
        csv_file.write_all(FULL_MOON_CSV.as_bytes()).unwrap();
        let table = parse_reference_file(csv_file.path()).unwrap();
        assert_eq!(table.instants.len(), 3);

        let mut json_file = Builder::new().suffix(".json").tempfile().unwrap();
        json_file
            .write_all(br#"["2024-01-25 17:54:00"]"#)
            .unwrap();
        let table = parse_reference_file(json_file.path()).unwrap();
        assert_eq!(table.instants.len(), 1);

        let xml_file = Builder::new().suffix(".xml").tempfile().unwrap();
        assert!(parse_reference_file(xml_file.path()).is_err());
    }

    /// Test that a missing file reports an error
    #[test]
    fn test_parse_missing_file() {
        let result = parse_reference_file(std::path::Path::new("/nonexistent/full_moons.csv"));
        assert!(result.is_err());
    }
}
