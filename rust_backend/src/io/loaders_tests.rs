#[cfg(test)]
mod tests {
    use crate::config::DataSettings;
    use crate::io::loaders::ReferenceLoader;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn write_table(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const FULL_MOONS: &str = "Full Moon Time (UTC)\n\
        2024-03-25 07:00:00.000000\n\
        2024-04-23 23:49:00.000000\n\
        2024-05-23 13:53:00.000000\n\
        2024-06-22 01:08:00.000000\n";

    const NEW_YEARS: &str = "Full Moon Time (UTC)\n\
        2024-03-25 07:00:00.000000\n\
        2025-04-13 00:22:00.000000\n";

    /// Test loading both tables from CSV files
    #[test]
    fn test_load_from_files() {
        let full = write_table(".csv", FULL_MOONS);
        let ny = write_table(".csv", NEW_YEARS);

        let result = ReferenceLoader::load_from_files(full.path(), ny.path()).unwrap();
        assert_eq!(result.data.full_moons.len(), 4);
        assert_eq!(result.data.new_years.len(), 2);
        assert_eq!(result.full_moons.skipped, 0);
    }

    /// Test loading a mix of CSV and JSON tables through settings
    #[test]
    fn test_load_from_settings_mixed_formats() {
        let full = write_table(".csv", FULL_MOONS);
        let ny = write_table(
            ".json",
            r#"["2024-03-25T07:00:00Z", "2025-04-13T00:22:00Z", "garbage"]"#,
        );
        let settings = DataSettings {
            full_moons: full.path().to_path_buf(),
            new_years: ny.path().to_path_buf(),
        };

        let result = ReferenceLoader::load_from_settings(&settings).unwrap();
        assert_eq!(result.new_years.accepted, 2);
        assert_eq!(result.new_years.skipped, 1);
    }

    /// Test that identical content gives an identical fingerprint
    #[test]
    fn test_fingerprint_is_stable() {
        let a = ReferenceLoader::load_from_csv_strs(FULL_MOONS, NEW_YEARS).unwrap();
        let b = ReferenceLoader::load_from_csv_strs(FULL_MOONS, NEW_YEARS).unwrap();
        assert_eq!(a.data.fingerprint, b.data.fingerprint);

        let swapped = ReferenceLoader::load_from_csv_strs(NEW_YEARS, FULL_MOONS).unwrap();
        assert_ne!(a.data.fingerprint, swapped.data.fingerprint);
    }

    /// Test that a table with no usable rows is an error
    #[test]
    fn test_empty_table_fails() {
        let result = ReferenceLoader::load_from_csv_strs(FULL_MOONS, "Full Moon Time (UTC)\nnope\n");
        assert!(result.is_err());
    }

    /// Test that a missing file is reported with its path
    #[test]
    fn test_missing_file_fails() {
        let full = write_table(".csv", FULL_MOONS);
        let result = ReferenceLoader::load_from_files(
            full.path(),
            std::path::Path::new("/nonexistent/new_years_day.csv"),
        );
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("/nonexistent/new_years_day.csv"));
    }
}
