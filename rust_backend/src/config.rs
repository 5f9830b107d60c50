//! Calendar configuration file support.
//!
//! This module reads engine settings from a TOML file: where the reference
//! tables live, the bounds of the day-stepping searches, the ΔT used by the
//! ephemeris routine and a default observer location.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::domain::Location;
use crate::core::error::{CalendarError, CalendarResult};

/// Calendar configuration from file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub ephemeris: EphemerisSettings,
    #[serde(default)]
    pub location: LocationSettings,
}

/// Reference table locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_full_moons_path")]
    pub full_moons: PathBuf,
    #[serde(default = "default_new_years_path")]
    pub new_years: PathBuf,
}

/// Bounds for the dawn searches and the latitude migration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Calendar days probed by a first-dawn-after search
    #[serde(default = "default_dawn_horizon_days")]
    pub dawn_horizon_days: u32,
    /// Longest dawn series walked while counting a month
    #[serde(default = "default_max_cycle_days")]
    pub max_cycle_days: u32,
    /// Degrees moved toward the equator per migration step
    #[serde(default = "default_migration_step_deg")]
    pub migration_step_deg: f64,
    #[serde(default = "default_max_migration_steps")]
    pub max_migration_steps: u32,
}

/// Ephemeris parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EphemerisSettings {
    /// TT − UT1 in seconds
    #[serde(default = "default_delta_t")]
    pub delta_t_seconds: f64,
}

/// Default observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSettings {
    #[serde(default = "default_location_name")]
    pub name: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_full_moons_path() -> PathBuf {
    PathBuf::from("data/full_moon_times.csv")
}

fn default_new_years_path() -> PathBuf {
    PathBuf::from("data/new_years_day.csv")
}

fn default_dawn_horizon_days() -> u32 {
    10
}

fn default_max_cycle_days() -> u32 {
    62
}

fn default_migration_step_deg() -> f64 {
    1.0
}

fn default_max_migration_steps() -> u32 {
    90
}

fn default_delta_t() -> f64 {
    69.0
}

fn default_location_name() -> String {
    "Greenwich, England".to_string()
}

fn default_latitude() -> f64 {
    51.4769
}

fn default_timezone() -> String {
    "Europe/London".to_string()
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            full_moons: default_full_moons_path(),
            new_years: default_new_years_path(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            dawn_horizon_days: default_dawn_horizon_days(),
            max_cycle_days: default_max_cycle_days(),
            migration_step_deg: default_migration_step_deg(),
            max_migration_steps: default_max_migration_steps(),
        }
    }
}

impl Default for EphemerisSettings {
    fn default() -> Self {
        Self {
            delta_t_seconds: default_delta_t(),
        }
    }
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            name: default_location_name(),
            latitude: default_latitude(),
            longitude: 0.0,
            timezone: default_timezone(),
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> CalendarResult<()> {
        if self.dawn_horizon_days == 0 {
            return Err(CalendarError::ConfigurationError(
                "search.dawn_horizon_days must be at least 1".to_string(),
            ));
        }
        if self.max_cycle_days < 31 {
            return Err(CalendarError::ConfigurationError(format!(
                "search.max_cycle_days must cover a month, got {}",
                self.max_cycle_days
            )));
        }
        if !(self.migration_step_deg > 0.0 && self.migration_step_deg <= 90.0) {
            return Err(CalendarError::ConfigurationError(format!(
                "search.migration_step_deg must be in (0, 90], got {}",
                self.migration_step_deg
            )));
        }
        if self.max_migration_steps == 0 {
            return Err(CalendarError::ConfigurationError(
                "search.max_migration_steps must be at least 1".to_string(),
            ));
        }
        // Migration must be able to reach the equator from either pole
        if self.migration_step_deg * f64::from(self.max_migration_steps) < 90.0 {
            return Err(CalendarError::ConfigurationError(format!(
                "search.max_migration_steps ({}) x search.migration_step_deg ({}) must cover 90 degrees",
                self.max_migration_steps, self.migration_step_deg
            )));
        }
        Ok(())
    }
}

impl LocationSettings {
    pub fn to_location(&self) -> CalendarResult<Location> {
        Location::new(self.latitude, self.longitude, &self.timezone)
    }
}

impl CalendarConfig {
    /// Load calendar configuration from a TOML file.
    ///
    /// Relative table paths are resolved against the file's directory.
    ///
    /// # Returns
    /// * `Ok(CalendarConfig)` if successful
    /// * `Err(CalendarError)` if file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> CalendarResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CalendarError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.data.full_moons = resolve(base, &config.data.full_moons);
            config.data.new_years = resolve(base, &config.data.new_years);
        }
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml_str(content: &str) -> CalendarResult<Self> {
        let config: CalendarConfig = toml::from_str(content).map_err(|e| {
            CalendarError::ConfigurationError(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load calendar configuration from the default location.
    ///
    /// Searches for `calendar.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    ///
    /// `Ok(None)` when no file exists; a file that fails to parse or
    /// validate is an error.
    pub fn from_default_location() -> CalendarResult<Option<Self>> {
        Self::from_first_existing(&[
            PathBuf::from("calendar.toml"),
            PathBuf::from("rust_backend/calendar.toml"),
            PathBuf::from("../calendar.toml"),
        ])
    }

    fn from_first_existing(search_paths: &[PathBuf]) -> CalendarResult<Option<Self>> {
        match search_paths.iter().find(|path| path.exists()) {
            Some(path) => Self::from_file(path).map(Some),
            None => Ok(None),
        }
    }

    pub fn validate(&self) -> CalendarResult<()> {
        self.search.validate()?;
        if !self.ephemeris.delta_t_seconds.is_finite() {
            return Err(CalendarError::ConfigurationError(
                "ephemeris.delta_t_seconds must be finite".to_string(),
            ));
        }
        self.location.to_location().map(|_| ())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CalendarConfig::from_toml_str("").unwrap();
        assert_eq!(config.search.dawn_horizon_days, 10);
        assert_eq!(config.search.max_migration_steps, 90);
        assert_eq!(config.ephemeris.delta_t_seconds, 69.0);
        assert_eq!(config.location.timezone, "Europe/London");
        assert_eq!(config.data.full_moons, PathBuf::from("data/full_moon_times.csv"));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[data]
full_moons = "tables/full.csv"
new_years = "tables/ny.json"

[search]
dawn_horizon_days = 12
max_cycle_days = 45

[ephemeris]
delta_t_seconds = 70.5

[location]
name = "Reykjavik"
latitude = 64.15
longitude = -21.94
timezone = "Atlantic/Reykjavik"
"#;
        let config = CalendarConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.search.dawn_horizon_days, 12);
        assert_eq!(config.search.migration_step_deg, 1.0);
        let location = config.location.to_location().unwrap();
        assert_eq!(location.timezone().name(), "Atlantic/Reykjavik");
    }

    #[test]
    fn test_rejects_zero_horizon() {
        let result = CalendarConfig::from_toml_str("[search]\ndawn_horizon_days = 0\n");
        assert!(matches!(result, Err(CalendarError::ConfigurationError(_))));
    }

    #[test]
    fn test_rejects_short_cycle_bound() {
        let result = CalendarConfig::from_toml_str("[search]\nmax_cycle_days = 20\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_migration_that_cannot_reach_equator() {
        let result = CalendarConfig::from_toml_str("[search]\nmigration_step_deg = 0.5\n");
        assert!(matches!(result, Err(CalendarError::ConfigurationError(_))));

        let covered = CalendarConfig::from_toml_str("[search]\nmigration_step_deg = 0.5\nmax_migration_steps = 180\n");
        assert!(covered.is_ok());
    }

    #[test]
    fn test_rejects_unknown_zone() {
        let result = CalendarConfig::from_toml_str("[location]\ntimezone = \"Nowhere/Land\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[data]\nfull_moons = \"fm.csv\"\nnew_years = \"/abs/ny.csv\"").unwrap();

        let config = CalendarConfig::from_file(&path).unwrap();
        assert_eq!(config.data.full_moons, dir.path().join("fm.csv"));
        assert_eq!(config.data.new_years, PathBuf::from("/abs/ny.csv"));
    }

    #[test]
    fn test_search_list_without_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let found = CalendarConfig::from_first_existing(&[dir.path().join("calendar.toml")]).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_search_list_reports_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.toml");
        fs::write(&path, "[search]\ndawn_horizon_days = 0\n").unwrap();

        let missing = dir.path().join("missing.toml");
        let result = CalendarConfig::from_first_existing(&[missing, path]);
        assert!(matches!(result, Err(CalendarError::ConfigurationError(_))));
    }
}
