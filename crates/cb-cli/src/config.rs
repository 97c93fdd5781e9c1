//! Configuration loading and management.

use std::path::{Path, PathBuf};

use cb_core::TimeDisplay;
use cb_core::billing::{DEFAULT_ACCURACY, DEFAULT_RATE};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Process-wide defaults. Every field can be overridden per report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hourly rate used when a report does not set `rate`.
    pub default_rate: f64,
    /// Decimal digits used when a report does not set `accuracy`.
    pub default_accuracy: u32,
    /// Time rendering used when neither the report nor a toggle sets one.
    pub time_display: TimeDisplay,
    /// Where toggled display modes are persisted.
    pub state_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let state_dir = dirs_state_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            default_rate: DEFAULT_RATE,
            default_accuracy: DEFAULT_ACCURACY,
            time_display: TimeDisplay::default(),
            state_path: state_dir.join("display.json"),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (CB_*)
        figment = figment.merge(Env::prefixed("CB_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for clockbill.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("clockbill"))
}

/// Returns the platform-specific state directory for clockbill.
///
/// On Linux: `~/.local/state/clockbill`
pub fn dirs_state_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|p| p.join("clockbill"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert!((config.default_rate - 80.0).abs() < f64::EPSILON);
        assert_eq!(config.default_accuracy, 3);
        assert_eq!(config.time_display, TimeDisplay::Hours);
        assert_eq!(config.state_path.file_name().unwrap(), "display.json");
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "default_rate = 120.5\ndefault_accuracy = 2\ntime_display = \"duration\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert!((config.default_rate - 120.5).abs() < f64::EPSILON);
        assert_eq!(config.default_accuracy, 2);
        assert_eq!(config.time_display, TimeDisplay::Duration);
    }

    #[test]
    fn test_missing_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.default_accuracy, 3);
    }
}
