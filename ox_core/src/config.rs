//! Configuration file support for ox.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/ox/config.toml`.

use crate::analytics::{Formula, Granularity};
use crate::units::MassUnit;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub units: UnitsConfig,

    #[serde(default)]
    pub reports: ReportsConfig,
}

/// Log file location
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct DataConfig {
    /// Used when `--file` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

/// Unit used by unit-aware reports and generators
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UnitsConfig {
    #[serde(default = "default_unit")]
    pub default: String,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            default: default_unit(),
        }
    }
}

/// Defaults for built-in report parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReportsConfig {
    #[serde(default = "default_bin")]
    pub default_bin: String,

    #[serde(default = "default_e1rm_formula")]
    pub e1rm_formula: String,

    #[serde(default = "default_max_effort_marker")]
    pub max_effort_marker: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            default_bin: default_bin(),
            e1rm_formula: default_e1rm_formula(),
            max_effort_marker: default_max_effort_marker(),
        }
    }
}

// Default value functions
fn default_unit() -> String {
    "lb".into()
}

fn default_bin() -> String {
    "weekly".into()
}

fn default_e1rm_formula() -> String {
    "brzycki".into()
}

fn default_max_effort_marker() -> String {
    "^rm".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Check that named defaults resolve
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, e: Error| Error::Config(format!("{}: {}", key, e));
        MassUnit::parse(&self.units.default).map_err(|e| invalid("units.default", e))?;
        self.reports
            .default_bin
            .parse::<Granularity>()
            .map_err(|e| invalid("reports.default_bin", e))?;
        self.reports
            .e1rm_formula
            .parse::<Formula>()
            .map_err(|e| invalid("reports.e1rm_formula", e))?;
        if self.reports.max_effort_marker.is_empty() {
            return Err(Error::Config(
                "reports.max_effort_marker must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from(".config"));
        base.join("ox").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data.log_file.is_none());
        assert_eq!(config.units.default, "lb");
        assert_eq!(config.reports.default_bin, "weekly");
        assert_eq!(config.reports.e1rm_formula, "brzycki");
        assert_eq!(config.reports.max_effort_marker, "^rm");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.data.log_file = Some(PathBuf::from("/tmp/training.ox"));
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[units]
default = "kg"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.units.default, "kg");
        assert_eq!(config.reports.default_bin, "weekly"); // default
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.reports.default_bin = "hourly".into();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.units.default = "furlong".into();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.reports.e1rm_formula = "epley".into();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.reports.e1rm_formula, "epley");
    }

    #[test]
    fn test_load_rejects_bad_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reports]\ne1rm_formula = \"guess\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
