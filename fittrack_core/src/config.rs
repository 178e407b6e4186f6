//! Configuration file support for FitTrack.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fittrack/config.toml`.

use crate::{Error, Result};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub nutrition: NutritionConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    /// Root of the file-backed document store
    pub fn remote_dir(&self) -> PathBuf {
        self.data_dir.join("remote")
    }

    /// Local cache file
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join("cache.json")
    }
}

/// Default identity used when no `--user` is given
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct IdentityConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Rotation constants for the schedule resolver
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Reference date sitting at rotation index 0
    #[serde(default = "default_epoch")]
    pub epoch: NaiveDate,

    #[serde(default = "default_rotation")]
    pub rotation: Vec<String>,

    /// Weekdays that always rest and consume no rotation slot
    #[serde(default = "default_fixed_rest_days")]
    pub fixed_rest_days: Vec<Weekday>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            epoch: default_epoch(),
            rotation: default_rotation(),
            fixed_rest_days: default_fixed_rest_days(),
        }
    }
}

/// Goals applied to a food log that has never been written
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NutritionConfig {
    #[serde(default = "crate::types::default_calorie_goal")]
    pub calorie_goal: f64,

    #[serde(default = "crate::types::default_protein_goal")]
    pub protein_goal: f64,
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            calorie_goal: crate::types::default_calorie_goal(),
            protein_goal: crate::types::default_protein_goal(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("fittrack")
}

fn default_epoch() -> NaiveDate {
    // A Monday, so the first workout of the default rotation lands on Monday
    NaiveDate::from_ymd_opt(2024, 12, 16).unwrap_or_default()
}

fn default_rotation() -> Vec<String> {
    vec![
        "Chest & Triceps".into(),
        "Back & Biceps".into(),
        "Legs".into(),
    ]
}

fn default_fixed_rest_days() -> Vec<Weekday> {
    vec![Weekday::Sun, Weekday::Wed]
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject configurations the schedule resolver cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.schedule.rotation.is_empty() {
            return Err(Error::Config("schedule.rotation must not be empty".into()));
        }
        if self.schedule.rotation.iter().any(|l| l.trim().is_empty()) {
            return Err(Error::Config(
                "schedule.rotation contains an empty label".into(),
            ));
        }
        if self.schedule.fixed_rest_days.len() >= 7 {
            return Err(Error::Config(
                "schedule.fixed_rest_days leaves no training days".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("fittrack").join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schedule.rotation.len(), 3);
        assert_eq!(
            config.schedule.epoch,
            NaiveDate::from_ymd_opt(2024, 12, 16).unwrap()
        );
        assert_eq!(
            config.schedule.fixed_rest_days,
            vec![Weekday::Sun, Weekday::Wed]
        );
        assert_eq!(config.nutrition.calorie_goal, 2000.0);
        assert!(config.identity.user_id.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.schedule.rotation, parsed.schedule.rotation);
        assert_eq!(config.schedule.epoch, parsed.schedule.epoch);
        assert_eq!(
            config.schedule.fixed_rest_days,
            parsed.schedule.fixed_rest_days
        );
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[schedule]
epoch = "2025-01-01"
rotation = ["Chest & Triceps", "Back & Biceps", "Legs", "Rest"]
fixed_rest_days = []
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.schedule.rotation.len(), 4);
        assert!(config.schedule.fixed_rest_days.is_empty());
        assert_eq!(config.nutrition.protein_goal, 150.0); // default
    }

    #[test]
    fn test_empty_rotation_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[schedule]\nrotation = []\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.identity.user_id = Some("alice".into());
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.identity.user_id.as_deref(), Some("alice"));
    }
}
