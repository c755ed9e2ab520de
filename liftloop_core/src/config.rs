//! Configuration file support for liftloop.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/liftloop/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub playthrough: PlaythroughSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
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
    /// Path of the store document inside a data directory
    pub fn store_path(data_dir: &Path) -> PathBuf {
        data_dir.join("store.json")
    }
}

/// Playthrough timing and cue settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlaythroughSettings {
    /// Get-ready countdown for blocks without their own transition time
    #[serde(default = "default_transition_seconds")]
    pub default_transition_seconds: f64,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Exercise name (case-insensitive) that skips the get-ready phase
    #[serde(default = "default_recover_exercise_name")]
    pub recover_exercise_name: String,

    #[serde(default = "default_audible_cue")]
    pub audible_cue: bool,
}

impl Default for PlaythroughSettings {
    fn default() -> Self {
        Self {
            default_transition_seconds: default_transition_seconds(),
            tick_interval_ms: default_tick_interval_ms(),
            recover_exercise_name: default_recover_exercise_name(),
            audible_cue: default_audible_cue(),
        }
    }
}

impl PlaythroughSettings {
    pub fn is_recover_exercise(&self, name: &str) -> bool {
        name.trim()
            .eq_ignore_ascii_case(self.recover_exercise_name.trim())
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".local/share"));
    base.join("liftloop")
}

fn default_transition_seconds() -> f64 {
    5.0
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_recover_exercise_name() -> String {
    "recover".into()
}

fn default_audible_cue() -> bool {
    true
}

fn default_log_level() -> String {
    "info".into()
}

const TICK_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 50..=1000;

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(
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

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        base.join("liftloop").join("config.toml")
    }

    /// Reject values the playthrough loop cannot run with
    pub fn validate(&self) -> Result<()> {
        let p = &self.playthrough;
        if !TICK_INTERVAL_RANGE_MS.contains(&p.tick_interval_ms) {
            return Err(Error::Config(format!(
                "tick_interval_ms must be within {}..={}, got {}",
                TICK_INTERVAL_RANGE_MS.start(),
                TICK_INTERVAL_RANGE_MS.end(),
                p.tick_interval_ms
            )));
        }
        if p.default_transition_seconds.is_nan() || p.default_transition_seconds < 0.0 {
            return Err(Error::Config(format!(
                "default_transition_seconds must be non-negative, got {}",
                p.default_transition_seconds
            )));
        }
        if p.recover_exercise_name.trim().is_empty() {
            return Err(Error::Config("recover_exercise_name is empty".into()));
        }
        Ok(())
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

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.playthrough.default_transition_seconds, 5.0);
        assert_eq!(config.playthrough.tick_interval_ms, 100);
        assert_eq!(config.playthrough.recover_exercise_name, "recover");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.playthrough.tick_interval_ms = 250;
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.playthrough, config.playthrough);
        assert_eq!(parsed.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[playthrough]
default_transition_seconds = 7.5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.playthrough.default_transition_seconds, 7.5);
        assert_eq!(config.playthrough.tick_interval_ms, 100); // default
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_tick_interval_out_of_range() {
        let mut config = Config::default();
        config.playthrough.tick_interval_ms = 5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_recover_name_is_case_insensitive() {
        let settings = PlaythroughSettings::default();
        assert!(settings.is_recover_exercise("Recover"));
        assert!(settings.is_recover_exercise(" recover "));
        assert!(!settings.is_recover_exercise("recovery walk"));
    }
}
