//! Configuration file support for Medtrack.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/medtrack/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub reminders: ReminderConfig,
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

/// Adherence analytics window configuration
///
/// The streak scan is hard-capped at `streak_lookback_days`: streaks longer
/// than the window read as the window length.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_streak_lookback_days")]
    pub streak_lookback_days: u32,

    #[serde(default = "default_trend_window_days")]
    pub trend_window_days: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            streak_lookback_days: default_streak_lookback_days(),
            trend_window_days: default_trend_window_days(),
        }
    }
}

/// Reminder classification tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// A dose counts as "upcoming" within this many minutes of its
    /// scheduled time.
    #[serde(default = "default_upcoming_window_minutes")]
    pub upcoming_window_minutes: u32,

    #[serde(default = "default_snooze_minutes")]
    pub default_snooze_minutes: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            upcoming_window_minutes: default_upcoming_window_minutes(),
            default_snooze_minutes: default_snooze_minutes(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("medtrack")
}

fn default_streak_lookback_days() -> u32 {
    60
}

fn default_trend_window_days() -> u32 {
    30
}

fn default_upcoming_window_minutes() -> u32 {
    30
}

fn default_snooze_minutes() -> u32 {
    15
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
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("medtrack").join("config.toml")
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

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analytics.streak_lookback_days, 60);
        assert_eq!(config.analytics.trend_window_days, 30);
        assert_eq!(config.reminders.upcoming_window_minutes, 30);
        assert_eq!(config.reminders.default_snooze_minutes, 15);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            config.analytics.streak_lookback_days,
            parsed.analytics.streak_lookback_days
        );
        assert_eq!(config.data.data_dir, parsed.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[analytics]
streak_lookback_days = 90
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.analytics.streak_lookback_days, 90);
        assert_eq!(config.analytics.trend_window_days, 30); // default
    }
}
