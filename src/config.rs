//! Configuration for pose matching.

use crate::core::scoring::{ScoringConfig, ScoringError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Window and precision used by the scorer
    pub scoring: ScoringConfig,

    /// Live detections below this confidence are not scored
    pub min_pose_confidence: f64,

    /// Keypoints below this confidence are not shown during replay
    pub min_part_confidence: f64,

    /// Minimum time between detection ticks
    #[serde(with = "duration_millis")]
    pub tick_interval: Duration,

    /// Path for recordings
    pub export_path: PathBuf,

    /// Path for statistics
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pose-match");

        Self {
            scoring: ScoringConfig::default(),
            min_pose_confidence: 0.1,
            min_part_confidence: 0.5,
            tick_interval: Duration::from_millis(33), // ~30 fps
            export_path: data_dir.join("recordings"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pose-match")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)?;
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// Check values that would make scoring or ticking meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;

        for (name, value) in [
            ("min_pose_confidence", self.min_pose_confidence),
            ("min_part_confidence", self.min_part_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {value}")));
            }
        }

        if self.tick_interval.is_zero() {
            return Err(ConfigError::Invalid("tick_interval must be non-zero".to_string()));
        }

        Ok(())
    }

    /// Tick interval for a frame-rate cap.
    pub fn interval_for_fps(fps: u32) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(fps.max(1)))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid scoring config: {0}")]
    Scoring(#[from] ScoringError),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Serde support for Duration as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
