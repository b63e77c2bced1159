//! Detection and store configuration
//!
//! Loaded from TOML, for example:
//!
//! ```toml
//! store = "data/interim/outliers.json"
//!
//! [detection]
//! confidence_level = 95
//! left = true
//! right = true
//!
//! [detection.mode]
//! kind = "windowed"
//! buffer_samples = 27
//! ```

use crate::dixon::{ConfidenceLevel, MAX_SAMPLE_SIZE, MIN_SAMPLE_SIZE};
use crate::error::{OutlierError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default outlier store location
pub const DEFAULT_STORE_PATH: &str = "outliers.json";

/// How an element column is fed to the Q-test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionMode {
    /// The whole column is tested at once (columns of 3..=30 rows)
    #[default]
    Batch,
    /// Values are streamed through a sliding window of `buffer_samples`
    Windowed { buffer_samples: usize },
}

/// Parameters of the per-element Q-test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// One of 90, 95, 99
    pub confidence_level: u32,
    /// Test the lowest value
    pub left: bool,
    /// Test the highest value
    pub right: bool,
    pub mode: DetectionMode,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_level: 95,
            left: true,
            right: true,
            mode: DetectionMode::Batch,
        }
    }
}

impl DetectionConfig {
    /// 99% confidence: fewer flagged readings
    pub fn strict() -> Self {
        Self {
            confidence_level: 99,
            ..Self::default()
        }
    }

    /// 90% confidence: more flagged readings
    pub fn permissive() -> Self {
        Self {
            confidence_level: 90,
            ..Self::default()
        }
    }

    /// Stream columns through a window of `buffer_samples`
    pub fn windowed(mut self, buffer_samples: usize) -> Self {
        self.mode = DetectionMode::Windowed { buffer_samples };
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        ConfidenceLevel::try_from(self.confidence_level)?;

        if !self.left && !self.right {
            return Err(OutlierError::InvalidTestSelection);
        }

        if let DetectionMode::Windowed { buffer_samples } = self.mode {
            if !(MIN_SAMPLE_SIZE..=MAX_SAMPLE_SIZE).contains(&buffer_samples) {
                return Err(OutlierError::InvalidConfig(format!(
                    "buffer_samples must be in [{}, {}], got {}",
                    MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE, buffer_samples
                )));
            }
        }

        Ok(())
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outlier store document
    pub store: PathBuf,
    pub detection: DetectionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: PathBuf::from(DEFAULT_STORE_PATH),
            detection: DetectionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.detection.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectionConfig::default();
        assert_eq!(config.confidence_level, 95);
        assert!(config.left);
        assert!(config.right);
        assert_eq!(config.mode, DetectionMode::Batch);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert_eq!(DetectionConfig::strict().confidence_level, 99);
        assert_eq!(DetectionConfig::permissive().confidence_level, 90);
        assert!(DetectionConfig::strict().validate().is_ok());
        assert!(DetectionConfig::permissive().validate().is_ok());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_confidence_level() {
        let mut config = DetectionConfig::default();
        config.confidence_level = 97;
        assert!(matches!(
            config.validate(),
            Err(OutlierError::InvalidConfidenceLevel(97))
        ));
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_test_selection() {
        let mut config = DetectionConfig::default();
        config.left = false;
        config.right = false;
        assert!(matches!(
            config.validate(),
            Err(OutlierError::InvalidTestSelection)
        ));
    }

    #[test]
    fn test_invalid_window() {
        assert!(DetectionConfig::default().windowed(2).validate().is_err());
        assert!(DetectionConfig::default().windowed(31).validate().is_err());
        assert!(DetectionConfig::default().windowed(27).validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml_str(
            r#"
store = "interim/outliers.json"

[detection]
confidence_level = 99
right = false

[detection.mode]
kind = "windowed"
buffer_samples = 27
"#,
        )
        .unwrap();
        assert_eq!(config.store, PathBuf::from("interim/outliers.json"));
        assert_eq!(config.detection.confidence_level, 99);
        assert!(config.detection.left);
        assert!(!config.detection.right);
        assert_eq!(
            config.detection.mode,
            DetectionMode::Windowed { buffer_samples: 27 }
        );
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_toml_validation_applies() {
        let result = Config::from_toml_str("[detection]\nconfidence_level = 50\n");
        assert!(matches!(
            result,
            Err(OutlierError::InvalidConfidenceLevel(50))
        ));
    }
}
