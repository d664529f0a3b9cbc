use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::POSE_MODEL_NAME;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for a measurement service instance.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// Minimum person-detection score.
    pub min_detection_confidence: f64,
    /// Minimum score for each required keypoint.
    pub min_keypoint_confidence: f64,
    /// File name looked up in the cache and bundled model directories.
    pub model_name: String,
    /// Explicit pose model file; skips cache lookup when set.
    pub model_path: Option<PathBuf>,
    /// Where to download the pose model from when it is not cached.
    pub model_url: Option<String>,
    pub detection_timeout_ms: u64,
    /// Fail with `PoseNotDetected` instead of falling back to proportions.
    pub strict_landmarks: bool,
    pub jpeg_quality: u8,
    /// Skip model detection entirely and always use the proportion estimate.
    pub force_proportions: bool,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            min_keypoint_confidence: 0.5,
            model_name: POSE_MODEL_NAME.to_string(),
            model_path: None,
            model_url: None,
            detection_timeout_ms: 5000,
            strict_landmarks: true,
            jpeg_quality: 90,
            force_proportions: false,
        }
    }
}

impl MeasureConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            return Err(ConfigError::Invalid(format!(
                "min_detection_confidence must be between 0.0 and 1.0, got {}",
                self.min_detection_confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.min_keypoint_confidence) {
            return Err(ConfigError::Invalid(format!(
                "min_keypoint_confidence must be between 0.0 and 1.0, got {}",
                self.min_keypoint_confidence
            )));
        }
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::Invalid("model_name must not be empty".into()));
        }
        if self.detection_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "detection_timeout_ms must be positive".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}
