//! Configuration file format.
//!
//! ```toml
//! [capture]
//! width = 640
//! height = 480
//!
//! [quality]
//! over_exposure_threshold = 250
//! under_exposure_threshold = 100
//! blur_margin = 1.1
//! blur_source = "color"
//!
//! [calibration]
//! advance_interval_ms = 5000
//! policy = "pooled"
//! ```
//!
//! `policy` may also name one sampling stage, either bare
//! (`policy = "focus_macro"`) or as a table
//! (`policy = { stage = "focus_macro" }`).

use crate::analysis::{BlurSource, QualityThresholds, ThresholdError};
use crate::calibration::{CalibrationStage, PolicyKind};
use crate::capture::CaptureConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Frame rate outside 1-120.
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    /// Minimum focus distance is not a positive finite number.
    #[error("invalid minimum focus distance {0}")]
    InvalidFocusDistance(f32),
    /// Calibration stage interval is zero.
    #[error("advance interval must be non-zero")]
    InvalidAdvanceInterval,
    /// Threshold policy names a stage that never records samples.
    #[error("threshold policy stage {0} records no calibration samples")]
    NonSamplingPolicyStage(CalibrationStage),
    /// Quality thresholds are inconsistent.
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Camera settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Quality check settings.
    #[serde(default)]
    pub quality: QualityConfig,
    /// Calibration sequencing.
    #[serde(default)]
    pub calibration: CalibrationConfig,
    /// Run length and reporting.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Quality check configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QualityConfig {
    /// Exposure limits and blur margin.
    #[serde(flatten)]
    pub thresholds: QualityThresholds,
    /// Frame projection used for sharpness scoring.
    #[serde(default)]
    pub blur_source: BlurSource,
}

/// Calibration sequencing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Time spent in each calibration stage.
    pub advance_interval_ms: u64,
    /// How calibration samples become the blur threshold.
    pub policy: PolicyKind,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            advance_interval_ms: 5000,
            policy: PolicyKind::Pooled,
        }
    }
}

impl CalibrationConfig {
    /// Time spent in each calibration stage.
    pub fn advance_interval(&self) -> Duration {
        Duration::from_millis(self.advance_interval_ms)
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Run until interrupted (true) or process a fixed number of frames (false).
    pub continuous: bool,
    /// Number of frames to process if not continuous.
    pub frame_count: u32,
    /// Print Prometheus metrics text after the run.
    pub print_metrics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            frame_count: 900,
            print_metrics: false,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.quality.thresholds.validate()?;
        if self.calibration.advance_interval_ms == 0 {
            return Err(ConfigError::InvalidAdvanceInterval);
        }
        if let Some(stage) = self.calibration.policy.stage() {
            if !stage.is_sampling() {
                return Err(ConfigError::NonSamplingPolicyStage(stage));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = FileConfig::from_toml("").unwrap();
        assert_eq!(config.capture.width, 640);
        assert_eq!(config.quality.thresholds, QualityThresholds::default());
        assert_eq!(config.quality.blur_source, BlurSource::Color);
        assert_eq!(config.calibration.advance_interval(), Duration::from_secs(5));
        assert_eq!(config.calibration.policy, PolicyKind::Pooled);
    }

    #[test]
    fn test_full_file() {
        let config = FileConfig::from_toml(
            r#"
            [capture]
            device_id = 2
            width = 320
            height = 240
            fps = 15

            [quality]
            over_exposure_threshold = 245
            under_exposure_threshold = 60
            blur_margin = 1.0
            blur_source = "gray"

            [calibration]
            advance_interval_ms = 250
            policy = { stage = "focus_auto_center" }

            [output]
            frame_count = 20
            print_metrics = true
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.device_id, 2);
        assert_eq!(config.capture.width, 320);
        assert_eq!(config.capture.fps, 15);
        assert_eq!(config.quality.thresholds.over_exposure_threshold, 245);
        assert_eq!(config.quality.thresholds.under_exposure_threshold, 60);
        assert_eq!(config.quality.blur_source, BlurSource::Gray);
        assert_eq!(
            config.calibration.policy,
            PolicyKind::Stage(CalibrationStage::FocusAutoCenter)
        );
        assert_eq!(config.output.frame_count, 20);
        assert!(config.output.print_metrics);
    }

    #[test]
    fn test_overlapping_exposure_rejected() {
        let result = FileConfig::from_toml(
            r#"
            [quality]
            over_exposure_threshold = 40
            under_exposure_threshold = 90
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Threshold(_))));
    }

    #[test]
    fn test_parse_error() {
        let result = FileConfig::from_toml("[capture]\nwidth = \"wide\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_non_sampling_policy_stage_rejected() {
        for stage in ["initialization", "quality_check"] {
            let bare = FileConfig::from_toml(&format!("[calibration]\npolicy = \"{stage}\""));
            assert!(
                matches!(bare, Err(ConfigError::NonSamplingPolicyStage(_))),
                "{stage}: {bare:?}"
            );

            let table =
                FileConfig::from_toml(&format!("[calibration]\npolicy = {{ stage = \"{stage}\" }}"));
            assert!(matches!(table, Err(ConfigError::NonSamplingPolicyStage(_))));
        }

        let mut config = FileConfig::default();
        config.calibration.policy = PolicyKind::Stage(CalibrationStage::QualityCheck);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonSamplingPolicyStage(CalibrationStage::QualityCheck))
        ));
    }

    #[test]
    fn test_bare_stage_policy() {
        let config = FileConfig::from_toml("[calibration]\npolicy = \"focus_macro\"").unwrap();
        assert_eq!(
            config.calibration.policy,
            PolicyKind::Stage(CalibrationStage::FocusMacro)
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = FileConfig::from_toml("[calibration]\nadvance_interval_ms = 0");
        assert!(matches!(result, Err(ConfigError::InvalidAdvanceInterval)));
    }
}
