//! Quality thresholds.
//!
//! Exposure limits are fixed tuning constants. The blur margin scales
//! the sharpness learned during calibration into the operating blur
//! threshold.

use serde::{Deserialize, Serialize};

/// Quality thresholds for frame checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Highest-bucket index at or above which a frame is over-exposed.
    pub over_exposure_threshold: u8,
    /// Highest-bucket index below which a frame is under-exposed.
    pub under_exposure_threshold: u8,
    /// Multiplier applied to the calibrated reference sharpness.
    pub blur_margin: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            over_exposure_threshold: 250,
            under_exposure_threshold: 100,
            blur_margin: 1.1,
        }
    }
}

impl QualityThresholds {
    /// Tighter limits: less tolerance for clipping and a larger blur margin.
    pub fn conservative() -> Self {
        Self {
            over_exposure_threshold: 240,
            under_exposure_threshold: 120,
            blur_margin: 1.25,
        }
    }

    /// Loose limits (for testing).
    pub fn permissive() -> Self {
        Self {
            over_exposure_threshold: 255,
            under_exposure_threshold: 1,
            blur_margin: 1.0,
        }
    }

    /// Checks that the exposure limits are disjoint and the margin is usable.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        if self.over_exposure_threshold <= self.under_exposure_threshold {
            return Err(ThresholdError::OverlappingExposure {
                over: self.over_exposure_threshold,
                under: self.under_exposure_threshold,
            });
        }
        if !self.blur_margin.is_finite() || self.blur_margin < 1.0 {
            return Err(ThresholdError::InvalidMargin(self.blur_margin));
        }
        Ok(())
    }
}

/// Invalid threshold configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    /// Exposure limits leave no acceptable range.
    #[error("over-exposure threshold {over} must exceed under-exposure threshold {under}")]
    OverlappingExposure {
        /// Over-exposure limit.
        over: u8,
        /// Under-exposure limit.
        under: u8,
    },

    /// Blur margin is not a finite value of at least 1.0.
    #[error("blur margin {0} must be finite and at least 1.0")]
    InvalidMargin(f64),
}

/// A single failed quality facet.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QualityIssue {
    /// Sharpness below the frozen threshold.
    #[error("sharpness {score:.2} below threshold {threshold:.2}")]
    Blurry {
        /// Frame sharpness.
        score: f64,
        /// Frozen blur threshold.
        threshold: f64,
    },

    /// Brightest bucket at or above the over-exposure limit.
    #[error("brightest bucket {max_white} at or above {threshold}")]
    OverExposed {
        /// Brightest populated bucket.
        max_white: u8,
        /// Over-exposure limit.
        threshold: u8,
    },

    /// Brightest bucket below the under-exposure limit.
    #[error("brightest bucket {max_white} below {threshold}")]
    UnderExposed {
        /// Brightest populated bucket.
        max_white: u8,
        /// Under-exposure limit.
        threshold: u8,
    },

    /// A shadow was detected.
    #[error("shadow detected")]
    Shadowed,
}
