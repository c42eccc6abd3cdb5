//! Per-frame image measurements.
//!
//! Sharpness, exposure and shadow analyzers share the
//! [`FrameAnalyzer`] interface. None of them keep state between
//! frames; learning happens in [`crate::calibration`].

mod analyzer;
mod blur;
mod histogram;
mod shadow;
mod threshold;

pub use analyzer::FrameAnalyzer;
pub use blur::{sharpness, BlurEstimator, BlurSource};
pub use histogram::{Exposure, Histogram, HistogramAnalyzer, BUCKETS};
pub use shadow::{NoShadow, ShadowAnalyzer};
pub use threshold::{QualityIssue, QualityThresholds, ThresholdError};
