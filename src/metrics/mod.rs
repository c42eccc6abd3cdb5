//! Prometheus metrics for frame quality monitoring.
//!
//! Metrics live in an in-process registry and are rendered in the
//! Prometheus text format on demand; nothing is served over the network.
//!
//! # Metrics Exposed
//!
//! ## Calibration
//! - `frame_quality_calibration_stage` - Current stage index
//! - `frame_quality_blur_threshold` - Frozen blur threshold
//! - `frame_quality_calibration_sharpness_min` / `_max` - Calibration sharpness range
//!
//! ## Per-frame
//! - `frame_quality_last_sharpness` - Sharpness of the latest frame
//! - `frame_quality_last_max_white` - Brightest bucket of the latest checked frame
//!
//! ## Counters
//! - `frame_quality_frames_total`, `frame_quality_calibration_samples_total`,
//!   `frame_quality_verdicts_total`
//! - `frame_quality_{blurry,over_exposed,under_exposed,shadowed}_frames_total`
//! - `frame_quality_reconfigurations_total`, `frame_quality_reconfiguration_failures_total`
//!
//! # Example
//!
//! ```no_run
//! use frame_quality::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     stage_index: 4,
//!     blur_threshold: Some(850.0),
//!     frames_evaluated: 300,
//!     verdicts: 120,
//!     ..Default::default()
//! };
//!
//! registry.update(&snapshot);
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
