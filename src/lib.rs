//! Frame Quality Library
//!
//! Scores live camera frames of a test strip for sharpness, exposure
//! and shadow, after a short calibration sequence that learns what
//! "sharp" looks like on the current device and scene.
//!
//! # Architecture
//!
//! ```text
//! capture → evaluation ─┬─ calibration (focus stages: learn blur threshold)
//!                       └─ analysis    (quality check: blur / exposure / shadow)
//!                ↑
//!            trigger (periodic stage advance)
//! ```
//!
//! # Design Principles
//!
//! - **Explicit session state**: stage, sharpness statistics and the
//!   learned threshold live in a [`QualitySession`], never in globals
//! - **No clock in the core**: stages advance only when asked to
//! - **Best-effort hardware control**: focus changes that fail are
//!   logged and skipped
//!
//! # Example
//!
//! ```no_run
//! use frame_quality::{
//!     analysis::{BlurSource, QualityThresholds},
//!     calibration::PolicyKind,
//!     capture::{Camera, CaptureConfig, MockCamera},
//!     evaluation::{Feedback, QualityEngine},
//! };
//!
//! let mut camera = MockCamera::new();
//! camera.open(&CaptureConfig::default()).unwrap();
//!
//! let engine = QualityEngine::with_thresholds(
//!     &QualityThresholds::default(),
//!     BlurSource::Color,
//!     PolicyKind::Pooled,
//! );
//!
//! for _ in 0..5 {
//!     engine.reconfigure(&mut camera);
//!     for _ in 0..10 {
//!         let frame = camera.capture().unwrap();
//!         if let Some(verdict) = engine.process(&frame) {
//!             println!("{}", Feedback::from(&verdict));
//!         }
//!     }
//!     engine.advance();
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod calibration;
pub mod capture;
pub mod config;
pub mod evaluation;
pub mod metrics;
pub mod trigger;

// Re-export commonly used types at crate root
pub use analysis::{BlurEstimator, HistogramAnalyzer, QualityThresholds};
pub use calibration::{CalibrationStage, CalibrationStateMachine, CalibrationTracker, FocusProfile};
pub use capture::{Camera, CaptureConfig, Frame, MockCamera};
pub use config::FileConfig;
pub use evaluation::{FrameQualityEvaluator, QualityEngine, QualitySession, QualityVerdict};
pub use trigger::AdvanceTrigger;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
