//! Focus calibration.
//!
//! Before quality checks start, the camera is cycled through a fixed
//! set of focus profiles while sharpness samples are collected. The
//! largest sample (times a margin) becomes the blur threshold.

mod machine;
mod stage;
mod tracker;

pub use machine::{CalibrationStateMachine, Transition};
pub use stage::{CalibrationStage, FocusProfile, MeteringRect, CENTER_WINDOW_SIZE, CENTER_WINDOW_WEIGHT};
pub use tracker::{
    CalibrationSamples, CalibrationTracker, PolicyKind, PooledMax, SharpnessRange, StageMax,
    ThresholdPolicy,
};
