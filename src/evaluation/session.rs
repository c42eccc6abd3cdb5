//! Mutable state of one calibration-and-check run.

use crate::calibration::{
    CalibrationStage, CalibrationStateMachine, CalibrationTracker, PolicyKind, Transition,
};
use serde::Serialize;

/// Counters kept over a session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    /// Frames handed to the evaluator, in any stage.
    pub frames_evaluated: u64,
    /// Frames that fed the calibration tracker.
    pub calibration_samples: u64,
    /// Verdicts produced during quality checking.
    pub verdicts: u64,
    /// Verdicts flagged blurry.
    pub blurry_frames: u64,
    /// Verdicts flagged over-exposed.
    pub over_exposed_frames: u64,
    /// Verdicts flagged under-exposed.
    pub under_exposed_frames: u64,
    /// Verdicts flagged shadowed.
    pub shadowed_frames: u64,
    /// Focus profiles the camera accepted.
    pub reconfigurations_applied: u64,
    /// Focus profiles the camera rejected.
    pub reconfiguration_failures: u64,
    /// Sharpness of the most recent frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sharpness: Option<f64>,
    /// Brightest bucket of the most recent checked frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_max_white: Option<u8>,
}

/// Everything a run learns and tracks: current stage, sharpness
/// statistics, the frozen blur threshold and counters.
///
/// Starting a new session is the only way to reset calibration.
#[derive(Debug)]
pub struct QualitySession {
    machine: CalibrationStateMachine,
    tracker: CalibrationTracker,
    blur_threshold: Option<f64>,
    stats: SessionStats,
}

impl QualitySession {
    /// Starts a session whose tracker uses `policy` and `margin`.
    pub fn new(margin: f64, policy: PolicyKind) -> Self {
        Self::with_tracker(CalibrationTracker::with_policy(margin, policy.build()))
    }

    /// Starts a session around an existing tracker.
    pub fn with_tracker(tracker: CalibrationTracker) -> Self {
        Self {
            machine: CalibrationStateMachine::new(),
            tracker,
            blur_threshold: None,
            stats: SessionStats::default(),
        }
    }

    /// Advances the calibration sequence.
    ///
    /// Entering `QualityCheck` freezes the blur threshold for the rest
    /// of the session.
    pub fn advance(&mut self) -> Transition {
        let transition = self.machine.advance();

        if !transition.is_self_loop() && transition.to == CalibrationStage::QualityCheck {
            self.blur_threshold = self.tracker.current_threshold();
            match self.blur_threshold {
                Some(threshold) => tracing::info!(
                    threshold,
                    samples = self.tracker.sample_count(),
                    min = self.tracker.running_min(),
                    max = self.tracker.running_max(),
                    "Blur threshold frozen"
                ),
                None => tracing::warn!("No calibration samples observed; blur check disabled"),
            }
        }

        transition
    }

    /// Current calibration stage.
    #[inline]
    pub fn current_stage(&self) -> CalibrationStage {
        self.machine.current_stage()
    }

    /// True while a focus profile is waiting to be applied.
    #[inline]
    pub fn needs_reconfiguration(&self) -> bool {
        self.machine.needs_reconfiguration()
    }

    /// Frozen blur threshold; `None` before `QualityCheck` or when
    /// calibration saw no samples.
    #[inline]
    pub fn blur_threshold(&self) -> Option<f64> {
        self.blur_threshold
    }

    /// Stage sequencer.
    pub fn machine(&self) -> &CalibrationStateMachine {
        &self.machine
    }

    /// Mutable stage sequencer.
    pub fn machine_mut(&mut self) -> &mut CalibrationStateMachine {
        &mut self.machine
    }

    /// Calibration sample tracker.
    pub fn tracker(&self) -> &CalibrationTracker {
        &self.tracker
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut CalibrationTracker {
        &mut self.tracker
    }

    /// Session counters.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut SessionStats {
        &mut self.stats
    }
}
