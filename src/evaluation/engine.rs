//! Thread-safe front end shared by the frame loop and the advance trigger.

use super::evaluator::FrameQualityEvaluator;
use super::session::{QualitySession, SessionStats};
use super::verdict::QualityVerdict;
use crate::analysis::{BlurSource, QualityThresholds};
use crate::calibration::{CalibrationStage, FocusProfile, PolicyKind, Transition};
use crate::capture::{Camera, Frame};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Point-in-time copy of a session's observable state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current calibration stage.
    pub stage: CalibrationStage,
    /// Frozen blur threshold, once quality checking started.
    pub blur_threshold: Option<f64>,
    /// Lowest calibration sharpness seen.
    pub running_min: Option<f64>,
    /// Highest calibration sharpness seen.
    pub running_max: Option<f64>,
    /// Session counters.
    pub stats: SessionStats,
}

/// Serializes frame evaluation, stage advances and camera
/// reconfiguration behind a single lock.
///
/// Cloning is cheap and yields a handle to the same session.
#[derive(Debug, Clone)]
pub struct QualityEngine {
    session: Arc<Mutex<QualitySession>>,
    evaluator: Arc<FrameQualityEvaluator>,
}

impl QualityEngine {
    /// Wraps an evaluator and a fresh or prepared session.
    pub fn new(evaluator: FrameQualityEvaluator, session: QualitySession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            evaluator: Arc::new(evaluator),
        }
    }

    /// Builds an engine with the stock analyzers.
    pub fn with_thresholds(
        thresholds: &QualityThresholds,
        source: BlurSource,
        policy: PolicyKind,
    ) -> Self {
        Self::new(
            FrameQualityEvaluator::new(thresholds, source),
            QualitySession::new(thresholds.blur_margin, policy),
        )
    }

    fn lock(&self) -> MutexGuard<'_, QualitySession> {
        // Session state stays consistent even if a holder panicked.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluates one frame. See [`FrameQualityEvaluator::evaluate`].
    pub fn process(&self, frame: &Frame) -> Option<QualityVerdict> {
        let mut session = self.lock();
        self.evaluator.evaluate(frame, &mut session)
    }

    /// Advances the calibration sequence. See [`QualitySession::advance`].
    pub fn advance(&self) -> Transition {
        self.lock().advance()
    }

    /// Current calibration stage.
    pub fn current_stage(&self) -> CalibrationStage {
        self.lock().current_stage()
    }

    /// True while a focus profile is waiting to be applied.
    pub fn needs_reconfiguration(&self) -> bool {
        self.lock().needs_reconfiguration()
    }

    /// Frozen blur threshold.
    pub fn blur_threshold(&self) -> Option<f64> {
        self.lock().blur_threshold()
    }

    /// Applies a pending focus profile to the camera.
    ///
    /// Returns the profile if one was pending. Camera errors are logged
    /// and dropped; the pending flag is cleared either way.
    pub fn reconfigure(&self, camera: &mut dyn Camera) -> Option<FocusProfile> {
        let mut session = self.lock();
        let profile = session.machine_mut().take_reconfiguration()?;
        let stage = session.current_stage();

        match camera.apply_focus(&profile) {
            Ok(()) => {
                session.stats_mut().reconfigurations_applied += 1;
                tracing::debug!(%stage, ?profile, "Camera reconfigured");
            }
            Err(e) => {
                session.stats_mut().reconfiguration_failures += 1;
                tracing::debug!(%stage, ?profile, error = %e, "Camera reconfiguration failed");
            }
        }
        Some(profile)
    }

    /// Shared evaluator.
    pub fn evaluator(&self) -> &FrameQualityEvaluator {
        &self.evaluator
    }

    /// Copies the observable session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.lock();
        SessionSnapshot {
            stage: session.current_stage(),
            blur_threshold: session.blur_threshold(),
            running_min: session.tracker().running_min(),
            running_max: session.tracker().running_max(),
            stats: session.stats().clone(),
        }
    }
}
