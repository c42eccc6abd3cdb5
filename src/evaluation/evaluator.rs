//! Per-frame entry point.

use super::session::QualitySession;
use super::verdict::{Measurements, QualityVerdict};
use crate::analysis::{
    BlurEstimator, BlurSource, FrameAnalyzer, HistogramAnalyzer, NoShadow, QualityIssue,
    QualityThresholds, ShadowAnalyzer,
};
use crate::calibration::CalibrationStage;
use crate::capture::Frame;

/// Routes each frame to calibration or quality checking depending on
/// the session's stage.
pub struct FrameQualityEvaluator {
    blur: BlurEstimator,
    histogram: HistogramAnalyzer,
    shadow: Box<ShadowAnalyzer>,
}

impl FrameQualityEvaluator {
    /// Builds an evaluator with the stock analyzers and no shadow detection.
    pub fn new(thresholds: &QualityThresholds, source: BlurSource) -> Self {
        Self {
            blur: BlurEstimator::new(source),
            histogram: HistogramAnalyzer::new(
                thresholds.over_exposure_threshold,
                thresholds.under_exposure_threshold,
            ),
            shadow: Box::new(NoShadow),
        }
    }

    /// Replaces the shadow detector.
    pub fn with_shadow_analyzer(mut self, shadow: Box<ShadowAnalyzer>) -> Self {
        self.shadow = shadow;
        self
    }

    /// Evaluates one frame against the session.
    ///
    /// - `Initialization`: ignored.
    /// - focus stages: the sharpness score feeds the calibration tracker.
    /// - `QualityCheck`: returns a verdict.
    pub fn evaluate(&self, frame: &Frame, session: &mut QualitySession) -> Option<QualityVerdict> {
        let stage = session.current_stage();
        session.stats_mut().frames_evaluated += 1;

        match stage {
            CalibrationStage::Initialization => None,
            CalibrationStage::FocusInfinity
            | CalibrationStage::FocusMacro
            | CalibrationStage::FocusAutoCenter => {
                let score = self.blur.analyze(frame);
                session.tracker_mut().observe(stage, score);

                let stats = session.stats_mut();
                stats.calibration_samples += 1;
                stats.last_sharpness = Some(score);

                tracing::debug!(%stage, sequence = frame.sequence(), score, "Calibration frame");
                None
            }
            CalibrationStage::QualityCheck => {
                let verdict = self.check(frame, session.blur_threshold());
                record(session, &verdict);
                Some(verdict)
            }
        }
    }

    fn check(&self, frame: &Frame, blur_threshold: Option<f64>) -> QualityVerdict {
        let score = self.blur.analyze(frame);
        let exposure = self.histogram.analyze(frame);
        let is_shadowed = self.shadow.analyze(frame);

        let verdict = QualityVerdict {
            is_blurry: BlurEstimator::is_blurry(score, blur_threshold),
            is_over_exposed: exposure.is_over_exposed,
            is_under_exposed: exposure.is_under_exposed,
            is_shadowed,
            measurements: Measurements {
                sharpness: score,
                blur_threshold,
                max_white: exposure.max_white,
            },
        };

        tracing::debug!(
            sequence = frame.sequence(),
            latency_us = frame.timestamp().elapsed().as_micros() as u64,
            score,
            threshold = blur_threshold,
            max_white = exposure.max_white,
            acceptable = verdict.is_acceptable(),
            "Quality check"
        );
        verdict
    }

    /// Lists the failed facets of a verdict.
    pub fn issues(&self, verdict: &QualityVerdict) -> Vec<QualityIssue> {
        let m = &verdict.measurements;
        let mut issues = Vec::new();

        if verdict.is_blurry {
            if let Some(threshold) = m.blur_threshold {
                issues.push(QualityIssue::Blurry {
                    score: m.sharpness,
                    threshold,
                });
            }
        }
        if verdict.is_over_exposed {
            issues.push(QualityIssue::OverExposed {
                max_white: m.max_white,
                threshold: self.histogram.over_exposure_threshold(),
            });
        }
        if verdict.is_under_exposed {
            issues.push(QualityIssue::UnderExposed {
                max_white: m.max_white,
                threshold: self.histogram.under_exposure_threshold(),
            });
        }
        if verdict.is_shadowed {
            issues.push(QualityIssue::Shadowed);
        }
        issues
    }
}

fn record(session: &mut QualitySession, verdict: &QualityVerdict) {
    let stats = session.stats_mut();
    stats.verdicts += 1;
    stats.blurry_frames += u64::from(verdict.is_blurry);
    stats.over_exposed_frames += u64::from(verdict.is_over_exposed);
    stats.under_exposed_frames += u64::from(verdict.is_under_exposed);
    stats.shadowed_frames += u64::from(verdict.is_shadowed);
    stats.last_sharpness = Some(verdict.measurements.sharpness);
    stats.last_max_white = Some(verdict.measurements.max_white);
}

impl std::fmt::Debug for FrameQualityEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameQualityEvaluator")
            .field("blur", &self.blur)
            .field("histogram", &self.histogram)
            .field("shadow", &self.shadow.name())
            .finish()
    }
}
