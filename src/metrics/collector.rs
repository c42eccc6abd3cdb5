//! Metrics collection and registry.

use crate::evaluation::SessionSnapshot;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of session state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Index of the current calibration stage (0 = initialization).
    pub stage_index: usize,
    /// Frozen blur threshold, once quality checking started.
    pub blur_threshold: Option<f64>,
    /// Lowest calibration sharpness seen.
    pub running_min: Option<f64>,
    /// Highest calibration sharpness seen.
    pub running_max: Option<f64>,
    /// Sharpness of the most recent frame.
    pub last_sharpness: Option<f64>,
    /// Brightest histogram bucket of the most recent checked frame.
    pub last_max_white: Option<u8>,
    /// Frames handed to the evaluator.
    pub frames_evaluated: u64,
    /// Frames that fed calibration.
    pub calibration_samples: u64,
    /// Verdicts produced.
    pub verdicts: u64,
    /// Verdicts flagged blurry.
    pub blurry_frames: u64,
    /// Verdicts flagged over-exposed.
    pub over_exposed_frames: u64,
    /// Verdicts flagged under-exposed.
    pub under_exposed_frames: u64,
    /// Verdicts flagged shadowed.
    pub shadowed_frames: u64,
    /// Focus profiles applied.
    pub reconfigurations: u64,
    /// Focus profiles rejected by the camera.
    pub reconfiguration_failures: u64,
}

/// Prometheus metrics registry for frame quality monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Calibration metrics
    stage: IntGauge,
    blur_threshold: Gauge,
    sharpness_min: Gauge,
    sharpness_max: Gauge,

    // Per-frame metrics
    last_sharpness: Gauge,
    last_max_white: IntGauge,

    // Counters
    frames_total: IntCounter,
    calibration_samples_total: IntCounter,
    verdicts_total: IntCounter,
    blurry_total: IntCounter,
    over_exposed_total: IntCounter,
    under_exposed_total: IntCounter,
    shadowed_total: IntCounter,
    reconfigurations_total: IntCounter,
    reconfiguration_failures_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all quality metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let stage = IntGauge::new(
            "frame_quality_calibration_stage",
            "Current calibration stage (0=initialization .. 4=quality check)",
        )?;
        let blur_threshold = Gauge::new(
            "frame_quality_blur_threshold",
            "Frozen blur threshold (0 until quality checking starts)",
        )?;
        let sharpness_min = Gauge::new(
            "frame_quality_calibration_sharpness_min",
            "Lowest sharpness observed during calibration",
        )?;
        let sharpness_max = Gauge::new(
            "frame_quality_calibration_sharpness_max",
            "Highest sharpness observed during calibration",
        )?;
        let last_sharpness = Gauge::new(
            "frame_quality_last_sharpness",
            "Sharpness score of the most recent frame",
        )?;
        let last_max_white = IntGauge::new(
            "frame_quality_last_max_white",
            "Brightest populated histogram bucket of the most recent checked frame",
        )?;

        let frames_total = IntCounter::new(
            "frame_quality_frames_total",
            "Total frames handed to the evaluator",
        )?;
        let calibration_samples_total = IntCounter::new(
            "frame_quality_calibration_samples_total",
            "Total frames used as calibration samples",
        )?;
        let verdicts_total = IntCounter::new(
            "frame_quality_verdicts_total",
            "Total quality verdicts produced",
        )?;
        let blurry_total = IntCounter::new(
            "frame_quality_blurry_frames_total",
            "Total frames judged blurry",
        )?;
        let over_exposed_total = IntCounter::new(
            "frame_quality_over_exposed_frames_total",
            "Total frames judged over-exposed",
        )?;
        let under_exposed_total = IntCounter::new(
            "frame_quality_under_exposed_frames_total",
            "Total frames judged under-exposed",
        )?;
        let shadowed_total = IntCounter::new(
            "frame_quality_shadowed_frames_total",
            "Total frames judged shadowed",
        )?;
        let reconfigurations_total = IntCounter::new(
            "frame_quality_reconfigurations_total",
            "Total focus profiles applied to the camera",
        )?;
        let reconfiguration_failures_total = IntCounter::new(
            "frame_quality_reconfiguration_failures_total",
            "Total focus profile applications that failed",
        )?;

        registry.register(Box::new(stage.clone()))?;
        registry.register(Box::new(blur_threshold.clone()))?;
        registry.register(Box::new(sharpness_min.clone()))?;
        registry.register(Box::new(sharpness_max.clone()))?;
        registry.register(Box::new(last_sharpness.clone()))?;
        registry.register(Box::new(last_max_white.clone()))?;
        registry.register(Box::new(frames_total.clone()))?;
        registry.register(Box::new(calibration_samples_total.clone()))?;
        registry.register(Box::new(verdicts_total.clone()))?;
        registry.register(Box::new(blurry_total.clone()))?;
        registry.register(Box::new(over_exposed_total.clone()))?;
        registry.register(Box::new(under_exposed_total.clone()))?;
        registry.register(Box::new(shadowed_total.clone()))?;
        registry.register(Box::new(reconfigurations_total.clone()))?;
        registry.register(Box::new(reconfiguration_failures_total.clone()))?;

        Ok(Self {
            registry,
            stage,
            blur_threshold,
            sharpness_min,
            sharpness_max,
            last_sharpness,
            last_max_white,
            frames_total,
            calibration_samples_total,
            verdicts_total,
            blurry_total,
            over_exposed_total,
            under_exposed_total,
            shadowed_total,
            reconfigurations_total,
            reconfiguration_failures_total,
        })
    }

    /// Updates all metrics from a snapshot of session state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.stage.set(snapshot.stage_index as i64);

        // Gauges only move once there is a value to report
        if let Some(threshold) = snapshot.blur_threshold {
            self.blur_threshold.set(threshold);
        }
        if let Some(min) = snapshot.running_min {
            self.sharpness_min.set(min);
        }
        if let Some(max) = snapshot.running_max {
            self.sharpness_max.set(max);
        }
        if let Some(score) = snapshot.last_sharpness {
            self.last_sharpness.set(score);
        }
        if let Some(max_white) = snapshot.last_max_white {
            self.last_max_white.set(i64::from(max_white));
        }

        // For counters, we need to increment by the difference
        advance_counter(&self.frames_total, snapshot.frames_evaluated);
        advance_counter(&self.calibration_samples_total, snapshot.calibration_samples);
        advance_counter(&self.verdicts_total, snapshot.verdicts);
        advance_counter(&self.blurry_total, snapshot.blurry_frames);
        advance_counter(&self.over_exposed_total, snapshot.over_exposed_frames);
        advance_counter(&self.under_exposed_total, snapshot.under_exposed_frames);
        advance_counter(&self.shadowed_total, snapshot.shadowed_frames);
        advance_counter(&self.reconfigurations_total, snapshot.reconfigurations);
        advance_counter(
            &self.reconfiguration_failures_total,
            snapshot.reconfiguration_failures,
        );
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance_counter(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

impl From<&SessionSnapshot> for MetricsSnapshot {
    fn from(session: &SessionSnapshot) -> Self {
        let stats = &session.stats;
        Self {
            stage_index: session.stage.index(),
            blur_threshold: session.blur_threshold,
            running_min: session.running_min,
            running_max: session.running_max,
            last_sharpness: stats.last_sharpness,
            last_max_white: stats.last_max_white,
            frames_evaluated: stats.frames_evaluated,
            calibration_samples: stats.calibration_samples,
            verdicts: stats.verdicts,
            blurry_frames: stats.blurry_frames,
            over_exposed_frames: stats.over_exposed_frames,
            under_exposed_frames: stats.under_exposed_frames,
            shadowed_frames: stats.shadowed_frames,
            reconfigurations: stats.reconfigurations_applied,
            reconfiguration_failures: stats.reconfiguration_failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationStage;
    use crate::evaluation::SessionStats;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            stage_index: 4,
            blur_threshold: Some(120.5),
            frames_evaluated: 10,
            verdicts: 3,
            blurry_frames: 2,
            reconfigurations: 5,
            last_max_white: Some(230),
            ..Default::default()
        };

        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("frame_quality_calibration_stage 4"));
        assert!(output.contains("frame_quality_blur_threshold 120.5"));
        assert!(output.contains("frame_quality_frames_total 10"));
        assert!(output.contains("frame_quality_blurry_frames_total 2"));
        assert!(output.contains("frame_quality_last_max_white 230"));
    }

    #[test]
    fn test_counters_never_decrease() {
        let registry = MetricsRegistry::new().unwrap();

        registry.update(&MetricsSnapshot {
            frames_evaluated: 10,
            ..Default::default()
        });
        registry.update(&MetricsSnapshot {
            frames_evaluated: 4,
            ..Default::default()
        });

        let output = registry.encode().unwrap();
        assert!(output.contains("frame_quality_frames_total 10"));
    }

    #[test]
    fn test_from_session_snapshot() {
        let session = SessionSnapshot {
            stage: CalibrationStage::FocusMacro,
            blur_threshold: None,
            running_min: Some(1.0),
            running_max: Some(9.0),
            stats: SessionStats {
                calibration_samples: 7,
                ..Default::default()
            },
        };

        let snapshot = MetricsSnapshot::from(&session);
        assert_eq!(snapshot.stage_index, 2);
        assert_eq!(snapshot.running_max, Some(9.0));
        assert_eq!(snapshot.calibration_samples, 7);
    }
}
