//! Sharpness statistics gathered during calibration.
//!
//! The tracker keeps a running min/max of every sample plus the same
//! pair per stage. Which of those becomes the blur threshold is up to
//! a [`ThresholdPolicy`].

use super::stage::CalibrationStage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running minimum and maximum of a stream of sharpness samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharpnessRange {
    /// Lowest score.
    pub min: f64,
    /// Highest score.
    pub max: f64,
    /// Number of scores.
    pub count: u64,
}

impl SharpnessRange {
    fn new(score: f64) -> Self {
        Self {
            min: score,
            max: score,
            count: 1,
        }
    }

    fn update(&mut self, score: f64) {
        self.min = self.min.min(score);
        self.max = self.max.max(score);
        self.count += 1;
    }
}

/// Read-only view of the samples collected so far.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSamples {
    pooled: Option<SharpnessRange>,
    per_stage: BTreeMap<CalibrationStage, SharpnessRange>,
}

impl CalibrationSamples {
    /// Range over every stage.
    pub fn pooled(&self) -> Option<SharpnessRange> {
        self.pooled
    }

    /// Range over a single stage.
    pub fn stage(&self, stage: CalibrationStage) -> Option<SharpnessRange> {
        self.per_stage.get(&stage).copied()
    }

    fn record(&mut self, stage: CalibrationStage, score: f64) {
        match self.pooled.as_mut() {
            Some(range) => range.update(score),
            None => self.pooled = Some(SharpnessRange::new(score)),
        }
        self.per_stage
            .entry(stage)
            .and_modify(|range| range.update(score))
            .or_insert_with(|| SharpnessRange::new(score));
    }
}

/// Reduces calibration samples to the reference sharpness the blur
/// threshold is derived from.
pub trait ThresholdPolicy: Send + Sync + std::fmt::Debug {
    /// Returns the reference sharpness, or `None` if the policy has no data yet.
    fn reference(&self, samples: &CalibrationSamples) -> Option<f64>;
}

/// Maximum over every calibration stage.
///
/// Fixed-focus and auto-focus samples are mixed into one maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct PooledMax;

impl ThresholdPolicy for PooledMax {
    fn reference(&self, samples: &CalibrationSamples) -> Option<f64> {
        samples.pooled().map(|range| range.max)
    }
}

/// Maximum over a single calibration stage.
#[derive(Debug, Clone, Copy)]
pub struct StageMax(pub CalibrationStage);

impl ThresholdPolicy for StageMax {
    fn reference(&self, samples: &CalibrationSamples) -> Option<f64> {
        samples.stage(self.0).map(|range| range.max)
    }
}

/// Serializable choice of [`ThresholdPolicy`].
///
/// Deserializes from `"pooled"`, a bare stage name such as
/// `"focus_macro"`, or a `{ stage = "focus_macro" }` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "PolicyRepr")]
pub enum PolicyKind {
    /// [`PooledMax`].
    #[default]
    Pooled,
    /// [`StageMax`] over the named stage.
    Stage(CalibrationStage),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum PooledName {
    Pooled,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PolicyRepr {
    Pooled(PooledName),
    StageName(CalibrationStage),
    StageTable { stage: CalibrationStage },
}

impl From<PolicyRepr> for PolicyKind {
    fn from(repr: PolicyRepr) -> Self {
        match repr {
            PolicyRepr::Pooled(PooledName::Pooled) => PolicyKind::Pooled,
            PolicyRepr::StageName(stage) | PolicyRepr::StageTable { stage } => {
                PolicyKind::Stage(stage)
            }
        }
    }
}

impl PolicyKind {
    /// Stage whose samples this policy reads, if it is limited to one.
    pub fn stage(self) -> Option<CalibrationStage> {
        match self {
            PolicyKind::Pooled => None,
            PolicyKind::Stage(stage) => Some(stage),
        }
    }

    /// Builds the policy this value names.
    pub fn build(self) -> Box<dyn ThresholdPolicy> {
        match self {
            PolicyKind::Pooled => Box::new(PooledMax),
            PolicyKind::Stage(stage) => Box::new(StageMax(stage)),
        }
    }
}

/// Accumulates sharpness samples and derives the blur threshold.
#[derive(Debug)]
pub struct CalibrationTracker {
    samples: CalibrationSamples,
    margin: f64,
    policy: Box<dyn ThresholdPolicy>,
}

impl CalibrationTracker {
    /// Creates a tracker using the pooled-maximum policy.
    pub fn new(margin: f64) -> Self {
        Self::with_policy(margin, Box::new(PooledMax))
    }

    /// Creates a tracker with a custom policy.
    pub fn with_policy(margin: f64, policy: Box<dyn ThresholdPolicy>) -> Self {
        Self {
            samples: CalibrationSamples::default(),
            margin,
            policy,
        }
    }

    /// Records one sharpness sample taken during `stage`.
    ///
    /// Non-finite scores are dropped.
    pub fn observe(&mut self, stage: CalibrationStage, score: f64) {
        if !score.is_finite() {
            tracing::warn!(%stage, score, "Ignoring non-finite sharpness sample");
            return;
        }

        self.samples.record(stage, score);

        tracing::trace!(
            %stage,
            score,
            running_max = self.running_max(),
            "Calibration sample recorded"
        );
    }

    /// Blur threshold implied by the samples so far.
    pub fn current_threshold(&self) -> Option<f64> {
        self.policy
            .reference(&self.samples)
            .map(|reference| reference * self.margin)
    }

    /// Lowest score over all stages.
    pub fn running_min(&self) -> Option<f64> {
        self.samples.pooled().map(|range| range.min)
    }

    /// Highest score over all stages.
    pub fn running_max(&self) -> Option<f64> {
        self.samples.pooled().map(|range| range.max)
    }

    /// Number of samples observed.
    pub fn sample_count(&self) -> u64 {
        self.samples.pooled().map_or(0, |range| range.count)
    }

    /// Recorded sample ranges.
    pub fn samples(&self) -> &CalibrationSamples {
        &self.samples
    }

    /// Multiplier applied to the policy reference.
    pub fn margin(&self) -> f64 {
        self.margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_threshold_undefined_before_samples() {
        let tracker = CalibrationTracker::new(1.1);
        assert_eq!(tracker.current_threshold(), None);
        assert_eq!(tracker.running_min(), None);
        assert_eq!(tracker.sample_count(), 0);
    }

    #[test]
    fn test_running_max_scenario() {
        let mut tracker = CalibrationTracker::new(1.0);
        tracker.observe(CalibrationStage::FocusInfinity, 10.0);
        tracker.observe(CalibrationStage::FocusMacro, 30.0);
        tracker.observe(CalibrationStage::FocusAutoCenter, 20.0);

        assert_eq!(tracker.running_min(), Some(10.0));
        assert_eq!(tracker.running_max(), Some(30.0));
        assert_eq!(tracker.current_threshold(), Some(30.0));
        assert_eq!(tracker.sample_count(), 3);
    }

    #[test]
    fn test_margin_applied_once() {
        let mut tracker = CalibrationTracker::new(2.0);
        tracker.observe(CalibrationStage::FocusInfinity, 10.0);
        tracker.observe(CalibrationStage::FocusInfinity, 20.0);
        tracker.observe(CalibrationStage::FocusInfinity, 40.0);

        assert_eq!(tracker.current_threshold(), Some(80.0));
    }

    #[test]
    fn test_stage_policy() {
        let mut tracker =
            CalibrationTracker::with_policy(1.0, Box::new(StageMax(CalibrationStage::FocusAutoCenter)));
        tracker.observe(CalibrationStage::FocusMacro, 500.0);
        assert_eq!(tracker.current_threshold(), None);

        tracker.observe(CalibrationStage::FocusAutoCenter, 120.0);
        assert_eq!(tracker.current_threshold(), Some(120.0));
        assert_eq!(tracker.running_max(), Some(500.0));
    }

    #[test]
    fn test_non_finite_ignored() {
        let mut tracker = CalibrationTracker::new(1.0);
        tracker.observe(CalibrationStage::FocusMacro, f64::NAN);
        tracker.observe(CalibrationStage::FocusMacro, f64::INFINITY);
        assert_eq!(tracker.sample_count(), 0);
    }

    #[test]
    fn test_policy_kind_build() {
        let samples = {
            let mut s = CalibrationSamples::default();
            s.record(CalibrationStage::FocusInfinity, 5.0);
            s.record(CalibrationStage::FocusMacro, 9.0);
            s
        };
        assert_eq!(PolicyKind::Pooled.build().reference(&samples), Some(9.0));
        assert_eq!(
            PolicyKind::Stage(CalibrationStage::FocusInfinity)
                .build()
                .reference(&samples),
            Some(5.0)
        );
    }

    #[test]
    fn test_policy_kind_accepts_every_spelling() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: PolicyKind,
        }
        let parse = |text: &str| toml::from_str::<Wrapper>(text).map(|w| w.policy);

        assert_eq!(parse(r#"policy = "pooled""#).unwrap(), PolicyKind::Pooled);
        assert_eq!(
            parse(r#"policy = "focus_macro""#).unwrap(),
            PolicyKind::Stage(CalibrationStage::FocusMacro)
        );
        assert_eq!(
            parse(r#"policy = { stage = "focus_infinity" }"#).unwrap(),
            PolicyKind::Stage(CalibrationStage::FocusInfinity)
        );
        assert!(parse(r#"policy = "sharpest""#).is_err());
    }

    #[test]
    fn test_policy_kind_serialized_form_parses_back() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            policy: PolicyKind,
        }
        for policy in [PolicyKind::Pooled, PolicyKind::Stage(CalibrationStage::FocusAutoCenter)] {
            let text = toml::to_string(&Wrapper { policy }).unwrap();
            let parsed: Wrapper = toml::from_str(&text).unwrap();
            assert_eq!(parsed.policy, policy, "{text}");
        }
    }

    proptest! {
        #[test]
        fn prop_threshold_monotone(scores in prop::collection::vec(0.0f64..1e6, 1..50)) {
            let mut tracker = CalibrationTracker::new(1.2);
            let mut previous = f64::MIN;
            for score in scores {
                tracker.observe(CalibrationStage::FocusAutoCenter, score);
                let threshold = tracker.current_threshold().unwrap();
                prop_assert!(threshold >= previous);
                previous = threshold;
            }
        }

        #[test]
        fn prop_min_never_exceeds_max(scores in prop::collection::vec(0.0f64..1e6, 1..50)) {
            let mut tracker = CalibrationTracker::new(1.0);
            for score in &scores {
                tracker.observe(CalibrationStage::FocusMacro, *score);
            }
            prop_assert!(tracker.running_min().unwrap() <= tracker.running_max().unwrap());
        }
    }
}
