//! User-facing projection of a verdict.
//!
//! A verdict becomes three labelled facets, a guidance line and a
//! pass/fail accent. Rendering it is up to a [`FeedbackSink`].

use super::verdict::QualityVerdict;
use std::fmt;

/// Label for a passing facet.
pub const OK: &str = "OK";
/// Label for a failing facet.
pub const NOT_OK: &str = "NOT OK";

const TOO_BRIGHT: &str = "TOO BRIGHT";
const TOO_DARK: &str = "TOO DARK";

const GOOD_MSG: &str = "LOOKS GOOD!";
const BLUR_MSG: &str = "PLACE THE STRIP IN THE BOX AND TRY TO STAY STILL";
const EXPOSURE_MSG: &str = "ADJUST THE LIGHTING";
const SHADOW_MSG: &str = "SHADOW IS VISIBLE!";

/// Status of one feedback facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetStatus {
    /// Facet passed.
    Ok,
    /// Facet failed, with an optional reason shown before the label.
    NotOk(Option<&'static str>),
}

impl FacetStatus {
    /// True when the facet passed.
    pub fn is_ok(&self) -> bool {
        matches!(self, FacetStatus::Ok)
    }
}

impl fmt::Display for FacetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetStatus::Ok => f.write_str(OK),
            FacetStatus::NotOk(Some(reason)) => write!(f, "{reason} {NOT_OK}"),
            FacetStatus::NotOk(None) => f.write_str(NOT_OK),
        }
    }
}

/// Visual accent for the feedback panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    /// Every facet passed.
    Pass,
    /// At least one facet failed.
    Fail,
}

/// Feedback for one checked frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    /// Blur facet.
    pub sharpness: FacetStatus,
    /// Exposure facet.
    pub brightness: FacetStatus,
    /// Shadow facet.
    pub shadow: FacetStatus,
    /// Instruction for the user, driven by the first failing facet.
    pub guidance: &'static str,
    /// Overall pass/fail accent.
    pub accent: Accent,
}

impl From<&QualityVerdict> for Feedback {
    fn from(verdict: &QualityVerdict) -> Self {
        let sharpness = if verdict.is_blurry {
            FacetStatus::NotOk(None)
        } else {
            FacetStatus::Ok
        };

        // Over-exposure wins when both flags are somehow set.
        let brightness = if verdict.is_over_exposed {
            FacetStatus::NotOk(Some(TOO_BRIGHT))
        } else if verdict.is_under_exposed {
            FacetStatus::NotOk(Some(TOO_DARK))
        } else {
            FacetStatus::Ok
        };

        let shadow = if verdict.is_shadowed {
            FacetStatus::NotOk(None)
        } else {
            FacetStatus::Ok
        };

        let guidance = if !sharpness.is_ok() {
            BLUR_MSG
        } else if !brightness.is_ok() {
            EXPOSURE_MSG
        } else if !shadow.is_ok() {
            SHADOW_MSG
        } else {
            GOOD_MSG
        };

        let accent = if verdict.is_acceptable() {
            Accent::Pass
        } else {
            Accent::Fail
        };

        Self {
            sharpness,
            brightness,
            shadow,
            guidance,
            accent,
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SHARPNESS: {}", self.sharpness)?;
        writeln!(f, "BRIGHTNESS: {}", self.brightness)?;
        write!(f, "NO SHADOW: {}", self.shadow)
    }
}

/// Consumer of rendered feedback.
pub trait FeedbackSink {
    /// Presents one frame's feedback.
    fn render(&mut self, feedback: &Feedback);
}

/// Renders feedback through `tracing`.
#[derive(Debug, Default)]
pub struct LogFeedbackSink {
    last: Option<Feedback>,
}

impl LogFeedbackSink {
    /// Creates a sink that has rendered nothing yet.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackSink for LogFeedbackSink {
    fn render(&mut self, feedback: &Feedback) {
        // Only log when something changes; frames arrive at camera rate.
        if self.last.as_ref() == Some(feedback) {
            return;
        }

        match feedback.accent {
            Accent::Pass => tracing::info!(
                sharpness = %feedback.sharpness,
                brightness = %feedback.brightness,
                shadow = %feedback.shadow,
                "{}",
                feedback.guidance
            ),
            Accent::Fail => tracing::warn!(
                sharpness = %feedback.sharpness,
                brightness = %feedback.brightness,
                shadow = %feedback.shadow,
                "{}",
                feedback.guidance
            ),
        }
        self.last = Some(feedback.clone());
    }
}

impl FeedbackSink for Vec<Feedback> {
    fn render(&mut self, feedback: &Feedback) {
        self.push(feedback.clone());
    }
}
