//! Shadow detection.
//!
//! Only a placeholder detector exists today. The evaluator talks to it
//! through [`ShadowAnalyzer`] so a real detector can be dropped in.

use super::analyzer::FrameAnalyzer;
use crate::capture::Frame;

/// A frame analyzer that reports whether a shadow covers the strip.
pub type ShadowAnalyzer = dyn FrameAnalyzer<Output = bool>;

/// Never reports a shadow.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShadow;

impl FrameAnalyzer for NoShadow {
    type Output = bool;

    fn name(&self) -> &'static str {
        "shadow"
    }

    fn analyze(&self, _frame: &Frame) -> bool {
        false
    }
}
