//! Common interface for per-frame analyzers.

use crate::capture::Frame;

/// Something that measures one aspect of a frame.
///
/// Analyzers are stateless with respect to frames: they read the
/// frame, return a measurement and keep nothing.
pub trait FrameAnalyzer: Send + Sync {
    /// Measurement produced for a single frame.
    type Output;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Analyzes one frame.
    fn analyze(&self, frame: &Frame) -> Self::Output;
}
