//! Frame quality evaluation.
//!
//! [`FrameQualityEvaluator`] decides what each frame is used for based
//! on the calibration stage held in a [`QualitySession`].
//! [`QualityEngine`] wraps both behind a mutex so a timer thread can
//! advance stages while frames are being scored.

mod engine;
mod evaluator;
mod feedback;
mod session;
mod verdict;

pub use engine::{QualityEngine, SessionSnapshot};
pub use evaluator::FrameQualityEvaluator;
pub use feedback::{Accent, FacetStatus, Feedback, FeedbackSink, LogFeedbackSink, NOT_OK, OK};
pub use session::{QualitySession, SessionStats};
pub use verdict::{Measurements, QualityVerdict};
