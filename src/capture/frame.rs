//! Frame type representing a captured image with metadata.

use image::{GrayImage, RgbImage};
use std::time::Instant;
use thiserror::Error;

/// Errors raised when assembling a frame from pixel buffers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Width or height is zero.
    #[error("frame has zero-sized dimensions")]
    Empty,
    /// The two projections have different sizes.
    #[error("color {color:?} and grayscale {gray:?} projections differ in size")]
    DimensionMismatch {
        /// Color projection size.
        color: (u32, u32),
        /// Grayscale projection size.
        gray: (u32, u32),
    },
}

/// A single captured frame from the camera.
///
/// Holds both projections the quality checks need: the full-color
/// buffer for sharpness scoring and the grayscale buffer for the
/// exposure histogram. Both always have the same dimensions.
#[derive(Clone)]
pub struct Frame {
    /// Full-color projection.
    color: RgbImage,
    /// Grayscale intensity projection.
    gray: GrayImage,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a frame from matching color and grayscale projections.
    pub fn new(color: RgbImage, gray: GrayImage, sequence: u64) -> Result<Self, FrameError> {
        if color.width() == 0 || color.height() == 0 {
            return Err(FrameError::Empty);
        }
        if color.dimensions() != gray.dimensions() {
            return Err(FrameError::DimensionMismatch {
                color: color.dimensions(),
                gray: gray.dimensions(),
            });
        }

        Ok(Self {
            color,
            gray,
            timestamp: Instant::now(),
            sequence,
        })
    }

    /// Creates a frame from a color buffer, deriving the grayscale projection.
    pub fn from_rgb(color: RgbImage, sequence: u64) -> Result<Self, FrameError> {
        let gray = image::imageops::grayscale(&color);
        Self::new(color, gray, sequence)
    }

    /// Returns the full-color projection.
    #[inline]
    pub fn color(&self) -> &RgbImage {
        &self.color
    }

    /// Returns the grayscale projection.
    #[inline]
    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.color.width()
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.color.height()
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("sequence", &self.sequence)
            .finish()
    }
}
