//! Camera abstraction for frame capture.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for both real camera input and mock implementations for testing.

use super::{CaptureConfig, Frame};
use crate::calibration::FocusProfile;
use image::{Rgb, RgbImage};
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No device matched the requested identifier.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The device refused to open.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// The capture configuration was rejected.
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    /// A frame could not be read.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// Focus or metering control failed.
    #[error("failed to apply focus profile: {0}")]
    FocusFailed(String),
    /// The camera is not open.
    #[error("camera not initialized")]
    NotInitialized,
}

/// Trait for camera implementations.
///
/// This abstraction allows swapping between real camera hardware
/// and mock implementations for testing.
pub trait Camera {
    /// Opens and initializes the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a single frame.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Applies a focus and metering profile to subsequent captures.
    fn apply_focus(&mut self, profile: &FocusProfile) -> Result<(), CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

// Scene intensities before gain: background, strip body, strip markings.
const BACKGROUND: f32 = 150.0;
const STRIP: f32 = 230.0;
const MARKING: f32 = 40.0;

/// Mock camera that renders a synthetic test strip.
///
/// The applied focus profile controls how defocused the strip looks:
/// centered auto-focus is sharp, macro is soft and infinity is softest.
/// Gain scales brightness, and seeded noise stands in for sensor grain.
#[derive(Debug)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
    focus: Option<FocusProfile>,
    gain: f32,
    noise: u8,
    shake: u32,
    fail_focus: bool,
    rng: ChaCha8Rng,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self {
            config: None,
            sequence: 0,
            focus: None,
            gain: 1.0,
            noise: 2,
            shake: 0,
            fail_focus: false,
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }
}

impl MockCamera {
    /// Creates a closed mock camera with default gain and noise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scales scene brightness (1.0 leaves it unchanged).
    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain.max(0.0);
        self
    }

    /// Sets the peak amplitude of per-pixel noise (0 disables it).
    pub fn with_noise(mut self, amplitude: u8) -> Self {
        self.noise = amplitude;
        self
    }

    /// Reseeds the noise generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Makes every `apply_focus` call fail.
    pub fn with_focus_failure(mut self, fail: bool) -> Self {
        self.fail_focus = fail;
        self
    }

    /// Extra Gaussian blur (sigma in pixels) on top of defocus, simulating a shaky hand.
    pub fn set_shake(&mut self, sigma: u32) {
        self.shake = sigma;
    }

    /// Changes scene brightness for subsequent captures.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }

    /// Currently applied focus profile.
    pub fn focus(&self) -> Option<FocusProfile> {
        self.focus
    }

    fn defocus_sigma(&self) -> u32 {
        let optical = match self.focus {
            Some(FocusProfile::CenteredAuto { .. }) => 0,
            Some(FocusProfile::FixedMacro) => 2,
            Some(FocusProfile::FixedInfinity) => 4,
            None => 1,
        };
        optical + self.shake
    }

    fn render(&mut self, width: u32, height: u32) -> RgbImage {
        let strip_x0 = width / 4;
        let strip_x1 = width - width / 4;
        let strip_y0 = height * 2 / 5;
        let strip_y1 = height * 3 / 5;

        let scene = RgbImage::from_fn(width, height, |x, y| {
            let inside = x >= strip_x0 && x < strip_x1 && y >= strip_y0 && y < strip_y1;
            let base = if !inside {
                BACKGROUND
            } else if (x - strip_x0) % 16 < 3 {
                MARKING
            } else {
                STRIP
            };
            let v = (base * self.gain).clamp(0.0, 255.0) as u8;
            Rgb([v, v, v.saturating_sub(10)])
        });

        let sigma = self.defocus_sigma();
        let mut image = if sigma == 0 {
            scene
        } else {
            image::imageops::blur(&scene, sigma as f32)
        };

        if self.noise > 0 {
            let span = u32::from(self.noise) * 2 + 1;
            for pixel in image.pixels_mut() {
                for channel in pixel.0.iter_mut() {
                    let delta = (self.rng.next_u32() % span) as i16 - i16::from(self.noise);
                    *channel = (i16::from(*channel) + delta).clamp(0, 255) as u8;
                }
            }
        }
        image
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(
            device = config.device_id,
            width = config.width,
            height = config.height,
            fps = config.fps,
            "MockCamera opened"
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let (width, height) = {
            let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;
            (config.width, config.height)
        };

        let color = self.render(width, height);
        self.sequence += 1;
        Frame::from_rgb(color, self.sequence).map_err(|e| CameraError::CaptureFailed(e.to_string()))
    }

    fn apply_focus(&mut self, profile: &FocusProfile) -> Result<(), CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;
        if self.fail_focus {
            return Err(CameraError::FocusFailed("focus control unavailable".into()));
        }

        tracing::debug!(
            ?profile,
            distance = profile.focus_distance(config.min_focus_distance),
            metering = ?profile.metering_rect(config.width, config.height),
            "MockCamera focus applied"
        );
        self.focus = Some(*profile);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        self.focus = None;
        tracing::info!("MockCamera closed");
    }
}
