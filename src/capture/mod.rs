//! Camera input and frame handling.
//!
//! The core never talks to hardware directly. Frames come in through
//! [`Camera::capture`] and focus changes go out through
//! [`Camera::apply_focus`].

mod camera;
mod config;
mod frame;

pub use camera::{Camera, CameraError, MockCamera};
pub use config::CaptureConfig;
pub use frame::{Frame, FrameError};
