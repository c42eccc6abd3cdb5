//! Calibration stages and the focus profile each one requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side length in sensor pixels of the centered metering window.
pub const CENTER_WINDOW_SIZE: u32 = 100;

/// Metering weight for the centered window (one below the hardware maximum of 1000).
pub const CENTER_WINDOW_WEIGHT: u32 = 999;

/// One phase of the fixed calibration sequence.
///
/// Stages are ordered; the machine only ever moves forward through
/// them and parks in [`CalibrationStage::QualityCheck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStage {
    /// Session start, before any calibration focus is applied.
    Initialization,
    /// Calibrating with focus fixed at infinity.
    FocusInfinity,
    /// Calibrating with focus fixed at the lens minimum distance.
    FocusMacro,
    /// Calibrating with centered auto-focus.
    FocusAutoCenter,
    /// Calibration done; frames get verdicts.
    QualityCheck,
}

impl CalibrationStage {
    /// All stages in sequence order.
    pub const ALL: [CalibrationStage; 5] = [
        CalibrationStage::Initialization,
        CalibrationStage::FocusInfinity,
        CalibrationStage::FocusMacro,
        CalibrationStage::FocusAutoCenter,
        CalibrationStage::QualityCheck,
    ];

    /// Returns the stage that follows this one. `QualityCheck` is its own successor.
    pub fn next(self) -> Self {
        match self {
            CalibrationStage::Initialization => CalibrationStage::FocusInfinity,
            CalibrationStage::FocusInfinity => CalibrationStage::FocusMacro,
            CalibrationStage::FocusMacro => CalibrationStage::FocusAutoCenter,
            CalibrationStage::FocusAutoCenter => CalibrationStage::QualityCheck,
            CalibrationStage::QualityCheck => CalibrationStage::QualityCheck,
        }
    }

    /// True for the stages whose frames feed the calibration tracker.
    pub fn is_sampling(self) -> bool {
        matches!(
            self,
            CalibrationStage::FocusInfinity
                | CalibrationStage::FocusMacro
                | CalibrationStage::FocusAutoCenter
        )
    }

    /// Focus configuration the camera should run with during this stage.
    pub fn focus_profile(self) -> FocusProfile {
        match self {
            CalibrationStage::Initialization
            | CalibrationStage::FocusAutoCenter
            | CalibrationStage::QualityCheck => FocusProfile::centered(),
            CalibrationStage::FocusInfinity => FocusProfile::FixedInfinity,
            CalibrationStage::FocusMacro => FocusProfile::FixedMacro,
        }
    }

    /// Position in the sequence, starting at 0.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CalibrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CalibrationStage::Initialization => "initialization",
            CalibrationStage::FocusInfinity => "focus_infinity",
            CalibrationStage::FocusMacro => "focus_macro",
            CalibrationStage::FocusAutoCenter => "focus_auto_center",
            CalibrationStage::QualityCheck => "quality_check",
        };
        f.write_str(name)
    }
}

/// A focus and metering configuration requested from the camera.
///
/// Pure data. Resolving it against a concrete lens and sensor is the
/// camera's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusProfile {
    /// Continuous auto-focus and auto-exposure metered on a centered square.
    CenteredAuto {
        /// Side length of the metering square in sensor pixels.
        window: u32,
        /// Metering weight applied to the square.
        weight: u32,
    },
    /// Manual focus at 0 diopters.
    FixedInfinity,
    /// Manual focus at the lens' minimum focus distance.
    FixedMacro,
}

impl FocusProfile {
    /// The centered auto-focus profile used outside the fixed-focus stages.
    pub const fn centered() -> Self {
        FocusProfile::CenteredAuto {
            window: CENTER_WINDOW_SIZE,
            weight: CENTER_WINDOW_WEIGHT,
        }
    }

    /// Returns the metering rectangle for a sensor of the given size,
    /// or `None` for the manual focus profiles.
    pub fn metering_rect(&self, sensor_width: u32, sensor_height: u32) -> Option<MeteringRect> {
        match *self {
            FocusProfile::CenteredAuto { window, weight } => {
                let half = window / 2;
                Some(MeteringRect {
                    x: (sensor_width / 2).saturating_sub(half),
                    y: (sensor_height / 2).saturating_sub(half),
                    width: window.min(sensor_width),
                    height: window.min(sensor_height),
                    weight,
                })
            }
            FocusProfile::FixedInfinity | FocusProfile::FixedMacro => None,
        }
    }

    /// Focus distance in diopters for manual profiles. `lens_min_focus`
    /// is the lens' minimum focus distance, also in diopters.
    pub fn focus_distance(&self, lens_min_focus: f32) -> Option<f32> {
        match self {
            FocusProfile::CenteredAuto { .. } => None,
            FocusProfile::FixedInfinity => Some(0.0),
            FocusProfile::FixedMacro => Some(lens_min_focus),
        }
    }
}

/// A weighted rectangle on the sensor used for focus and exposure metering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeteringRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Metering weight.
    pub weight: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_order() {
        let mut stage = CalibrationStage::Initialization;
        for expected in CalibrationStage::ALL.iter().skip(1) {
            stage = stage.next();
            assert_eq!(stage, *expected);
        }
        assert_eq!(stage.next(), CalibrationStage::QualityCheck);
    }

    #[test]
    fn test_sampling_stages() {
        assert!(!CalibrationStage::Initialization.is_sampling());
        assert!(CalibrationStage::FocusInfinity.is_sampling());
        assert!(CalibrationStage::FocusMacro.is_sampling());
        assert!(CalibrationStage::FocusAutoCenter.is_sampling());
        assert!(!CalibrationStage::QualityCheck.is_sampling());
    }

    #[test]
    fn test_profile_mapping() {
        assert_eq!(
            CalibrationStage::Initialization.focus_profile(),
            FocusProfile::centered()
        );
        assert_eq!(
            CalibrationStage::FocusInfinity.focus_profile(),
            FocusProfile::FixedInfinity
        );
        assert_eq!(
            CalibrationStage::FocusMacro.focus_profile(),
            FocusProfile::FixedMacro
        );
        assert_eq!(
            CalibrationStage::QualityCheck.focus_profile(),
            FocusProfile::centered()
        );
    }

    #[test]
    fn test_centered_metering_rect() {
        let rect = FocusProfile::centered().metering_rect(4000, 3000).unwrap();
        assert_eq!(rect.x, 1950);
        assert_eq!(rect.y, 1450);
        assert_eq!(rect.width, 100);
        assert_eq!(rect.weight, 999);

        assert!(FocusProfile::FixedMacro.metering_rect(4000, 3000).is_none());
    }

    #[test]
    fn test_focus_distance() {
        assert_eq!(FocusProfile::FixedInfinity.focus_distance(10.0), Some(0.0));
        assert_eq!(FocusProfile::FixedMacro.focus_distance(10.0), Some(10.0));
        assert_eq!(FocusProfile::centered().focus_distance(10.0), None);
    }
}
