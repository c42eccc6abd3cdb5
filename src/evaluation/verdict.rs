//! Per-frame quality verdict.

use serde::Serialize;

/// Outcome of checking one frame during `QualityCheck`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct QualityVerdict {
    /// Sharpness fell below the frozen threshold.
    pub is_blurry: bool,
    /// Brightest bucket at or above the over-exposure limit.
    pub is_over_exposed: bool,
    /// Brightest bucket below the under-exposure limit.
    pub is_under_exposed: bool,
    /// Always false until a real shadow detector is plugged in.
    pub is_shadowed: bool,
    /// Raw measurements behind the flags.
    pub measurements: Measurements,
}

/// Numbers the verdict flags were derived from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Measurements {
    /// Sharpness score of the frame.
    pub sharpness: f64,
    /// Threshold the score was compared against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur_threshold: Option<f64>,
    /// Brightest populated histogram bucket.
    pub max_white: u8,
}

impl QualityVerdict {
    /// True when the exposure facet passes.
    pub fn is_well_exposed(&self) -> bool {
        !self.is_over_exposed && !self.is_under_exposed
    }

    /// True only if every facet passes.
    pub fn is_acceptable(&self) -> bool {
        !self.is_blurry && self.is_well_exposed() && !self.is_shadowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_acceptable() {
        assert!(QualityVerdict::default().is_acceptable());
    }

    #[test]
    fn test_any_facet_fails() {
        let blurry = QualityVerdict {
            is_blurry: true,
            ..Default::default()
        };
        let dark = QualityVerdict {
            is_under_exposed: true,
            ..Default::default()
        };
        let shadowed = QualityVerdict {
            is_shadowed: true,
            ..Default::default()
        };

        assert!(!blurry.is_acceptable());
        assert!(!dark.is_acceptable());
        assert!(!dark.is_well_exposed());
        assert!(!shadowed.is_acceptable());
    }
}
