//! Intensity histogram and exposure verdict.

use super::analyzer::FrameAnalyzer;
use crate::capture::Frame;
use image::GrayImage;

/// Number of intensity buckets.
pub const BUCKETS: usize = 256;

/// Intensity histogram of a grayscale image.
#[derive(Debug, Clone)]
pub struct Histogram {
    counts: [u32; BUCKETS],
    /// Value the tallest bucket is scaled to in [`Histogram::normalized`].
    scale: f32,
}

impl Histogram {
    /// Builds a histogram normalized so the tallest bucket maps to half
    /// the image height.
    pub fn from_gray(image: &GrayImage) -> Self {
        let mut counts = [0u32; BUCKETS];
        for pixel in image.pixels() {
            counts[pixel.0[0] as usize] += 1;
        }

        Self {
            counts,
            scale: image.height() as f32 / 2.0,
        }
    }

    /// Raw pixel count per bucket.
    pub fn counts(&self) -> &[u32; BUCKETS] {
        &self.counts
    }

    /// Buckets scaled so the largest equals the normalization scale.
    /// All zeros for an empty histogram.
    pub fn normalized(&self) -> [f32; BUCKETS] {
        let mut out = [0.0f32; BUCKETS];
        let peak = self.counts.iter().copied().max().unwrap_or(0);
        if peak == 0 {
            return out;
        }

        let factor = self.scale / peak as f32;
        for (slot, &count) in out.iter_mut().zip(self.counts.iter()) {
            *slot = count as f32 * factor;
        }
        out
    }

    /// Highest bucket index with a nonzero count (0 when empty).
    pub fn max_white(&self) -> u8 {
        self.counts
            .iter()
            .rposition(|&count| count > 0)
            .map_or(0, |index| index as u8)
    }

    /// Total number of pixels counted.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }
}

/// Exposure verdict derived from a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exposure {
    /// Brightest populated bucket.
    pub max_white: u8,
    /// `max_white` at or above the over-exposure limit.
    pub is_over_exposed: bool,
    /// `max_white` below the under-exposure limit.
    pub is_under_exposed: bool,
}

impl Exposure {
    /// True when neither flag is set.
    pub fn is_ok(&self) -> bool {
        !self.is_over_exposed && !self.is_under_exposed
    }
}

/// Builds histograms and judges exposure against fixed limits.
#[derive(Debug, Clone)]
pub struct HistogramAnalyzer {
    over_exposure_threshold: u8,
    under_exposure_threshold: u8,
}

impl HistogramAnalyzer {
    /// Creates an analyzer with the given exposure limits.
    pub fn new(over_exposure_threshold: u8, under_exposure_threshold: u8) -> Self {
        Self {
            over_exposure_threshold,
            under_exposure_threshold,
        }
    }

    /// Judges exposure from the brightest populated bucket.
    pub fn exposure(&self, histogram: &Histogram) -> Exposure {
        let max_white = histogram.max_white();
        Exposure {
            max_white,
            is_over_exposed: max_white >= self.over_exposure_threshold,
            is_under_exposed: max_white < self.under_exposure_threshold,
        }
    }

    /// Over-exposure limit.
    pub fn over_exposure_threshold(&self) -> u8 {
        self.over_exposure_threshold
    }

    /// Under-exposure limit.
    pub fn under_exposure_threshold(&self) -> u8 {
        self.under_exposure_threshold
    }
}

impl FrameAnalyzer for HistogramAnalyzer {
    type Output = Exposure;

    fn name(&self) -> &'static str {
        "histogram"
    }

    fn analyze(&self, frame: &Frame) -> Exposure {
        let histogram = Histogram::from_gray(frame.gray());
        let exposure = self.exposure(&histogram);
        tracing::trace!(
            max_white = exposure.max_white,
            over = exposure.is_over_exposed,
            under = exposure.is_under_exposed,
            "Exposure measured"
        );
        exposure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use proptest::prelude::*;

    #[test]
    fn test_black_frame_under_exposed() {
        let image = GrayImage::from_pixel(32, 32, Luma([0]));
        let histogram = Histogram::from_gray(&image);
        let exposure = HistogramAnalyzer::new(250, 50).exposure(&histogram);

        assert_eq!(exposure.max_white, 0);
        assert!(exposure.is_under_exposed);
        assert!(!exposure.is_over_exposed);
    }

    #[test]
    fn test_low_buckets_under_exposed() {
        // Values 0..=10 only.
        let image = GrayImage::from_fn(11, 4, |x, _| Luma([x as u8]));
        let histogram = Histogram::from_gray(&image);
        let exposure = HistogramAnalyzer::new(250, 50).exposure(&histogram);

        assert_eq!(exposure.max_white, 10);
        assert!(exposure.is_under_exposed);
        assert!(!exposure.is_over_exposed);
    }

    #[test]
    fn test_saturated_over_exposed() {
        let image = GrayImage::from_fn(16, 16, |x, _| Luma([if x == 0 { 255 } else { 128 }]));
        let exposure = HistogramAnalyzer::new(250, 50).exposure(&Histogram::from_gray(&image));

        assert_eq!(exposure.max_white, 255);
        assert!(exposure.is_over_exposed);
        assert!(!exposure.is_ok());
    }

    #[test]
    fn test_normalization_peak_is_half_height() {
        let image = GrayImage::from_fn(10, 40, |x, _| Luma([if x < 8 { 70 } else { 200 }]));
        let normalized = Histogram::from_gray(&image).normalized();

        assert!((normalized[70] - 20.0).abs() < 1e-4);
        assert!((normalized[200] - 5.0).abs() < 1e-4);
        assert_eq!(normalized[0], 0.0);
    }

    proptest! {
        #[test]
        fn prop_uniform_frame_single_bucket(v in any::<u8>(), w in 1u32..32, h in 1u32..32) {
            let image = GrayImage::from_pixel(w, h, Luma([v]));
            let histogram = Histogram::from_gray(&image);

            let nonzero: Vec<usize> = histogram
                .counts()
                .iter()
                .enumerate()
                .filter(|(_, &c)| c > 0)
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(nonzero, vec![v as usize]);
            prop_assert_eq!(histogram.max_white(), v);
            prop_assert_eq!(histogram.total(), u64::from(w * h));
        }

        #[test]
        fn prop_never_both_over_and_under(
            pixels in prop::collection::vec(any::<u8>(), 1..256),
            under in 0u8..255,
            gap in 1u8..=255,
        ) {
            let over = under.saturating_add(gap).max(under + 1);
            let width = pixels.len() as u32;
            let image = GrayImage::from_raw(width, 1, pixels).unwrap();
            let exposure = HistogramAnalyzer::new(over, under).exposure(&Histogram::from_gray(&image));

            prop_assert!(!(exposure.is_over_exposed && exposure.is_under_exposed));
        }
    }
}
