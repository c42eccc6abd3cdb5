//! Laplacian sharpness estimation.
//!
//! The score is the squared maximum per-channel standard deviation of
//! the Laplacian response. Higher means sharper; a flat image scores 0.

use super::analyzer::FrameAnalyzer;
use crate::capture::Frame;
use image::{ImageBuffer, Pixel};
use serde::{Deserialize, Serialize};

/// Which frame projection the sharpness score is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurSource {
    /// Full-color frame; the sharpest channel wins.
    #[default]
    Color,
    /// Grayscale projection.
    Gray,
}

/// Scores frame sharpness and judges blur against a threshold.
#[derive(Debug, Clone, Default)]
pub struct BlurEstimator {
    source: BlurSource,
}

impl BlurEstimator {
    /// Creates an estimator scoring the given projection.
    pub fn new(source: BlurSource) -> Self {
        Self { source }
    }

    /// Projection being scored.
    pub fn source(&self) -> BlurSource {
        self.source
    }

    /// A frame is blurry when its score is below the learned threshold.
    /// Without a threshold nothing is blurry.
    pub fn is_blurry(score: f64, threshold: Option<f64>) -> bool {
        threshold.is_some_and(|threshold| score < threshold)
    }
}

impl FrameAnalyzer for BlurEstimator {
    type Output = f64;

    fn name(&self) -> &'static str {
        "blur"
    }

    fn analyze(&self, frame: &Frame) -> f64 {
        let score = match self.source {
            BlurSource::Color => sharpness(frame.color()),
            BlurSource::Gray => sharpness(frame.gray()),
        };
        tracing::trace!(sequence = frame.sequence(), score, "Sharpness measured");
        score
    }
}

/// Computes the sharpness score of an 8-bit image with any channel count.
///
/// Uses the 4-neighbour kernel `[0 1 0; 1 -4 1; 0 1 0]` with
/// reflect-101 borders, so the response map has the input's size.
pub fn sharpness<P>(image: &ImageBuffer<P, Vec<u8>>) -> f64
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return 0.0;
    }

    let channels = P::CHANNEL_COUNT as usize;
    let raw = image.as_raw();
    let at = |x: usize, y: usize, c: usize| f64::from(raw[(y * w + x) * channels + c]);

    let mut sum = vec![0.0f64; channels];
    let mut sum_sq = vec![0.0f64; channels];

    for y in 0..h {
        let up = reflect101(y as isize - 1, h);
        let down = reflect101(y as isize + 1, h);
        for x in 0..w {
            let left = reflect101(x as isize - 1, w);
            let right = reflect101(x as isize + 1, w);
            for c in 0..channels {
                let response = at(x, up, c) + at(x, down, c) + at(left, y, c) + at(right, y, c)
                    - 4.0 * at(x, y, c);
                sum[c] += response;
                sum_sq[c] += response * response;
            }
        }
    }

    let n = (w * h) as f64;
    let max_std = sum
        .iter()
        .zip(sum_sq.iter())
        .map(|(&s, &sq)| {
            let mean = s / n;
            // Population variance; clamp rounding noise below zero.
            (sq / n - mean * mean).max(0.0).sqrt()
        })
        .fold(0.0f64, f64::max);

    max_std * max_std
}

/// Mirrors an out-of-range index without repeating the edge sample.
#[inline]
fn reflect101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let reflected = if i < 0 {
        -i
    } else if i > last {
        2 * last - i
    } else {
        i
    };
    reflected as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn checkerboard(size: u32, cell: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Luma([230])
            } else {
                Luma([20])
            }
        })
    }

    #[test]
    fn test_uniform_image_scores_zero() {
        let image = RgbImage::from_pixel(32, 24, Rgb([90, 120, 200]));
        assert_eq!(sharpness(&image), 0.0);
        assert!(BlurEstimator::is_blurry(0.0, Some(1.0)));
    }

    #[test]
    fn test_single_bright_pixel_exact() {
        let mut image = GrayImage::new(3, 3);
        image.put_pixel(1, 1, Luma([255]));

        // Response: -1020 at the centre, 510 at the four edge midpoints.
        let n = 9.0;
        let mean = 1020.0 / n;
        let expected = 2_080_800.0 / n - mean * mean;
        assert!((sharpness(&image) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_blur_lowers_score() {
        let sharp = checkerboard(64, 4);
        let soft = image::imageops::blur(&sharp, 2.0);

        assert!(sharpness(&sharp) > sharpness(&soft));
    }

    #[test]
    fn test_max_channel_wins() {
        // Only the red channel has structure.
        let image = RgbImage::from_fn(16, 16, |x, _| Rgb([if x % 2 == 0 { 255 } else { 0 }, 50, 50]));
        let red_only = GrayImage::from_fn(16, 16, |x, _| Luma([if x % 2 == 0 { 255 } else { 0 }]));

        assert!((sharpness(&image) - sharpness(&red_only)).abs() < 1e-6);
    }

    #[test]
    fn test_is_blurry_without_threshold() {
        assert!(!BlurEstimator::is_blurry(0.0, None));
        assert!(BlurEstimator::is_blurry(25.0, Some(30.0)));
        assert!(!BlurEstimator::is_blurry(35.0, Some(30.0)));
    }

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(2, 5), 2);
        assert_eq!(reflect101(-1, 1), 0);
    }

    #[test]
    fn test_gray_source() {
        let color = RgbImage::from_fn(16, 16, |x, y| {
            let v = if (x + y) % 2 == 0 { 200 } else { 40 };
            Rgb([v, v, v])
        });
        let frame = Frame::from_rgb(color, 1).unwrap();

        let from_color = BlurEstimator::new(BlurSource::Color).analyze(&frame);
        let from_gray = BlurEstimator::new(BlurSource::Gray).analyze(&frame);
        assert!(from_color > 0.0);
        assert!(from_gray > 0.0);
    }
}
