//! # Quality Module
//!
//! Sharpness as the variance of the 4-neighbour Laplacian response.
//!
//! Sharpness feeds the quality-based original policy: of two copies of the
//! same picture, the blurrier one is more likely the re-encoded derivative.

use image::{DynamicImage, GrayImage};
use imageproc::filter::laplacian_filter;

use crate::core::normalizer::ImageBuffer;

/// Measures Laplacian-variance sharpness on a bounded-size grayscale copy
#[derive(Debug, Clone)]
pub struct SharpnessAnalyzer {
    /// Longest side analyzed; larger images are downscaled first
    analysis_size: u32,
}

impl Default for SharpnessAnalyzer {
    fn default() -> Self {
        Self { analysis_size: 512 }
    }
}

impl SharpnessAnalyzer {
    pub fn new(analysis_size: u32) -> Self {
        Self { analysis_size }
    }

    /// Sharpness of a decoded buffer
    pub fn measure_buffer(&self, buffer: &ImageBuffer) -> f64 {
        self.measure_image(buffer.image())
    }

    /// Sharpness of a loaded image (higher = sharper, 0 for flat input)
    pub fn measure_image(&self, image: &DynamicImage) -> f64 {
        // Never upscale small inputs
        if image.width() <= self.analysis_size && image.height() <= self.analysis_size {
            return laplacian_variance(&image.to_luma8());
        }

        let resized = image.resize(
            self.analysis_size,
            self.analysis_size,
            image::imageops::FilterType::Triangle,
        );
        laplacian_variance(&resized.to_luma8())
    }
}

/// Population variance of the Laplacian response over every pixel
fn laplacian_variance(gray: &GrayImage) -> f64 {
    let response = laplacian_filter(gray);
    let values = response.as_raw();
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    values
        .iter()
        .map(|&v| (f64::from(v) - mean).powi(2))
        .sum::<f64>()
        / n
}
