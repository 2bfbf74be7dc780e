//! Hue histogram comparison.
//!
//! Each image is reduced to a 50-bin histogram of HSV hue on the 0..180
//! scale, min-max normalized with a small floor so no bin is empty. Two
//! histograms are compared with four classic measures blended into one
//! score: correlation, intersection, Bhattacharyya distance and a
//! symmetric chi-square.

use crate::core::normalizer::PixelGrid;
use serde::{Deserialize, Serialize};

/// Number of hue bins
pub const HUE_BINS: usize = 50;

/// Hue range covered by the bins (half-degrees)
const HUE_RANGE: f64 = 180.0;

/// Added to every bin after normalization
const BIN_FLOOR: f64 = 1e-6;

/// Weight of the symmetric chi-square inside the blended score
const CHI_SQUARE_WEIGHT: f64 = 0.1;

/// Normalized hue histogram of one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HueHistogram {
    bins: Vec<f64>,
}

impl HueHistogram {
    /// Histogram of an RGB grid.
    ///
    /// Grids without three channels are achromatic: every sample has hue 0.
    pub fn from_grid(grid: &PixelGrid) -> Self {
        let mut counts = [0u64; HUE_BINS];
        if grid.channels() == 3 {
            for pixel in grid.samples().chunks_exact(3) {
                counts[hue_bin(pixel[0], pixel[1], pixel[2])] += 1;
            }
        } else {
            counts[0] = (grid.samples().len() / grid.channels() as usize) as u64;
        }

        let min = counts.iter().copied().min().unwrap_or(0) as f64;
        let max = counts.iter().copied().max().unwrap_or(0) as f64;
        let scale = if max > min { 1.0 / (max - min) } else { 0.0 };

        let bins = counts
            .iter()
            .map(|&count| (count as f64 - min) * scale + BIN_FLOOR)
            .collect();

        Self { bins }
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Pearson correlation of the bins; 1.0 when either side is constant
    pub fn correlation(&self, other: &HueHistogram) -> f64 {
        let n = self.bins.len() as f64;
        let mean_a = self.bins.iter().sum::<f64>() / n;
        let mean_b = other.bins.iter().sum::<f64>() / n;

        let (mut numerator, mut denom_a, mut denom_b) = (0.0f64, 0.0f64, 0.0f64);
        for (&a, &b) in self.bins.iter().zip(&other.bins) {
            let (da, db) = (a - mean_a, b - mean_b);
            numerator += da * db;
            denom_a += da * da;
            denom_b += db * db;
        }

        let denominator = denom_a * denom_b;
        if denominator.abs() > f64::EPSILON {
            numerator / denominator.sqrt()
        } else {
            1.0
        }
    }

    /// Chi-square distance `Σ (a - b)² / a`, averaged over both directions
    pub fn chi_square(&self, other: &HueHistogram) -> f64 {
        let directed = |p: &[f64], q: &[f64]| -> f64 {
            p.iter()
                .zip(q)
                .filter(|(&a, _)| a > f64::EPSILON)
                .map(|(&a, &b)| (a - b) * (a - b) / a)
                .sum()
        };
        (directed(&self.bins, &other.bins) + directed(&other.bins, &self.bins)) / 2.0
    }

    /// Shared mass `Σ min(a, b)` relative to the heavier histogram, in [0, 1]
    pub fn intersection(&self, other: &HueHistogram) -> f64 {
        let shared: f64 = self
            .bins
            .iter()
            .zip(&other.bins)
            .map(|(&a, &b)| a.min(b))
            .sum();
        let heavier = self.bins.iter().sum::<f64>().max(other.bins.iter().sum());
        if heavier > 0.0 {
            shared / heavier
        } else {
            1.0
        }
    }

    /// Bhattacharyya distance, 0 for identical distributions
    pub fn bhattacharyya(&self, other: &HueHistogram) -> f64 {
        let coefficient: f64 = self
            .bins
            .iter()
            .zip(&other.bins)
            .map(|(&a, &b)| (a * b).sqrt())
            .sum();
        let mass = self.bins.iter().sum::<f64>() * other.bins.iter().sum::<f64>();
        let scale = if mass.abs() > f64::EPSILON {
            1.0 / mass.sqrt()
        } else {
            1.0
        };
        (1.0 - coefficient * scale).max(0.0).sqrt()
    }

    /// Blend of the four measures; 1.0 for identical histograms
    pub fn similarity(&self, other: &HueHistogram) -> f64 {
        let correlation = self.correlation(other);
        let intersection = self.intersection(other);
        let overlap = 1.0 - self.bhattacharyya(other);
        let chi = 1.0 / (1.0 + self.chi_square(other) * CHI_SQUARE_WEIGHT);
        (correlation + intersection + overlap + chi) / 4.0
    }
}

/// Blended hue-histogram similarity of two histograms
pub fn hue_similarity(a: &HueHistogram, b: &HueHistogram) -> f64 {
    a.similarity(b)
}

/// Bin of the 8-bit HSV hue (0..180) of one RGB pixel
fn hue_bin(r: u8, g: u8, b: u8) -> usize {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let delta = max - r.min(g).min(b);
    if delta == 0.0 {
        return 0;
    }

    let mut degrees = if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if degrees < 0.0 {
        degrees += 360.0;
    }

    let hue = (degrees / 2.0).round() % HUE_RANGE;
    ((hue * HUE_BINS as f64 / HUE_RANGE) as usize).min(HUE_BINS - 1)
}
