//! # Metrics Module
//!
//! Distance and similarity measures between two images.
//!
//! ## Measures
//! - **Hamming distance** between fingerprints of the same algorithm
//! - **Pixel divergence** - mean absolute difference of 64x64 blurred grayscale grids
//! - **Similarity score** - normalized cross-correlation of 256x256 contrast-normalized
//!   grids, mapped onto [0, 1]
//! - **Structural similarity** - mean SSIM of 128x128 grayscale grids
//! - **Hue similarity** - blended comparison of 50-bin hue histograms
//!
//! The last two are reported alongside the verdict but never decide it.

mod correlation;
mod divergence;
mod histogram;
mod ssim;

pub use crate::core::hasher::hamming_distance;
pub use correlation::{cross_correlation, similarity_score};
pub use divergence::pixel_divergence;
pub use histogram::{hue_similarity, HueHistogram, HUE_BINS};
pub use ssim::{structural_similarity, SSIM_WINDOW};

use crate::core::hasher::HashAlgorithmKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grid side used for pixel divergence
pub const DIVERGENCE_GRID: u32 = 64;

/// Grid side used for the similarity score
pub const SIMILARITY_GRID: u32 = 256;

/// Grid side used for structural similarity and the hue histogram
pub const STRUCTURE_GRID: u32 = 128;

/// Every measurement taken for one pair of images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    /// Mean absolute per-sample difference (0-255)
    pub pixel_divergence: f64,
    /// Correlation mapped onto [0, 1]
    pub similarity_score: f64,
    /// Hamming distance per fingerprint algorithm
    pub hash_distances: BTreeMap<HashAlgorithmKind, u32>,
    /// Mean SSIM, informational only
    #[serde(default)]
    pub structural_similarity: f64,
    /// Blended hue-histogram similarity, informational only
    #[serde(default)]
    pub hue_similarity: f64,
}

impl MetricResult {
    /// pHash distance, or None when pHash was not computed
    pub fn perceptual_hash_distance(&self) -> Option<u32> {
        self.hash_distances
            .get(&HashAlgorithmKind::Perceptual)
            .copied()
    }

    /// dHash distance, if computed
    pub fn difference_hash_distance(&self) -> Option<u32> {
        self.hash_distances
            .get(&HashAlgorithmKind::Difference)
            .copied()
    }
}
