//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Normalizing the image to a 9x8 grayscale grid
//! 2. Comparing each pixel to the one on its right
//! 3. Emitting 1 if the left pixel is darker, else 0
//!
//! This captures the relative gradient of brightness changes. Because every
//! bit depends on a left/right relationship, a horizontal flip inverts most of
//! the hash and a crop shifts it; neither is detected by dHash alone.

use super::super::traits::{Fingerprint, HashAlgorithm, HashAlgorithmKind};
use crate::core::normalizer::{normalize, ImageBuffer, NormalizeOptions, PixelGrid};
use crate::error::NormalizeError;

const GRID_WIDTH: u32 = 9;
const GRID_HEIGHT: u32 = 8;

/// Difference Hash (dHash) implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct DifferenceHasher;

impl DifferenceHasher {
    /// Create a new dHash hasher
    pub fn new() -> Self {
        Self
    }

    /// Hash an already normalized 9x8 grayscale grid
    pub fn hash_grid(grid: &PixelGrid) -> Result<Fingerprint, NormalizeError> {
        grid.require_shape(GRID_WIDTH, GRID_HEIGHT, 1)?;
        let mut bits = 0u64;

        for y in 0..GRID_HEIGHT {
            for x in 0..GRID_WIDTH - 1 {
                let left = grid.get(x, y, 0);
                let right = grid.get(x + 1, y, 0);
                bits = (bits << 1) | u64::from(left < right);
            }
        }

        Ok(Fingerprint::new(bits, HashAlgorithmKind::Difference))
    }
}

impl HashAlgorithm for DifferenceHasher {
    fn hash_image(&self, buffer: &ImageBuffer) -> Result<Fingerprint, NormalizeError> {
        let grid = normalize(buffer, GRID_WIDTH, GRID_HEIGHT, &NormalizeOptions::hashing())?;
        Self::hash_grid(&grid)
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Difference
    }
}
