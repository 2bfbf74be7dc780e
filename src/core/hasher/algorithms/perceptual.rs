//! Perceptual Hash (pHash) implementation.
//!
//! pHash uses the Discrete Cosine Transform (DCT) to extract
//! low-frequency structure from the image. This makes it robust to:
//! - Recompression artifacts
//! - Brightness/contrast changes
//! - Small amounts of noise
//!
//! ## Algorithm
//! 1. Normalize to a 32x32 grayscale grid (no blur)
//! 2. Unnormalized type-II 2D DCT,
//!    `F(u,v) = Σx Σy p(x,y) cos((2x+1)uπ/64) cos((2y+1)vπ/64)` with x the row
//! 3. Keep the top-left 8x8 coefficients, row-major
//! 4. Bit is 1 where the coefficient exceeds the mean of the block
//!
//! The transform is computed separably with rustdct: a 32-point DCT-II over
//! every row, then over every column, before cropping the 8x8 corner.

use super::super::traits::{Fingerprint, HashAlgorithm, HashAlgorithmKind};
use crate::core::normalizer::{normalize, ImageBuffer, NormalizeOptions, PixelGrid};
use crate::error::NormalizeError;
use rustdct::{DctPlanner, TransformType2And3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const GRID_SIZE: usize = 32;
const BLOCK_SIZE: usize = 8;

/// How the DC coefficient enters the threshold mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DcTerm {
    /// Mean over all 64 coefficients, DC included
    #[default]
    Include,
    /// Mean over the 63 AC coefficients only
    Exclude,
}

/// Perceptual Hash (pHash) implementation using DCT
#[derive(Clone)]
pub struct PerceptualHasher {
    dc_term: DcTerm,
    dct: Arc<dyn TransformType2And3<f64>>,
}

impl PerceptualHasher {
    /// Create a new pHash hasher
    pub fn new() -> Self {
        Self::with_dc_term(DcTerm::Include)
    }

    /// Create a pHash hasher with explicit DC handling
    pub fn with_dc_term(dc_term: DcTerm) -> Self {
        let dct = DctPlanner::new().plan_dct2(GRID_SIZE);
        Self { dc_term, dct }
    }

    pub fn dc_term(&self) -> DcTerm {
        self.dc_term
    }

    /// Low-frequency 8x8 DCT block of a 32x32 grid, row-major in (u, v)
    fn dct_block(&self, grid: &PixelGrid) -> [f64; BLOCK_SIZE * BLOCK_SIZE] {
        let mut scratch = vec![0.0f64; self.dct.get_scratch_len()];
        let mut rows: Vec<f64> = grid.samples().iter().map(|&p| p as f64).collect();

        for row in rows.chunks_mut(GRID_SIZE) {
            self.dct.process_dct2_with_scratch(row, &mut scratch);
        }

        // Only the first BLOCK_SIZE columns survive the crop
        let mut block = [0.0f64; BLOCK_SIZE * BLOCK_SIZE];
        let mut column = [0.0f64; GRID_SIZE];
        for v in 0..BLOCK_SIZE {
            for (x, slot) in column.iter_mut().enumerate() {
                *slot = rows[x * GRID_SIZE + v];
            }
            self.dct.process_dct2_with_scratch(&mut column, &mut scratch);
            for u in 0..BLOCK_SIZE {
                block[u * BLOCK_SIZE + v] = column[u];
            }
        }

        block
    }

    /// Hash an already normalized 32x32 grayscale grid
    pub fn hash_grid(&self, grid: &PixelGrid) -> Result<Fingerprint, NormalizeError> {
        grid.require_shape(GRID_SIZE as u32, GRID_SIZE as u32, 1)?;
        let block = self.dct_block(grid);

        let mean = match self.dc_term {
            DcTerm::Include => block.iter().sum::<f64>() / block.len() as f64,
            DcTerm::Exclude => block[1..].iter().sum::<f64>() / (block.len() - 1) as f64,
        };

        let bits = block
            .iter()
            .fold(0u64, |bits, &coefficient| (bits << 1) | u64::from(coefficient > mean));

        Ok(Fingerprint::new(bits, HashAlgorithmKind::Perceptual))
    }
}

impl fmt::Debug for PerceptualHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerceptualHasher")
            .field("dc_term", &self.dc_term)
            .field("grid_size", &GRID_SIZE)
            .finish()
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl HashAlgorithm for PerceptualHasher {
    fn hash_image(&self, buffer: &ImageBuffer) -> Result<Fingerprint, NormalizeError> {
        let size = GRID_SIZE as u32;
        let grid = normalize(buffer, size, size, &NormalizeOptions::hashing())?;
        self.hash_grid(&grid)
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Perceptual
    }
}
