//! # Hasher Module
//!
//! Computes 64-bit perceptual fingerprints for images.
//!
//! ## Supported Algorithms
//! - **dHash (Difference Hash)** - 9x8 horizontal gradients, fast, blind to flips and crops
//! - **pHash (Perceptual Hash)** - 32x32 DCT, robust to recompression and tone changes
//!
//! ## How It Works
//! 1. Normalize the image to a small grayscale grid
//! 2. Compute bits from pixel relationships (dHash) or DCT coefficients (pHash)
//! 3. Compare fingerprints using Hamming distance

mod algorithms;
mod extractor;
mod traits;

pub use algorithms::{DcTerm, DifferenceHasher, PerceptualHasher};
pub use extractor::{FingerprintExtractor, FingerprintSet};
pub use traits::{hamming_distance, Fingerprint, HashAlgorithm, HashAlgorithmKind};
