//! Trait and value types for image fingerprints.

use crate::core::normalizer::ImageBuffer;
use crate::error::{MetricError, NormalizeError};
use serde::{Deserialize, Serialize};

/// Available hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HashAlgorithmKind {
    /// Difference Hash (dHash) - horizontal brightness gradients
    #[serde(rename = "dHash")]
    Difference,
    /// Perceptual Hash (pHash) - low DCT frequencies
    #[serde(rename = "pHash")]
    Perceptual,
}

impl HashAlgorithmKind {
    /// Get a human-readable description of the algorithm
    pub fn description(&self) -> &'static str {
        match self {
            HashAlgorithmKind::Difference => {
                "Difference Hash (dHash) - Compares brightness gradients between pixels"
            }
            HashAlgorithmKind::Perceptual => {
                "Perceptual Hash (pHash) - DCT-based, robust to recompression and tone changes"
            }
        }
    }
}

impl std::fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithmKind::Difference => write!(f, "dHash"),
            HashAlgorithmKind::Perceptual => write!(f, "pHash"),
        }
    }
}

/// Trait for hash algorithm implementations
pub trait HashAlgorithm: Send + Sync {
    /// Compute a fingerprint from a decoded image
    fn hash_image(&self, buffer: &ImageBuffer) -> Result<Fingerprint, NormalizeError>;

    /// Get the algorithm kind
    fn kind(&self) -> HashAlgorithmKind;
}

/// A fixed-width perceptual fingerprint.
///
/// The first bit an extractor emits is the most significant bit of `bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    bits: u64,
    bit_len: u32,
    algorithm: HashAlgorithmKind,
}

impl Fingerprint {
    /// Width of every fingerprint the built-in extractors produce
    pub const BITS: u32 = 64;

    /// Create a 64-bit fingerprint
    pub fn new(bits: u64, algorithm: HashAlgorithmKind) -> Self {
        Self {
            bits,
            bit_len: Self::BITS,
            algorithm,
        }
    }

    /// Raw bit string
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Number of meaningful bits
    pub fn bit_len(&self) -> u32 {
        self.bit_len
    }

    /// The algorithm that produced this fingerprint
    pub fn algorithm(&self) -> HashAlgorithmKind {
        self.algorithm
    }

    /// Hamming distance to another fingerprint of the same kind.
    ///
    /// Lower distance = more similar images.
    pub fn distance(&self, other: &Fingerprint) -> Result<u32, MetricError> {
        if self.algorithm != other.algorithm || self.bit_len != other.bit_len {
            return Err(MetricError::IncomparableHash {
                left: self.algorithm,
                left_bits: self.bit_len,
                right: other.algorithm,
                right_bits: other.bit_len,
            });
        }
        Ok((self.bits ^ other.bits).count_ones())
    }

    /// Similarity as a percentage (0-100)
    pub fn similarity(&self, other: &Fingerprint) -> Result<f64, MetricError> {
        let distance = self.distance(other)?;
        if self.bit_len == 0 {
            return Ok(100.0);
        }
        Ok((1.0 - (distance as f64 / self.bit_len as f64)) * 100.0)
    }

    /// Lowercase hexadecimal form, one digit per four bits
    pub fn to_hex(&self) -> String {
        let digits = self.bit_len.div_ceil(4) as usize;
        format!("{:0width$x}", self.bits, width = digits)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Hamming distance between two fingerprints
pub fn hamming_distance(a: &Fingerprint, b: &Fingerprint) -> Result<u32, MetricError> {
    a.distance(b)
}
