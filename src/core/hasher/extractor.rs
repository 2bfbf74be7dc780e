//! # Fingerprint Extractor
//!
//! Computes every enabled fingerprint for an image from a single decode.
//!
//! ## How It Works
//! 1. dHash is always computed
//! 2. pHash is computed unless disabled for the run
//! 3. Distances are compared per algorithm; the fuser decides what they mean

use super::traits::{Fingerprint, HashAlgorithm, HashAlgorithmKind};
use super::{DcTerm, DifferenceHasher, PerceptualHasher};
use crate::core::normalizer::ImageBuffer;
use crate::error::{MetricError, NormalizeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fingerprints extracted from one image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintSet {
    /// Difference hash (dHash)
    pub difference: Fingerprint,
    /// Perceptual hash (pHash), absent when disabled
    pub perceptual: Option<Fingerprint>,
}

impl FingerprintSet {
    /// Per-algorithm Hamming distances to another set.
    ///
    /// pHash appears only when both sides carry one.
    pub fn distances(
        &self,
        other: &FingerprintSet,
    ) -> Result<BTreeMap<HashAlgorithmKind, u32>, MetricError> {
        let mut distances = BTreeMap::new();
        distances.insert(
            HashAlgorithmKind::Difference,
            self.difference.distance(&other.difference)?,
        );

        if let (Some(a), Some(b)) = (&self.perceptual, &other.perceptual) {
            distances.insert(HashAlgorithmKind::Perceptual, a.distance(b)?);
        }

        Ok(distances)
    }

    /// Look up the fingerprint for one algorithm
    pub fn get(&self, kind: HashAlgorithmKind) -> Option<&Fingerprint> {
        match kind {
            HashAlgorithmKind::Difference => Some(&self.difference),
            HashAlgorithmKind::Perceptual => self.perceptual.as_ref(),
        }
    }
}

/// Computes fingerprint sets using the enabled algorithms
#[derive(Debug, Clone)]
pub struct FingerprintExtractor {
    dhash: DifferenceHasher,
    phash: Option<PerceptualHasher>,
    dc_term: DcTerm,
}

impl FingerprintExtractor {
    /// Extractor with both algorithms and the DC term included
    pub fn new() -> Self {
        Self {
            dhash: DifferenceHasher::new(),
            phash: Some(PerceptualHasher::new()),
            dc_term: DcTerm::Include,
        }
    }

    /// Enable or disable the perceptual hash
    pub fn perceptual(mut self, enabled: bool) -> Self {
        let dc_term = self.dc_term;
        self.phash = enabled.then(|| PerceptualHasher::with_dc_term(dc_term));
        self
    }

    /// How the pHash treats the DC coefficient
    pub fn dc_term(&self) -> DcTerm {
        self.dc_term
    }

    /// Set pHash DC handling; kept even while pHash is disabled
    pub fn with_dc_term(mut self, dc_term: DcTerm) -> Self {
        self.dc_term = dc_term;
        if self.phash.is_some() {
            self.phash = Some(PerceptualHasher::with_dc_term(dc_term));
        }
        self
    }

    /// Whether pHash is computed
    pub fn perceptual_enabled(&self) -> bool {
        self.phash.is_some()
    }

    /// Compute all enabled fingerprints for a decoded image
    pub fn extract(&self, buffer: &ImageBuffer) -> Result<FingerprintSet, NormalizeError> {
        let difference = self.dhash.hash_image(buffer)?;
        let perceptual = self
            .phash
            .as_ref()
            .map(|hasher| hasher.hash_image(buffer))
            .transpose()?;

        Ok(FingerprintSet {
            difference,
            perceptual,
        })
    }
}

impl Default for FingerprintExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer as RawImage, Luma};

    fn checker() -> ImageBuffer {
        let image = RawImage::from_fn(64, 64, |x, y| {
            Luma([if (x / 16 + y / 16) % 2 == 0 { 30 } else { 220 }])
        });
        ImageBuffer::from_image(DynamicImage::ImageLuma8(image)).unwrap()
    }

    #[test]
    fn extractor_computes_both_hashes() {
        let set = FingerprintExtractor::new().extract(&checker()).unwrap();

        assert_eq!(set.difference.algorithm(), HashAlgorithmKind::Difference);
        assert_eq!(
            set.perceptual.map(|p| p.algorithm()),
            Some(HashAlgorithmKind::Perceptual)
        );
    }

    #[test]
    fn disabling_phash_drops_it_from_distances() {
        let extractor = FingerprintExtractor::new().perceptual(false);
        let set = extractor.extract(&checker()).unwrap();

        assert!(set.perceptual.is_none());
        let distances = set.distances(&set).unwrap();
        assert_eq!(distances.len(), 1);
        assert_eq!(distances[&HashAlgorithmKind::Difference], 0);
    }

    #[test]
    fn distances_include_phash_when_both_sides_have_it() {
        let set = FingerprintExtractor::new().extract(&checker()).unwrap();
        let distances = set.distances(&set).unwrap();
        assert_eq!(distances.get(&HashAlgorithmKind::Perceptual), Some(&0));
    }

    #[test]
    fn dc_term_is_carried_through() {
        let extractor = FingerprintExtractor::new().with_dc_term(DcTerm::Exclude);
        assert_eq!(extractor.dc_term(), DcTerm::Exclude);

        let disabled = FingerprintExtractor::new().perceptual(false);
        assert!(!disabled.perceptual_enabled());
    }

    #[test]
    fn dc_term_survives_toggling_phash() {
        let extractor = FingerprintExtractor::new()
            .perceptual(false)
            .with_dc_term(DcTerm::Exclude)
            .perceptual(true);
        assert_eq!(extractor.dc_term(), DcTerm::Exclude);

        let expected = PerceptualHasher::with_dc_term(DcTerm::Exclude)
            .hash_image(&checker())
            .unwrap();
        let set = extractor.extract(&checker()).unwrap();
        assert_eq!(set.perceptual, Some(expected));
    }
}
