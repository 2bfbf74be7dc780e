//! # Profile Module
//!
//! Everything the comparator needs to know about one image, computed once.
//!
//! An [`ImageProfile`] holds the fingerprints, the normalized grids used by
//! the pixel metrics and a hue histogram, so a batch of `n` images is decoded and
//! normalized `n` times rather than once per pair.

use crate::core::cache::ProfileKey;
use crate::core::hasher::{FingerprintExtractor, FingerprintSet};
use crate::core::metrics::{
    pixel_divergence, similarity_score, structural_similarity, HueHistogram, MetricResult,
    DIVERGENCE_GRID, SIMILARITY_GRID, STRUCTURE_GRID,
};
use crate::core::normalizer::{normalize, ImageBuffer, NormalizeOptions, PixelGrid};
use crate::core::quality::SharpnessAnalyzer;
use crate::error::{MetricError, NormalizeError};

/// Precomputed comparison data for one image
#[derive(Debug, Clone)]
pub struct ImageProfile {
    /// dHash and (optionally) pHash
    pub fingerprints: FingerprintSet,
    /// 64x64 blurred grayscale grid
    pub divergence_grid: PixelGrid,
    /// 256x256 blurred, contrast-normalized grayscale grid
    pub similarity_grid: PixelGrid,
    /// 128x128 unfiltered grayscale grid
    pub structure_grid: PixelGrid,
    pub hue_histogram: HueHistogram,
    /// Decoded width
    pub width: u32,
    /// Decoded height
    pub height: u32,
    /// Encoded size in bytes
    pub byte_len: usize,
    /// Content digest of the source buffer
    pub digest: u64,
    /// Laplacian-variance sharpness, when requested
    pub sharpness: Option<f64>,
}

impl ImageProfile {
    /// Measure every metric between this image and another
    pub fn measure(&self, other: &ImageProfile) -> Result<MetricResult, MetricError> {
        Ok(MetricResult {
            pixel_divergence: pixel_divergence(&self.divergence_grid, &other.divergence_grid)?,
            similarity_score: similarity_score(&self.similarity_grid, &other.similarity_grid)?,
            hash_distances: self.fingerprints.distances(&other.fingerprints)?,
            structural_similarity: structural_similarity(
                &self.structure_grid,
                &other.structure_grid,
            )?,
            hue_similarity: self.hue_histogram.similarity(&other.hue_histogram),
        })
    }

    /// Decoded pixel count
    pub fn resolution(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Builds profiles with a fixed set of options
#[derive(Debug, Clone, Default)]
pub struct Profiler {
    extractor: FingerprintExtractor,
    sharpness: Option<SharpnessAnalyzer>,
}

impl Profiler {
    /// Profiler with both hashes and no sharpness analysis
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific fingerprint extractor
    pub fn extractor(mut self, extractor: FingerprintExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Enable or disable the sharpness measurement used by quality ranking
    pub fn with_quality(mut self, enabled: bool) -> Self {
        self.sharpness = enabled.then(SharpnessAnalyzer::default);
        self
    }

    /// Cache key for a buffer under these options
    pub fn key(&self, buffer: &ImageBuffer) -> ProfileKey {
        ProfileKey {
            digest: buffer.digest(),
            perceptual: self.extractor.perceptual_enabled(),
            dc_term: self.extractor.dc_term(),
            quality: self.sharpness.is_some(),
        }
    }

    /// Compute the full profile of a decoded image
    pub fn profile(&self, buffer: &ImageBuffer) -> Result<ImageProfile, NormalizeError> {
        let fingerprints = self.extractor.extract(buffer)?;
        let divergence_grid = normalize(
            buffer,
            DIVERGENCE_GRID,
            DIVERGENCE_GRID,
            &NormalizeOptions::divergence(),
        )?;
        let similarity_grid = normalize(
            buffer,
            SIMILARITY_GRID,
            SIMILARITY_GRID,
            &NormalizeOptions::similarity(),
        )?;
        let structure_grid = normalize(
            buffer,
            STRUCTURE_GRID,
            STRUCTURE_GRID,
            &NormalizeOptions::hashing(),
        )?;
        let color_grid = normalize(
            buffer,
            STRUCTURE_GRID,
            STRUCTURE_GRID,
            &NormalizeOptions::color(),
        )?;

        Ok(ImageProfile {
            fingerprints,
            divergence_grid,
            similarity_grid,
            structure_grid,
            hue_histogram: HueHistogram::from_grid(&color_grid),
            width: buffer.width(),
            height: buffer.height(),
            byte_len: buffer.byte_len(),
            digest: buffer.digest(),
            sharpness: self
                .sharpness
                .as_ref()
                .map(|analyzer| analyzer.measure_buffer(buffer)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::{DcTerm, HashAlgorithmKind};
    use image::{DynamicImage, ImageBuffer as RawImage, Luma};

    fn buffer(dark: u8) -> ImageBuffer {
        let image = RawImage::from_fn(96, 96, |x, y| {
            Luma([if (x / 24 + y / 32) % 2 == 0 { dark } else { 230 }])
        });
        ImageBuffer::from_image(DynamicImage::ImageLuma8(image)).unwrap()
    }

    #[test]
    fn profile_has_canonical_grids() {
        let profile = Profiler::new().profile(&buffer(20)).unwrap();

        assert_eq!(profile.divergence_grid.shape_label(), "64x64x1");
        assert_eq!(profile.similarity_grid.shape_label(), "256x256x1");
        assert_eq!(profile.structure_grid.shape_label(), "128x128x1");
        assert_eq!((profile.width, profile.height), (96, 96));
        assert!(profile.sharpness.is_none());
    }

    #[test]
    fn self_measure_is_identity() {
        let profile = Profiler::new().profile(&buffer(20)).unwrap();
        let metrics = profile.measure(&profile).unwrap();

        assert_eq!(metrics.pixel_divergence, 0.0);
        assert!((metrics.similarity_score - 1.0).abs() < 1e-9);
        assert!((metrics.structural_similarity - 1.0).abs() < 1e-9);
        assert!((metrics.hue_similarity - 1.0).abs() < 1e-6);
        assert_eq!(metrics.perceptual_hash_distance(), Some(0));
        assert_eq!(metrics.hash_distances[&HashAlgorithmKind::Difference], 0);
    }

    #[test]
    fn measure_is_symmetric() {
        let profiler = Profiler::new();
        let a = profiler.profile(&buffer(20)).unwrap();
        let b = profiler.profile(&buffer(90)).unwrap();

        assert_eq!(a.measure(&b).unwrap(), b.measure(&a).unwrap());
    }

    #[test]
    fn key_tracks_options() {
        let image = buffer(20);
        let plain = Profiler::new().key(&image);
        let no_phash = Profiler::new()
            .extractor(FingerprintExtractor::new().perceptual(false))
            .key(&image);
        let excluded = Profiler::new()
            .extractor(FingerprintExtractor::new().with_dc_term(DcTerm::Exclude))
            .key(&image);
        let with_quality = Profiler::new().with_quality(true).key(&image);

        assert_ne!(plain, no_phash);
        assert_ne!(plain, excluded);
        assert_ne!(plain, with_quality);
        assert_eq!(plain, Profiler::new().key(&image));
    }

    #[test]
    fn hue_similarity_separates_palettes() {
        let solid = |color: [u8; 3]| {
            let image = RawImage::from_fn(48, 48, |x, _| {
                let shade = (x % 8) as u8 * 4;
                image::Rgb([color[0] + shade, color[1] + shade, color[2] + shade])
            });
            ImageBuffer::from_image(DynamicImage::ImageRgb8(image)).unwrap()
        };
        let profiler = Profiler::new();
        let red = profiler.profile(&solid([200, 10, 10])).unwrap();
        let blue = profiler.profile(&solid([10, 10, 200])).unwrap();

        assert!(red.measure(&blue).unwrap().hue_similarity < 0.5);
        assert!((red.measure(&red).unwrap().hue_similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn quality_is_computed_on_request() {
        let profile = Profiler::new()
            .with_quality(true)
            .profile(&buffer(20))
            .unwrap();
        assert!(profile.sharpness.is_some());
    }
}
