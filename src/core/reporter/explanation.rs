//! Human-readable explanations for verdicts.

use crate::core::comparator::{DetectionMethod, Thresholds, Verdict};
use crate::core::hasher::HashAlgorithmKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Detailed explanation of why a candidate was (or was not) flagged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateExplanation {
    /// One-line summary (e.g., "Derivative: pixels are nearly identical")
    pub summary: String,
    /// The signal that decided
    pub method: DetectionMethod,
    /// Whether the candidate was flagged
    pub is_derivative: bool,
    /// Technical details for advanced users
    pub technical: TechnicalDetails,
    /// Human-friendly explanation
    pub human_readable: String,
}

/// Raw measurements behind an explanation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalDetails {
    /// Mean absolute difference, 0-255
    pub pixel_divergence: f64,
    /// Similarity score as a percentage (0-100)
    pub similarity_percent: f64,
    /// Differing fingerprint bits per algorithm
    pub hash_distances: BTreeMap<HashAlgorithmKind, u32>,
}

impl DuplicateExplanation {
    /// Explain a verdict against the thresholds that produced it
    pub fn new(verdict: &Verdict, thresholds: &Thresholds) -> Self {
        let metrics = &verdict.metrics;

        Self {
            summary: Self::generate_summary(verdict.method),
            method: verdict.method,
            is_derivative: verdict.is_derivative,
            technical: TechnicalDetails {
                pixel_divergence: metrics.pixel_divergence,
                similarity_percent: metrics.similarity_score * 100.0,
                hash_distances: metrics.hash_distances.clone(),
            },
            human_readable: Self::generate_human_readable(verdict, thresholds),
        }
    }

    fn generate_summary(method: DetectionMethod) -> String {
        match method {
            DetectionMethod::PixelDivergence => {
                "Derivative: the pixels are nearly identical".to_string()
            }
            DetectionMethod::SimilarityScore => {
                "Derivative: the images are strongly correlated".to_string()
            }
            DetectionMethod::PerceptualHash => {
                "Derivative: the visual fingerprints match".to_string()
            }
            DetectionMethod::Combined => {
                "Derivative: several signals narrowly missed their thresholds".to_string()
            }
            DetectionMethod::None => "Not derivative: no signal matched".to_string(),
        }
    }

    fn generate_human_readable(verdict: &Verdict, thresholds: &Thresholds) -> String {
        let metrics = &verdict.metrics;

        match verdict.method {
            DetectionMethod::PixelDivergence => format!(
                "On a small grayscale thumbnail the two images differ by {:.1} brightness \
                 levels per pixel on average (flagged below {:.1}). This is typical of \
                 exact copies, recompression and format conversion.",
                metrics.pixel_divergence, thresholds.pixel_divergence_max
            ),
            DetectionMethod::SimilarityScore => format!(
                "The images are {:.0}% correlated after contrast normalization (flagged \
                 above {:.0}%). The same picture survives brightness or contrast edits.",
                metrics.similarity_score * 100.0,
                thresholds.similarity_min * 100.0
            ),
            DetectionMethod::PerceptualHash => format!(
                "Only {} of 64 fingerprint bits differ (flagged below {}). The overall \
                 structure of the picture is the same even though its pixels changed.",
                metrics.perceptual_hash_distance().unwrap_or_default(),
                thresholds.perceptual_hash_max
            ),
            DetectionMethod::Combined => format!(
                "No single signal was decisive, but at least two came close: pixel \
                 divergence {:.1}, similarity {:.0}%{}. Review this pair before acting.",
                metrics.pixel_divergence,
                metrics.similarity_score * 100.0,
                Self::phash_clause(verdict)
            ),
            DetectionMethod::None => format!(
                "Pixel divergence {:.1}, similarity {:.0}%{}. None of these is close \
                 enough to call the candidate a copy of the reference.",
                metrics.pixel_divergence,
                metrics.similarity_score * 100.0,
                Self::phash_clause(verdict)
            ),
        }
    }

    fn phash_clause(verdict: &Verdict) -> String {
        verdict
            .metrics
            .perceptual_hash_distance()
            .map(|distance| format!(", {} of 64 fingerprint bits differ", distance))
            .unwrap_or_default()
    }
}

/// Reporter that generates detailed explanations
#[derive(Debug, Clone, Default)]
pub struct DetailedReporter {
    thresholds: Thresholds,
}

impl DetailedReporter {
    /// Create a reporter for the given thresholds
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Generate an explanation for a verdict
    pub fn explain(&self, verdict: &Verdict) -> DuplicateExplanation {
        DuplicateExplanation::new(verdict, &self.thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comparator::fuse;
    use crate::core::metrics::MetricResult;

    fn verdict(divergence: f64, similarity: f64, phash: Option<u32>) -> Verdict {
        let mut hash_distances = BTreeMap::new();
        hash_distances.insert(HashAlgorithmKind::Difference, 20);
        if let Some(distance) = phash {
            hash_distances.insert(HashAlgorithmKind::Perceptual, distance);
        }
        fuse(
            MetricResult {
                pixel_divergence: divergence,
                similarity_score: similarity,
                hash_distances,
                structural_similarity: 0.0,
                hue_similarity: 0.0,
            },
            &Thresholds::default(),
        )
    }

    #[test]
    fn pixel_divergence_summary_is_clear() {
        let explanation = DetailedReporter::default().explain(&verdict(6.8, 1.0, Some(0)));

        assert!(explanation.is_derivative);
        assert_eq!(explanation.method, DetectionMethod::PixelDivergence);
        assert!(explanation.summary.contains("nearly identical"));
        assert!(explanation.human_readable.contains("6.8"));
    }

    #[test]
    fn perceptual_hash_reports_bit_count() {
        let explanation = DetailedReporter::default().explain(&verdict(80.0, 0.4, Some(9)));

        assert_eq!(explanation.method, DetectionMethod::PerceptualHash);
        assert!(explanation.human_readable.contains("9 of 64"));
    }

    #[test]
    fn negative_verdict_omits_missing_phash() {
        let explanation = DetailedReporter::default().explain(&verdict(159.0, 0.36, None));

        assert!(!explanation.is_derivative);
        assert!(explanation.summary.starts_with("Not derivative"));
        assert!(!explanation.human_readable.contains("fingerprint"));
    }

    #[test]
    fn technical_details_carry_percentages() {
        let explanation = DetailedReporter::default().explain(&verdict(80.0, 0.65, Some(30)));

        assert_eq!(explanation.method, DetectionMethod::SimilarityScore);
        assert!((explanation.technical.similarity_percent - 65.0).abs() < 1e-9);
        assert_eq!(
            explanation.technical.hash_distances[&HashAlgorithmKind::Perceptual],
            30
        );
    }
}
