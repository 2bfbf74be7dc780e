//! # Comparator Module
//!
//! Turns metrics into verdicts and batches into duplicate groups.
//!
//! ## How It Works
//! 1. Fuse each pair's metrics into a single verdict (fixed priority)
//! 2. Treat every derivative pair in a batch as an edge
//! 3. Group images into clusters (transitive grouping)
//! 4. Designate one original per group
//!
//! ## Fusion Priority
//! | Order | Signal             | Fires when            | Method            |
//! |-------|--------------------|-----------------------|-------------------|
//! | 1     | Pixel divergence   | `< 50`                | `PixelDivergence` |
//! | 2     | Similarity score   | `> 0.6`               | `SimilarityScore` |
//! | 3     | pHash distance     | present and `< 15`    | `PerceptualHash`  |
//! | 4     | Near misses (opt)  | 2+ signals in margin  | `Combined`        |

mod cluster;
mod grouper;
mod thresholds;
mod traits;

pub use cluster::{cluster_profiles, cluster_profiles_with, OriginalPolicy};
pub use grouper::TransitiveGrouper;
pub use thresholds::{CombinedRule, Thresholds};
pub use traits::{FusionStrategy, PriorityStrategy};

use crate::core::metrics::MetricResult;
use serde::{Deserialize, Serialize};

/// Which signal decided a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionMethod {
    #[serde(rename = "Pixel Divergence")]
    PixelDivergence,
    #[serde(rename = "Similarity Score")]
    SimilarityScore,
    #[serde(rename = "Perceptual Hash")]
    PerceptualHash,
    #[serde(rename = "Combined Analysis")]
    Combined,
    #[serde(rename = "None")]
    None,
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMethod::PixelDivergence => write!(f, "Pixel Divergence"),
            DetectionMethod::SimilarityScore => write!(f, "Similarity Score"),
            DetectionMethod::PerceptualHash => write!(f, "Perceptual Hash"),
            DetectionMethod::Combined => write!(f, "Combined Analysis"),
            DetectionMethod::None => write!(f, "None"),
        }
    }
}

/// The fused decision for one pair of images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// Whether the candidate is judged derivative of the reference
    pub is_derivative: bool,
    /// The signal that decided
    pub method: DetectionMethod,
    /// Every measurement taken
    pub metrics: MetricResult,
}

/// Fuse a pair's metrics into a verdict.
///
/// All comparisons are strict: a value exactly at its threshold does not fire.
pub fn fuse(metrics: MetricResult, thresholds: &Thresholds) -> Verdict {
    let method = if metrics.pixel_divergence < thresholds.pixel_divergence_max {
        DetectionMethod::PixelDivergence
    } else if metrics.similarity_score > thresholds.similarity_min {
        DetectionMethod::SimilarityScore
    } else if metrics
        .perceptual_hash_distance()
        .is_some_and(|distance| distance < thresholds.perceptual_hash_max)
    {
        DetectionMethod::PerceptualHash
    } else if thresholds
        .combined
        .is_some_and(|rule| near_misses(&metrics, thresholds, rule.margin) >= 2)
    {
        DetectionMethod::Combined
    } else {
        DetectionMethod::None
    };

    Verdict {
        is_derivative: method != DetectionMethod::None,
        method,
        metrics,
    }
}

/// Count the signals that missed their threshold by at most `margin` of it.
///
/// Only called once every single-signal rule has failed.
fn near_misses(metrics: &MetricResult, thresholds: &Thresholds, margin: f64) -> usize {
    let divergence =
        metrics.pixel_divergence < thresholds.pixel_divergence_max * (1.0 + margin);
    let similarity = metrics.similarity_score > thresholds.similarity_min * (1.0 - margin);
    let hash = metrics.perceptual_hash_distance().is_some_and(|distance| {
        f64::from(distance) < f64::from(thresholds.perceptual_hash_max) * (1.0 + margin)
    });

    [divergence, similarity, hash].into_iter().filter(|&near| near).count()
}

/// A derivative pair found in a batch (`first < second`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairVerdict {
    pub first: usize,
    pub second: usize,
    pub verdict: Verdict,
}

/// A group of mutual near-duplicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    /// Batch indices, ascending
    pub members: Vec<usize>,
    /// The member designated as the original
    pub original_index: usize,
}

impl DuplicateGroup {
    /// Get the number of derivatives (excluding the original)
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Whether the group holds more than one image
    pub fn has_duplicates(&self) -> bool {
        self.members.len() > 1
    }
}

/// Outcome of clustering a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResult {
    /// Every image in exactly one group, ordered by smallest member
    pub groups: Vec<DuplicateGroup>,
    /// Derivative pairs, sorted by `(first, second)`
    pub pairs: Vec<PairVerdict>,
    /// Images in the batch
    pub total_images: usize,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

impl ClusterResult {
    /// One original index per group, in group order
    pub fn originals(&self) -> Vec<usize> {
        self.groups.iter().map(|group| group.original_index).collect()
    }

    /// Groups with more than one member
    pub fn duplicate_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter().filter(|group| group.has_duplicates())
    }

    /// Images judged derivative of their group's original
    pub fn derivative_count(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::HashAlgorithmKind;
    use std::collections::BTreeMap;

    fn metrics(divergence: f64, similarity: f64, phash: Option<u32>) -> MetricResult {
        let mut hash_distances = BTreeMap::from([(HashAlgorithmKind::Difference, 20)]);
        if let Some(distance) = phash {
            hash_distances.insert(HashAlgorithmKind::Perceptual, distance);
        }
        MetricResult {
            pixel_divergence: divergence,
            similarity_score: similarity,
            hash_distances,
            structural_similarity: 0.0,
            hue_similarity: 0.0,
        }
    }

    #[test]
    fn informational_metrics_never_decide() {
        let verdict = fuse(
            MetricResult {
                structural_similarity: 1.0,
                hue_similarity: 1.0,
                ..metrics(200.0, 0.1, Some(40))
            },
            &Thresholds::default(),
        );
        assert!(!verdict.is_derivative);
        assert_eq!(verdict.method, DetectionMethod::None);
    }

    #[test]
    fn divergence_takes_priority() {
        let verdict = fuse(metrics(10.0, 0.95, Some(0)), &Thresholds::default());
        assert!(verdict.is_derivative);
        assert_eq!(verdict.method, DetectionMethod::PixelDivergence);
    }

    #[test]
    fn similarity_fires_second() {
        let verdict = fuse(metrics(80.0, 0.7, Some(3)), &Thresholds::default());
        assert_eq!(verdict.method, DetectionMethod::SimilarityScore);
    }

    #[test]
    fn perceptual_hash_fires_third() {
        let verdict = fuse(metrics(80.0, 0.3, Some(8)), &Thresholds::default());
        assert!(verdict.is_derivative);
        assert_eq!(verdict.method, DetectionMethod::PerceptualHash);
    }

    #[test]
    fn nothing_fires() {
        let verdict = fuse(metrics(120.0, 0.3, Some(30)), &Thresholds::default());
        assert!(!verdict.is_derivative);
        assert_eq!(verdict.method, DetectionMethod::None);
    }

    #[test]
    fn missing_phash_cannot_fire() {
        let verdict = fuse(metrics(120.0, 0.3, None), &Thresholds::default());
        assert_eq!(verdict.method, DetectionMethod::None);
        assert_eq!(verdict.metrics.perceptual_hash_distance(), None);
    }

    #[test]
    fn values_at_threshold_do_not_fire() {
        let verdict = fuse(metrics(50.0, 0.6, Some(15)), &Thresholds::default());
        assert!(!verdict.is_derivative);
        assert_eq!(verdict.method, DetectionMethod::None);
    }

    #[test]
    fn combined_rule_only_fires_when_enabled() {
        // Every signal misses by less than 10%
        let near = metrics(52.0, 0.58, Some(16));

        let plain = fuse(near.clone(), &Thresholds::default());
        assert_eq!(plain.method, DetectionMethod::None);

        let with_rule = Thresholds {
            combined: Some(CombinedRule { margin: 0.1 }),
            ..Thresholds::default()
        };
        let verdict = fuse(near, &with_rule);
        assert!(verdict.is_derivative);
        assert_eq!(verdict.method, DetectionMethod::Combined);
    }

    #[test]
    fn combined_rule_needs_two_near_misses() {
        let with_rule = Thresholds {
            combined: Some(CombinedRule { margin: 0.1 }),
            ..Thresholds::default()
        };
        // Only divergence is close
        let verdict = fuse(metrics(52.0, 0.2, Some(40)), &with_rule);
        assert_eq!(verdict.method, DetectionMethod::None);
    }

    #[test]
    fn fuse_is_deterministic() {
        let m = metrics(70.0, 0.65, Some(12));
        assert_eq!(
            fuse(m.clone(), &Thresholds::default()),
            fuse(m, &Thresholds::default())
        );
    }

    #[test]
    fn method_serializes_as_display_text() {
        let json = serde_json::to_string(&DetectionMethod::Combined).unwrap();
        assert_eq!(json, "\"Combined Analysis\"");
        assert_eq!(DetectionMethod::PerceptualHash.to_string(), "Perceptual Hash");
    }

    #[test]
    fn originals_follow_group_order() {
        let result = ClusterResult {
            groups: vec![
                DuplicateGroup {
                    members: vec![0, 2],
                    original_index: 0,
                },
                DuplicateGroup {
                    members: vec![1],
                    original_index: 1,
                },
            ],
            pairs: Vec::new(),
            total_images: 3,
            duration_ms: 0,
        };

        assert_eq!(result.originals(), vec![0, 1]);
        assert_eq!(result.duplicate_groups().count(), 1);
        assert_eq!(result.derivative_count(), 1);
    }
}
