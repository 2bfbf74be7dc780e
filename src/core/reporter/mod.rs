//! # Reporter Module
//!
//! Turns verdicts and cluster results into output a person or a UI can use.
//!
//! ## Outputs
//! 1. **Comparison report**: one JSON object per candidate
//!    (`pixelDivergence`, `similarityScore`, `perceptualHashDistance`,
//!    `isDerivative`, `detectionMethod`)
//! 2. **Batch report**: `groups` as arrays of indices plus one `originals` entry per group
//! 3. **Explanation**: plain-language account of which signal decided and why

mod explanation;
mod visualization;

pub use explanation::{DetailedReporter, DuplicateExplanation, TechnicalDetails};
pub use visualization::HashVisualizer;

use crate::core::comparator::{ClusterResult, DetectionMethod, Verdict};
use crate::core::hasher::HashAlgorithmKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Presentation record for one reference/candidate comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    /// Display name of the candidate (usually its path)
    pub candidate: String,
    pub pixel_divergence: f64,
    pub similarity_score: f64,
    /// `null` when the perceptual hash was disabled
    pub perceptual_hash_distance: Option<u32>,
    pub is_derivative: bool,
    pub detection_method: DetectionMethod,
    pub hash_distances: BTreeMap<HashAlgorithmKind, u32>,
    /// Informational; not part of the verdict
    pub structural_similarity: f64,
    /// Informational; not part of the verdict
    pub hue_similarity: f64,
}

impl ComparisonReport {
    /// Build a report from a verdict
    pub fn new(candidate: impl Into<String>, verdict: &Verdict) -> Self {
        Self {
            candidate: candidate.into(),
            pixel_divergence: verdict.metrics.pixel_divergence,
            similarity_score: verdict.metrics.similarity_score,
            perceptual_hash_distance: verdict.metrics.perceptual_hash_distance(),
            is_derivative: verdict.is_derivative,
            detection_method: verdict.method,
            hash_distances: verdict.metrics.hash_distances.clone(),
            structural_similarity: verdict.metrics.structural_similarity,
            hue_similarity: verdict.metrics.hue_similarity,
        }
    }
}

/// One derivative pair inside a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairReport {
    pub first: usize,
    pub second: usize,
    pub detection_method: DetectionMethod,
}

/// Presentation record for a clustered batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Display names, indexed like the batch
    pub images: Vec<String>,
    /// Every image appears in exactly one group
    pub groups: Vec<Vec<usize>>,
    /// `originals[k]` is the chosen original of `groups[k]`
    pub originals: Vec<usize>,
    /// Derivative pairs that produced the groups
    pub matches: Vec<PairReport>,
    pub duration_ms: u64,
}

impl BatchReport {
    /// Build a report from a cluster result and the batch's display names
    pub fn new(images: Vec<String>, result: &ClusterResult) -> Self {
        Self {
            images,
            groups: result
                .groups
                .iter()
                .map(|group| group.members.clone())
                .collect(),
            originals: result.originals(),
            matches: result
                .pairs
                .iter()
                .map(|pair| PairReport {
                    first: pair.first,
                    second: pair.second,
                    detection_method: pair.verdict.method,
                })
                .collect(),
            duration_ms: result.duration_ms,
        }
    }

    /// Display name for a batch index, falling back to `#index`
    pub fn name(&self, index: usize) -> String {
        self.images
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{}", index))
    }

    /// Groups with more than one member
    pub fn duplicate_groups(&self) -> impl Iterator<Item = (&Vec<usize>, usize)> {
        self.groups
            .iter()
            .zip(self.originals.iter().copied())
            .filter(|(members, _)| members.len() > 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comparator::{DuplicateGroup, PairVerdict};
    use crate::core::metrics::MetricResult;
    use serde_json::Value;

    fn verdict(phash: Option<u32>) -> Verdict {
        let mut hash_distances = BTreeMap::new();
        hash_distances.insert(HashAlgorithmKind::Difference, 3);
        if let Some(distance) = phash {
            hash_distances.insert(HashAlgorithmKind::Perceptual, distance);
        }
        Verdict {
            is_derivative: true,
            method: DetectionMethod::PixelDivergence,
            metrics: MetricResult {
                pixel_divergence: 6.5,
                similarity_score: 0.99,
                hash_distances,
                structural_similarity: 0.97,
                hue_similarity: 0.92,
            },
        }
    }

    #[test]
    fn comparison_report_uses_presentation_names() {
        let report = ComparisonReport::new("copy.jpg", &verdict(Some(2)));
        let json: Value = serde_json::to_value(&report).unwrap();

        assert_eq!(json["candidate"], "copy.jpg");
        assert_eq!(json["pixelDivergence"], 6.5);
        assert_eq!(json["similarityScore"], 0.99);
        assert_eq!(json["perceptualHashDistance"], 2);
        assert_eq!(json["isDerivative"], true);
        assert_eq!(json["detectionMethod"], "Pixel Divergence");
        assert_eq!(json["hashDistances"]["dHash"], 3);
        assert_eq!(json["hashDistances"]["pHash"], 2);
        assert_eq!(json["structuralSimilarity"], 0.97);
        assert_eq!(json["hueSimilarity"], 0.92);
    }

    #[test]
    fn missing_phash_serializes_as_null() {
        let report = ComparisonReport::new("copy.jpg", &verdict(None));
        let json: Value = serde_json::to_value(&report).unwrap();

        assert!(json["perceptualHashDistance"].is_null());
    }

    #[test]
    fn batch_report_lists_groups_and_originals() {
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
            pairs: vec![PairVerdict {
                first: 0,
                second: 2,
                verdict: verdict(Some(0)),
            }],
            total_images: 3,
            duration_ms: 4,
        };
        let names = vec!["a.png".to_string(), "b.png".to_string(), "c.jpg".to_string()];
        let report = BatchReport::new(names, &result);
        let json: Value = serde_json::to_value(&report).unwrap();

        assert_eq!(json["groups"], serde_json::json!([[0, 2], [1]]));
        assert_eq!(json["originals"], serde_json::json!([0, 1]));
        assert_eq!(json["matches"][0]["detectionMethod"], "Pixel Divergence");
        assert_eq!(report.duplicate_groups().count(), 1);
        assert_eq!(report.name(2), "c.jpg");
        assert_eq!(report.name(9), "#9");
    }
}
