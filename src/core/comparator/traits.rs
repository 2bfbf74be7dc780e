//! Trait definitions for fusion strategies.

use super::{fuse, Thresholds, Verdict};
use crate::core::metrics::MetricResult;
use crate::error::ConfigError;

/// Strategy trait for turning a pair's metrics into a verdict
pub trait FusionStrategy: Send + Sync {
    /// Decide whether the metrics describe a derivative pair
    fn fuse(&self, metrics: MetricResult) -> Verdict;

    /// Get the thresholds used
    fn thresholds(&self) -> &Thresholds;

    /// Human-readable description of the strategy
    fn description(&self) -> String;
}

/// Fixed-priority threshold strategy.
///
/// Checks divergence, then similarity, then pHash distance; the first
/// signal that passes decides the method.
#[derive(Debug, Clone, Default)]
pub struct PriorityStrategy {
    thresholds: Thresholds,
}

impl PriorityStrategy {
    /// Create a strategy after validating the thresholds
    pub fn new(thresholds: Thresholds) -> Result<Self, ConfigError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }
}

impl FusionStrategy for PriorityStrategy {
    fn fuse(&self, metrics: MetricResult) -> Verdict {
        fuse(metrics, &self.thresholds)
    }

    fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    fn description(&self) -> String {
        let mut description = format!(
            "Priority fusion: divergence < {}, similarity > {}, pHash distance < {}",
            self.thresholds.pixel_divergence_max,
            self.thresholds.similarity_min,
            self.thresholds.perceptual_hash_max
        );
        if let Some(rule) = self.thresholds.combined {
            description.push_str(&format!(", combined within {:.0}%", rule.margin * 100.0));
        }
        description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comparator::{CombinedRule, DetectionMethod};
    use std::collections::BTreeMap;

    #[test]
    fn invalid_thresholds_are_rejected() {
        let thresholds = Thresholds {
            similarity_min: 1.5,
            ..Thresholds::default()
        };
        assert!(PriorityStrategy::new(thresholds).is_err());
    }

    #[test]
    fn strategy_delegates_to_fuse() {
        let strategy = PriorityStrategy::default();
        let verdict = strategy.fuse(MetricResult {
            pixel_divergence: 3.0,
            similarity_score: 0.1,
            hash_distances: BTreeMap::new(),
            structural_similarity: 0.0,
            hue_similarity: 0.0,
        });
        assert_eq!(verdict.method, DetectionMethod::PixelDivergence);
    }

    #[test]
    fn description_mentions_thresholds() {
        let strategy = PriorityStrategy::new(Thresholds {
            combined: Some(CombinedRule { margin: 0.2 }),
            ..Thresholds::default()
        })
        .unwrap();

        let description = strategy.description();
        assert!(description.contains("50"));
        assert!(description.contains("0.6"));
        assert!(description.contains("20%"));
    }
}
