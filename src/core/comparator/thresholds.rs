//! Decision thresholds for the verdict fuser.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Opt-in rule that flags a pair when several signals narrowly miss
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinedRule {
    /// Fraction of each threshold a failing signal may miss by and still count
    pub margin: f64,
}

impl Default for CombinedRule {
    fn default() -> Self {
        Self { margin: 0.1 }
    }
}

/// Thresholds applied by the fuser, all compared strictly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Thresholds {
    /// Divergence below this marks a derivative
    pub pixel_divergence_max: f64,
    /// Similarity above this marks a derivative
    pub similarity_min: f64,
    /// pHash distance below this marks a derivative
    pub perceptual_hash_max: u32,
    /// Near-miss rule, disabled unless set
    pub combined: Option<CombinedRule>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pixel_divergence_max: 50.0,
            similarity_min: 0.6,
            perceptual_hash_max: 15,
            combined: None,
        }
    }
}

impl Thresholds {
    /// Check every threshold is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pixel_divergence_max.is_finite() || self.pixel_divergence_max < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "pixel_divergence_max",
                value: self.pixel_divergence_max,
                reason: "must be a finite, non-negative number",
            });
        }

        if !(0.0..=1.0).contains(&self.similarity_min) {
            return Err(ConfigError::InvalidThreshold {
                name: "similarity_min",
                value: self.similarity_min,
                reason: "must lie within [0, 1]",
            });
        }

        if self.perceptual_hash_max > 64 {
            return Err(ConfigError::InvalidThreshold {
                name: "perceptual_hash_max",
                value: f64::from(self.perceptual_hash_max),
                reason: "cannot exceed the 64-bit hash length",
            });
        }

        if let Some(rule) = self.combined {
            if !rule.margin.is_finite() || rule.margin < 0.0 {
                return Err(ConfigError::InvalidMargin { value: rule.margin });
            }
        }

        Ok(())
    }

    /// Parse and validate thresholds from JSON; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let thresholds: Self = serde_json::from_str(json).map_err(|e| ConfigError::Malformed {
            reason: e.to_string(),
        })?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Load and validate thresholds from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_json_str(&text).map_err(|e| match e {
            ConfigError::Malformed { reason } => ConfigError::Unreadable {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }
}
