//! # Core Module
//!
//! The presentation-agnostic derivative detection engine.
//!
//! ## Modules
//! - `normalizer` - Decodes images and reduces them to canonical pixel grids
//! - `hasher` - Computes difference and perceptual fingerprints
//! - `metrics` - Hamming distance, pixel divergence and similarity score
//! - `comparator` - Fuses metrics into verdicts and clusters batches
//! - `profile` - Per-image precomputation shared by every comparison
//! - `cache` - Reuses profiles for byte-identical inputs
//! - `quality` - Laplacian sharpness, used to pick group originals
//! - `pipeline` - The `Detector` that ties the stages together
//! - `intake` - Collects input files with type and size checks
//! - `reporter` - Output records and plain-language explanations

pub mod cache;
pub mod comparator;
pub mod hasher;
pub mod intake;
pub mod metrics;
pub mod normalizer;
pub mod pipeline;
pub mod profile;
pub mod quality;
pub mod reporter;

// Re-export commonly used types
pub use comparator::{
    ClusterResult, DetectionMethod, DuplicateGroup, OriginalPolicy, Thresholds, Verdict,
};
pub use hasher::{DcTerm, Fingerprint, HashAlgorithmKind};
pub use metrics::MetricResult;
pub use normalizer::{normalize, ImageBuffer, NormalizeOptions, PixelGrid};
pub use pipeline::{Detector, DetectorBuilder};
pub use reporter::{BatchReport, ComparisonReport, DuplicateExplanation};
