//! # Error Module
//!
//! Error types for the derivative image detector.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - sizes, algorithms, paths, what went wrong
//! - **Deterministic** - every error is a function of the input, nothing here is retried

use crate::core::hasher::HashAlgorithmKind;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level detector error
#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Intake(#[from] IntakeError),

    #[error("Nothing to compare: {0}")]
    EmptyBatch(String),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while decoding and normalizing an image
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("Failed to decode image: {reason}")]
    Decode { reason: String },

    #[error("Invalid grid dimensions {width}x{height} (both must be positive)")]
    Dimension { width: u32, height: u32 },

    #[error("Image is empty (decoded to {width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Invalid blur sigma {sigma} (must be finite and non-negative)")]
    InvalidBlur { sigma: f32 },

    #[error("Resize failed: {0}")]
    Resize(String),

    #[error("Expected a {expected} grid, got {found}")]
    GridShape { expected: String, found: String },
}

/// Errors raised while comparing fingerprints or pixel grids
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error(
        "Cannot compare a {left_bits}-bit {left} hash with a {right_bits}-bit {right} hash"
    )]
    IncomparableHash {
        left: HashAlgorithmKind,
        left_bits: u32,
        right: HashAlgorithmKind,
        right_bits: u32,
    },

    #[error("Pixel grids differ in shape: {left} vs {right}")]
    GridMismatch { left: String, right: String },

    #[error("Image has zero intensity variance; correlation is undefined")]
    DegenerateImage,

    #[error("Grid {shape} is smaller than the {window}x{window} comparison window")]
    WindowTooLarge { window: u32, shape: String },
}

/// Errors in detector configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid threshold {name} = {value}: {reason}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Invalid combined-rule margin {value} (must be finite and non-negative)")]
    InvalidMargin { value: f64 },

    #[error("Failed to read thresholds from {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Malformed thresholds JSON: {reason}")]
    Malformed { reason: String },
}

/// Errors raised while collecting input images from disk
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Input not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File {path} is not an allowed image type")]
    UnsupportedExtension { path: PathBuf },

    #[error("File {path} is {size} bytes, above the {limit} byte limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DetectorError>;
