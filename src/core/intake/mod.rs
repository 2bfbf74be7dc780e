//! # Intake Module
//!
//! Collects encoded images from disk for the detector.
//!
//! Plays the role of an upload endpoint: files are checked against an
//! extension allow-list (jpg, jpeg, png, bmp, webp, tiff, tif, gif) and a
//! size limit (5 MiB by default) before any bytes are read.
//!
//! ## Example
//! ```rust,ignore
//! use pixel_peep::core::intake::{ImageCollector, WalkDirIntake, load_all};
//!
//! let files = WalkDirIntake::default().collect(&["uploads/".into()])?;
//! let images = load_all(&files)?;
//! ```

mod filter;
mod walker;

pub use filter::{ExtensionFilter, Rejection, DEFAULT_EXTENSIONS};
pub use walker::{IntakeConfig, WalkDirIntake, DEFAULT_MAX_FILE_SIZE};

use crate::core::normalizer::ImageBuffer;
use crate::error::{DetectorError, IntakeError};
use crate::events::EventSender;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// An accepted input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeFile {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl IntakeFile {
    /// Read and decode the file
    pub fn load(&self) -> Result<ImageBuffer, DetectorError> {
        let bytes = fs::read(&self.path).map_err(|source| IntakeError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(ImageBuffer::decode(bytes)?)
    }

    /// Path shown to users
    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read and decode files in parallel, preserving order
pub fn load_all(files: &[IntakeFile]) -> Result<Vec<ImageBuffer>, DetectorError> {
    files.par_iter().map(IntakeFile::load).collect()
}

/// Trait for input collectors
///
/// Implement this trait to feed the detector from somewhere other than
/// the local filesystem.
pub trait ImageCollector: Send + Sync {
    /// Expand paths into accepted files
    fn collect(&self, paths: &[PathBuf]) -> Result<Vec<IntakeFile>, IntakeError>;

    /// Expand paths with progress reporting via events
    fn collect_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<Vec<IntakeFile>, IntakeError>;
}
