//! Input collection using walkdir.

use super::filter::{ExtensionFilter, Rejection};
use super::{ImageCollector, IntakeFile};
use crate::error::IntakeError;
use crate::events::{null_sender, Event, EventSender, IntakeEvent};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Default upload size limit (5 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Configuration for input collection
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Whether to follow symbolic links inside directories
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
    /// Largest accepted file in bytes
    pub max_file_size: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: false,
            max_depth: None,
            extensions: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Collector that expands directories with the walkdir crate.
///
/// Files named directly must pass the filter or collection fails. Files found
/// inside a directory that do not pass are skipped and reported as events.
#[derive(Debug, Clone)]
pub struct WalkDirIntake {
    config: IntakeConfig,
    filter: ExtensionFilter,
}

impl WalkDirIntake {
    /// Create a new collector with the given configuration
    pub fn new(config: IntakeConfig) -> Self {
        let mut filter = ExtensionFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions);
        }

        Self { config, filter }
    }

    fn file_size(path: &Path) -> Result<u64, IntakeError> {
        fs::metadata(path)
            .map(|metadata| metadata.len())
            .map_err(|source| IntakeError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Accept a file named directly by the caller
    fn collect_file(&self, path: &Path, events: &EventSender) -> Result<IntakeFile, IntakeError> {
        if self.filter.check(path) == Err(Rejection::Extension) {
            return Err(IntakeError::UnsupportedExtension {
                path: path.to_path_buf(),
            });
        }

        let size = Self::file_size(path)?;
        if size > self.config.max_file_size {
            return Err(IntakeError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.config.max_file_size,
            });
        }

        events.send(Event::Intake(IntakeEvent::ImageAccepted {
            path: path.to_path_buf(),
            size,
        }));
        Ok(IntakeFile {
            path: path.to_path_buf(),
            size,
        })
    }

    /// Expand a directory in file-name order
    fn collect_directory(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<Vec<IntakeFile>, IntakeError> {
        let mut files = Vec::new();

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.config.include_hidden;
        let entries = walker.into_iter().filter_entry(|entry| {
            include_hidden
                || entry.depth() == 0
                || !entry.file_type().is_dir()
                || !ExtensionFilter::is_hidden(entry.path())
        });

        for entry_result in entries {
            let entry = entry_result.map_err(|e| IntakeError::Io {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
                source: std::io::Error::from(e),
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let skip = |reason: String| {
                debug!(path = %path.display(), %reason, "skipping file");
                events.send(Event::Intake(IntakeEvent::Skipped {
                    path: path.to_path_buf(),
                    reason,
                }));
            };

            match self.filter.check(path) {
                Ok(()) => {}
                Err(Rejection::Hidden) => {
                    skip("hidden file".to_string());
                    continue;
                }
                Err(Rejection::Extension) => {
                    skip("not an allowed image type".to_string());
                    continue;
                }
            }

            let size = Self::file_size(path)?;
            if size > self.config.max_file_size {
                warn!(
                    path = %path.display(),
                    size,
                    limit = self.config.max_file_size,
                    "file above size limit"
                );
                skip(format!(
                    "{} bytes exceeds the {} byte limit",
                    size, self.config.max_file_size
                ));
                continue;
            }

            events.send(Event::Intake(IntakeEvent::ImageAccepted {
                path: path.to_path_buf(),
                size,
            }));
            files.push(IntakeFile {
                path: path.to_path_buf(),
                size,
            });
        }

        Ok(files)
    }
}

impl Default for WalkDirIntake {
    fn default() -> Self {
        Self::new(IntakeConfig::default())
    }
}

impl ImageCollector for WalkDirIntake {
    fn collect(&self, paths: &[PathBuf]) -> Result<Vec<IntakeFile>, IntakeError> {
        self.collect_with_events(paths, &null_sender())
    }

    fn collect_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<Vec<IntakeFile>, IntakeError> {
        events.send(Event::Intake(IntakeEvent::Started {
            paths: paths.to_vec(),
        }));

        let mut all_files = Vec::new();

        for path in paths {
            if !path.exists() {
                return Err(IntakeError::NotFound { path: path.clone() });
            }

            if path.is_dir() {
                all_files.extend(self.collect_directory(path, events)?);
            } else {
                all_files.push(self.collect_file(path, events)?);
            }
        }

        debug!(inputs = paths.len(), images = all_files.len(), "intake finished");

        events.send(Event::Intake(IntakeEvent::Completed {
            total_images: all_files.len(),
        }));

        Ok(all_files)
    }
}
