//! File filtering logic for intake.

use std::collections::HashSet;
use std::path::Path;

/// Extensions accepted by default
pub const DEFAULT_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "bmp", "webp", "tiff", "tif", "gif"];

/// Why a file was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Hidden,
    Extension,
}

/// Filters files to determine if they are accepted images
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    /// Lowercase file extensions to include
    extensions: HashSet<String>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl ExtensionFilter {
    /// Create a new filter with the default allow-list
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Override the list of extensions to accept
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Whether a file or directory name counts as hidden
    pub fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with('.'))
    }

    /// Check a file against the filter
    pub fn check(&self, path: &Path) -> Result<(), Rejection> {
        if !self.include_hidden && Self::is_hidden(path) {
            return Err(Rejection::Hidden);
        }

        let allowed = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()));

        if allowed {
            Ok(())
        } else {
            Err(Rejection::Extension)
        }
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        self.check(path).is_ok()
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new()
    }
}
