//! Recursive discovery of candidate files under a target directory.

use crate::config::CompiledFilters;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Errors that abort a scan before any file is processed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Walks a directory tree and yields files accepted by the filters.
#[derive(Debug)]
pub struct Scanner<'a> {
    filters: &'a CompiledFilters,
    skip_dir: Option<PathBuf>,
}

impl<'a> Scanner<'a> {
    pub fn new(filters: &'a CompiledFilters) -> Self {
        Self {
            filters,
            skip_dir: None,
        }
    }

    /// Does not descend into `dir` when it lies strictly below the scan root.
    ///
    /// Used for an output root nested inside the target, so files that were
    /// already sorted are not picked up again.
    pub fn skip_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.skip_dir = Some(dir.into());
        self
    }

    /// Lists every accepted file below `root`, sorted by path.
    ///
    /// Unreadable entries are logged and skipped. Symlinks are not followed.
    ///
    /// # Errors
    ///
    /// Fails only when `root` itself is missing or not a directory.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let skip_dir = self
            .skip_dir
            .as_ref()
            .and_then(|dir| dir.canonicalize().ok())
            .filter(|dir| root.canonicalize().is_ok_and(|root| *dir != root));

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && skip_dir.as_ref().is_some_and(|skip| {
                        entry.path().canonicalize().is_ok_and(|path| path == *skip)
                    }))
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error accessing entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if self.filters.should_include(relative) {
                files.push(entry.into_path());
            } else {
                debug!(path = %relative.display(), "filtered out");
            }
        }

        debug!(root = %root.display(), count = files.len(), "scan complete");
        Ok(files)
    }
}
