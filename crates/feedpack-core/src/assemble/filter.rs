//! Traversal policy for the backend source tree.
//!
//! Listing is kept free of copy side effects so the selection rules can be
//! checked on their own.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use walkdir::WalkDir;

/// A file discovered under the backend root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Path relative to the backend root.
    pub relative_path: PathBuf,
    /// Matched the source rule but is named in the excluded-file set.
    pub excluded: bool,
}

/// Which files are firmware sources and which are left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    /// Extension of firmware source files, without the dot.
    pub source_extension: String,
    pub excluded_files: BTreeSet<String>,
    pub excluded_dirs: BTreeSet<String>,
    /// Directory (relative to the root) whose metadata files are also shipped.
    pub metadata_dir: PathBuf,
    pub metadata_extensions: BTreeSet<String>,
    /// Relative paths never descended into, e.g. an output directory that
    /// lives inside the backend under a non-excluded name.
    pub skipped_paths: Vec<PathBuf>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            source_extension: "py".to_string(),
            excluded_files: to_set(&[
                "api_old.py",
                "test_gpio.py",
                "test_servo.py",
                "test_scheduler.py",
            ]),
            excluded_dirs: to_set(&["dist", "node_modules", "__pycache__"]),
            metadata_dir: PathBuf::from("ota"),
            metadata_extensions: to_set(&["json", "md"]),
            skipped_paths: Vec::new(),
        }
    }
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl FilterPolicy {
    pub fn with_skipped_path(mut self, relative: impl Into<PathBuf>) -> Self {
        self.skipped_paths.push(relative.into());
        self
    }

    pub fn is_excluded_dir(&self, name: &OsStr) -> bool {
        name.to_str()
            .is_some_and(|n| self.excluded_dirs.contains(n))
    }

    /// Whether `name` is a firmware source file by extension.
    pub fn is_source_file(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext == self.source_extension)
    }

    /// Classify a file by its path relative to the root.
    ///
    /// `None` means the file is not part of the firmware at all;
    /// `Some(excluded)` means it matched a selection rule.
    pub fn classify(&self, relative: &Path) -> Option<bool> {
        let name = relative.file_name()?.to_str()?;

        if self.is_source_file(name) {
            return Some(self.excluded_files.contains(name));
        }

        let in_metadata_dir = relative.parent() == Some(self.metadata_dir.as_path());
        let is_metadata = relative
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.metadata_extensions.contains(ext));
        if in_metadata_dir && is_metadata {
            return Some(false);
        }

        None
    }
}

/// Walk `root` and list every file a selection rule matched, sorted by path.
pub fn list_filtered_entries(root: &Path, policy: &FilterPolicy) -> anyhow::Result<Vec<FileEntry>> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            if policy.is_excluded_dir(entry.file_name()) {
                return false;
            }
            match entry.path().strip_prefix(root) {
                Ok(rel) => !policy.skipped_paths.iter().any(|p| p == rel),
                Err(_) => true,
            }
        });

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry
            .with_context(|| format!("Failed to read directory entry under {}", root.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("Failed to strip source prefix from {}", entry.path().display()))?;

        if let Some(excluded) = policy.classify(relative) {
            entries.push(FileEntry {
                relative_path: relative.to_path_buf(),
                excluded,
            });
        }
    }

    Ok(entries)
}
