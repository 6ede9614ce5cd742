//! Copy helpers that tolerate per-file failures.
//!
//! A single unreadable or unwritable file must not abort a whole traversal,
//! so file-level errors are returned as [`CopyFailure`] records while
//! directory-level errors still propagate.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

/// A file that could not be copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyFailure {
    pub src: PathBuf,
    pub dest: PathBuf,
    pub error: String,
}

/// Create `path` and any missing ancestors.
///
/// Returns `true` when the directory was created, `false` when it already
/// existed.
pub fn ensure_dir(path: &Path) -> anyhow::Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "created directory");
    Ok(true)
}

/// Copy one file byte-for-byte, creating the destination parent first.
pub fn copy_file(src: &Path, dest: &Path) -> Result<(), CopyFailure> {
    let result = (|| -> anyhow::Result<()> {
        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }
        fs::copy(src, dest).with_context(|| {
            format!(
                "Failed to copy file from {} to {}",
                src.display(),
                dest.display()
            )
        })?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            tracing::debug!(src = %src.display(), dest = %dest.display(), "copied");
            Ok(())
        }
        Err(err) => {
            let failure = CopyFailure {
                src: src.to_path_buf(),
                dest: dest.to_path_buf(),
                error: format!("{:#}", err),
            };
            tracing::warn!(src = %src.display(), error = %failure.error, "copy failed");
            Err(failure)
        }
    }
}

/// Mirror every file under `src` into `dest`.
///
/// Hidden files are included. Files already present in `dest` that have no
/// counterpart in `src` are left alone. Returns the files that failed to
/// copy; unreadable directories are an error.
pub fn copy_dir_recursive(src: &Path, dest: &Path) -> anyhow::Result<Vec<CopyFailure>> {
    let mut failures = Vec::new();
    copy_dir_inner(src, dest, &mut failures)?;
    Ok(failures)
}

fn copy_dir_inner(src: &Path, dest: &Path, failures: &mut Vec<CopyFailure>) -> anyhow::Result<()> {
    ensure_dir(dest)?;

    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read dir: {}", src.display()))?
    {
        let entry =
            entry.with_context(|| format!("Failed to read dir entry: {}", src.display()))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let ty = entry
            .file_type()
            .with_context(|| format!("Failed to stat: {}", from.display()))?;

        // Symlinked directories go through copy_file and fail there; never followed.
        if ty.is_dir() {
            copy_dir_inner(&from, &to, failures)?;
        } else if let Err(failure) = copy_file(&from, &to) {
            failures.push(failure);
        }
    }
    Ok(())
}
