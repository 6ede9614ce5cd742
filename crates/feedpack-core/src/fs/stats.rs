//! Read-only aggregations over a directory tree.

use std::fs;
use std::path::Path;

use anyhow::Context;

/// Number of non-directory entries under `dir`, recursively.
pub fn count_files(dir: &Path) -> anyhow::Result<u64> {
    let mut count = 0;
    for entry in read_sorted(dir)? {
        if is_real_dir(&entry)? {
            count += count_files(&entry.path())?;
        } else {
            count += 1;
        }
    }
    Ok(count)
}

/// Total size in bytes of all files under `dir`, recursively.
pub fn dir_size(dir: &Path) -> anyhow::Result<u64> {
    let mut size = 0;
    for entry in read_sorted(dir)? {
        if is_real_dir(&entry)? {
            size += dir_size(&entry.path())?;
        } else {
            size += entry
                .metadata()
                .with_context(|| format!("Failed to stat file: {}", entry.path().display()))?
                .len();
        }
    }
    Ok(size)
}

/// Directory without following symlinks.
fn is_real_dir(entry: &fs::DirEntry) -> anyhow::Result<bool> {
    let ty = entry
        .file_type()
        .with_context(|| format!("Failed to stat: {}", entry.path().display()))?;
    Ok(ty.is_dir())
}

fn read_sorted(dir: &Path) -> anyhow::Result<Vec<fs::DirEntry>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    let mut entries: Vec<_> = entries
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read directory entries: {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}
