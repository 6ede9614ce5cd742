//! Deterministic tree hashing for build output fingerprints.
//!
//! Two builds of an unchanged source tree hash the same once the generated
//! manifest is left out.

use anyhow::Context;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

const FILE_MARKER: u8 = 0x00;
const DIR_MARKER: u8 = 0xFF;

/// Fingerprint everything under `path`.
///
/// Entries are visited in name order. Each file contributes its
/// `/`-separated relative path, a `0x00` marker and its bytes; each
/// directory contributes its relative path and `0xFF`. The result is the
/// blake3 digest as lowercase hex.
pub fn hash_tree(path: &Path) -> anyhow::Result<String> {
    hash_tree_excluding(path, &[])
}

/// Like [`hash_tree`], skipping the named entries at the top level only.
///
/// ```no_run
/// use feedpack_core::fs::hash_tree_excluding;
/// use std::path::Path;
///
/// let hash = hash_tree_excluding(Path::new("dist"), &["README.md"])?;
/// assert_eq!(hash.len(), 64);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn hash_tree_excluding(path: &Path, skip_top_level: &[&str]) -> anyhow::Result<String> {
    if !path.is_dir() {
        anyhow::bail!("Not a directory: {}", path.display());
    }

    let walker = WalkDir::new(path)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() != 1
                || !skip_top_level
                    .iter()
                    .any(|name| e.file_name().to_string_lossy() == *name)
        });

    let mut hasher = blake3::Hasher::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        let rel = relative_key(path, entry.path())?;
        let ty = entry.file_type();

        if ty.is_dir() {
            hasher.update(rel.as_bytes());
            hasher.update(&[DIR_MARKER]);
        } else if ty.is_file() {
            let content = fs::read(entry.path())
                .with_context(|| format!("Failed to read file: {}", entry.path().display()))?;
            hasher.update(rel.as_bytes());
            hasher.update(&[FILE_MARKER]);
            hasher.update(&content);
        } else {
            anyhow::bail!("Cannot hash non-regular entry: {}", entry.path().display());
        }
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Relative path with `/` separators so hashes agree across platforms.
fn relative_key(root: &Path, path: &Path) -> anyhow::Result<String> {
    let rel = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
