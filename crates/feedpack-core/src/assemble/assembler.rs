//! Produce the deployable file set in the output directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use super::filter::{FileEntry, FilterPolicy, list_filtered_entries};
use crate::context::{BuildContext, DATA_DIR_NAME, UI_DIR_NAME};
use crate::fs::{CopyFailure, copy_dir_recursive, copy_file, ensure_dir};
use crate::types::DEFAULT_DATA_FILES;

/// Root-level third-party runtime files always shipped.
pub const VENDOR_PREFIX: &str = "microdot";

/// Network credentials file copied verbatim when present.
pub const CREDENTIALS_FILE: &str = "wifi.dat";

/// Where the output's `data/` directory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Existing field data copied from the backend tree.
    Copied,
    /// No data directory existed; templates were written.
    Defaults,
    /// Not applicable to this build mode.
    #[default]
    Skipped,
}

/// Everything the assembler did, for reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssemblyReport {
    /// Output-relative paths of copied sources, vendor and credentials files.
    pub copied: BTreeSet<PathBuf>,
    /// Backend-relative paths skipped by the excluded-file rule.
    pub excluded: Vec<PathBuf>,
    pub failures: Vec<CopyFailure>,
    pub warnings: Vec<String>,
    pub data_source: DataSource,
}

impl AssemblyReport {
    fn record(&mut self, relative: &Path, result: Result<(), CopyFailure>) {
        match result {
            Ok(()) => {
                self.copied.insert(relative.to_path_buf());
            }
            Err(failure) => self.failures.push(failure),
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}

pub struct Assembler<'a> {
    ctx: &'a BuildContext,
    policy: FilterPolicy,
}

impl<'a> Assembler<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        let mut policy = FilterPolicy::default();
        if let Some(rel) = ctx.output_within_backend() {
            policy = policy.with_skipped_path(rel);
        }
        Self { ctx, policy }
    }

    /// Delete and recreate the output directory.
    pub fn reset_output(&self) -> anyhow::Result<()> {
        let out = self.ctx.output_dir();
        if out.exists() {
            fs::remove_dir_all(out)
                .with_context(|| format!("Failed to clean output directory: {}", out.display()))?;
            tracing::info!(path = %out.display(), "cleaned output directory");
        }
        ensure_dir(out)?;
        Ok(())
    }

    /// List the backend tree and copy what the filter selects.
    pub fn copy_sources(&self, report: &mut AssemblyReport) -> anyhow::Result<()> {
        let entries = list_filtered_entries(self.ctx.backend_dir(), &self.policy)?;
        self.copy_entries(entries, report);
        Ok(())
    }

    /// Copy every non-excluded entry, keeping relative paths. Excluded
    /// entries are recorded only.
    pub fn copy_entries(&self, entries: Vec<FileEntry>, report: &mut AssemblyReport) {
        for entry in entries {
            if entry.excluded {
                tracing::debug!(path = %entry.relative_path.display(), "excluded");
                report.excluded.push(entry.relative_path);
                continue;
            }
            let result = copy_file(
                &self.ctx.backend_dir().join(&entry.relative_path),
                &self.ctx.output_dir().join(&entry.relative_path),
            );
            report.record(&entry.relative_path, result);
        }
    }

    /// Copy root-level vendor runtime files regardless of the source filter.
    pub fn copy_vendor_files(&self, report: &mut AssemblyReport) -> anyhow::Result<()> {
        let root = self.ctx.backend_dir();
        let mut names: Vec<String> = fs::read_dir(root)
            .with_context(|| format!("Failed to read dir: {}", root.display()))?
            .filter_map(Result::ok)
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| name.starts_with(VENDOR_PREFIX) && self.policy.is_source_file(name))
            .collect();
        names.sort();

        for name in names {
            let result = copy_file(&root.join(&name), &self.ctx.output_dir().join(&name));
            report.record(Path::new(&name), result);
        }
        Ok(())
    }

    /// Copy the credentials file if one exists at the backend root.
    pub fn copy_credentials(&self, report: &mut AssemblyReport) {
        let src = self.ctx.backend_dir().join(CREDENTIALS_FILE);
        if !src.is_file() {
            tracing::debug!("no {} found", CREDENTIALS_FILE);
            return;
        }
        let result = copy_file(&src, &self.ctx.output_dir().join(CREDENTIALS_FILE));
        report.record(Path::new(CREDENTIALS_FILE), result);
    }

    /// Copy the staged web UI into the output.
    pub fn copy_ui_assets(&self, report: &mut AssemblyReport) -> anyhow::Result<()> {
        let src = self.ctx.staged_ui_dir();
        if !src.is_dir() {
            report.warn(format!("{} directory not found", UI_DIR_NAME));
            return Ok(());
        }
        tracing::info!("copying UI directory");
        let failures = copy_dir_recursive(&src, &self.ctx.output_dir().join(UI_DIR_NAME))?;
        report.failures.extend(failures);
        Ok(())
    }

    /// Copy existing field data verbatim, or write the default templates.
    pub fn copy_data_files(&self, report: &mut AssemblyReport) -> anyhow::Result<DataSource> {
        let src = self.ctx.data_dir();
        let dest = self.ctx.output_dir().join(DATA_DIR_NAME);

        let source = if src.is_dir() {
            tracing::info!("found existing data directory, copying");
            let failures = copy_dir_recursive(&src, &dest)?;
            report.failures.extend(failures);
            DataSource::Copied
        } else {
            tracing::info!("no existing data directory, creating defaults");
            for template in DEFAULT_DATA_FILES {
                let path = self.ctx.output_dir().join(template.path);
                if let Some(parent) = path.parent() {
                    ensure_dir(parent)?;
                }
                fs::write(&path, template.content)
                    .with_context(|| format!("Failed to write data file: {}", path.display()))?;
                tracing::debug!(path = template.path, "created data file");
            }
            DataSource::Defaults
        };

        report.data_source = source;
        Ok(source)
    }
}
