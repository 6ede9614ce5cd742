//! Orchestrates one packaging run.
//!
//! Step order:
//! 1. Build and stage the UI project (api mode only; failures are warnings)
//! 2. Recreate the output directory
//! 3. Copy filtered sources, vendor files and the credentials file
//! 4. Copy UI assets and data files (api mode only)
//! 5. Write the manifest
//! 6. Summarize the output tree
//!
//! Errors from steps 2 to 6 abort the run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::assemble::{Assembler, AssemblyReport, DataSource};
use crate::context::BuildContext;
use crate::frontend::{CommandRunner, FrontendBuild, FrontendBuilder, StageOutcome};
use crate::fs::{CopyFailure, count_files, dir_size, hash_tree_excluding};
use crate::manifest::{MANIFEST_FILE, write_manifest};
use crate::types::BuildMode;

/// What happened to the UI project during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FrontendStatus {
    /// Battery mode has no web UI.
    NotApplicable,
    /// Disabled for this run.
    Disabled,
    Built { staged: bool },
    Skipped,
    Failed { reason: String },
}

/// Aggregate figures for the finished output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub file_count: u64,
    pub total_bytes: u64,
    /// blake3 over the tree, excluding the timestamped manifest.
    pub tree_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub mode: BuildMode,
    pub output_dir: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub frontend: FrontendStatus,
    pub copied_files: usize,
    pub excluded_files: Vec<PathBuf>,
    pub failures: Vec<CopyFailure>,
    pub warnings: Vec<String>,
    pub data_source: DataSource,
    pub summary: BuildSummary,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.warnings.is_empty()
    }
}

pub struct BuildPipeline<'a> {
    ctx: &'a BuildContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(ctx: &'a BuildContext, runner: &'a dyn CommandRunner) -> Self {
        Self { ctx, runner }
    }

    pub fn run(&self) -> anyhow::Result<BuildReport> {
        self.run_at(Utc::now())
    }

    /// Run with a fixed manifest timestamp.
    pub fn run_at(&self, now: DateTime<Utc>) -> anyhow::Result<BuildReport> {
        self.ctx.validate()?;
        let mode = self.ctx.mode();
        tracing::info!(%mode, "building fish feeder package");

        let mut report = AssemblyReport::default();
        let frontend = self.prepare_frontend(&mut report);

        tracing::info!("building backend");
        let assembler = Assembler::new(self.ctx);
        assembler.reset_output()?;
        assembler.copy_sources(&mut report)?;
        assembler.copy_vendor_files(&mut report)?;
        assembler.copy_credentials(&mut report);

        if mode.serves_http() {
            assembler.copy_ui_assets(&mut report)?;
            assembler.copy_data_files(&mut report)?;
        }

        write_manifest(self.ctx.output_dir(), mode, now)?;

        let out = self.ctx.output_dir();
        let summary = BuildSummary {
            file_count: count_files(out)?,
            total_bytes: dir_size(out)?,
            tree_hash: hash_tree_excluding(out, &[MANIFEST_FILE])?,
        };
        tracing::info!(
            path = %out.display(),
            files = summary.file_count,
            bytes = summary.total_bytes,
            "build complete"
        );

        Ok(BuildReport {
            mode,
            output_dir: out.to_path_buf(),
            generated_at: now,
            frontend,
            copied_files: report.copied.len(),
            excluded_files: report.excluded,
            failures: report.failures,
            warnings: report.warnings,
            data_source: report.data_source,
            summary,
        })
    }

    fn prepare_frontend(&self, report: &mut AssemblyReport) -> FrontendStatus {
        if !self.ctx.mode().serves_http() {
            return FrontendStatus::NotApplicable;
        }
        if !self.ctx.builds_frontend() {
            return FrontendStatus::Disabled;
        }

        let builder = FrontendBuilder::new(self.ctx, self.runner);
        match builder.build() {
            FrontendBuild::Built => {}
            FrontendBuild::Skipped => {
                report.warnings.push(format!(
                    "Frontend directory not found: {}",
                    self.ctx.frontend_dir().display()
                ));
                return FrontendStatus::Skipped;
            }
            FrontendBuild::Failed { reason } => {
                report
                    .warnings
                    .push(format!("Frontend build failed: {}", reason));
                return FrontendStatus::Failed { reason };
            }
        }

        let staged = match builder.stage() {
            Ok(StageOutcome::Staged { failures }) => {
                report.failures.extend(failures);
                true
            }
            Ok(StageOutcome::MissingOutput) => {
                report.warnings.push(format!(
                    "Frontend dist not found: {}",
                    self.ctx.frontend_dist().display()
                ));
                false
            }
            Err(err) => {
                tracing::warn!(error = %format!("{:#}", err), "frontend staging failed");
                report
                    .warnings
                    .push(format!("Frontend staging failed: {:#}", err));
                false
            }
        };
        FrontendStatus::Built { staged }
    }
}
