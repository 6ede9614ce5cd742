//! Build the separate UI project and stage its output into the backend tree.
//!
//! Nothing here is fatal to a packaging run: a missing project, a failed
//! build, or a missing build output all degrade to warnings and the
//! pipeline packages whatever is already staged.

pub mod runner;

use std::fs;

use anyhow::Context;
use serde::Serialize;

pub use runner::{CommandRunner, CommandStatus, SystemCommandRunner};

use crate::context::BuildContext;
use crate::fs::{CopyFailure, copy_dir_recursive};

/// Outcome of [`FrontendBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FrontendBuild {
    Built,
    /// The UI project directory does not exist.
    Skipped,
    Failed { reason: String },
}

/// Outcome of [`FrontendBuilder::stage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Staged { failures: Vec<CopyFailure> },
    /// The build produced no output directory; nothing was copied.
    MissingOutput,
}

pub struct FrontendBuilder<'a> {
    ctx: &'a BuildContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> FrontendBuilder<'a> {
    pub fn new(ctx: &'a BuildContext, runner: &'a dyn CommandRunner) -> Self {
        Self { ctx, runner }
    }

    /// Run the configured build command inside the UI project.
    pub fn build(&self) -> FrontendBuild {
        let project = self.ctx.frontend_dir();
        if !project.is_dir() {
            tracing::warn!(
                path = %project.display(),
                "frontend directory not found, skipping frontend build"
            );
            return FrontendBuild::Skipped;
        }

        let Some((program, args)) = self.ctx.frontend_command().split_first() else {
            return FrontendBuild::Failed {
                reason: "frontend build command is empty".to_string(),
            };
        };

        tracing::info!(path = %project.display(), "building frontend project");
        match self.runner.run(program, args, project) {
            Ok(status) if status.is_success() => {
                tracing::info!("frontend build complete");
                FrontendBuild::Built
            }
            Ok(status) => {
                let reason = match status.code {
                    Some(code) => format!("{} exited with status {}", program, code),
                    None => format!("{} was terminated by a signal", program),
                };
                tracing::error!(%reason, "frontend build failed");
                FrontendBuild::Failed { reason }
            }
            Err(err) => {
                let reason = format!("{:#}", err);
                tracing::error!(%reason, "frontend build failed");
                FrontendBuild::Failed { reason }
            }
        }
    }

    /// Replace the staged UI directory with the fresh build output.
    pub fn stage(&self) -> anyhow::Result<StageOutcome> {
        let staged = self.ctx.staged_ui_dir();
        if staged.exists() {
            fs::remove_dir_all(&staged).with_context(|| {
                format!("Failed to remove staged UI directory: {}", staged.display())
            })?;
        }

        let dist = self.ctx.frontend_dist();
        if !dist.is_dir() {
            tracing::warn!(path = %dist.display(), "frontend dist not found, skipping copy");
            return Ok(StageOutcome::MissingOutput);
        }

        tracing::info!(from = %dist.display(), to = %staged.display(), "staging frontend output");
        let failures = copy_dir_recursive(dist, &staged)?;
        Ok(StageOutcome::Staged { failures })
    }
}
