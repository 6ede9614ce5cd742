//! External command execution behind a trait so the pipeline can be tested
//! without spawning real build tools.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::Context;

/// Exit status of a finished external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn failure(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a program to completion in a working directory.
pub trait CommandRunner {
    /// Block until the command exits. `Err` means the process could not be
    /// started at all.
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> anyhow::Result<CommandStatus>;
}

/// Spawns real processes with inherited stdio so build output streams live.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> anyhow::Result<CommandStatus> {
        tracing::info!(program, ?args, cwd = %cwd.display(), "running external command");

        let status = shell_command(program, args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to invoke {}", program))?;

        Ok(CommandStatus {
            code: status.code(),
        })
    }
}

// npm and friends are batch shims on Windows and only resolve through cmd.
#[cfg(windows)]
fn shell_command(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(program).args(args);
    cmd
}

#[cfg(not(windows))]
fn shell_command(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd
}
