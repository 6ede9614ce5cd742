//! Build context shared by every pipeline component.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;

use crate::assemble::FilterPolicy;
use crate::config::PackConfig;
use crate::manifest::MANIFEST_FILE;
use crate::types::BuildMode;

/// Name of the staged UI directory, both in the backend tree and the output.
pub const UI_DIR_NAME: &str = "UI";

/// Name of the persistence directory, both in the backend tree and the output.
pub const DATA_DIR_NAME: &str = "data";

/// Resolved paths and settings for one build invocation.
///
/// Frontends create this once and hand it to the pipeline; nothing in the
/// core reads paths from globals.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildContext {
    mode: BuildMode,
    backend_dir: PathBuf,
    frontend_dir: PathBuf,
    frontend_dist: PathBuf,
    frontend_command: Vec<String>,
    output_dir: PathBuf,
    frontend_enabled: bool,
}

impl BuildContext {
    /// Create a context with the conventional layout around `backend_dir`:
    /// the UI project at `../frontend` and the output at `dist/`.
    pub fn new(mode: BuildMode, backend_dir: impl Into<PathBuf>) -> Self {
        let backend_dir = backend_dir.into();
        let frontend_dir = backend_dir.join("..").join("frontend");
        let output_dir = backend_dir.join("dist");
        let defaults = crate::config::FrontendConfig::default();

        Self {
            mode,
            frontend_dist: frontend_dir.join(&defaults.dist),
            frontend_dir,
            frontend_command: defaults.command,
            output_dir,
            backend_dir,
            frontend_enabled: true,
        }
    }

    /// Create a context from a parsed config file.
    ///
    /// Relative paths in the config resolve against `config_root`.
    pub fn from_config(config: &PackConfig, config_root: &Path, mode: BuildMode) -> Self {
        let backend_dir = config
            .paths
            .backend
            .as_ref()
            .map(|p| resolve(config_root, p))
            .unwrap_or_else(|| config_root.to_path_buf());

        let mut ctx = Self::new(mode, backend_dir)
            .with_frontend_command(config.frontend.command.clone())
            .with_frontend_dist(&config.frontend.dist);
        if let Some(frontend) = &config.paths.frontend {
            ctx = ctx.with_frontend_dir(resolve(config_root, frontend));
        }
        if let Some(output) = &config.paths.output {
            let out = resolve(&ctx.backend_dir, output);
            ctx = ctx.with_output_dir(out);
        }
        ctx
    }

    pub fn with_frontend_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let dist_rel = self
            .frontend_dist
            .strip_prefix(&self.frontend_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from("dist"));
        self.frontend_dist = dir.join(dist_rel);
        self.frontend_dir = dir;
        self
    }

    /// Set the UI build output directory, relative to the UI project.
    pub fn with_frontend_dist(mut self, dist: &Path) -> Self {
        self.frontend_dist = self.frontend_dir.join(dist);
        self
    }

    pub fn with_frontend_command(mut self, command: Vec<String>) -> Self {
        self.frontend_command = command;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_frontend_enabled(mut self, enabled: bool) -> Self {
        self.frontend_enabled = enabled;
        self
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn backend_dir(&self) -> &Path {
        &self.backend_dir
    }

    pub fn frontend_dir(&self) -> &Path {
        &self.frontend_dir
    }

    pub fn frontend_dist(&self) -> &Path {
        &self.frontend_dist
    }

    pub fn frontend_command(&self) -> &[String] {
        &self.frontend_command
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Whether the UI project should be built and staged for this run.
    pub fn builds_frontend(&self) -> bool {
        self.frontend_enabled && self.mode.serves_http()
    }

    /// UI directory inside the backend tree that staging writes to.
    pub fn staged_ui_dir(&self) -> PathBuf {
        self.backend_dir.join(UI_DIR_NAME)
    }

    /// Field data directory inside the backend tree.
    pub fn data_dir(&self) -> PathBuf {
        self.backend_dir.join(DATA_DIR_NAME)
    }

    /// Output path relative to the backend root, if the output lives inside it.
    pub fn output_within_backend(&self) -> Option<PathBuf> {
        normalize(&self.output_dir)
            .strip_prefix(normalize(&self.backend_dir))
            .ok()
            .map(Path::to_path_buf)
    }

    /// Reject layouts where recreating the output would delete anything
    /// but a previous package.
    ///
    /// Refused: the backend or any ancestor, anything under the backend's
    /// `UI/` or `data/`, and an existing non-empty directory with no
    /// manifest at its root. Output under an excluded backend directory
    /// such as `dist/` is always allowed.
    pub fn validate(&self) -> anyhow::Result<()> {
        let backend = normalize(&self.backend_dir);
        let output = normalize(&self.output_dir);

        if backend.starts_with(&output) {
            anyhow::bail!(
                "Output directory {} would overwrite the backend sources at {}",
                output.display(),
                backend.display()
            );
        }

        let top_in_backend = output
            .strip_prefix(&backend)
            .ok()
            .and_then(|rel| rel.components().next())
            .map(|c| c.as_os_str().to_os_string());
        let scratch = top_in_backend
            .as_deref()
            .is_some_and(|top| FilterPolicy::default().is_excluded_dir(top));

        if let Some(top) = top_in_backend.as_deref().and_then(|t| t.to_str()) {
            if top == UI_DIR_NAME || top == DATA_DIR_NAME {
                anyhow::bail!(
                    "Output directory {} would overwrite the backend's {}/ directory",
                    output.display(),
                    top
                );
            }
        }

        if !scratch && holds_foreign_content(&output)? {
            anyhow::bail!(
                "Output directory {} already has content and no {}; refusing to overwrite it",
                output.display(),
                MANIFEST_FILE
            );
        }
        if self.frontend_command.is_empty() {
            anyhow::bail!("Frontend build command must not be empty");
        }
        Ok(())
    }
}

/// Absolute form of `path` with `.` and `..` folded, without touching
/// the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in abs.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// An existing non-empty directory that is not a previous package.
fn holds_foreign_content(dir: &Path) -> anyhow::Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    if !dir.is_dir() {
        return Ok(true);
    }
    if dir.join(MANIFEST_FILE).is_file() {
        return Ok(false);
    }
    let mut entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read dir: {}", dir.display()))?;
    Ok(entries.next().is_some())
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_backend_conventions() {
        let ctx = BuildContext::new(BuildMode::Api, "/repo/Code/backend");

        assert_eq!(ctx.output_dir(), Path::new("/repo/Code/backend/dist"));
        assert_eq!(
            ctx.frontend_dir(),
            Path::new("/repo/Code/backend/../frontend")
        );
        assert_eq!(
            ctx.frontend_dist(),
            Path::new("/repo/Code/backend/../frontend/dist")
        );
        assert_eq!(ctx.frontend_command(), ["npm", "run", "build"]);
        assert_eq!(ctx.staged_ui_dir(), Path::new("/repo/Code/backend/UI"));
        assert_eq!(ctx.output_within_backend(), Some(PathBuf::from("dist")));
    }

    #[test]
    fn frontend_only_built_in_api_mode() {
        assert!(BuildContext::new(BuildMode::Api, "/b").builds_frontend());
        assert!(!BuildContext::new(BuildMode::Battery, "/b").builds_frontend());
        assert!(
            !BuildContext::new(BuildMode::Api, "/b")
                .with_frontend_enabled(false)
                .builds_frontend()
        );
    }

    #[test]
    fn from_config_resolves_relative_paths() {
        let config = crate::config::parse_config_str(
            r#"
[paths]
backend = "Code/backend"
frontend = "Code/frontend"
output = "../../out"

[frontend]
dist = "build"
"#,
        )
        .expect("config should parse");

        let ctx = BuildContext::from_config(&config, Path::new("/repo"), BuildMode::Battery);

        assert_eq!(ctx.mode(), BuildMode::Battery);
        assert_eq!(ctx.backend_dir(), Path::new("/repo/Code/backend"));
        assert_eq!(ctx.frontend_dir(), Path::new("/repo/Code/frontend"));
        assert_eq!(ctx.frontend_dist(), Path::new("/repo/Code/frontend/build"));
        assert_eq!(ctx.output_dir(), Path::new("/repo/Code/backend/../../out"));
    }

    #[test]
    fn from_config_output_resolves_against_backend() {
        let config = crate::config::parse_config_str(
            "[paths]\nbackend = \"fw\"\noutput = \"release\"\n",
        )
        .expect("config should parse");

        let ctx = BuildContext::from_config(&config, Path::new("/repo"), BuildMode::Api);

        assert_eq!(ctx.output_dir(), Path::new("/repo/fw/release"));
        assert_eq!(ctx.output_within_backend(), Some(PathBuf::from("release")));
    }

    #[test]
    fn from_config_keeps_absolute_output() {
        let config = crate::config::parse_config_str("[paths]\noutput = \"/srv/pkg\"\n")
            .expect("config should parse");

        let ctx = BuildContext::from_config(&config, Path::new("/repo"), BuildMode::Api);

        assert_eq!(ctx.backend_dir(), Path::new("/repo"));
        assert_eq!(ctx.output_dir(), Path::new("/srv/pkg"));
        assert_eq!(ctx.output_within_backend(), None);
    }

    #[test]
    fn changing_frontend_dir_keeps_dist_relative() {
        let ctx = BuildContext::new(BuildMode::Api, "/b")
            .with_frontend_dist(Path::new("build"))
            .with_frontend_dir("/ui");
        assert_eq!(ctx.frontend_dist(), Path::new("/ui/build"));
    }

    #[test]
    fn validate_rejects_output_over_backend() {
        let ctx = BuildContext::new(BuildMode::Api, "/repo/backend").with_output_dir("/repo");
        let err = ctx.validate().unwrap_err();
        assert!(err.to_string().contains("overwrite"));

        let same = BuildContext::new(BuildMode::Api, "/repo/backend").with_output_dir("/repo/backend");
        assert!(same.validate().is_err());

        assert!(BuildContext::new(BuildMode::Api, "/repo/backend").validate().is_ok());
    }

    #[test]
    fn validate_folds_parent_components() {
        let up = BuildContext::new(BuildMode::Battery, "/repo/backend")
            .with_output_dir("/repo/backend/..");
        assert!(up.validate().unwrap_err().to_string().contains("overwrite"));

        let dotted = BuildContext::new(BuildMode::Battery, "/repo/backend")
            .with_output_dir("/repo/backend/./lib/../");
        assert!(dotted.validate().is_err());
    }

    #[test]
    fn validate_rejects_ui_and_data_dirs() {
        for name in ["data", "UI", "data/out"] {
            let ctx = BuildContext::new(BuildMode::Api, "/repo/backend")
                .with_output_dir(Path::new("/repo/backend").join(name));
            let err = ctx.validate().unwrap_err();
            assert!(err.to_string().contains("would overwrite"), "{name}: {err}");
        }
    }

    #[test]
    fn output_within_backend_sees_through_dot_dot() {
        let ctx = BuildContext::new(BuildMode::Api, "/repo/backend")
            .with_output_dir("/repo/frontend/../backend/release");
        assert_eq!(ctx.output_within_backend(), Some(PathBuf::from("release")));
    }

    #[test]
    fn normalize_is_lexical() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
    }
}
