//! Configuration schema for feedpack.toml

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for feedpack.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PackConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub frontend: FrontendConfig,

    #[serde(default)]
    pub device: DeviceConfig,
}

/// Source and destination roots.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Backend source root (defaults to the config directory)
    #[serde(default)]
    pub backend: Option<PathBuf>,

    /// UI project root (defaults to `<backend>/../frontend`)
    #[serde(default)]
    pub frontend: Option<PathBuf>,

    /// Output directory (defaults to `<backend>/dist`)
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// How the UI project is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FrontendConfig {
    /// Program and arguments run inside the UI project
    #[serde(default = "default_frontend_command")]
    pub command: Vec<String>,

    /// Build output directory, relative to the UI project
    #[serde(default = "default_frontend_dist")]
    pub dist: PathBuf,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            command: default_frontend_command(),
            dist: default_frontend_dist(),
        }
    }
}

fn default_frontend_command() -> Vec<String> {
    vec!["npm".to_string(), "run".to_string(), "build".to_string()]
}

fn default_frontend_dist() -> PathBuf {
    PathBuf::from("dist")
}

/// Device HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Base URL of the feeder, e.g. `http://192.168.4.1`
    #[serde(default)]
    pub url: Option<String>,
}

impl PackConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.frontend
            .validate()
            .context("Invalid [frontend] configuration")?;
        self.device
            .validate()
            .context("Invalid [device] configuration")?;
        Ok(())
    }
}

impl FrontendConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.command.first() {
            None => anyhow::bail!("command must not be empty"),
            Some(program) if program.trim().is_empty() => {
                anyhow::bail!("command program must not be blank")
            }
            Some(_) => {}
        }
        if self.dist.is_absolute() {
            anyhow::bail!("dist must be relative to the UI project");
        }
        Ok(())
    }
}

impl DeviceConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(url) = &self.url {
            let parsed =
                url::Url::parse(url).with_context(|| format!("Invalid device url: {}", url))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("Device url must use http or https: {}", url);
            }
        }
        Ok(())
    }
}
