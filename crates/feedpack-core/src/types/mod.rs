//! Shared core types used across the build pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Firmware deployment profile to package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Standalone scheduled feeding. No HTTP server, no web assets.
    Battery,
    /// HTTP-server-driven feeding with the web UI.
    #[default]
    Api,
}

impl BuildMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Battery => "battery",
            BuildMode::Api => "api",
        }
    }

    /// Whether this mode ships the web UI and persistence files.
    pub fn serves_http(self) -> bool {
        matches!(self, BuildMode::Api)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown build mode: '{0}'. Use 'battery' or 'api'")]
pub struct ModeParseError(pub String);

impl FromStr for BuildMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "battery" => Ok(BuildMode::Battery),
            "api" => Ok(BuildMode::Api),
            _ => Err(ModeParseError(s.to_string())),
        }
    }
}

/// Default persistence file written when no data directory exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFileTemplate {
    /// Path relative to the output root.
    pub path: &'static str,
    pub content: &'static str,
}

/// Templates materialized on a first-time api build.
pub const DEFAULT_DATA_FILES: [DataFileTemplate; 4] = [
    DataFileTemplate {
        path: "data/schedule.txt",
        content: "times=\ndays=",
    },
    DataFileTemplate {
        path: "data/last_fed.txt",
        content: "",
    },
    DataFileTemplate {
        path: "data/next_feed.txt",
        content: "Not scheduled",
    },
    DataFileTemplate {
        path: "data/quantity.txt",
        content: "10",
    },
];
