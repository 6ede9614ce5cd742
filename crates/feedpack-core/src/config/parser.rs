//! Reading and writing `feedpack.toml`.

use super::schema::PackConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Read and validate a config file.
pub fn parse_config(path: &Path) -> Result<PackConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_config_str(content: &str) -> Result<PackConfig> {
    let config: PackConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;
    config.validate()?;
    Ok(config)
}

/// Load `path` when it exists, otherwise fall back to defaults.
pub fn load_or_default(path: &Path) -> Result<PackConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(PackConfig::new());
    }
    parse_config(path)
}

/// Point at the offending line when toml reports a span.
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let Some(span) = error.span() else {
        return anyhow::anyhow!("Invalid feedpack.toml: {}", error.message());
    };

    let offset = span.start.min(content.len());
    let line_num = content.as_bytes()[..offset]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1;
    anyhow::anyhow!(
        "Invalid feedpack.toml at line {}: {}\n{}",
        line_num,
        error.message(),
        excerpt(content, line_num)
    )
}

/// Up to two lines either side of `line_num` (1-based), marked and numbered.
fn excerpt(content: &str, line_num: usize) -> String {
    let first = line_num.saturating_sub(2).max(1);
    content
        .lines()
        .enumerate()
        .map(|(idx, text)| (idx + 1, text))
        .skip(first - 1)
        .take_while(|(num, _)| *num <= line_num + 2)
        .map(|(num, text)| {
            let marker = if num == line_num { ">" } else { " " };
            format!("{marker} {num:>4} | {text}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn to_toml(config: &PackConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration to TOML")
}
