//! Feedpack - fish feeder deployment packager
//!
//! Usage:
//!   feedpack build            # Package for api mode (default)
//!   feedpack build battery    # Package for battery mode
//!   feedpack device status    # Talk to a running feeder

mod device;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedpack_core::config::{CONFIG_FILE_NAME, PackConfig, load_or_default};
use feedpack_core::context::BuildContext;
use feedpack_core::frontend::SystemCommandRunner;
use feedpack_core::pipeline::{BuildPipeline, BuildReport, FrontendStatus};
use feedpack_core::types::BuildMode;

use crate::device::DeviceArgs;

#[derive(Parser)]
#[command(name = "feedpack")]
#[command(about = "Fish feeder deployment packager", long_about = None)]
struct Cli {
    /// Path to feedpack.toml (defaults to ./feedpack.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a deployment package
    Build {
        /// Build mode (battery or api)
        #[arg(default_value = "api")]
        mode: BuildMode,

        /// Backend source tree (overrides config)
        #[arg(long)]
        backend: Option<PathBuf>,

        /// UI project directory (overrides config)
        #[arg(long)]
        frontend: Option<PathBuf>,

        /// Output directory (overrides config)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Do not run the UI build; stage whatever is already in the backend
        #[arg(long)]
        skip_frontend: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Query or control a running feeder
    Device(DeviceArgs),
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedpack=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let (config, config_root) = load_config(cli.config.as_deref())?;
    tracing::debug!(root = %config_root.display(), "configuration loaded");

    match cli.command {
        Commands::Build {
            mode,
            backend,
            frontend,
            out,
            skip_frontend,
            format,
        } => {
            let mut ctx = BuildContext::from_config(&config, &config_root, mode);
            if let Some(backend) = backend {
                // Re-resolve so the default frontend and output follow the new backend.
                let mut overridden = config.clone();
                overridden.paths.backend = Some(absolute(&backend)?);
                ctx = BuildContext::from_config(&overridden, &config_root, mode);
            }
            if let Some(frontend) = frontend {
                ctx = ctx.with_frontend_dir(absolute(&frontend)?);
            }
            if let Some(out) = out {
                ctx = ctx.with_output_dir(absolute(&out)?);
            }
            if skip_frontend {
                ctx = ctx.with_frontend_enabled(false);
            }
            run_build(&ctx, format)?;
        }
        Commands::Device(args) => {
            device::run(args, config.device.url.as_deref())?;
        }
    }

    Ok(())
}

/// Load the config file and return it with the directory relative paths
/// resolve against.
fn load_config(explicit: Option<&Path>) -> Result<(PackConfig, PathBuf)> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    match explicit {
        Some(path) => {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                cwd.join(path)
            };
            let config = feedpack_core::config::parse_config(&path)?;
            let root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.clone());
            Ok((config, root))
        }
        None => {
            let config = load_or_default(&cwd.join(CONFIG_FILE_NAME))?;
            Ok((config, cwd))
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    Ok(cwd.join(path))
}

fn run_build(ctx: &BuildContext, format: OutputFormat) -> Result<()> {
    let runner = SystemCommandRunner;
    let report = BuildPipeline::new(ctx, &runner)
        .run()
        .with_context(|| format!("{} build failed", ctx.mode()))?;

    match format {
        OutputFormat::Table => print_build_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn print_build_table(report: &BuildReport) {
    let marker = if report.is_clean() {
        style("✓").green()
    } else {
        style("⚠").yellow()
    };
    println!(
        "{} {} build complete",
        marker,
        style(report.mode.as_str().to_uppercase()).bold()
    );
    println!("  Output:    {}", report.output_dir.display());
    println!("  Frontend:  {}", describe_frontend(&report.frontend));
    println!(
        "  Files:     {} ({} bytes)",
        report.summary.file_count, report.summary.total_bytes
    );
    println!("  Copied:    {}", report.copied_files);
    println!("  Excluded:  {}", report.excluded_files.len());
    if report.mode.serves_http() {
        println!("  Data:      {}", describe_data(report));
    }
    println!("  Tree hash: {}", style(&report.summary.tree_hash).dim());

    for failure in &report.failures {
        println!(
            "  {} Failed to copy {}: {}",
            style("✗").red(),
            failure.src.display(),
            failure.error
        );
    }
    for warning in &report.warnings {
        println!("  {} {}", style("⚠").yellow(), warning);
    }

    println!();
    println!(
        "Upload instructions: {}",
        report
            .output_dir
            .join(feedpack_core::manifest::MANIFEST_FILE)
            .display()
    );
}

fn describe_frontend(status: &FrontendStatus) -> String {
    match status {
        FrontendStatus::NotApplicable => "not applicable".to_string(),
        FrontendStatus::Disabled => "skipped (--skip-frontend)".to_string(),
        FrontendStatus::Built { staged: true } => "built and staged".to_string(),
        FrontendStatus::Built { staged: false } => "built, no output to stage".to_string(),
        FrontendStatus::Skipped => "project not found".to_string(),
        FrontendStatus::Failed { reason } => format!("failed ({reason})"),
    }
}

fn describe_data(report: &BuildReport) -> &'static str {
    use feedpack_core::assemble::DataSource;

    match report.data_source {
        DataSource::Copied => "copied from backend",
        DataSource::Defaults => "default templates",
        DataSource::Skipped => "none",
    }
}
