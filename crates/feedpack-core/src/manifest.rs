//! Deployment README written into the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::{BuildMode, DEFAULT_DATA_FILES};

pub const MANIFEST_FILE: &str = "README.md";

const LIB_DRIVERS: [&str; 3] = [
    "lib/stepper.py",
    "lib/rtc_handler.py",
    "lib/notification.py",
];

const API_ROOT_FILES: [&str; 8] = [
    "api.py",
    "config.py",
    "services.py",
    "last_fed_service.py",
    "next_feed_service.py",
    "quantity_service.py",
    "microdot.py",
    "urequests.py",
];

const UI_FILES: [&str; 4] = [
    "UI/index.html",
    "UI/feednow.html",
    "UI/setquantity.html",
    "UI/setschedule.html",
];

/// Render the deployment guide for `mode`.
pub fn render_manifest(mode: BuildMode, generated_at: DateTime<Utc>) -> String {
    let upper = mode.as_str().to_uppercase();
    let mut out = String::new();

    out.push_str(&format!("# Fish Feeder - {} Mode Deployment\n\n", upper));
    out.push_str(&format!(
        "This directory contains all files needed for ESP8266 deployment in {} mode.\n\n",
        mode
    ));
    out.push_str("## Files included:\n");
    out.push_str("All Python files from the backend directory, including lib/ and ota/ folders\n\n");

    match mode {
        BuildMode::Api => {
            out.push_str("## Additional directories:\n");
            out.push_str("- UI/ (complete web interface)\n");
            out.push_str("- data/ (persistence files)\n\n");
            out.push_str("## Deployment:\n");
            out.push_str("Upload all files to ESP8266 maintaining the directory structure.\n");
            out.push_str("The api.py will serve the UI files and handle API requests.\n\n");
        }
        BuildMode::Battery => {
            out.push_str("## Deployment:\n");
            out.push_str("Upload all files to ESP8266 maintaining the directory structure.\n");
            out.push_str("The main.py will run on boot and handle scheduled feedings.\n\n");
        }
    }

    out.push_str("## Upload commands (using ampy):\n");
    out.push_str("```bash\n");
    out.push_str("# Set your COM port\n");
    out.push_str("$PORT = \"COM3\"\n\n");
    out.push_str(&upload_block(mode));
    out.push_str("```\n\n");

    out.push_str(&format!(
        "Generated on: {}\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
    out
}

/// The ampy command sequence for `mode`.
pub fn upload_block(mode: BuildMode) -> String {
    let mut out = String::new();
    out.push_str("# Upload main files\n");

    let root_files: &[&str] = match mode {
        BuildMode::Battery => &["main.py", "config.py"],
        BuildMode::Api => &API_ROOT_FILES,
    };
    for file in root_files {
        put(&mut out, file, None);
    }

    out.push_str("\n# Create lib directory and upload drivers\n");
    mkdir(&mut out, "lib");
    for driver in LIB_DRIVERS {
        put(&mut out, driver, Some(driver));
    }

    if mode == BuildMode::Api {
        out.push_str("\n# Create data directory and upload data files\n");
        mkdir(&mut out, "data");
        for template in DEFAULT_DATA_FILES {
            put(&mut out, template.path, Some(template.path));
        }

        out.push_str("\n# Upload UI directory (you may need to upload each file individually)\n");
        mkdir(&mut out, "UI");
        for file in UI_FILES {
            put(&mut out, file, Some(file));
        }
        mkdir(&mut out, "UI/css");
        put(&mut out, "UI/css/styles.css", Some("UI/css/styles.css"));
        mkdir(&mut out, "UI/assets");
        mkdir(&mut out, "UI/assets/images");
        out.push_str("# Add image files as needed\n");
    }

    out
}

fn put(out: &mut String, src: &str, dest: Option<&str>) {
    let line = match dest {
        Some(dest) => format!("ampy --port $PORT put {} {}\n", src, dest),
        None => format!("ampy --port $PORT put {}\n", src),
    };
    out.push_str(&line);
}

fn mkdir(out: &mut String, dir: &str) {
    out.push_str(&format!("ampy --port $PORT mkdir {}\n", dir));
}

/// Write the manifest into `out_dir`. Failure aborts the build.
pub fn write_manifest(
    out_dir: &Path,
    mode: BuildMode,
    generated_at: DateTime<Utc>,
) -> anyhow::Result<PathBuf> {
    let path = out_dir.join(MANIFEST_FILE);
    fs::write(&path, render_manifest(mode, generated_at))
        .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
    tracing::info!(path = %path.display(), "created manifest");
    Ok(path)
}
