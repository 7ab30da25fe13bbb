/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! camera-sim – stand-in for the camera device-control executable
//!
//! Point the scheduler at it with `--device-tool camera-sim` (or
//! `TOTALITY_DEVICE_TOOL`) to rehearse a schedule without hardware.
//!
//! Behaviour is tuned through environment variables:
//!
//! | Variable                    | Effect                                               |
//! |-----------------------------|------------------------------------------------------|
//! | `CAMERA_SIM_MODELS`         | `model=port;…` listed by `auto-detect`               |
//! | `CAMERA_SIM_DELAY_MS`       | latency added to every command                       |
//! | `CAMERA_SIM_FAIL_EXPOSURE`  | fail the first N `set-exposure` calls (per port)     |
//! | `CAMERA_SIM_FAIL_CAPTURE`   | fail the first N `capture-image` calls (per port)    |
//! | `CAMERA_SIM_STATE_DIR`      | where failure counters live (default: temp dir)      |
//!
//! Logs go to stderr; only `auto-detect` writes to stdout.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use totality::exposure::is_supported_shutter;

#[derive(Debug, Parser)]
#[command(name = "camera-sim", about = "Camera device-control simulator", long_about = None)]
struct Cli {
    /// Camera port to address.
    #[arg(long, global = true)]
    port: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Set the shutter speed.
    SetExposure { label: String },
    /// Take one picture.
    CaptureImage,
    /// Set a `key=value` configuration entry.
    SetConfig { entry: String },
    /// List connected cameras.
    AutoDetect,
}

fn env_u64(name: &str) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

fn state_dir() -> PathBuf {
    std::env::var_os("CAMERA_SIM_STATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

/// Returns `true` while fewer than `CAMERA_SIM_FAIL_<KIND>` calls have been
/// failed for this port, bumping the persisted counter.
fn should_fail(kind: &str, port: Option<&str>) -> Result<bool> {
    let budget = env_u64(&format!("CAMERA_SIM_FAIL_{}", kind.to_ascii_uppercase()));
    if budget == 0 {
        return Ok(false);
    }
    let port = port.unwrap_or("default").replace(|c: char| !c.is_ascii_alphanumeric(), "_");
    let path = state_dir().join(format!("camera-sim-{port}-{kind}.count"));

    let failed: u64 = std::fs::read_to_string(&path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0);
    if failed >= budget {
        return Ok(false);
    }
    std::fs::write(&path, (failed + 1).to_string())
        .with_context(|| format!("cannot update {}", path.display()))?;
    Ok(true)
}

fn models() -> Vec<(String, String)> {
    std::env::var("CAMERA_SIM_MODELS")
        .unwrap_or_else(|_| "Simulated Camera=usb:001,002".to_string())
        .split(';')
        .filter_map(|entry| {
            let (model, port) = entry.split_once('=')?;
            Some((model.trim().to_string(), port.trim().to_string()))
        })
        .collect()
}

fn run(cli: Cli) -> Result<()> {
    let delay = env_u64("CAMERA_SIM_DELAY_MS");
    if delay > 0 {
        std::thread::sleep(Duration::from_millis(delay));
    }
    let port = cli.port.as_deref();

    match cli.command {
        Command::SetExposure { label } => {
            if !is_supported_shutter(&label) {
                bail!("unsupported shutter speed '{label}'");
            }
            if should_fail("exposure", port)? {
                bail!("camera busy, cannot set shutter speed");
            }
            info!(port = ?port, "shutterspeed={}", label);
        }
        Command::CaptureImage => {
            if should_fail("capture", port)? {
                bail!("capture failed");
            }
            info!(port = ?port, "Captured image");
        }
        Command::SetConfig { entry } => {
            let Some((key, value)) = entry.split_once('=') else {
                bail!("expected key=value, got '{entry}'");
            };
            info!(port = ?port, "{}={}", key, value);
        }
        Command::AutoDetect => {
            println!("{:<30} {}", "Model", "Port");
            println!("{}", "-".repeat(46));
            for (model, port) in models() {
                println!("{:<30} {}", model, port);
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{:#}", e);
        process::exit(1);
    }
}
