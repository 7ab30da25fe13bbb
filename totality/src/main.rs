/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use totality::camera::{self, Camera};
use totality::clock::Clock;
use totality::config::ScheduleConfig;
use totality::dispatch::DispatchEngine;
use totality::input::spawn_stdin_listener;
use totality::scheduler::{Scheduler, SchedulerOptions};
use totality::timeline::LocalZone;
use totality::voice::{Announcer, Silent, SpeechCommand};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Totality eclipse camera and voice scheduler.
///
/// Example (rehearse, starting 75 s before second contact):
///   totality --input info.json --test -75
#[derive(Debug, Parser)]
#[command(
    name = "totality",
    about = "Totality – eclipse camera and voice action scheduler",
    long_about = None,
)]
struct Cli {
    /// Schedule file (JSON, or YAML by .yaml/.yml extension).
    #[arg(short = 'i', long = "input", default_value = "info.json")]
    input: PathBuf,

    /// Test run: start the clock this many seconds from the test event
    /// (negative = before it).
    #[arg(short = 't', long = "test", allow_negative_numbers = true)]
    test: Option<f64>,

    /// Event the --test offset is relative to.
    #[arg(long = "test-event", default_value = "c2")]
    test_event: String,

    /// Device-control executable.
    #[arg(long = "device-tool", env = "TOTALITY_DEVICE_TOOL", default_value = "camctl")]
    device_tool: String,

    /// Do not log the once-per-second status line.
    #[arg(long = "nodisplay", default_value_t = false)]
    no_display: bool,

    /// Log announcements instead of speaking them.
    #[arg(long = "nosound", default_value_t = false)]
    no_sound: bool,

    /// Do not read operator commands from stdin.
    #[arg(long = "noinput", default_value_t = false)]
    no_input: bool,

    /// Debug logging (RUST_LOG takes precedence).
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialise structured logging.
    // RUST_LOG wins; otherwise info, or debug with --verbose.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    info!("Totality starting up...");
    info!(
        input       = %cli.input.display(),
        test        = ?cli.test,
        test_event  = %cli.test_event,
        device_tool = %cli.device_tool,
        display     = !cli.no_display,
        sound       = !cli.no_sound,
        input_cmds  = !cli.no_input,
        "Configuration"
    );

    match run(cli).await {
        // Exit explicitly: the stdin reader may still be parked in a
        // blocking read, which would hold up runtime shutdown.
        Ok(()) => process::exit(0),
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // ── Load the schedule ─────────────────────────────────────────────────────
    let zone = LocalZone::detect();
    info!("Local zone: UTC{}", zone.offset());

    let config = ScheduleConfig::load_from_file(&cli.input, zone)
        .with_context(|| format!("failed to load schedule from {}", cli.input.display()))?;
    info!(
        "Loaded {} event(s), {} phase(s), {} camera action(s), {} voice action(s), {} camera(s)",
        config.events.len(),
        config.phases.len(),
        config.camera_actions.len(),
        config.voice_actions.len(),
        config.equipment.len(),
    );
    for event in config.events.iter() {
        info!("  [{}]  {}  {}", event.name, event.instant.format("%Y-%m-%d %H:%M:%S%.3f"), event.text);
    }

    // ── Clock ─────────────────────────────────────────────────────────────────
    let clock = Arc::new(Clock::system(zone));
    if let Some(seconds) = cli.test {
        clock.set_test_offset(&config.events, &cli.test_event, seconds)?;
    }

    // ── Cameras ───────────────────────────────────────────────────────────────
    let detected = match camera::auto_detect(&cli.device_tool).await {
        Ok(found) => Some(found),
        Err(e) => {
            warn!("Camera auto-detection failed: {}", e);
            None
        }
    };

    let mut cameras: Vec<Arc<Camera>> = Vec::with_capacity(config.equipment.len());
    for cfg in &config.equipment {
        let cam = camera::connect(cfg, &cli.device_tool, detected.as_deref(), clock.clone())
            .await
            .with_context(|| format!("failed to set up camera '{}'", cfg.camera_id))?;
        cameras.push(Arc::new(cam));
    }
    let engine = DispatchEngine::start(cameras).context("failed to start camera workers")?;

    // ── Scheduler ─────────────────────────────────────────────────────────────
    let announcer: Arc<dyn Announcer> = if cli.no_sound {
        Arc::new(Silent)
    } else {
        Arc::new(SpeechCommand::default())
    };

    let scheduler = Scheduler::new(
        config,
        clock,
        engine,
        announcer,
        SchedulerOptions {
            display: !cli.no_display,
            greet: true,
        },
    );

    let listener = (!cli.no_input).then(|| spawn_stdin_listener(scheduler.commands()));

    let summary = scheduler.run().await;
    if let Some(handle) = listener {
        handle.abort();
    }

    info!(
        "Done: {} capture(s) dispatched, {} completed, {} announcement(s){}",
        summary.dispatched,
        summary.processed,
        summary.spoken,
        if summary.stopped_early { " (stopped early)" } else { "" },
    );
    Ok(())
}
