/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};

use totality::config::template::write_template;

/// Writes a blank Totality schedule: five contact events with empty times,
/// the standard phases, and empty equipment and action lists.
#[derive(Debug, Parser)]
#[command(name = "totality-template", long_about = None)]
struct Cli {
    /// Output file.
    #[arg(short = 'p', long = "path", default_value = "new_info.json")]
    path: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = write_template(&cli.path) {
        error!("{:#}", e);
        process::exit(1);
    }
    info!("Template written to {}", cli.path.display());
}
