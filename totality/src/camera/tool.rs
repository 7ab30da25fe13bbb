/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Camera control through the external device-control executable.
//!
//! Commands:
//!
//! ```text
//! <tool> set-exposure <label> [--port=<id>]
//! <tool> capture-image        [--port=<id>]
//! <tool> set-config capturetarget=1 [--port=<id>]
//! <tool> auto-detect
//! ```
//!
//! Exit status 0 means success.  Every child is killed if its future is
//! dropped (e.g. by a shutter-set timeout).

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::device::{CameraDevice, DeviceError};

/// Pause after a failed capture inside a continuous run.
const RETRY_PAUSE: Duration = Duration::from_millis(100);

/// Program path plus optional `--port` selector; cheap to clone into the
/// continuous-capture task.
#[derive(Debug, Clone)]
struct Invoker {
    program: String,
    port: Option<String>,
}

impl Invoker {
    async fn run(&self, args: &[&str]) -> Result<String, DeviceError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(port) = &self.port {
            cmd.arg(format!("--port={port}"));
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = cmd.output().await.map_err(|source| DeviceError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(DeviceError::CommandFailed {
                command: format!("{} {}", self.program, args.join(" ")),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

struct ContinuousRun {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<u32>,
}

/// One camera reached through the device-control executable.
pub struct DeviceTool {
    invoker: Invoker,
    continuous: Mutex<Option<ContinuousRun>>,
}

impl DeviceTool {
    pub fn new(program: impl Into<String>, port: Option<String>) -> Self {
        Self {
            invoker: Invoker {
                program: program.into(),
                port,
            },
            continuous: Mutex::new(None),
        }
    }

    /// Asks the camera to store images on its memory card.
    pub async fn set_capture_target(&self) -> Result<(), DeviceError> {
        self.invoker
            .run(&["set-config", "capturetarget=1"])
            .await
            .map(drop)
    }
}

#[async_trait]
impl CameraDevice for DeviceTool {
    fn describe(&self) -> String {
        match &self.invoker.port {
            Some(port) => format!("{} (port {})", self.invoker.program, port),
            None => self.invoker.program.clone(),
        }
    }

    async fn set_exposure(&self, label: &str) -> Result<(), DeviceError> {
        self.invoker.run(&["set-exposure", label]).await.map(drop)
    }

    async fn trigger_once(&self) -> Result<(), DeviceError> {
        self.invoker.run(&["capture-image"]).await.map(drop)
    }

    /// Captures back to back until stopped.  A stop request takes effect once
    /// the capture in flight has finished.
    async fn start_continuous(&self) -> Result<(), DeviceError> {
        let mut slot = self.continuous.lock().await;
        if slot.is_some() {
            return Err(DeviceError::AlreadyCapturing);
        }

        let (stop, mut stop_rx) = oneshot::channel::<()>();
        let invoker = self.invoker.clone();
        let handle = tokio::spawn(async move {
            let mut captured = 0u32;
            loop {
                match stop_rx.try_recv() {
                    Err(oneshot::error::TryRecvError::Empty) => {}
                    _ => break,
                }
                match invoker.run(&["capture-image"]).await {
                    Ok(_) => captured += 1,
                    Err(e) => {
                        warn!("Continuous capture: {}", e);
                        tokio::time::sleep(RETRY_PAUSE).await;
                    }
                }
            }
            captured
        });

        *slot = Some(ContinuousRun { stop, handle });
        Ok(())
    }

    async fn stop_continuous(&self) -> Result<(), DeviceError> {
        let Some(run) = self.continuous.lock().await.take() else {
            return Ok(());
        };
        let _ = run.stop.send(());
        let captured = run.handle.await?;
        debug!(captured, "Continuous capture stopped");
        Ok(())
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// A camera reported by `auto-detect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCamera {
    pub model: String,
    pub port: String,
}

/// Lists connected cameras.  A tool that cannot be run yields an error; an
/// empty list means none are attached.
pub async fn auto_detect(program: &str) -> Result<Vec<DetectedCamera>, DeviceError> {
    let invoker = Invoker {
        program: program.to_string(),
        port: None,
    };
    let stdout = invoker.run(&["auto-detect"]).await?;
    let cameras = parse_auto_detect(&stdout);
    info!("Detected {} camera(s) via {}", cameras.len(), program);
    for cam in &cameras {
        info!("  {} at {}", cam.model, cam.port);
    }
    Ok(cameras)
}

/// Parses `<model>   <port>` lines, skipping the header and ruler.
///
/// Ports always contain a `:` (`usb:001,004`), headers never do.
pub fn parse_auto_detect(stdout: &str) -> Vec<DetectedCamera> {
    stdout
        .lines()
        .filter_map(|line| {
            let (model, port) = line.trim().rsplit_once(char::is_whitespace)?;
            let model = model.trim();
            (!model.is_empty() && port.contains(':')).then(|| DetectedCamera {
                model: model.to_string(),
                port: port.to_string(),
            })
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
