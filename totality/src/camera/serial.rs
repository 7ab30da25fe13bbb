/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Shutter release through a serial line's RTS signal.
//!
//! Asserting RTS closes the shutter-release circuit; a short pulse takes one
//! photo, holding it drives the camera's burst mode.  Port I/O is blocking and
//! runs on tokio's blocking pool.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serialport::SerialPort;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::device::{CameraDevice, DeviceError};

pub const DEFAULT_BAUD: u32 = 9_600;

/// RTS pulse width for a single photo.
pub const PULSE: Duration = Duration::from_millis(100);

const OPEN_TIMEOUT: Duration = Duration::from_millis(100);

pub struct SerialTrigger {
    path: String,
    baud: u32,
    /// Port held open with RTS asserted during a continuous capture.
    held: Mutex<Option<Box<dyn SerialPort>>>,
}

impl SerialTrigger {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud: DEFAULT_BAUD,
            held: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn open(path: &str, baud: u32) -> Result<Box<dyn SerialPort>, DeviceError> {
        serialport::new(path, baud)
            .timeout(OPEN_TIMEOUT)
            .open()
            .map_err(|source| serial_error(path, source))
    }
}

fn serial_error(path: &str, source: serialport::Error) -> DeviceError {
    DeviceError::Serial {
        port: path.to_string(),
        source,
    }
}

#[async_trait]
impl CameraDevice for SerialTrigger {
    fn describe(&self) -> String {
        format!("serial {}", self.path)
    }

    async fn set_exposure(&self, _label: &str) -> Result<(), DeviceError> {
        // A bare release cable cannot change settings.
        Ok(())
    }

    async fn trigger_once(&self) -> Result<(), DeviceError> {
        let (path, baud) = (self.path.clone(), self.baud);
        tokio::task::spawn_blocking(move || {
            let mut port = Self::open(&path, baud)?;
            port.write_request_to_send(true)
                .map_err(|e| serial_error(&path, e))?;
            std::thread::sleep(PULSE);
            port.write_request_to_send(false)
                .map_err(|e| serial_error(&path, e))
        })
        .await??;
        debug!(port = %self.path, "Serial shutter pulse sent");
        Ok(())
    }

    async fn start_continuous(&self) -> Result<(), DeviceError> {
        let mut held = self.held.lock().await;
        if held.is_some() {
            return Err(DeviceError::AlreadyCapturing);
        }
        let (path, baud) = (self.path.clone(), self.baud);
        let port = tokio::task::spawn_blocking(move || {
            let mut port = Self::open(&path, baud)?;
            port.write_request_to_send(true)
                .map_err(|e| serial_error(&path, e))?;
            Ok::<_, DeviceError>(port)
        })
        .await??;
        *held = Some(port);
        debug!(port = %self.path, "Serial shutter held");
        Ok(())
    }

    async fn stop_continuous(&self) -> Result<(), DeviceError> {
        let Some(mut port) = self.held.lock().await.take() else {
            return Ok(());
        };
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            port.write_request_to_send(false)
                .map_err(|e| serial_error(&path, e))
        })
        .await??;
        debug!(port = %self.path, "Serial shutter released");
        Ok(())
    }
}

// ── Port resolution ───────────────────────────────────────────────────────────

/// Checks the configured serial device, falling back to the single
/// `/dev/tty*serial*` device when it is missing.
pub fn resolve_serial_path(configured: &str) -> Result<Option<String>, DeviceError> {
    resolve_serial_path_in(Path::new("/dev"), configured)
}

/// [`resolve_serial_path`] against an arbitrary device directory.
///
/// * configured path exists → kept;
/// * missing, one candidate → candidate adopted (with a warning);
/// * missing, no candidate → `None` (serial transport dropped, with a warning);
/// * missing, several candidates → [`DeviceError::AmbiguousSerialPort`].
pub fn resolve_serial_path_in(dir: &Path, configured: &str) -> Result<Option<String>, DeviceError> {
    if Path::new(configured).exists() {
        return Ok(Some(configured.to_string()));
    }

    let mut candidates: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| {
                    let name = e.file_name();
                    let name = name.to_string_lossy();
                    name.starts_with("tty") && name.contains("serial")
                })
                .map(|e| e.path().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    candidates.sort();
    info!("Found serial ports: {:?}", candidates);

    match candidates.len() {
        0 => {
            warn!(
                "Serial port '{}' not found and no candidate exists; falling back to USB capture",
                configured
            );
            Ok(None)
        }
        1 => {
            let found = candidates.remove(0);
            warn!(
                "Serial port '{}' not found; using '{}' instead (may be wrong with several cameras)",
                configured, found
            );
            Ok(Some(found))
        }
        _ => Err(DeviceError::AmbiguousSerialPort {
            configured: configured.to_string(),
            candidates,
        }),
    }
}
