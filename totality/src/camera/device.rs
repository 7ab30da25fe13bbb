/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The capability interface every camera transport implements.

use async_trait::async_trait;
use thiserror::Error;

/// Low-level camera operations.
///
/// Implementations must tolerate being called from a single worker at a time;
/// the dispatch engine guarantees calls for one camera never overlap.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Short human-readable description of the transport, for logs.
    fn describe(&self) -> String;

    /// Asks the camera to use the given shutter label.  One attempt.
    async fn set_exposure(&self, label: &str) -> Result<(), DeviceError>;

    /// Takes a single photo.
    async fn trigger_once(&self) -> Result<(), DeviceError>;

    /// Starts capturing until [`stop_continuous`](Self::stop_continuous).
    async fn start_continuous(&self) -> Result<(), DeviceError>;

    async fn stop_continuous(&self) -> Result<(), DeviceError>;
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("cannot run '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The device-control tool ran but reported failure.
    #[error("'{command}' exited with {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("serial port {port}: {source}")]
    Serial {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("blocking serial task failed")]
    Join(#[from] tokio::task::JoinError),

    /// The configured serial device is missing and several candidates exist.
    #[error("serial port '{configured}' not found; did you mean one of: {}", .candidates.join(", "))]
    AmbiguousSerialPort {
        configured: String,
        candidates: Vec<String>,
    },

    #[error("continuous capture is already running")]
    AlreadyCapturing,
}
