/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Camera hardware: the [`CameraDevice`] capability interface, its
//! transports, and the per-camera [`Camera`] controller.
//!
//! ```text
//! camera/
//! ├── device.rs      – CameraDevice trait + DeviceError
//! ├── tool.rs        – device-control executable (USB)
//! ├── serial.rs      – RTS shutter release
//! ├── transport.rs   – USB exposure + serial release
//! └── controller.rs  – exposure, bounded-retry shutter, capture
//! ```

pub mod controller;
pub mod device;
pub mod serial;
pub mod tool;
pub mod transport;

use std::sync::Arc;

use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::CameraConfig;

pub use controller::{Camera, CameraState, EnhancementFactor};
pub use device::{CameraDevice, DeviceError};
pub use serial::SerialTrigger;
pub use tool::{auto_detect, DetectedCamera, DeviceTool};
pub use transport::CameraTransport;

/// Builds the real transport for one configured camera.
///
/// `detected` is the `auto-detect` result, or `None` when detection could not
/// run.  A camera without a configured USB port adopts the detected port whose
/// model equals its id.
///
/// # Errors
/// [`DeviceError::AmbiguousSerialPort`] when the configured serial device is
/// missing and more than one candidate exists.
pub async fn connect(
    cfg: &CameraConfig,
    program: &str,
    detected: Option<&[DetectedCamera]>,
    clock: Arc<Clock>,
) -> Result<Camera, DeviceError> {
    let usb_port = match (&cfg.usb_port, detected) {
        (Some(port), Some(found)) => {
            if !found.iter().any(|d| &d.port == port) {
                warn!(camera = %cfg.camera_id, "USB port '{}' not detected", port);
            }
            Some(port.clone())
        }
        (Some(port), None) => Some(port.clone()),
        (None, Some(found)) => match found.iter().find(|d| d.model == cfg.camera_id) {
            Some(d) => {
                info!(camera = %cfg.camera_id, "Found matching USB camera at {}", d.port);
                Some(d.port.clone())
            }
            None => {
                if found.is_empty() {
                    warn!(camera = %cfg.camera_id, "No USB camera found");
                }
                None
            }
        },
        (None, None) => None,
    };

    let serial = match &cfg.serial_port {
        Some(path) => serial::resolve_serial_path(path)?.map(SerialTrigger::new),
        None => None,
    };

    let tool = DeviceTool::new(program, usb_port);
    info!(camera = %cfg.camera_id, "Setting capture target to the memory card");
    if let Err(e) = tool.set_capture_target().await {
        warn!(camera = %cfg.camera_id, "Failed setting capturetarget=1: {}", e);
    }

    let transport = CameraTransport::new(tool, serial);
    info!(
        camera = %cfg.camera_id,
        "Shutter release via {}",
        if transport.uses_serial() { "serial line" } else { "device tool" }
    );
    let camera = Camera::new(cfg, Arc::new(transport), clock);
    info!("Camera ready: {}", camera.describe());
    Ok(camera)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::LocalZone;

    fn config(usb_port: Option<&str>, serial_port: Option<&str>) -> CameraConfig {
        CameraConfig {
            camera_id: "Canon EOS R".into(),
            serial_port: serial_port.map(String::from),
            usb_port: usb_port.map(String::from),
            f_ratio: 10.0,
            iso: 100.0,
            enhancement_factor: 1.0,
            shutter_timeout: 1.0,
        }
    }

    fn detected() -> Vec<DetectedCamera> {
        vec![DetectedCamera {
            model: "Canon EOS R".into(),
            port: "usb:001,004".into(),
        }]
    }

    fn clock() -> Arc<Clock> {
        Arc::new(Clock::system(LocalZone::utc()))
    }

    #[tokio::test]
    async fn connect_adopts_detected_usb_port() {
        let found = detected();
        let cam = connect(&config(None, None), "true", Some(&found), clock())
            .await
            .unwrap();
        assert!(cam.describe().contains("usb:001,004"));
    }

    #[tokio::test]
    async fn connect_keeps_configured_usb_port() {
        let found = detected();
        let cam = connect(&config(Some("usb:002,001"), None), "true", Some(&found), clock())
            .await
            .unwrap();
        assert!(cam.describe().contains("usb:002,001"));
    }

    #[tokio::test]
    async fn connect_survives_failed_capture_target() {
        let cam = connect(&config(None, None), "false", None, clock()).await.unwrap();
        assert_eq!(cam.id(), "Canon EOS R");
    }
}
