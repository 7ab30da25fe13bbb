/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The combined transport: exposure over USB, release over serial when a
//! serial line is configured.

use async_trait::async_trait;

use super::device::{CameraDevice, DeviceError};
use super::serial::SerialTrigger;
use super::tool::DeviceTool;

pub struct CameraTransport {
    tool: DeviceTool,
    serial: Option<SerialTrigger>,
}

impl CameraTransport {
    pub fn new(tool: DeviceTool, serial: Option<SerialTrigger>) -> Self {
        Self { tool, serial }
    }

    pub fn uses_serial(&self) -> bool {
        self.serial.is_some()
    }

    fn release(&self) -> &dyn CameraDevice {
        match &self.serial {
            Some(serial) => serial,
            None => &self.tool,
        }
    }
}

#[async_trait]
impl CameraDevice for CameraTransport {
    fn describe(&self) -> String {
        match &self.serial {
            Some(serial) => format!("{} + {}", self.tool.describe(), serial.describe()),
            None => self.tool.describe(),
        }
    }

    async fn set_exposure(&self, label: &str) -> Result<(), DeviceError> {
        self.tool.set_exposure(label).await
    }

    async fn trigger_once(&self) -> Result<(), DeviceError> {
        self.release().trigger_once().await
    }

    async fn start_continuous(&self) -> Result<(), DeviceError> {
        self.release().start_continuous().await
    }

    async fn stop_continuous(&self) -> Result<(), DeviceError> {
        self.release().stop_continuous().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn release_prefers_serial_line() {
        // The tool would succeed; the missing serial device proves it is used.
        let transport = CameraTransport::new(
            DeviceTool::new("true", None),
            Some(SerialTrigger::new("/nonexistent/ttyUSBserial0")),
        );
        assert!(transport.uses_serial());
        transport.set_exposure("1/250").await.unwrap();
        assert!(matches!(
            transport.trigger_once().await,
            Err(DeviceError::Serial { .. })
        ));
    }

    #[tokio::test]
    async fn release_falls_back_to_tool() {
        let transport = CameraTransport::new(DeviceTool::new("true", None), None);
        assert!(!transport.uses_serial());
        transport.trigger_once().await.unwrap();
        assert_eq!(transport.describe(), "true");
    }
}
