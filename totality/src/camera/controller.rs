/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-camera action processing.
//!
//! ```text
//! process(action)
//!   busy = true
//!   label = resolve_exposure(action)        literal, or E·N²/(ISO·2^Q) snapped
//!   set_shutter(label)                      skip if current; retry until timeout
//!   capture                                 one trigger, or hold until `end`
//!   action.release(); busy = false
//! ```
//!
//! A shutter timeout or a failed capture is logged and the run carries on.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::device::CameraDevice;
use crate::action::{CameraAction, Shape};
use crate::clock::Clock;
use crate::config::CameraConfig;

/// Pause between two shutter-set attempts.
pub const SHUTTER_RETRY_DELAY: Duration = Duration::from_millis(10);

/// How often a continuous capture re-checks the clock.
const CONTINUOUS_POLL: Duration = Duration::from_millis(100);

pub const MIN_ENHANCEMENT: f64 = 0.1;

// ── EnhancementFactor ─────────────────────────────────────────────────────────

/// Live-adjustable exposure multiplier, stored as `f64` bits so the input
/// listener can change it while a worker reads it.
#[derive(Debug)]
pub struct EnhancementFactor(AtomicU64);

impl EnhancementFactor {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.max(MIN_ENHANCEMENT).to_bits()))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, value: f64) {
        self.0
            .store(value.max(MIN_ENHANCEMENT).to_bits(), Ordering::Release);
    }

    /// Adds `delta` (clamped at [`MIN_ENHANCEMENT`]) and returns the new value.
    pub fn adjust(&self, delta: f64) -> f64 {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let next = (f64::from_bits(current) + delta).max(MIN_ENHANCEMENT);
            // Keep one decimal so repeated ±0.1 steps do not accumulate noise.
            let next = (next * 10.0).round() / 10.0;
            match self.0.compare_exchange_weak(
                current,
                next.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

// ── Camera ────────────────────────────────────────────────────────────────────

/// State only the worker holding the camera lock may touch.
#[derive(Debug, Default)]
pub struct CameraState {
    pub current_shutter: Option<String>,
}

pub struct Camera {
    id: String,
    f_ratio: f64,
    iso: f64,
    enhancement: EnhancementFactor,
    shutter_timeout: Duration,
    busy: AtomicBool,
    device: Arc<dyn CameraDevice>,
    clock: Arc<Clock>,
    state: Mutex<CameraState>,
}

impl Camera {
    pub fn new(cfg: &CameraConfig, device: Arc<dyn CameraDevice>, clock: Arc<Clock>) -> Self {
        Self {
            id: cfg.camera_id.clone(),
            f_ratio: cfg.f_ratio,
            iso: cfg.iso,
            enhancement: EnhancementFactor::new(cfg.enhancement_factor),
            shutter_timeout: Duration::from_secs_f64(cfg.shutter_timeout.max(0.0)),
            busy: AtomicBool::new(false),
            device,
            clock,
            state: Mutex::new(CameraState::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn enhancement(&self) -> &EnhancementFactor {
        &self.enhancement
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn describe(&self) -> String {
        format!(
            "{} [f/{} ISO {} E {:.1}] via {}",
            self.id,
            self.f_ratio,
            self.iso,
            self.enhancement.get(),
            self.device.describe()
        )
    }

    /// The camera's mutual-exclusion lock.  Held for the whole of
    /// [`process`](Self::process).
    pub async fn lock(&self) -> MutexGuard<'_, CameraState> {
        self.state.lock().await
    }

    /// The shutter label an action needs on this camera right now.
    pub fn resolve_exposure(&self, action: &CameraAction) -> &'static str {
        action
            .params
            .exposure
            .resolve(self.f_ratio, self.iso, self.enhancement.get())
    }

    /// Runs one dispatched action to completion and makes it eligible again.
    pub async fn process(&self, state: &mut CameraState, action: &CameraAction) {
        self.busy.store(true, Ordering::Release);
        info!(camera = %self.id, action = %action.name, shape = %action.timing.shape(), "Processing action");

        let label = self.resolve_exposure(action);
        self.set_shutter(state, label).await;

        match action.timing.shape() {
            Shape::Continuous => self.capture_continuous(action).await,
            _ => {
                if let Err(e) = self.device.trigger_once().await {
                    warn!(camera = %self.id, action = %action.name, "Capture failed: {}", e);
                }
            }
        }

        action.release();
        self.busy.store(false, Ordering::Release);
        debug!(camera = %self.id, action = %action.name, "Action complete");
    }

    /// Applies `label`, retrying until it sticks or the shutter timeout
    /// elapses.  Returns `false` on timeout; the caller captures anyway.
    pub async fn set_shutter(&self, state: &mut CameraState, label: &str) -> bool {
        if state.current_shutter.as_deref() == Some(label) {
            debug!(camera = %self.id, shutter = label, "Shutter already set");
            return true;
        }

        let deadline = tokio::time::Instant::now() + self.shutter_timeout;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, self.device.set_exposure(label)).await {
                Ok(Ok(())) => {
                    state.current_shutter = Some(label.to_string());
                    info!(camera = %self.id, shutter = label, attempts, "Shutter set");
                    return true;
                }
                Ok(Err(e)) => debug!(camera = %self.id, shutter = label, attempts, "Shutter set failed: {}", e),
                Err(_) => break,
            }
            if tokio::time::Instant::now() + SHUTTER_RETRY_DELAY >= deadline {
                break;
            }
            tokio::time::sleep(SHUTTER_RETRY_DELAY).await;
        }

        warn!(
            camera = %self.id,
            shutter = label,
            attempts,
            timeout_s = self.shutter_timeout.as_secs_f64(),
            "Timed out setting shutter speed; capturing with the current setting"
        );
        false
    }

    /// Holds the shutter from now until the action's `end` on the run clock.
    async fn capture_continuous(&self, action: &CameraAction) {
        let Some(end) = action.timing.end() else {
            return;
        };
        if let Err(e) = self.device.start_continuous().await {
            warn!(camera = %self.id, action = %action.name, "Continuous capture failed to start: {}", e);
            return;
        }

        loop {
            let Ok(remaining) = (end - self.clock.now()).to_std() else {
                break;
            };
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(remaining.min(CONTINUOUS_POLL)).await;
        }

        if let Err(e) = self.device.stop_continuous().await {
            warn!(camera = %self.id, action = %action.name, "Continuous capture failed to stop: {}", e);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
