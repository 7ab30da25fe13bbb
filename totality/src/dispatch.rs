/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-camera work queues.
//!
//! ```text
//!  Scheduler ──submit(action)──► queue[cam A] ──► worker A ──lock──► Camera::process
//!                           └──► queue[cam B] ──► worker B ──lock──► Camera::process
//! ```
//!
//! Each camera has one unbounded FIFO queue and one worker task.  The worker
//! holds the camera's lock for the whole of a job, so one camera never sees
//! overlapping commands while different cameras run in parallel.  `submit`
//! never blocks the scheduler.
//!
//! [`DispatchEngine::shutdown`] enqueues a [`Job::Stop`] behind whatever is
//! already queued and waits for every worker, so every job submitted before
//! shutdown runs to completion.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::action::CameraAction;
use crate::camera::Camera;

pub enum Job {
    Capture(Arc<CameraAction>),
    /// Sentinel: the worker exits when it dequeues this.
    Stop,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no cameras to dispatch to")]
    NoCameras,

    #[error("camera '{0}' registered twice")]
    DuplicateCamera(String),

    #[error("action '{action}' targets unknown camera '{camera}'")]
    UnknownCamera { action: String, camera: String },

    #[error("action '{action}' names no camera and {count} cameras are configured")]
    NoCameraSelected { action: String, count: usize },

    #[error("worker for camera '{0}' has stopped")]
    WorkerGone(String),
}

struct Worker {
    camera: Arc<Camera>,
    queue: mpsc::UnboundedSender<Job>,
    handle: JoinHandle<usize>,
}

pub struct DispatchEngine {
    workers: BTreeMap<String, Worker>,
}

impl DispatchEngine {
    /// Spawns one worker per camera.  Must be called inside a tokio runtime.
    pub fn start(cameras: Vec<Arc<Camera>>) -> Result<Self, DispatchError> {
        if cameras.is_empty() {
            return Err(DispatchError::NoCameras);
        }

        let mut workers = BTreeMap::new();
        for camera in cameras {
            let id = camera.id().to_string();
            if workers.contains_key(&id) {
                return Err(DispatchError::DuplicateCamera(id));
            }
            let (queue, rx) = mpsc::unbounded_channel();
            let handle = tokio::spawn(run_worker(camera.clone(), rx));
            debug!(camera = %id, "Worker started");
            workers.insert(
                id,
                Worker {
                    camera,
                    queue,
                    handle,
                },
            );
        }

        info!("Dispatch engine started with {} worker(s)", workers.len());
        Ok(Self { workers })
    }

    pub fn cameras(&self) -> impl Iterator<Item = &Arc<Camera>> {
        self.workers.values().map(|w| &w.camera)
    }

    /// Enqueues `action` on its camera's worker and returns that camera's id.
    ///
    /// With a single camera every action goes to it; otherwise the action's
    /// `camera_id` selects the worker.
    pub fn submit(&self, action: Arc<CameraAction>) -> Result<&str, DispatchError> {
        let (id, worker) = self.route(&action)?;
        debug!(camera = %id, action = %action.name, "Submitting action");
        worker
            .queue
            .send(Job::Capture(action))
            .map_err(|_| DispatchError::WorkerGone(id.clone()))?;
        Ok(id)
    }

    fn route(&self, action: &CameraAction) -> Result<(&String, &Worker), DispatchError> {
        if self.workers.len() == 1 {
            if let Some(entry) = self.workers.iter().next() {
                return Ok(entry);
            }
        }
        match &action.params.camera_id {
            Some(camera) => self
                .workers
                .get_key_value(camera)
                .ok_or_else(|| DispatchError::UnknownCamera {
                    action: action.name.clone(),
                    camera: camera.clone(),
                }),
            None => Err(DispatchError::NoCameraSelected {
                action: action.name.clone(),
                count: self.workers.len(),
            }),
        }
    }

    /// Stops every worker after its queued jobs and waits for all of them.
    /// Returns the number of jobs processed.
    pub async fn shutdown(self) -> usize {
        info!("Shutting down dispatch engine...");
        for (id, worker) in &self.workers {
            if worker.queue.send(Job::Stop).is_err() {
                warn!(camera = %id, "Worker already stopped");
            }
        }

        let mut processed = 0;
        for (id, worker) in self.workers {
            match worker.handle.await {
                Ok(n) => processed += n,
                Err(e) => warn!(camera = %id, "Worker ended abnormally: {}", e),
            }
        }
        info!(processed, "Dispatch engine stopped");
        processed
    }
}

async fn run_worker(camera: Arc<Camera>, mut rx: mpsc::UnboundedReceiver<Job>) -> usize {
    let mut processed = 0;
    while let Some(job) = rx.recv().await {
        match job {
            Job::Stop => break,
            Job::Capture(action) => {
                let mut state = camera.lock().await;
                debug!(camera = %camera.id(), action = %action.name, "Executing action");
                camera.process(&mut state, &action).await;
                processed += 1;
            }
        }
    }
    debug!(camera = %camera.id(), processed, "Worker stopped");
    processed
}

// ── Tests ─────────────────────────────────────────────────────────────────────
