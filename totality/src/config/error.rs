/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured load-time errors for the schedule configuration.
//!
//! Every variant is fatal: the run never starts with a partially understood
//! schedule.  Variants carry the owning entry's name and the offending value so
//! the message printed at exit points straight at the line to fix.

use std::path::PathBuf;

use thiserror::Error;

use crate::action::TimingError;
use crate::exposure::UnknownExposure;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read configuration file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON configuration")]
    Json(#[from] serde_json::Error),

    #[error("malformed YAML configuration")]
    Yaml(#[from] serde_yaml::Error),

    /// The `equipment` list is empty.
    #[error("no cameras configured: the equipment list is empty")]
    NoCameras,

    #[error("camera id '{0}' is configured more than once")]
    DuplicateCamera(String),

    #[error("event '{0}' is configured more than once")]
    DuplicateEvent(String),

    /// An event without a `time` (the template leaves these `null`).
    #[error("event '{0}' has no time")]
    MissingTime(String),

    /// A time string that is neither an event name nor an accepted datetime.
    #[error("{owner}: cannot parse {field} '{value}' as an event name or datetime")]
    InvalidTime {
        owner: String,
        field: &'static str,
        value: String,
    },

    /// An offset that is not a finite number, or that moves the instant out
    /// of the representable range.
    #[error("{owner}: {field} '{value}' shifted by {offset}s is out of range")]
    InvalidOffset {
        owner: String,
        field: &'static str,
        value: String,
        offset: f64,
    },

    /// A phase bound naming an event that is not configured.
    #[error("{owner}: unknown event '{name}'")]
    UnknownEvent { owner: String, name: String },

    #[error("action '{action}': unsupported timing: {reason}")]
    UnsupportedTiming {
        action: String,
        #[source]
        reason: TimingError,
    },

    #[error("camera action '{action}': {source}")]
    UnknownExposure {
        action: String,
        #[source]
        source: UnknownExposure,
    },

    #[error("camera action '{0}' has no shutter")]
    MissingExposure(String),

    /// With several cameras, every camera action must name one of them.
    #[error("camera action '{action}' targets unknown camera '{camera}' (configured: {known})")]
    UnknownCamera {
        action: String,
        camera: String,
        known: String,
    },

    #[error("camera action '{0}' must name a camera_id when several cameras are configured")]
    AmbiguousCamera(String),

    #[error("camera '{camera}': {reason}")]
    InvalidEquipment { camera: String, reason: String },
}
