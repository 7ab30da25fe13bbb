/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedule configuration loading.
//!
//! The file is JSON by default, or YAML when the path ends in `.yaml`/`.yml`.
//! Both carry the same layout:
//!
//! ```json
//! {
//!   "events": [{"name": "c2", "time": "2024-04-08 13:27:41.3", "text": "Beginning of Totality"}],
//!   "phases": [{"start": "c2", "end": "c3", "text": "Totality"}],
//!   "voice_actions": [{"name": "v1", "time": "c2", "offset": -60, "text": "One minute"}],
//!   "camera_actions": [{"name": "corona", "start": "c2", "end": "c3", "interval": 2,
//!                       "shutter": "Corona - 1.0 Rs", "camera_id": "EOS R"}],
//!   "equipment": [{"camera_id": "EOS R", "serial_port": "/dev/ttyUSBserial0", "f_ratio": 8}]
//! }
//! ```
//!
//! `contact_times` is accepted in place of `events`.  A `time`, `start` or
//! `end` value is either an event name or a datetime string (see
//! [`parse_instant`]); each may be shifted by `offset`, `start_offset` or
//! `end_offset` seconds.
//!
//! Every instant is resolved here, once, against the observer's [`LocalZone`].
//! Everything that would make the run misbehave later is rejected now with a
//! [`ConfigError`].

pub mod error;
pub mod template;

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::action::{Action, ActionSet, CameraParams, Timing, VoiceParams};
use crate::exposure::ExposureSpec;
use crate::timeline::{parse, parse_instant, Event, EventSet, Instant, LocalZone, Phase, PhaseSet};

pub use error::ConfigError;

// ── Private deserialization types ─────────────────────────────────────────────

/// Maps directly onto the file layout.  Callers work with [`ScheduleConfig`].
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default, alias = "contact_times")]
    events: Vec<EventEntry>,
    #[serde(default)]
    phases: Vec<PhaseEntry>,
    #[serde(default)]
    voice_actions: Vec<ActionEntry>,
    #[serde(default)]
    camera_actions: Vec<ActionEntry>,
    #[serde(default)]
    equipment: Vec<EquipmentEntry>,
}

#[derive(Debug, Deserialize)]
struct EventEntry {
    name: String,
    time: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhaseEntry {
    start: Option<String>,
    end: Option<String>,
    #[serde(default)]
    text: String,
}

/// Shared by camera and voice actions; kind-specific fields are simply
/// ignored for the other kind.
#[derive(Debug, Deserialize)]
struct ActionEntry {
    name: Option<String>,
    text: Option<String>,
    time: Option<String>,
    offset: Option<f64>,
    start: Option<String>,
    start_offset: Option<f64>,
    end: Option<String>,
    end_offset: Option<f64>,
    interval: Option<f64>,
    // camera
    shutter: Option<String>,
    camera_id: Option<IdEntry>,
    #[serde(default)]
    priority: i32,
    // voice
    voice: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EquipmentEntry {
    camera_id: Option<IdEntry>,
    serial_port: Option<String>,
    usb_port: Option<String>,
    #[serde(default = "default_f_ratio")]
    f_ratio: f64,
    #[serde(default = "default_iso")]
    iso: f64,
    #[serde(default = "default_enhancement")]
    enhancement_factor: f64,
    #[serde(default = "default_shutter_timeout")]
    shutter_timeout: f64,
}

/// Camera ids are usually model names but may be written as bare numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IdEntry {
    Text(String),
    Number(i64),
}

impl fmt::Display for IdEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdEntry::Text(s) => f.write_str(s),
            IdEntry::Number(n) => write!(f, "{n}"),
        }
    }
}

fn default_f_ratio() -> f64 {
    10.0
}

fn default_iso() -> f64 {
    100.0
}

fn default_enhancement() -> f64 {
    1.0
}

fn default_shutter_timeout() -> f64 {
    10.0
}

// ── Public data structures ────────────────────────────────────────────────────

/// One entry of the `equipment` list.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub camera_id: String,
    pub serial_port: Option<String>,
    pub usb_port: Option<String>,
    pub f_ratio: f64,
    pub iso: f64,
    pub enhancement_factor: f64,
    /// Seconds allowed for a shutter-speed change before giving up.
    pub shutter_timeout: f64,
}

/// File format, chosen from the path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

/// The fully resolved schedule.
#[derive(Debug)]
pub struct ScheduleConfig {
    pub zone: LocalZone,
    pub events: EventSet,
    pub phases: PhaseSet,
    pub camera_actions: ActionSet<CameraParams>,
    pub voice_actions: ActionSet<VoiceParams>,
    pub equipment: Vec<CameraConfig>,
}

impl ScheduleConfig {
    /// Reads and resolves the configuration at `path`.
    ///
    /// # Errors
    /// Any [`ConfigError`]; none of them is recoverable.
    pub fn load_from_file(path: &Path, zone: LocalZone) -> Result<Self, ConfigError> {
        info!("Loading schedule configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, ConfigFormat::from_path(path), zone)
    }

    /// Resolves configuration text that has already been read.
    pub fn parse(content: &str, format: ConfigFormat, zone: LocalZone) -> Result<Self, ConfigError> {
        let file: ConfigFile = match format {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        };
        Self::resolve(file, zone)
    }

    fn resolve(file: ConfigFile, zone: LocalZone) -> Result<Self, ConfigError> {
        let (events, anchor) = resolve_events(file.events, zone)?;
        let resolver = TimeResolver {
            events: &events,
            zone,
            anchor,
        };

        let phases = resolve_phases(file.phases, &events)?;
        for issue in phases.coverage_issues() {
            warn!("Phase layout: {}", issue);
        }

        let equipment = resolve_equipment(file.equipment)?;
        let camera_actions = resolve_camera_actions(file.camera_actions, &resolver, &equipment)?;
        let voice_actions = resolve_voice_actions(file.voice_actions, &resolver)?;

        let config = Self {
            zone,
            events: EventSet::new(events),
            phases,
            camera_actions,
            voice_actions,
            equipment,
        };

        info!(
            events = config.events.len(),
            phases = config.phases.len(),
            camera_actions = config.camera_actions.len(),
            voice_actions = config.voice_actions.len(),
            cameras = config.equipment.len(),
            "Schedule configuration loaded"
        );
        for cam in &config.equipment {
            info!(
                "  Camera: {} | f/{} | ISO {} | E {} | serial: {} | usb: {}",
                cam.camera_id,
                cam.f_ratio,
                cam.iso,
                cam.enhancement_factor,
                cam.serial_port.as_deref().unwrap_or("-"),
                cam.usb_port.as_deref().unwrap_or("-"),
            );
        }

        Ok(config)
    }
}

// ── Resolution helpers ────────────────────────────────────────────────────────

fn resolve_events(
    entries: Vec<EventEntry>,
    zone: LocalZone,
) -> Result<(Vec<Event>, Option<NaiveDate>), ConfigError> {
    let mut seen = HashSet::new();
    let mut anchor = None;
    let mut events = Vec::with_capacity(entries.len());

    for entry in entries {
        if !seen.insert(entry.name.clone()) {
            return Err(ConfigError::DuplicateEvent(entry.name));
        }
        let value = entry
            .time
            .ok_or_else(|| ConfigError::MissingTime(entry.name.clone()))?;
        let instant = parse_instant(&value, zone, anchor).ok_or_else(|| ConfigError::InvalidTime {
            owner: format!("event '{}'", entry.name),
            field: "time",
            value: value.clone(),
        })?;
        // Time-of-day strings elsewhere are placed on the first event's date.
        anchor.get_or_insert(instant.date_naive());

        let text = entry.text.unwrap_or_else(|| entry.name.clone());
        debug!("  Event: {} | {} | {}", entry.name, instant, text);
        events.push(Event::new(entry.name, text, instant));
    }

    Ok((events, anchor))
}

fn resolve_phases(entries: Vec<PhaseEntry>, events: &[Event]) -> Result<PhaseSet, ConfigError> {
    let lookup = |name: Option<String>, text: &str| -> Result<Option<Instant>, ConfigError> {
        match name {
            None => Ok(None),
            Some(name) => events
                .iter()
                .find(|e| e.name == name)
                .map(|e| Some(e.instant))
                .ok_or_else(|| ConfigError::UnknownEvent {
                    owner: format!("phase '{text}'"),
                    name,
                }),
        }
    };

    let mut phases = Vec::with_capacity(entries.len());
    for entry in entries {
        let start = lookup(entry.start, &entry.text)?;
        let end = lookup(entry.end, &entry.text)?;
        phases.push(Phase::new(entry.text, start, end));
    }
    Ok(PhaseSet::new(phases))
}

fn resolve_equipment(entries: Vec<EquipmentEntry>) -> Result<Vec<CameraConfig>, ConfigError> {
    if entries.is_empty() {
        return Err(ConfigError::NoCameras);
    }

    let mut seen = HashSet::new();
    let mut cameras = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let camera_id = entry
            .camera_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| format!("camera-{}", i + 1));
        if !seen.insert(camera_id.clone()) {
            return Err(ConfigError::DuplicateCamera(camera_id));
        }

        let invalid = |reason: String| ConfigError::InvalidEquipment {
            camera: camera_id.clone(),
            reason,
        };
        if !(entry.f_ratio > 0.0) {
            return Err(invalid(format!("f_ratio must be positive (got {})", entry.f_ratio)));
        }
        if !(entry.iso > 0.0) {
            return Err(invalid(format!("iso must be positive (got {})", entry.iso)));
        }
        if !(entry.enhancement_factor > 0.0) {
            return Err(invalid(format!(
                "enhancement_factor must be positive (got {})",
                entry.enhancement_factor
            )));
        }
        if !(entry.shutter_timeout > 0.0 && entry.shutter_timeout.is_finite()) {
            return Err(invalid(format!(
                "shutter_timeout must be a positive number of seconds (got {})",
                entry.shutter_timeout
            )));
        }

        cameras.push(CameraConfig {
            camera_id,
            serial_port: entry.serial_port,
            usb_port: entry.usb_port,
            f_ratio: entry.f_ratio,
            iso: entry.iso,
            enhancement_factor: entry.enhancement_factor,
            shutter_timeout: entry.shutter_timeout,
        });
    }
    Ok(cameras)
}

/// Turns the textual `time`/`start`/`end` fields of an action into a
/// [`Timing`].
struct TimeResolver<'a> {
    events: &'a [Event],
    zone: LocalZone,
    anchor: Option<NaiveDate>,
}

impl TimeResolver<'_> {
    fn field(
        &self,
        owner: &str,
        field: &'static str,
        value: Option<&str>,
        offset: Option<f64>,
    ) -> Result<Option<Instant>, ConfigError> {
        let Some(value) = value else {
            if offset.is_some() {
                warn!("{}: {} offset given without a {}; ignored", owner, field, field);
            }
            return Ok(None);
        };

        let base = match self.events.iter().find(|e| e.name == value) {
            Some(event) => event.instant,
            None => parse_instant(value, self.zone, self.anchor).ok_or_else(|| {
                ConfigError::InvalidTime {
                    owner: owner.to_string(),
                    field,
                    value: value.to_string(),
                }
            })?,
        };
        let offset = offset.unwrap_or(0.0);
        parse::shift(base, offset)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidOffset {
                owner: owner.to_string(),
                field,
                value: value.to_string(),
                offset,
            })
    }

    fn timing(&self, name: &str, entry: &ActionEntry) -> Result<Timing, ConfigError> {
        let owner = format!("action '{name}'");
        let time = self.field(&owner, "time", entry.time.as_deref(), entry.offset)?;
        let start = self.field(&owner, "start", entry.start.as_deref(), entry.start_offset)?;
        let end = self.field(&owner, "end", entry.end.as_deref(), entry.end_offset)?;

        if time.is_some() && start.is_none() && end.is_none() && entry.interval.is_some() {
            debug!("{}: interval ignored on a single-instant action", owner);
        }

        Timing::new(time, start, end, entry.interval).map_err(|reason| {
            ConfigError::UnsupportedTiming {
                action: name.to_string(),
                reason,
            }
        })
    }
}

fn action_name(entry: &ActionEntry, kind: &str, index: usize) -> String {
    entry
        .name
        .clone()
        .or_else(|| entry.text.clone())
        .unwrap_or_else(|| format!("{kind}-{}", index + 1))
}

fn resolve_camera_actions(
    entries: Vec<ActionEntry>,
    resolver: &TimeResolver<'_>,
    cameras: &[CameraConfig],
) -> Result<ActionSet<CameraParams>, ConfigError> {
    let known = || {
        cameras
            .iter()
            .map(|c| c.camera_id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut actions = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let name = action_name(&entry, "camera-action", i);
        let timing = resolver.timing(&name, &entry)?;

        let shutter = entry
            .shutter
            .as_deref()
            .ok_or_else(|| ConfigError::MissingExposure(name.clone()))?;
        let exposure: ExposureSpec =
            shutter
                .parse()
                .map_err(|source| ConfigError::UnknownExposure {
                    action: name.clone(),
                    source,
                })?;

        let camera_id = entry.camera_id.as_ref().map(|id| id.to_string());
        match (&camera_id, cameras.len()) {
            (Some(id), n) if n > 1 && !cameras.iter().any(|c| &c.camera_id == id) => {
                return Err(ConfigError::UnknownCamera {
                    action: name,
                    camera: id.clone(),
                    known: known(),
                })
            }
            (None, n) if n > 1 => return Err(ConfigError::AmbiguousCamera(name)),
            (Some(id), 1) if cameras[0].camera_id != *id => warn!(
                "Camera action '{}' names camera '{}'; routing to the only camera '{}'",
                name, id, cameras[0].camera_id
            ),
            _ => {}
        }

        debug!(
            "  Camera action: {} | {} | time: {} | start: {:?} | end: {:?} | interval: {:?} | shutter: {} | camera: {:?}",
            name,
            timing.shape(),
            timing.time(),
            timing.start(),
            timing.end(),
            entry.interval,
            exposure,
            camera_id,
        );

        let text = entry.text.clone().unwrap_or_else(|| name.clone());
        actions.push(Action::new(
            name,
            text,
            timing,
            CameraParams {
                camera_id,
                exposure,
                priority: entry.priority,
            },
        ));
    }
    Ok(ActionSet::new(actions))
}

fn resolve_voice_actions(
    entries: Vec<ActionEntry>,
    resolver: &TimeResolver<'_>,
) -> Result<ActionSet<VoiceParams>, ConfigError> {
    let mut actions = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let name = action_name(&entry, "voice-action", i);
        let timing = resolver.timing(&name, &entry)?;
        let text = entry.text.clone().unwrap_or_else(|| name.clone());

        debug!("  Voice action: {} | {} | {}", name, timing.time(), text);
        actions.push(Action::new(
            name,
            text,
            timing,
            VoiceParams { voice: entry.voice },
        ));
    }
    Ok(ActionSet::new(actions))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
