/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Spoken announcements.
//!
//! Speech is fire-and-forget: [`Announcer::announce`] returns immediately and
//! the scheduler never waits for playback.

use std::process::Stdio;

use chrono::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use crate::timeline::{EventSet, Instant, PhaseSet};

/// Words per minute passed to the speech command.
pub const SPEECH_RATE: u32 = 184;

pub trait Announcer: Send + Sync {
    /// Starts speaking `text` and returns without waiting.
    fn announce(&self, text: &str, voice: Option<&str>);
}

/// Speaks through `say -r 184 [-v <voice>] <text>`.
///
/// Must be used from within a tokio runtime.
pub struct SpeechCommand {
    program: String,
}

impl SpeechCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, text: &str, voice: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-r").arg(SPEECH_RATE.to_string());
        if let Some(voice) = voice {
            cmd.arg("-v").arg(voice);
        }
        cmd.arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl Default for SpeechCommand {
    fn default() -> Self {
        Self::new("say")
    }
}

impl Announcer for SpeechCommand {
    fn announce(&self, text: &str, voice: Option<&str>) {
        info!(voice = voice.unwrap_or("default"), "Saying \"{}\"", text);
        let mut cmd = self.command(text, voice);
        let program = self.program.clone();
        tokio::spawn(async move {
            match cmd.status().await {
                Ok(status) if status.success() => {}
                Ok(status) => warn!("Speech command '{}' exited with {}", program, status),
                Err(e) => warn!("Cannot run speech command '{}': {}", program, e),
            }
        });
    }
}

/// Logs announcements without playing them (`--nosound`).
#[derive(Debug, Default)]
pub struct Silent;

impl Announcer for Silent {
    fn announce(&self, text: &str, _voice: Option<&str>) {
        info!("(muted) \"{}\"", text);
    }
}

// ── Phrasing ──────────────────────────────────────────────────────────────────

fn split(d: Duration) -> (i64, i64, i64, i64) {
    let secs = d.num_seconds().max(0);
    (secs / 86_400, secs % 86_400 / 3_600, secs % 3_600 / 60, secs % 60)
}

/// Spoken form of a duration: `"1 minute, and 15 seconds"`.  Negative
/// durations read as `"0 seconds"`.
pub fn describe_countdown(d: Duration) -> String {
    let (days, hours, minutes, seconds) = split(d);
    let unit = |n: i64, word: &str| format!("{n} {word}{}", if n > 1 { "s" } else { "" });

    let parts: Vec<String> = [(days, "day"), (hours, "hour"), (minutes, "minute"), (seconds, "second")]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, w)| unit(n, w))
        .collect();

    match parts.as_slice() {
        [] => "0 seconds".to_string(),
        [one] => one.clone(),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// Clock form of a duration: `"1:02:03"`, `"2:03"`, `"3"`.
pub fn format_hms(d: Duration) -> String {
    let (days, hours, minutes, seconds) = split(d);
    if days > 0 {
        format!("{days}:{hours:02}:{minutes:02}:{seconds:02}")
    } else if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else if minutes > 0 {
        format!("{minutes}:{seconds:02}")
    } else {
        format!("{seconds}")
    }
}

/// The greeting spoken once at startup, or `None` once every event has
/// passed.
pub fn startup_announcement(now: Instant, phases: &PhaseSet, events: &EventSet) -> Option<String> {
    let next = events.next_after(now)?;
    let countdown = describe_countdown(next.instant - now);
    Some(match phases.containing(now) {
        Some(phase) => format!(
            "We are currently in the {} phase. {} until {}",
            phase, countdown, next
        ),
        None => format!("{} until {}", countdown, next),
    })
}

/// An [`Announcer`] that records what it was asked to say.
#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use super::Announcer;

    #[derive(Default)]
    pub(crate) struct RecordingAnnouncer {
        pub(crate) spoken: Mutex<Vec<(String, Option<String>)>>,
    }

    impl RecordingAnnouncer {
        pub(crate) fn texts(&self) -> Vec<String> {
            self.spoken
                .lock()
                .unwrap()
                .iter()
                .map(|(t, _)| t.clone())
                .collect()
        }
    }

    impl Announcer for RecordingAnnouncer {
        fn announce(&self, text: &str, voice: Option<&str>) {
            self.spoken
                .lock()
                .unwrap()
                .push((text.to_string(), voice.map(String::from)));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
