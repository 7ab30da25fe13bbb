/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Resolved temporal fields of an action and the matching rules.
//!
//! An action's timing resolves, once at load, to exactly one [`Shape`]:
//!
//! | Shape          | Configured fields          | Matches `now` iff                                  |
//! |----------------|----------------------------|----------------------------------------------------|
//! | `Instant`      | `time`                     | `time ≤ now < time + 1s`                           |
//! | `Continuous`   | `start`, `end`             | `start ≤ now < end`                                |
//! | `Periodic`     | `start`, `end`, `interval` | `start ≤ now < end` and `(now − start) mod r < 1s` |
//! | `OpenPeriodic` | `start`, `interval`        | `now ≥ start` and `(now − start) mod r < 1s`       |
//!
//! Every other combination is rejected with a [`TimingError`].

use std::fmt;

use chrono::Duration;

use crate::timeline::{Instant, MATCH_WINDOW_MS};

const MATCH_WINDOW_US: i64 = MATCH_WINDOW_MS * 1_000;

/// Why a combination of temporal fields cannot be scheduled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimingError {
    #[error("no time, start or end configured")]
    Missing,

    #[error("an end without a start is not supported")]
    EndWithoutStart,

    #[error("a start without an end needs a repeat interval")]
    OpenWithoutInterval,

    #[error("window is empty: start {start} is not before end {end}")]
    EmptyWindow { start: Instant, end: Instant },

    #[error("repeat interval must be positive (got {0}s)")]
    NonPositiveInterval(f64),

    #[error("repeat interval {0}s is below the 1 µs resolution")]
    IntervalTooSmall(f64),
}

/// The mutually exclusive matching modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Instant,
    Continuous,
    Periodic,
    OpenPeriodic,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Shape::Instant => "instant",
            Shape::Continuous => "continuous",
            Shape::Periodic => "periodic",
            Shape::OpenPeriodic => "open-periodic",
        };
        f.write_str(s)
    }
}

/// Resolved, immutable timing of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Anchor instant: the configured `time`, or `start` when no `time` was
    /// given.  Used for ordering and "next action" lookups.
    time: Instant,
    start: Option<Instant>,
    end: Option<Instant>,
    interval_us: Option<i64>,
    shape: Shape,
}

impl Timing {
    /// Classifies the configured fields.  `interval` is in seconds.
    pub fn new(
        time: Option<Instant>,
        start: Option<Instant>,
        end: Option<Instant>,
        interval: Option<f64>,
    ) -> Result<Self, TimingError> {
        let interval_us = match interval {
            Some(secs) if secs <= 0.0 || !secs.is_finite() => {
                return Err(TimingError::NonPositiveInterval(secs))
            }
            Some(secs) => match (secs * 1_000_000.0).round() as i64 {
                us if us < 1 => return Err(TimingError::IntervalTooSmall(secs)),
                us => Some(us),
            },
            None => None,
        };

        let shape = match (start, end, interval_us) {
            (None, None, _) => Shape::Instant,
            (Some(s), Some(e), _) if s >= e => {
                return Err(TimingError::EmptyWindow { start: s, end: e })
            }
            (Some(_), Some(_), None) => Shape::Continuous,
            (Some(_), Some(_), Some(_)) => Shape::Periodic,
            (Some(_), None, Some(_)) => Shape::OpenPeriodic,
            (Some(_), None, None) => return Err(TimingError::OpenWithoutInterval),
            (None, Some(_), _) => return Err(TimingError::EndWithoutStart),
        };

        let time = time.or(start).ok_or(TimingError::Missing)?;

        Ok(Self {
            time,
            start,
            end,
            // A bare instant fires once; an interval on it has no meaning.
            interval_us: if shape == Shape::Instant { None } else { interval_us },
            shape,
        })
    }

    /// A bare instant.
    pub fn at(time: Instant) -> Self {
        Self {
            time,
            start: None,
            end: None,
            interval_us: None,
            shape: Shape::Instant,
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn time(&self) -> Instant {
        self.time
    }

    pub fn start(&self) -> Option<Instant> {
        self.start
    }

    pub fn end(&self) -> Option<Instant> {
        self.end
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval_us.map(Duration::microseconds)
    }

    pub fn is_continuous(&self) -> bool {
        self.shape == Shape::Continuous
    }

    /// The temporal match predicate.
    pub fn matches(&self, now: Instant) -> bool {
        self.window_start(now).is_some()
    }

    /// Start of the match window containing `now`, or `None` if `now` does not
    /// match.
    ///
    /// Two calls inside the same window return the same instant, so it
    /// doubles as a key for "this window has already been fired".
    pub fn window_start(&self, now: Instant) -> Option<Instant> {
        match self.shape {
            Shape::Instant => {
                let elapsed = micros_between(self.time, now)?;
                (0..MATCH_WINDOW_US)
                    .contains(&elapsed)
                    .then_some(self.time)
            }
            Shape::Continuous => {
                let (start, end) = (self.start?, self.end?);
                (start <= now && now < end).then_some(start)
            }
            Shape::Periodic | Shape::OpenPeriodic => {
                let start = self.start?;
                if now < start || self.end.is_some_and(|end| now >= end) {
                    return None;
                }
                let interval = self.interval_us?;
                let elapsed = micros_between(start, now)?;
                let phase = elapsed.rem_euclid(interval);
                (phase < MATCH_WINDOW_US)
                    .then(|| start + Duration::microseconds(elapsed - phase))
            }
        }
    }

    /// `true` while `now` lies inside the action's overall span (the whole
    /// window for interval shapes, the one-second window for an instant).
    pub fn in_span(&self, now: Instant) -> bool {
        match self.shape {
            Shape::Instant => self.matches(now),
            _ => {
                self.start.is_some_and(|s| s <= now) && self.end.map_or(true, |e| now < e)
            }
        }
    }

    /// `true` while the action can still match at `now` or later.
    ///
    /// An open-periodic action keeps sampling after its first window but only
    /// counts as pending until that first window has opened, so it never holds
    /// a finished run open.
    pub fn is_pending(&self, now: Instant) -> bool {
        match self.shape {
            Shape::Instant => now < self.time + Duration::microseconds(MATCH_WINDOW_US),
            Shape::Continuous | Shape::Periodic => self.end.is_some_and(|e| now < e),
            Shape::OpenPeriodic => now < self.time,
        }
    }
}

fn micros_between(from: Instant, to: Instant) -> Option<i64> {
    (to - from).num_microseconds()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
