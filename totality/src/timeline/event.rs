/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Contact events (c1, c2, max, c3, c4) and the ordered [`EventSet`].

use std::fmt;

use super::parse::Instant;

/// Width of the window in which an instant "matches" a given time.
///
/// Wider than the scheduler's 10 ms polling step.
pub const MATCH_WINDOW_MS: i64 = 1_000;

/// Returns [`MATCH_WINDOW_MS`] as a chrono duration.
fn match_window() -> chrono::Duration {
    chrono::Duration::milliseconds(MATCH_WINDOW_MS)
}

// ── Event ─────────────────────────────────────────────────────────────────────

/// A named absolute instant, immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub text: String,
    pub instant: Instant,
}

impl Event {
    pub fn new(name: impl Into<String>, text: impl Into<String>, instant: Instant) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            instant,
        }
    }

    /// `true` iff `instant ≤ at < instant + 1s`.
    pub fn matches(&self, at: Instant) -> bool {
        self.instant <= at && at < self.instant + match_window()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ── EventSet ──────────────────────────────────────────────────────────────────

/// All configured events, kept sorted by instant.
#[derive(Debug, Clone, Default)]
pub struct EventSet {
    events: Vec<Event>,
}

impl EventSet {
    pub fn new(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.instant);
        Self { events }
    }

    /// Looks an event up by its configured name (`"c2"`, `"max"`, ...).
    pub fn get(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.name == name)
    }

    /// The earliest event whose instant is at or after `now`.
    pub fn next_after(&self, now: Instant) -> Option<&Event> {
        self.events.iter().find(|e| e.instant >= now)
    }

    /// `true` once `now` has left the final event's match window.
    ///
    /// An empty set is always "after last".
    pub fn is_after_last(&self, now: Instant) -> bool {
        match self.events.last() {
            Some(last) => now >= last.instant && !last.matches(now),
            None => true,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
