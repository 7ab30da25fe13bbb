/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The eclipse timeline: contact events, the phases between them, and the
//! timezone-aware parsing that turns configuration strings into instants.

pub mod event;
pub mod parse;
pub mod phase;

pub use event::{Event, EventSet, MATCH_WINDOW_MS};
pub use parse::{parse_instant, Instant, LocalZone};
pub use phase::{Phase, PhaseSet};
