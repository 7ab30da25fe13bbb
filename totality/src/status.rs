/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! One-line run status, logged once per second when the display is enabled.

use std::fmt::Write;

use crate::action::{ActionSet, CameraParams};
use crate::camera::Camera;
use crate::timeline::{EventSet, Instant, PhaseSet};
use crate::voice::format_hms;

/// How many upcoming camera actions the line names.
const UPCOMING: usize = 2;

/// `13:25:45 | Partial (Totality in 1:15) | Beginning of Totality in 1:15 | next: beads in 1:13, corona in 1:20 | active: partials | busy: EOS R`
pub fn status_line<'a>(
    now: Instant,
    phases: &PhaseSet,
    events: &EventSet,
    actions: &ActionSet<CameraParams>,
    cameras: impl IntoIterator<Item = &'a Camera>,
) -> String {
    let mut line = now.format("%H:%M:%S").to_string();

    let phase = phases.containing(now).map_or("-", |p| p.text.as_str());
    let _ = write!(line, " | {phase}");
    if let Some(upcoming) = phases.next_after(now) {
        if let Some(start) = upcoming.start {
            let _ = write!(line, " ({} in {})", upcoming.text, format_hms(start - now));
        }
    }

    match events.next_after(now) {
        Some(event) => {
            let _ = write!(line, " | {} in {}", event, format_hms(event.instant - now));
        }
        None => line.push_str(" | no more events"),
    }

    let next: Vec<String> = actions
        .next_n(now, UPCOMING)
        .iter()
        .map(|a| format!("{} in {}", a.name, format_hms(a.timing.time() - now)))
        .collect();
    if !next.is_empty() {
        let _ = write!(line, " | next: {}", next.join(", "));
    }

    let current: Vec<&str> = actions.current(now).iter().map(|a| a.name.as_str()).collect();
    if !current.is_empty() {
        let _ = write!(line, " | active: {}", current.join(", "));
    }

    let busy: Vec<&str> = cameras
        .into_iter()
        .filter(|c| c.is_busy())
        .map(|c| c.id())
        .collect();
    if !busy.is_empty() {
        let _ = write!(line, " | busy: {}", busy.join(", "));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, Timing};
    use crate::exposure::ExposureSpec;
    use crate::timeline::{Event, Phase};
    use chrono::{TimeZone, Utc};

    fn at(h: u32, m: u32, s: u32) -> Instant {
        Utc.with_ymd_and_hms(2024, 4, 8, h, m, s).unwrap().fixed_offset()
    }

    fn camera_action(name: &str, timing: Timing) -> Action<CameraParams> {
        Action::new(
            name,
            name,
            timing,
            CameraParams {
                camera_id: None,
                exposure: ExposureSpec::Shutter("1/250"),
                priority: 0,
            },
        )
    }

    #[test]
    fn line_lists_phase_event_and_actions() {
        let events = EventSet::new(vec![Event::new("c2", "Beginning of Totality", at(13, 27, 0))]);
        let phases = PhaseSet::new(vec![
            Phase::new("Partial", None, Some(at(13, 27, 0))),
            Phase::new("Totality", Some(at(13, 27, 0)), Some(at(13, 31, 0))),
        ]);
        let actions = ActionSet::new(vec![
            camera_action("beads", Timing::at(at(13, 26, 58))),
            camera_action("corona", Timing::at(at(13, 27, 5))),
            camera_action("diamond", Timing::at(at(13, 31, 0))),
            camera_action(
                "partials",
                Timing::new(None, Some(at(13, 0, 0)), Some(at(13, 26, 0)), Some(60.0)).unwrap(),
            ),
        ]);

        let line = status_line(at(13, 25, 45), &phases, &events, &actions, std::iter::empty());
        assert_eq!(
            line,
            "13:25:45 | Partial (Totality in 1:15) | Beginning of Totality in 1:15 \
             | next: beads in 1:13, corona in 1:20 | active: partials"
        );
    }

    #[test]
    fn line_in_last_phase_has_no_upcoming_phase() {
        let phases = PhaseSet::new(vec![Phase::new("Post-Eclipse", Some(at(14, 45, 0)), None)]);
        let actions = ActionSet::new(vec![camera_action("last", Timing::at(at(14, 50, 0)))]);
        let line = status_line(
            at(14, 49, 30),
            &phases,
            &EventSet::default(),
            &actions,
            std::iter::empty(),
        );
        assert_eq!(line, "14:49:30 | Post-Eclipse | no more events | next: last in 30");
    }

    #[test]
    fn line_after_last_event() {
        let line = status_line(
            at(15, 0, 0),
            &PhaseSet::default(),
            &EventSet::default(),
            &ActionSet::default(),
            std::iter::empty(),
        );
        assert_eq!(line, "15:00:00 | - | no more events");
    }
}
