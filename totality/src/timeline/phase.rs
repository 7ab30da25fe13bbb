/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Named half-open intervals between contact events.

use std::fmt;

use super::parse::Instant;

/// A phase `[start, end)`.  A missing bound is open: "since the beginning of
/// time" or "until the end of time".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub text: String,
    pub start: Option<Instant>,
    pub end: Option<Instant>,
}

impl Phase {
    pub fn new(text: impl Into<String>, start: Option<Instant>, end: Option<Instant>) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    pub fn matches(&self, now: Instant) -> bool {
        self.start.map_or(true, |s| s <= now) && self.end.map_or(true, |e| now < e)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// All configured phases, ordered by start (the open-start phase first).
#[derive(Debug, Clone, Default)]
pub struct PhaseSet {
    phases: Vec<Phase>,
}

impl PhaseSet {
    pub fn new(mut phases: Vec<Phase>) -> Self {
        // `None < Some(_)`, so an open start sorts first.
        phases.sort_by_key(|p| p.start);
        Self { phases }
    }

    /// The phase containing `now`.
    pub fn containing(&self, now: Instant) -> Option<&Phase> {
        self.phases.iter().find(|p| p.matches(now))
    }

    /// The earliest phase that starts strictly after `now`.
    pub fn next_after(&self, now: Instant) -> Option<&Phase> {
        self.phases
            .iter()
            .find(|p| p.start.is_some_and(|s| s > now))
    }

    /// Describes every way in which the phases fail to partition the
    /// timeline: a bounded first start, a bounded last end, gaps and overlaps.
    /// An empty result means the partition is complete.
    pub fn coverage_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let (Some(first), Some(last)) = (self.phases.first(), self.phases.last()) else {
            issues.push("no phases configured".to_string());
            return issues;
        };

        if first.start.is_some() {
            issues.push(format!("first phase '{}' has a start bound", first.text));
        }
        if last.end.is_some() {
            issues.push(format!("last phase '{}' has an end bound", last.text));
        }
        for pair in self.phases.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            match (a.end, b.start) {
                (Some(end), Some(start)) if end < start => {
                    issues.push(format!("gap between '{}' and '{}'", a.text, b.text))
                }
                (Some(end), Some(start)) if end > start => {
                    issues.push(format!("'{}' overlaps '{}'", a.text, b.text))
                }
                (None, _) => issues.push(format!("'{}' is open-ended but not last", a.text)),
                _ => {}
            }
        }
        issues
    }

    pub fn iter(&self) -> impl Iterator<Item = &Phase> {
        self.phases.iter()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(h: u32, m: u32, s: u32) -> Instant {
        Utc.with_ymd_and_hms(2024, 4, 8, h, m, s).unwrap().fixed_offset()
    }

    /// The standard five-phase layout from the config template.
    fn standard() -> PhaseSet {
        let (c1, c2, c3, c4) = (at(12, 14, 0), at(13, 27, 0), at(13, 31, 0), at(14, 45, 0));
        PhaseSet::new(vec![
            Phase::new("Post-Eclipse", Some(c4), None),
            Phase::new("Pre-Eclipse", None, Some(c1)),
            Phase::new("Partial", Some(c1), Some(c2)),
            Phase::new("Totality", Some(c2), Some(c3)),
            Phase::new("Partial", Some(c3), Some(c4)),
        ])
    }

    #[test]
    fn containing_uses_half_open_bounds() {
        let set = standard();
        assert_eq!(set.containing(at(10, 0, 0)).unwrap().text, "Pre-Eclipse");
        assert_eq!(set.containing(at(13, 27, 0)).unwrap().text, "Totality");
        assert_eq!(
            set.containing(at(13, 31, 0) - Duration::milliseconds(1))
                .unwrap()
                .text,
            "Totality"
        );
        assert_eq!(set.containing(at(13, 31, 0)).unwrap().text, "Partial");
        assert_eq!(set.containing(at(20, 0, 0)).unwrap().text, "Post-Eclipse");
    }

    #[test]
    fn standard_layout_partitions_timeline() {
        assert!(standard().coverage_issues().is_empty());
    }

    #[test]
    fn gap_and_overlap_are_reported() {
        let set = PhaseSet::new(vec![
            Phase::new("a", None, Some(at(10, 0, 0))),
            Phase::new("b", Some(at(10, 0, 5)), Some(at(11, 0, 0))),
            Phase::new("c", Some(at(10, 59, 0)), None),
        ]);
        let issues = set.coverage_issues();
        assert_eq!(issues.len(), 2, "{issues:?}");
        assert!(issues[0].contains("gap"));
        assert!(issues[1].contains("overlaps"));
    }

    #[test]
    fn next_after_skips_current_phase() {
        let set = standard();
        assert_eq!(set.next_after(at(13, 28, 0)).unwrap().text, "Partial");
        assert!(set.next_after(at(15, 0, 0)).is_none());
    }
}
