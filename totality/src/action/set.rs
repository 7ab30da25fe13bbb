/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Ordered collection of actions of one kind.

use std::sync::Arc;

use super::Action;
use crate::timeline::Instant;

/// Actions sorted by their anchor time.  Entries are shared with the dispatch
/// workers, hence the `Arc`.
#[derive(Debug)]
pub struct ActionSet<P> {
    actions: Vec<Arc<Action<P>>>,
}

impl<P> Default for ActionSet<P> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
        }
    }
}

impl<P> ActionSet<P> {
    pub fn new(actions: Vec<Action<P>>) -> Self {
        let mut actions: Vec<_> = actions.into_iter().map(Arc::new).collect();
        actions.sort_by_key(|a| a.timing.time());
        Self { actions }
    }

    /// Every action whose timing matches `now`, regardless of eligibility.
    pub fn due(&self, now: Instant) -> impl Iterator<Item = &Arc<Action<P>>> {
        self.actions.iter().filter(move |a| a.matches(now))
    }

    /// Due actions that are eligible and whose current window has not been
    /// dispatched yet.
    pub fn eligible_due(&self, now: Instant) -> impl Iterator<Item = &Arc<Action<P>>> {
        self.actions.iter().filter(move |a| a.is_claimable(now))
    }

    /// Up to `n` actions anchored strictly after `now`, earliest first.
    pub fn next_n(&self, now: Instant, n: usize) -> Vec<&Arc<Action<P>>> {
        self.actions
            .iter()
            .filter(|a| a.timing.time() > now)
            .take(n)
            .collect()
    }

    /// Actions whose overall span contains `now`.
    pub fn current(&self, now: Instant) -> Vec<&Arc<Action<P>>> {
        self.actions.iter().filter(|a| a.timing.in_span(now)).collect()
    }

    /// `true` when no action is due now or can become due later.
    pub fn is_finished(&self, now: Instant) -> bool {
        !self
            .actions
            .iter()
            .any(|a| a.matches(now) || a.timing.is_pending(now))
    }

    /// Removes and returns every action due at `now`.
    ///
    /// Used for voice actions, which fire once and are dropped.
    pub fn take_due(&mut self, now: Instant) -> Vec<Arc<Action<P>>> {
        let (due, rest) = std::mem::take(&mut self.actions)
            .into_iter()
            .partition(|a| a.matches(now));
        self.actions = rest;
        due
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Action<P>>> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Timing, VoiceParams};
    use chrono::{Duration, TimeZone, Utc};

    fn at(h: u32, m: u32, s: u32) -> Instant {
        Utc.with_ymd_and_hms(2024, 4, 8, h, m, s).unwrap().fixed_offset()
    }

    fn instant(name: &str, t: Instant) -> Action<VoiceParams> {
        Action::new(name, name, Timing::at(t), VoiceParams::default())
    }

    fn window(name: &str, s: Instant, e: Instant, r: Option<f64>) -> Action<VoiceParams> {
        Action::new(name, name, Timing::new(None, Some(s), Some(e), r).unwrap(), VoiceParams::default())
    }

    fn sample() -> ActionSet<VoiceParams> {
        ActionSet::new(vec![
            instant("late", at(13, 40, 0)),
            instant("early", at(13, 20, 0)),
            window("burst", at(13, 27, 0), at(13, 31, 0), Some(5.0)),
        ])
    }

    #[test]
    fn actions_are_sorted_by_time() {
        let names: Vec<_> = sample().iter().map(|a| a.name.clone()).collect();
        assert_eq!(names, vec!["early", "burst", "late"]);
    }

    #[test]
    fn due_and_eligible_due() {
        let set = sample();
        let now = at(13, 27, 5);
        assert_eq!(set.due(now).count(), 1);
        assert!(set.iter().nth(1).unwrap().try_claim(now));
        assert_eq!(set.due(now).count(), 1);
        assert_eq!(set.eligible_due(now).count(), 0);
    }

    #[test]
    fn next_n_is_strictly_after_now() {
        let set = sample();
        let names = |now, n| -> Vec<String> {
            set.next_n(now, n).iter().map(|a| a.name.clone()).collect()
        };
        assert_eq!(names(at(13, 0, 0), 2), vec!["early", "burst"]);
        assert_eq!(names(at(13, 20, 0), 5), vec!["burst", "late"]);
        assert_eq!(names(at(13, 0, 0), 0), Vec::<String>::new());
        assert!(names(at(13, 40, 0), 2).is_empty());
    }

    #[test]
    fn current_reports_window_in_progress() {
        let set = sample();
        let cur = set.current(at(13, 28, 2));
        assert_eq!(cur.len(), 1);
        assert_eq!(cur[0].name, "burst");
    }

    #[test]
    fn finished_after_last_pending_action() {
        let set = sample();
        assert!(!set.is_finished(at(13, 35, 0)));
        assert!(!set.is_finished(at(13, 40, 0) + Duration::milliseconds(500)));
        assert!(set.is_finished(at(13, 40, 1)));
    }

    #[test]
    fn open_periodic_does_not_hold_run_open() {
        let open = Action::new(
            "watch",
            "watch",
            Timing::new(None, Some(at(14, 0, 0)), None, Some(60.0)).unwrap(),
            VoiceParams::default(),
        );
        let set = ActionSet::new(vec![open]);
        assert!(!set.is_finished(at(13, 59, 0)));
        assert!(set.is_finished(at(14, 0, 30)));
        // Still due while inside a sample window.
        assert!(!set.is_finished(at(14, 1, 0)));
    }

    #[test]
    fn take_due_removes_matched_actions() {
        let mut set = sample();
        let taken = set.take_due(at(13, 20, 0));
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].name, "early");
        assert_eq!(set.len(), 2);
        assert!(set.take_due(at(13, 20, 0)).is_empty());
    }
}
