/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Scheduled camera and voice actions.
//!
//! Both kinds share one [`Action`] type: a resolved [`Timing`], an eligibility
//! flag, and a per-kind payload ([`CameraParams`] or [`VoiceParams`]).
//!
//! # Claim protocol
//!
//! A due camera action is dispatched at most once per match window:
//!
//! ```text
//!  eligible ──try_claim()──► dispatched ──worker──► executing ──release()──► eligible
//! ```
//!
//! [`Action::try_claim`] flips `eligible` from `true` to `false` with a single
//! compare-and-swap and records the start of the window it claimed.  A second
//! tick that sees the same window (even after the job has already finished and
//! released the action) is refused.

pub mod set;
pub mod timing;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use crate::exposure::ExposureSpec;
use crate::timeline::Instant;

pub use set::ActionSet;
pub use timing::{Shape, Timing, TimingError};

const NEVER_FIRED: i64 = i64::MIN;

// ── Payloads ──────────────────────────────────────────────────────────────────

/// Camera-specific fields of an action.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraParams {
    /// Target camera.  `None` is only valid with a single configured camera.
    pub camera_id: Option<String>,
    pub exposure: ExposureSpec,
    /// Parsed for completeness; dispatch order does not depend on it.
    pub priority: i32,
}

/// Voice-specific fields of an action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoiceParams {
    pub voice: Option<String>,
}

pub type CameraAction = Action<CameraParams>;
pub type VoiceAction = Action<VoiceParams>;

// ── Action ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Action<P> {
    pub name: String,
    pub text: String,
    pub timing: Timing,
    pub params: P,
    eligible: AtomicBool,
    /// Start of the last dispatched window, as UTC microseconds.
    last_fired_us: AtomicI64,
}

impl<P> Action<P> {
    pub fn new(name: impl Into<String>, text: impl Into<String>, timing: Timing, params: P) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            timing,
            params,
            eligible: AtomicBool::new(true),
            last_fired_us: AtomicI64::new(NEVER_FIRED),
        }
    }

    pub fn matches(&self, now: Instant) -> bool {
        self.timing.matches(now)
    }

    pub fn is_eligible(&self) -> bool {
        self.eligible.load(Ordering::Acquire)
    }

    /// `true` if the action matches `now`, is eligible, and the window
    /// containing `now` has not been dispatched yet.
    pub fn is_claimable(&self, now: Instant) -> bool {
        self.is_eligible()
            && self
                .timing
                .window_start(now)
                .is_some_and(|w| !self.already_fired(w))
    }

    /// Atomically moves the action from eligible to dispatched for the window
    /// containing `now`.  Returns `false` if it does not match, is already in
    /// flight, or this window was already dispatched.
    pub fn try_claim(&self, now: Instant) -> bool {
        let Some(window) = self.timing.window_start(now) else {
            return false;
        };
        if self.already_fired(window) {
            return false;
        }
        if self
            .eligible
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.last_fired_us
            .store(window.timestamp_micros(), Ordering::Release);
        true
    }

    /// Marks the action eligible again once its job has completed.
    pub fn release(&self) {
        self.eligible.store(true, Ordering::Release);
    }

    fn already_fired(&self, window: Instant) -> bool {
        self.last_fired_us.load(Ordering::Acquire) == window.timestamp_micros()
    }
}

impl<P> fmt::Display for Action<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.timing.shape())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
