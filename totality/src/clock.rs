/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The run's single source of "now".
//!
//! [`Clock::now`] is the host clock plus a fixed offset.  The offset is zero in
//! a real run; in a test run it is set once so that "now" sits a chosen number
//! of seconds away from a contact event, and then stays constant while real
//! time advances.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::timeline::{parse, EventSet, Instant, LocalZone};

/// Source of the host's wall-clock time.
pub type HostClock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Why [`Clock::set_test_offset`] refused to move the clock.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TestOffsetError {
    #[error("cannot start test run: event '{0}' is not configured")]
    UnknownEvent(String),

    #[error("cannot start test run: {seconds}s from event '{event}' is out of range")]
    OutOfRange { event: String, seconds: f64 },
}

pub struct Clock {
    zone: LocalZone,
    host: HostClock,
    /// Offset added to the host clock, in microseconds.
    offset_us: AtomicI64,
}

impl Clock {
    /// A clock backed by the system time.
    pub fn system(zone: LocalZone) -> Self {
        Self::with_host(zone, Arc::new(Utc::now))
    }

    /// A clock backed by an arbitrary host time source (used by tests).
    pub fn with_host(zone: LocalZone, host: HostClock) -> Self {
        Self {
            zone,
            host,
            offset_us: AtomicI64::new(0),
        }
    }

    /// `hostClock() + offset`, in the observer's zone.
    pub fn now(&self) -> Instant {
        self.zone.from_utc((self.host)() + self.offset())
    }

    pub fn offset(&self) -> Duration {
        Duration::microseconds(self.offset_us.load(Ordering::Acquire))
    }

    pub fn set_offset(&self, offset: Duration) {
        let us = offset.num_microseconds().unwrap_or(i64::MAX);
        self.offset_us.store(us, Ordering::Release);
    }

    /// Shifts the clock so that, right now, it reads `seconds` relative to the
    /// instant of event `name` (negative = before the event).
    ///
    /// The offset is computed once; afterwards the clock advances at the host
    /// rate.
    pub fn set_test_offset(
        &self,
        events: &EventSet,
        name: &str,
        seconds: f64,
    ) -> Result<Duration, TestOffsetError> {
        let event = events
            .get(name)
            .ok_or_else(|| TestOffsetError::UnknownEvent(name.to_string()))?;

        let target = parse::shift(event.instant, seconds).ok_or_else(|| {
            TestOffsetError::OutOfRange {
                event: name.to_string(),
                seconds,
            }
        })?;
        let offset = target.with_timezone(&Utc) - (self.host)();
        self.set_offset(offset);

        info!(
            event = %event.name,
            seconds,
            offset_s = offset.num_milliseconds() as f64 / 1_000.0,
            "Test run: clock offset applied"
        );
        Ok(offset)
    }
}

/// A manually driven host clock for tests.
#[cfg(test)]
pub(crate) mod manual {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone)]
    pub(crate) struct ManualHost(Arc<Mutex<DateTime<Utc>>>);

    impl ManualHost {
        pub(crate) fn new(start: DateTime<Utc>) -> Self {
            Self(Arc::new(Mutex::new(start)))
        }

        pub(crate) fn advance(&self, by: Duration) {
            let mut t = self.0.lock().unwrap();
            *t += by;
        }

        pub(crate) fn set(&self, to: DateTime<Utc>) {
            *self.0.lock().unwrap() = to;
        }

        pub(crate) fn host(&self) -> HostClock {
            let inner = self.0.clone();
            Arc::new(move || *inner.lock().unwrap())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
