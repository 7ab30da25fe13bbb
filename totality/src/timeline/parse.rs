/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Observer timezone and datetime-string parsing.
//!
//! Every configuration instant is localized exactly once, at load time, to the
//! observer's [`LocalZone`].  The zone is detected once at startup and handed
//! to every call site explicitly; nothing in the crate reads the host timezone
//! on its own.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};

/// A timezone-aware point in time, expressed in the observer's local offset.
pub type Instant = DateTime<FixedOffset>;

/// Accepted full datetime layouts (no offset; interpreted in the local zone).
///
/// `%.f` also accepts a missing fractional part when parsing.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
];

/// Accepted time-of-day layouts, anchored to the eclipse date.
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

// ── LocalZone ─────────────────────────────────────────────────────────────────

/// The observer's local UTC offset, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalZone {
    offset: FixedOffset,
}

impl LocalZone {
    /// Reads the host's current local offset.  Call once, at startup.
    pub fn detect() -> Self {
        Self {
            offset: Local::now().offset().fix(),
        }
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Converts a UTC instant into the observer's zone.
    pub fn from_utc(&self, utc: DateTime<Utc>) -> Instant {
        utc.with_timezone(&self.offset)
    }

    /// Attaches the observer's offset to a wall-clock datetime.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<Instant> {
        self.offset.from_local_datetime(&naive).single()
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parses a configuration datetime string into an [`Instant`].
///
/// * RFC 3339 strings keep their instant and are converted to `zone`.
/// * Offset-less datetimes are read as local wall-clock time in `zone`.
/// * A bare time of day (`13:51:00`) is placed on `anchor`, the local date of
///   the first contact event.  Without an anchor it is rejected.
///
/// Returns `None` when no accepted layout matches.
pub fn parse_instant(value: &str, zone: LocalZone, anchor: Option<NaiveDate>) -> Option<Instant> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&zone.offset()));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return zone.localize(naive);
        }
    }

    let date = anchor?;
    for fmt in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(value, fmt) {
            return zone.localize(date.and_time(time));
        }
    }

    None
}

/// Converts a (possibly fractional) number of seconds into a chrono duration
/// with microsecond resolution.  `None` for NaN, infinities and values whose
/// microsecond count does not fit an `i64`.
pub fn seconds(value: f64) -> Option<chrono::Duration> {
    let us = (value * 1_000_000.0).round();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    (us.is_finite() && us.abs() < i64::MAX as f64)
        .then(|| chrono::Duration::microseconds(us as i64))
}

/// `base` moved by `offset` seconds, or `None` if the offset is not a finite
/// number or the result leaves chrono's representable range.
pub fn shift(base: Instant, offset: f64) -> Option<Instant> {
    base.checked_add_signed(seconds(offset)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn cdt() -> LocalZone {
        LocalZone::fixed(FixedOffset::west_opt(5 * 3600).unwrap())
    }

    #[test]
    fn naive_datetime_is_localized_to_zone() {
        let dt = parse_instant("2024-04-08 13:27:41.300", cdt(), None).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(dt.hour(), 13);
        assert_eq!(dt.nanosecond(), 300_000_000);
    }

    #[test]
    fn fractional_seconds_are_optional() {
        let a = parse_instant("2024-04-08 13:27:41", cdt(), None).unwrap();
        let b = parse_instant("2024-04-08T13:27:41.0", cdt(), None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rfc3339_keeps_instant_and_converts_offset() {
        let dt = parse_instant("2024-04-08T18:27:41Z", cdt(), None).unwrap();
        assert_eq!(dt.hour(), 13);
        assert_eq!(dt.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn time_of_day_needs_an_anchor() {
        assert!(parse_instant("13:51:00", cdt(), None).is_none());

        let anchor = NaiveDate::from_ymd_opt(2024, 4, 8).unwrap();
        let dt = parse_instant("13:51:00", cdt(), Some(anchor)).unwrap();
        assert_eq!(dt.date_naive(), anchor);
        assert_eq!(dt.minute(), 51);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_instant("not a time", cdt(), None).is_none());
        assert!(parse_instant("", cdt(), None).is_none());
        assert!(parse_instant("2024-13-40 99:00:00", cdt(), None).is_none());
    }

    #[test]
    fn seconds_keeps_fractional_part() {
        assert_eq!(seconds(1.5).unwrap().num_milliseconds(), 1_500);
        assert_eq!(seconds(-75.0).unwrap().num_seconds(), -75);
    }

    #[test]
    fn non_finite_seconds_are_rejected() {
        assert!(seconds(f64::NAN).is_none());
        assert!(seconds(f64::INFINITY).is_none());
        assert!(seconds(-f64::INFINITY).is_none());
        assert!(seconds(1e300).is_none());
    }

    #[test]
    fn shift_refuses_out_of_range_results() {
        let base = parse_instant("2024-04-08 13:27:41", cdt(), None).unwrap();
        assert_eq!(shift(base, -60.0).unwrap().minute(), 26);
        // ~285 000 years: fits in microseconds, not in a chrono date.
        assert!(shift(base, 9e12).is_none());
        assert!(shift(base, -9e12).is_none());
        assert!(shift(base, 1e13).is_none());
        assert!(shift(base, f64::NAN).is_none());
    }
}
