/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Shutter-speed table and brightness-target exposure calculation.
//!
//! A camera action names its exposure either as a literal shutter label the
//! camera accepts (`"1/250"`, `"0.5"`, `"2"`) or as a photographic target
//! (`"Corona - 1.0 Rs"`).  Targets are converted with the classic eclipse
//! exposure formula
//!
//! ```text
//! t = E · N² / (ISO · 2^Q)
//! ```
//!
//! where `N` is the focal ratio, `Q` the target's brightness exponent and `E`
//! the live-adjustable enhancement factor.  The computed `t` is snapped to the
//! nearest supported label.

use std::fmt;
use std::str::FromStr;

// ── Shutter table ─────────────────────────────────────────────────────────────

/// Every shutter label the camera accepts, in ascending duration order.
pub const SHUTTER_LABELS: &[&str] = &[
    "1/8000", "1/6400", "1/5000", "1/4000", "1/3200", "1/2500", "1/2000", "1/1600", "1/1250",
    "1/1000", "1/800", "1/640", "1/500", "1/400", "1/320", "1/250", "1/200", "1/160", "1/125",
    "1/100", "1/80", "1/60", "1/50", "1/40", "1/30", "1/25", "1/20", "1/15", "1/13", "1/10",
    "1/8", "1/6", "1/5", "1/4", "0.3", "0.4", "0.5", "0.6", "0.8", "1", "1.3", "1.6", "2", "2.5",
    "3.2", "4", "5", "6.3", "8", "10.3", "13", "15", "20", "25", "30",
];

pub fn is_supported_shutter(label: &str) -> bool {
    SHUTTER_LABELS.contains(&label)
}

/// Nominal duration of a shutter label in seconds (`"1/250"` → `0.004`).
pub fn shutter_seconds(label: &str) -> Option<f64> {
    match label.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => label.trim().parse().ok(),
    }
}

/// The supported label whose nominal duration is closest to `seconds`.
///
/// Ties go to the shorter label (the first one in ascending order).
pub fn nearest_shutter(seconds: f64) -> &'static str {
    let mut best = SHUTTER_LABELS[0];
    let mut best_diff = f64::INFINITY;
    for &label in SHUTTER_LABELS {
        let Some(d) = shutter_seconds(label) else {
            continue;
        };
        let diff = (d - seconds).abs();
        if diff < best_diff {
            best = label;
            best_diff = diff;
        }
    }
    best
}

// ── Brightness targets ────────────────────────────────────────────────────────

/// Photographic targets with a tabulated brightness exponent `Q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrightnessTarget {
    PartialNd4,
    PartialNd5,
    BailysBeads,
    Chromosphere,
    Prominences,
    Corona0_1,
    Corona0_2,
    Corona0_5,
    Corona1_0,
    Corona2_0,
    Corona4_0,
    Corona8_0,
}

impl BrightnessTarget {
    pub const ALL: [BrightnessTarget; 12] = [
        BrightnessTarget::PartialNd4,
        BrightnessTarget::PartialNd5,
        BrightnessTarget::BailysBeads,
        BrightnessTarget::Chromosphere,
        BrightnessTarget::Prominences,
        BrightnessTarget::Corona0_1,
        BrightnessTarget::Corona0_2,
        BrightnessTarget::Corona0_5,
        BrightnessTarget::Corona1_0,
        BrightnessTarget::Corona2_0,
        BrightnessTarget::Corona4_0,
        BrightnessTarget::Corona8_0,
    ];

    /// The name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            BrightnessTarget::PartialNd4 => "Partial, ND 4.0",
            BrightnessTarget::PartialNd5 => "Partial, ND 5.0",
            BrightnessTarget::BailysBeads => "Baily's Beads",
            BrightnessTarget::Chromosphere => "Chromosphere",
            BrightnessTarget::Prominences => "Prominences",
            BrightnessTarget::Corona0_1 => "Corona - 0.1 Rs",
            BrightnessTarget::Corona0_2 => "Corona - 0.2 Rs",
            BrightnessTarget::Corona0_5 => "Corona - 0.5 Rs",
            BrightnessTarget::Corona1_0 => "Corona - 1.0 Rs",
            BrightnessTarget::Corona2_0 => "Corona - 2.0 Rs",
            BrightnessTarget::Corona4_0 => "Corona - 4.0 Rs",
            BrightnessTarget::Corona8_0 => "Corona - 8.0 Rs",
        }
    }

    /// Brightness exponent `Q`.
    pub fn q(self) -> i32 {
        match self {
            BrightnessTarget::PartialNd4 => 11,
            BrightnessTarget::PartialNd5 => 8,
            BrightnessTarget::BailysBeads => 12,
            BrightnessTarget::Chromosphere => 11,
            BrightnessTarget::Prominences => 9,
            BrightnessTarget::Corona0_1 => 7,
            BrightnessTarget::Corona0_2 => 5,
            BrightnessTarget::Corona0_5 => 3,
            BrightnessTarget::Corona1_0 => 1,
            BrightnessTarget::Corona2_0 => 0,
            BrightnessTarget::Corona4_0 => -1,
            BrightnessTarget::Corona8_0 => -3,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// `t = E · N² / (ISO · 2^Q)`, in seconds.
    pub fn exposure_seconds(self, f_ratio: f64, iso: f64, enhancement: f64) -> f64 {
        enhancement * f_ratio.powi(2) / (iso * 2f64.powi(self.q()))
    }
}

impl fmt::Display for BrightnessTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── ExposureSpec ──────────────────────────────────────────────────────────────

/// How a camera action asks for its exposure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExposureSpec {
    /// A literal, supported shutter label.
    Shutter(&'static str),
    /// A brightness target resolved against the camera's optics at dispatch.
    Target(BrightnessTarget),
}

impl ExposureSpec {
    /// Resolves to a shutter label for a camera with the given optics.
    pub fn resolve(&self, f_ratio: f64, iso: f64, enhancement: f64) -> &'static str {
        match self {
            ExposureSpec::Shutter(label) => *label,
            ExposureSpec::Target(target) => {
                nearest_shutter(target.exposure_seconds(f_ratio, iso, enhancement))
            }
        }
    }
}

/// Error returned when a string is neither a shutter label nor a target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is neither a supported shutter speed nor a known brightness target")]
pub struct UnknownExposure(pub String);

impl FromStr for ExposureSpec {
    type Err = UnknownExposure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(label) = SHUTTER_LABELS.iter().find(|l| **l == s) {
            return Ok(ExposureSpec::Shutter(*label));
        }
        BrightnessTarget::from_name(s)
            .map(ExposureSpec::Target)
            .ok_or_else(|| UnknownExposure(s.to_string()))
    }
}

impl fmt::Display for ExposureSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposureSpec::Shutter(label) => f.write_str(label),
            ExposureSpec::Target(target) => write!(f, "{target}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutter_table_is_ascending() {
        let durations: Vec<f64> = SHUTTER_LABELS
            .iter()
            .map(|l| shutter_seconds(l).unwrap())
            .collect();
        assert!(durations.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(SHUTTER_LABELS.len(), 55);
    }

    #[test]
    fn shutter_seconds_parses_fractions_and_decimals() {
        assert_eq!(shutter_seconds("1/250"), Some(0.004));
        assert_eq!(shutter_seconds("0.5"), Some(0.5));
        assert_eq!(shutter_seconds("30"), Some(30.0));
        assert_eq!(shutter_seconds("1/0"), None);
        assert_eq!(shutter_seconds("fast"), None);
    }

    #[test]
    fn literal_label_passes_through() {
        let spec: ExposureSpec = "1/250".parse().unwrap();
        assert_eq!(spec, ExposureSpec::Shutter("1/250"));
        assert_eq!(spec.resolve(10.0, 100.0, 1.0), "1/250");
        // Enhancement never affects a literal label.
        assert_eq!(spec.resolve(10.0, 100.0, 9.0), "1/250");
    }

    #[test]
    fn corona_one_radius_at_f10_iso100_is_half_second() {
        let spec: ExposureSpec = "Corona - 1.0 Rs".parse().unwrap();
        assert_eq!(spec, ExposureSpec::Target(BrightnessTarget::Corona1_0));
        assert_eq!(spec.resolve(10.0, 100.0, 1.0), "0.5");
    }

    #[test]
    fn targets_snap_to_nearest_label() {
        // Partial ND 5.0: Q = 8 → 100 / (100 · 256) ≈ 0.0039 s
        assert_eq!(
            ExposureSpec::Target(BrightnessTarget::PartialNd5).resolve(10.0, 100.0, 1.0),
            "1/250"
        );
        // Baily's Beads: Q = 12 → 100 / (100 · 4096) ≈ 0.000244 s
        assert_eq!(
            ExposureSpec::Target(BrightnessTarget::BailysBeads).resolve(10.0, 100.0, 1.0),
            "1/4000"
        );
        // Corona 8 Rs: Q = -3 → 8 s
        assert_eq!(
            ExposureSpec::Target(BrightnessTarget::Corona8_0).resolve(10.0, 100.0, 1.0),
            "8"
        );
    }

    #[test]
    fn enhancement_scales_exposure() {
        let spec = ExposureSpec::Target(BrightnessTarget::Corona1_0);
        assert_eq!(spec.resolve(10.0, 100.0, 2.0), "1");
    }

    #[test]
    fn nearest_shutter_clamps_to_table_ends() {
        assert_eq!(nearest_shutter(0.0), "1/8000");
        assert_eq!(nearest_shutter(-1.0), "1/8000");
        assert_eq!(nearest_shutter(1_000.0), "30");
    }

    #[test]
    fn nearest_shutter_tie_prefers_shorter_label() {
        // Exactly halfway between 0.4 and 0.5.
        assert_eq!(nearest_shutter(0.45), "0.4");
    }

    #[test]
    fn unknown_exposure_is_rejected() {
        let err = "Sunspots".parse::<ExposureSpec>().unwrap_err();
        assert_eq!(err.0, "Sunspots");
    }

    #[test]
    fn every_target_round_trips_by_name() {
        for t in BrightnessTarget::ALL {
            assert_eq!(BrightnessTarget::from_name(t.name()), Some(t));
        }
    }
}
