// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Intelligence Module
//!
//! Derived analytics over persisted workout history. Every operation here is
//! a pure function over [`TrainingEntry`](crate::models::TrainingEntry) rows
//! and workout dates loaded from storage; nothing in this module mutates
//! state, and all functions take an explicit `now` so results are
//! deterministic under test.
//!
//! Submodules:
//! - [`muscle_groups`]: exercise-name to muscle-group categorization
//! - [`stats`]: weekly counts, heatmap, summary/streaks, split, progress
//! - [`trends`]: per-muscle-group weekly volume trends
//! - [`predictions`]: progressive-overload weight recommendations
//! - [`deload`]: fatigue scoring and deload detection
//! - [`suggestions`]: next-workout muscle-group suggestion

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

pub mod deload;
pub mod muscle_groups;
pub mod predictions;
pub mod stats;
pub mod suggestions;
pub mod trends;

pub use muscle_groups::MuscleGroup;

/// Kilograms-to-pounds conversion, applied at presentation time only.
pub const KG_TO_LB: f64 = 2.20462;

/// Direction of a volume trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Confidence level for recommendations and verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Kilogram value converted to pounds.
pub fn kg_to_lb(kg: f64) -> f64 {
    kg * KG_TO_LB
}

/// Round to one decimal place, half away from zero (`f64::round` semantics).
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to the nearest multiple of `step` (e.g. plate increments of 2.5 lb).
pub fn round_to_step(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}

/// ISO week label, e.g. `2024-W07`.
pub fn week_key(date: DateTime<Utc>) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: DateTime<Utc>) -> NaiveDate {
    let iso = date.iso_week();
    NaiveDate::from_isoywd_opt(iso.year(), iso.week(), Weekday::Mon)
        .unwrap_or_else(|| date.date_naive())
}

/// The `count` most recent ISO week starts, oldest first, ending with the
/// week containing `now`.
pub fn trailing_week_starts(now: DateTime<Utc>, count: usize) -> Vec<NaiveDate> {
    let current = week_start(now);
    (0..count)
        .rev()
        .map(|i| current - Duration::weeks(i as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_round1_half_away_from_zero() {
        // 2.25 and 22.5 are exactly representable, so this pins the mode.
        assert_eq!(round1(2.25), 2.3);
        assert_eq!(round1(-2.25), -2.3);
        assert_eq!(round1(2.24), 2.2);
    }

    #[test]
    fn test_round_to_step() {
        assert_eq!(round_to_step(101.2, 2.5), 100.0);
        assert_eq!(round_to_step(101.3, 2.5), 102.5);
        assert_eq!(round_to_step(0.0, 2.5), 0.0);
    }

    #[test]
    fn test_week_key_format() {
        let d = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        assert_eq!(week_key(d), "2024-W01");
    }

    #[test]
    fn test_week_key_year_boundary() {
        // 2023-12-31 is a Sunday and belongs to ISO week 2023-W52.
        let d = Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap();
        assert_eq!(week_key(d), "2023-W52");
        // 2025-12-29 is a Monday in ISO week 2026-W01.
        let d = Utc.with_ymd_and_hms(2025, 12, 29, 12, 0, 0).unwrap();
        assert_eq!(week_key(d), "2026-W01");
    }

    #[test]
    fn test_trailing_week_starts() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let weeks = trailing_week_starts(now, 4);
        assert_eq!(weeks.len(), 4);
        assert_eq!(weeks[3], NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(weeks[0], NaiveDate::from_ymd_opt(2024, 2, 19).unwrap());
    }
}
