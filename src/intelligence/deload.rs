// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fatigue scoring from recent volume patterns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{kg_to_lb, round1, trailing_week_starts, week_start, Confidence};
use crate::models::TrainingEntry;

/// Analysis window in weeks.
const WINDOW_WEEKS: usize = 6;

/// Minimum workouts in the window before a verdict is attempted.
const MIN_WORKOUTS: usize = 6;

/// Minimum distinct training weeks before a verdict is attempted.
const MIN_ACTIVE_WEEKS: usize = 4;

/// Score at or above which a deload is advised.
const DELOAD_SCORE: i32 = 2;

/// Deload verdict with the signals that contributed to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeloadResponse {
    pub needs_deload: bool,
    pub score: i32,
    pub confidence: Confidence,
    pub signals: Vec<String>,
    pub weekly_volume_lb: Vec<f64>,
}

/// Score fatigue over the trailing six ISO weeks. Three indicators
/// contribute: a sharp volume drop in the last two weeks (overreaching
/// followed by collapse, +2), recent volume spiking well above the window
/// baseline (+2), and most of the last month running hot above baseline
/// (+1). A total of two or more advises a deload.
pub fn deload_status(
    dates: &[DateTime<Utc>],
    entries: &[TrainingEntry],
    now: DateTime<Utc>,
) -> DeloadResponse {
    let starts = trailing_week_starts(now, WINDOW_WEEKS);
    let index: HashMap<_, _> = starts.iter().enumerate().map(|(i, s)| (*s, i)).collect();
    let window_start = starts[0];

    let mut weekly = vec![0.0_f64; WINDOW_WEEKS];
    for entry in entries {
        if let Some(i) = index.get(&week_start(entry.started_at)) {
            weekly[*i] += kg_to_lb(entry.volume_kg());
        }
    }
    let weekly_volume_lb: Vec<f64> = weekly.iter().map(|v| round1(*v)).collect();

    let in_window: Vec<_> = dates
        .iter()
        .filter(|d| week_start(**d) >= window_start && **d <= now)
        .collect();
    let active_weeks: HashSet<_> = in_window.iter().map(|d| week_start(**d)).collect();

    if in_window.len() < MIN_WORKOUTS || active_weeks.len() < MIN_ACTIVE_WEEKS {
        return DeloadResponse {
            needs_deload: false,
            score: 0,
            confidence: Confidence::Low,
            signals: vec!["not enough recent training data to assess fatigue".to_string()],
            weekly_volume_lb,
        };
    }

    let mut score = 0;
    let mut signals = Vec::new();

    let recent = (weekly[4] + weekly[5]) / 2.0;
    let prior = (weekly[2] + weekly[3]) / 2.0;
    let baseline = weekly.iter().sum::<f64>() / WINDOW_WEEKS as f64;

    if prior > 0.0 && recent < prior * 0.85 {
        score += 2;
        signals.push(format!(
            "volume dropped over 15% in the last two weeks ({:.0} lb vs {:.0} lb)",
            recent, prior
        ));
    }
    if baseline > 0.0 && recent > baseline * 1.30 {
        score += 2;
        signals.push(format!(
            "recent volume is over 30% above the six-week baseline ({:.0} lb vs {:.0} lb)",
            recent, baseline
        ));
    }
    let hot_weeks = weekly[2..]
        .iter()
        .filter(|v| baseline > 0.0 && **v > baseline * 1.10)
        .count();
    if hot_weeks >= 3 {
        score += 1;
        signals.push(format!(
            "{hot_weeks} of the last 4 weeks ran above 110% of baseline volume"
        ));
    }

    let confidence = if score >= 3 {
        Confidence::High
    } else if score >= DELOAD_SCORE {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    DeloadResponse {
        needs_deload: score >= DELOAD_SCORE,
        score,
        confidence,
        signals,
        weekly_volume_lb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SetEntry;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        // A Friday, so week offsets stay inside their ISO weeks.
        Utc.with_ymd_and_hms(2024, 6, 14, 10, 0, 0).unwrap()
    }

    /// One entry whose volume is exactly `volume_lb`, placed `weeks_ago`
    /// whole ISO weeks before `now`.
    fn entry_lb(weeks_ago: i64, volume_lb: f64) -> TrainingEntry {
        let started_at = now() - Duration::weeks(weeks_ago);
        TrainingEntry {
            workout_id: format!("w-{}", started_at.timestamp()),
            started_at,
            exercise_id: "e1".to_string(),
            exercise_name: "Bench Press".to_string(),
            sets: vec![SetEntry {
                weight_kg: volume_lb / super::super::KG_TO_LB,
                reps: 1,
                rpe: None,
            }],
        }
    }

    fn dates_of(entries: &[TrainingEntry]) -> Vec<DateTime<Utc>> {
        entries.iter().map(|e| e.started_at).collect()
    }

    #[test]
    fn test_insufficient_data() {
        let entries = vec![entry_lb(0, 1000.0), entry_lb(1, 1000.0)];
        let resp = deload_status(&dates_of(&entries), &entries, now());
        assert!(!resp.needs_deload);
        assert_eq!(resp.score, 0);
        assert_eq!(resp.confidence, Confidence::Low);
        assert_eq!(resp.signals.len(), 1);
        assert_eq!(resp.weekly_volume_lb.len(), 6);
    }

    #[test]
    fn test_volume_drop_triggers() {
        // Two workouts per week keeps the workout floor satisfied. Weekly
        // totals oldest to newest: 0, 0, 1000, 1000, 1200, 300.
        let mut entries = Vec::new();
        for (weeks_ago, volume) in [(3, 1000.0), (2, 1000.0), (1, 1200.0), (0, 300.0)] {
            entries.push(entry_lb(weeks_ago, volume / 2.0));
            entries.push(entry_lb(weeks_ago, volume / 2.0));
        }
        let resp = deload_status(&dates_of(&entries), &entries, now());
        // Last-2 average 750 sits more than 15% below the prior-2 average 1000.
        assert!(resp.score >= 2);
        assert!(resp.needs_deload);
        assert!(resp.signals.iter().any(|s| s.contains("dropped")));
    }

    #[test]
    fn test_steady_volume_no_deload() {
        let mut entries = Vec::new();
        for weeks_ago in 0..6 {
            entries.push(entry_lb(weeks_ago, 500.0));
            entries.push(entry_lb(weeks_ago, 500.0));
        }
        let resp = deload_status(&dates_of(&entries), &entries, now());
        assert!(!resp.needs_deload);
        assert_eq!(resp.score, 0);
        assert!(resp.signals.is_empty());
    }

    #[test]
    fn test_volume_spike_triggers() {
        // Baseline 1000 for four weeks, then two weeks at 2000.
        let mut entries = Vec::new();
        for weeks_ago in 2..6 {
            entries.push(entry_lb(weeks_ago, 500.0));
            entries.push(entry_lb(weeks_ago, 500.0));
        }
        for weeks_ago in 0..2 {
            entries.push(entry_lb(weeks_ago, 1000.0));
            entries.push(entry_lb(weeks_ago, 1000.0));
        }
        let resp = deload_status(&dates_of(&entries), &entries, now());
        assert!(resp.needs_deload);
        assert!(resp.signals.iter().any(|s| s.contains("above the six-week baseline")));
    }

    #[test]
    fn test_weekly_volumes_reported_oldest_first() {
        let entries = vec![entry_lb(5, 100.0), entry_lb(0, 900.0)];
        let resp = deload_status(&dates_of(&entries), &entries, now());
        assert!((resp.weekly_volume_lb[0] - 100.0).abs() < 0.5);
        assert!((resp.weekly_volume_lb[5] - 900.0).abs() < 0.5);
    }
}
