// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-muscle-group weekly volume trends.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::muscle_groups::{categorize, MuscleGroup};
use super::{kg_to_lb, round1, trailing_week_starts, week_start, TrendDirection};
use crate::models::TrainingEntry;

/// Default analysis window in weeks.
pub const DEFAULT_TREND_WEEKS: usize = 12;

/// Weeks of data required before a direction is assigned.
const MIN_WEEKS_FOR_TREND: usize = 4;

/// Relative change beyond which a trend counts as moving.
const TREND_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTrend {
    pub group: MuscleGroup,
    pub weekly_volume_lb: Vec<f64>,
    pub trend: TrendDirection,
    pub change_pct: f64,
}

/// Weekly volume series per trainable muscle group over a trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeTrendsResponse {
    pub weeks: Vec<String>,
    pub groups: Vec<GroupTrend>,
}

/// Compute weekly volume per muscle group over the trailing `weeks` ISO
/// weeks. Direction compares the average of the window's second half against
/// its first half; a group needs at least four weeks of activity before it is
/// labeled anything other than stable.
pub fn volume_trends(
    entries: &[TrainingEntry],
    weeks: usize,
    now: DateTime<Utc>,
) -> VolumeTrendsResponse {
    let weeks = weeks.max(2);
    let starts = trailing_week_starts(now, weeks);
    let index: HashMap<_, _> = starts.iter().enumerate().map(|(i, s)| (*s, i)).collect();

    let mut series: HashMap<MuscleGroup, Vec<f64>> = MuscleGroup::TRAINABLE
        .iter()
        .map(|g| (*g, vec![0.0; weeks]))
        .collect();

    for entry in entries {
        let group = categorize(&entry.exercise_name);
        let Some(buckets) = series.get_mut(&group) else {
            continue;
        };
        if let Some(i) = index.get(&week_start(entry.started_at)) {
            buckets[*i] += kg_to_lb(entry.volume_kg());
        }
    }

    let week_labels = starts
        .iter()
        .map(|s| {
            let iso = s.iso_week();
            format!("{}-W{:02}", iso.year(), iso.week())
        })
        .collect();

    let groups = MuscleGroup::TRAINABLE
        .iter()
        .map(|group| {
            let volumes = &series[group];
            let (trend, change_pct) = classify(volumes);
            GroupTrend {
                group: *group,
                weekly_volume_lb: volumes.iter().map(|v| round1(*v)).collect(),
                trend,
                change_pct,
            }
        })
        .collect();

    VolumeTrendsResponse {
        weeks: week_labels,
        groups,
    }
}

fn classify(volumes: &[f64]) -> (TrendDirection, f64) {
    let active_weeks = volumes.iter().filter(|v| **v > 0.0).count();
    if active_weeks < MIN_WEEKS_FOR_TREND {
        return (TrendDirection::Stable, 0.0);
    }

    let half = volumes.len() / 2;
    let first: f64 = volumes[..half].iter().sum::<f64>() / half as f64;
    let second: f64 = volumes[half..].iter().sum::<f64>() / (volumes.len() - half) as f64;
    if first <= 0.0 {
        return (TrendDirection::Stable, 0.0);
    }

    let change_pct = (second - first) / first * 100.0;
    let trend = if change_pct > TREND_THRESHOLD_PCT {
        TrendDirection::Increasing
    } else if change_pct < -TREND_THRESHOLD_PCT {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };
    (trend, round1(change_pct))
}
