// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Next-workout focus based on per-muscle-group recovery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::deload::DeloadResponse;
use super::muscle_groups::{categorize, MuscleGroup};
use super::predictions::{ExercisePrediction, PredictionsResponse};
use crate::models::TrainingEntry;

/// Sentinel for groups that have never been trained.
const NEVER_TRAINED_DAYS: i64 = 999;

/// How many groups a session should focus on.
const FOCUS_GROUPS: usize = 3;

/// Maximum exercise recommendations attached to a suggestion.
const MAX_EXERCISES: usize = 6;

/// Recovery state of a single muscle group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
    Rested,
    Recovered,
    Recovering,
    Fatigued,
    Untrained,
}

/// Training priority derived from recovery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReadiness {
    pub group: MuscleGroup,
    pub days_since_trained: i64,
    pub sessions_2w: usize,
    pub status: RecoveryStatus,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextWorkoutResponse {
    pub focus: Vec<String>,
    pub reason: String,
    pub groups: Vec<GroupReadiness>,
    pub exercises: Vec<ExercisePrediction>,
}

/// Suggest what to train next. Each trainable muscle group is classified by
/// days since it was last trained, the most rested groups become the focus,
/// and matching weight recommendations are attached. An active deload verdict
/// overrides everything with a recovery session.
pub fn next_workout(
    entries: &[TrainingEntry],
    deload: &DeloadResponse,
    predictions: &PredictionsResponse,
    now: DateTime<Utc>,
) -> NextWorkoutResponse {
    let mut last_trained: HashMap<MuscleGroup, DateTime<Utc>> = HashMap::new();
    let mut recent_workouts: HashMap<MuscleGroup, HashSet<&str>> = HashMap::new();

    for entry in entries {
        let group = categorize(&entry.exercise_name);
        let slot = last_trained.entry(group).or_insert(entry.started_at);
        if entry.started_at > *slot {
            *slot = entry.started_at;
        }
        if (now - entry.started_at).num_days() < 14 {
            recent_workouts
                .entry(group)
                .or_default()
                .insert(entry.workout_id.as_str());
        }
    }

    let groups: Vec<GroupReadiness> = MuscleGroup::TRAINABLE
        .iter()
        .map(|group| {
            let days = last_trained
                .get(group)
                .map(|last| (now - *last).num_days().max(0))
                .unwrap_or(NEVER_TRAINED_DAYS);
            let (status, priority) = classify(days, last_trained.contains_key(group));
            GroupReadiness {
                group: *group,
                days_since_trained: days,
                sessions_2w: recent_workouts.get(group).map_or(0, |w| w.len()),
                status,
                priority,
            }
        })
        .collect();

    if deload.needs_deload {
        return NextWorkoutResponse {
            focus: vec!["Active Recovery".to_string()],
            reason: "recent volume patterns point to accumulated fatigue, take a light session"
                .to_string(),
            groups,
            exercises: Vec::new(),
        };
    }

    let mut ready: Vec<&GroupReadiness> = groups
        .iter()
        .filter(|g| matches!(g.priority, Priority::High | Priority::Medium))
        .collect();
    ready.sort_by(|a, b| b.days_since_trained.cmp(&a.days_since_trained));
    ready.truncate(FOCUS_GROUPS);

    let focus: Vec<String> = ready.iter().map(|g| g.group.to_string()).collect();
    let focus_groups: HashSet<MuscleGroup> = ready.iter().map(|g| g.group).collect();

    let reason = if focus.is_empty() {
        "every muscle group was trained recently, rest or train light".to_string()
    } else if ready.iter().any(|g| g.status == RecoveryStatus::Untrained) {
        format!("{} have little recent training history", focus.join(", "))
    } else {
        format!("{} are the most recovered groups", focus.join(", "))
    };

    let exercises = predictions
        .predictions
        .iter()
        .filter(|p| focus_groups.contains(&p.muscle_group))
        .take(MAX_EXERCISES)
        .cloned()
        .collect();

    NextWorkoutResponse {
        focus,
        reason,
        groups,
        exercises,
    }
}

fn classify(days: i64, ever_trained: bool) -> (RecoveryStatus, Priority) {
    if !ever_trained {
        return (RecoveryStatus::Untrained, Priority::High);
    }
    if days >= 5 {
        (RecoveryStatus::Rested, Priority::High)
    } else if days >= 3 {
        (RecoveryStatus::Recovered, Priority::Medium)
    } else if days >= 1 {
        (RecoveryStatus::Recovering, Priority::Low)
    } else {
        (RecoveryStatus::Fatigued, Priority::Rest)
    }
}
