// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Progressive-overload recommendations per exercise.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::muscle_groups::{categorize, MuscleGroup};
use super::{kg_to_lb, round1, round_to_step, Confidence};
use crate::models::TrainingEntry;

/// Weeks of history considered per exercise.
const ANALYSIS_WEEKS: i64 = 8;

/// Maximum number of exercises to recommend for.
const MAX_EXERCISES: usize = 8;

/// Minimum sessions in the window before an exercise is analyzed.
const MIN_SESSIONS: usize = 2;

/// Most recent sessions used for the weight trend.
const TREND_SESSIONS: usize = 5;

/// Per-session weight delta (lb) above which progression is assumed.
const PROGRESSION_DELTA_LB: f64 = 0.5;

/// Plate increment recommendations snap to.
const WEIGHT_STEP_LB: f64 = 2.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExercisePrediction {
    pub exercise_id: String,
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub sessions_analyzed: usize,
    pub last_weight_lb: f64,
    pub recommended_weight_lb: f64,
    pub recommended_sets: i64,
    pub recommended_reps: i64,
    pub confidence: Confidence,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionsResponse {
    pub predictions: Vec<ExercisePrediction>,
}

/// Recommend the next working weight for the most frequent exercises of the
/// trailing eight weeks. The trend is the average per-session change in top
/// set weight across the last five sessions: a rising trend adds one plate
/// increment, a flat trend holds the weight, and a falling trend backs off
/// ten percent.
pub fn workout_predictions(entries: &[TrainingEntry], now: DateTime<Utc>) -> PredictionsResponse {
    let window_start = now - Duration::weeks(ANALYSIS_WEEKS);

    let mut by_exercise: HashMap<&str, Vec<&TrainingEntry>> = HashMap::new();
    for entry in entries {
        if entry.started_at >= window_start && entry.started_at <= now {
            by_exercise
                .entry(entry.exercise_id.as_str())
                .or_default()
                .push(entry);
        }
    }

    let mut ranked: Vec<(&str, Vec<&TrainingEntry>)> = by_exercise
        .into_iter()
        .filter(|(_, sessions)| sessions.len() >= MIN_SESSIONS)
        .collect();
    ranked.sort_by(|a, b| {
        b.1.len()
            .cmp(&a.1.len())
            .then_with(|| a.1[0].exercise_name.cmp(&b.1[0].exercise_name))
    });
    ranked.truncate(MAX_EXERCISES);

    let predictions = ranked
        .into_iter()
        .map(|(id, mut sessions)| {
            sessions.sort_by_key(|e| e.started_at);
            analyze(id, &sessions)
        })
        .collect();

    PredictionsResponse { predictions }
}

fn analyze(exercise_id: &str, sessions: &[&TrainingEntry]) -> ExercisePrediction {
    let recent = &sessions[sessions.len().saturating_sub(TREND_SESSIONS)..];
    let weights: Vec<f64> = recent.iter().map(|e| kg_to_lb(e.max_weight_kg())).collect();
    let last_weight = *weights.last().unwrap_or(&0.0);

    let delta = if weights.len() > 1 {
        (last_weight - weights[0]) / (weights.len() - 1) as f64
    } else {
        0.0
    };

    let (raw_weight, confidence, reason) = if delta > PROGRESSION_DELTA_LB {
        (
            last_weight + WEIGHT_STEP_LB,
            Confidence::High,
            "weight is trending up, add a small increment".to_string(),
        )
    } else if delta > -PROGRESSION_DELTA_LB {
        (
            last_weight,
            Confidence::Medium,
            "weight has plateaued, hold and add volume".to_string(),
        )
    } else {
        (
            last_weight * 0.9,
            Confidence::Medium,
            "weight is trending down, back off and rebuild".to_string(),
        )
    };

    let total_sets: usize = recent.iter().map(|e| e.sets.len()).sum();
    let total_reps: i64 = recent.iter().map(|e| e.total_reps()).sum();
    let recommended_sets = ((total_sets as f64 / recent.len() as f64).round() as i64).max(1);
    let recommended_reps = if total_sets > 0 {
        ((total_reps as f64 / total_sets as f64).round() as i64).max(1)
    } else {
        1
    };

    let name = sessions[0].exercise_name.clone();
    ExercisePrediction {
        exercise_id: exercise_id.to_string(),
        muscle_group: categorize(&name),
        name,
        sessions_analyzed: sessions.len(),
        last_weight_lb: round1(last_weight),
        recommended_weight_lb: round_to_step(raw_weight, WEIGHT_STEP_LB),
        recommended_sets,
        recommended_reps,
        confidence,
        reason,
    }
}
