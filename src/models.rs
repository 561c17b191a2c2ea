// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Canonical representation of workout history, independent of the upstream
//! payload shape. The normalizer produces these structures from raw Hevy
//! records; the reconciliation engine persists them; the metrics engine reads
//! them back as flattened [`TrainingEntry`] rows.
//!
//! ## Core Models
//!
//! - [`Workout`]: one training session with its exercise logs
//! - [`Exercise`]: a globally deduplicated exercise definition
//! - [`ExerciseLog`]: an exercise as performed within one workout
//! - [`SetEntry`]: a single set (weight in kilograms, reps, optional RPE)
//! - [`TrainingEntry`]: a persisted workout/exercise link row with its sets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single workout session as normalized from the upstream API.
///
/// The `id` is upstream-assigned and is the unit of idempotency: the same id
/// observed twice must never create a second row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub title: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub logs: Vec<ExerciseLog>,
}

/// An exercise definition, deduplicated globally by `id`.
///
/// The id is the upstream template id when available, otherwise the resolved
/// display name stands in for it so repeat observations still converge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
}

/// One exercise performed within one workout, with its sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub exercise: Exercise,
    pub sets: Vec<SetEntry>,
}

/// A single set. Weight is always kilograms in the canonical model and in
/// storage; pounds are derived at presentation time only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    pub weight_kg: f64,
    pub reps: i64,
    pub rpe: Option<f64>,
}

/// A flattened history row: one workout/exercise link with its sets, as
/// loaded from storage for the metrics engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingEntry {
    pub workout_id: String,
    pub started_at: DateTime<Utc>,
    pub exercise_id: String,
    pub exercise_name: String,
    pub sets: Vec<SetEntry>,
}

impl Workout {
    /// Total number of sets across all logs.
    pub fn set_count(&self) -> usize {
        self.logs.iter().map(|l| l.sets.len()).sum()
    }
}

impl TrainingEntry {
    /// Session volume for this entry in kilograms (weight x reps summed).
    pub fn volume_kg(&self) -> f64 {
        self.sets
            .iter()
            .map(|s| s.weight_kg * s.reps as f64)
            .sum()
    }

    /// Heaviest single set in kilograms, 0 when there are no sets.
    pub fn max_weight_kg(&self) -> f64 {
        self.sets.iter().map(|s| s.weight_kg).fold(0.0, f64::max)
    }

    pub fn total_reps(&self) -> i64 {
        self.sets.iter().map(|s| s.reps).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sets: Vec<SetEntry>) -> TrainingEntry {
        TrainingEntry {
            workout_id: "w1".to_string(),
            started_at: Utc::now(),
            exercise_id: "e1".to_string(),
            exercise_name: "Bench Press".to_string(),
            sets,
        }
    }

    #[test]
    fn test_entry_aggregates() {
        let e = entry(vec![
            SetEntry { weight_kg: 60.0, reps: 8, rpe: None },
            SetEntry { weight_kg: 80.0, reps: 5, rpe: Some(8.5) },
        ]);

        assert_eq!(e.volume_kg(), 60.0 * 8.0 + 80.0 * 5.0);
        assert_eq!(e.max_weight_kg(), 80.0);
        assert_eq!(e.total_reps(), 13);
    }

    #[test]
    fn test_empty_entry() {
        let e = entry(vec![]);
        assert_eq!(e.volume_kg(), 0.0);
        assert_eq!(e.max_weight_kg(), 0.0);
        assert_eq!(e.total_reps(), 0);
    }
}
