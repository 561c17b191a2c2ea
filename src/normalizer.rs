// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Upstream Normalizer
//!
//! Converts loosely shaped upstream workout records into the canonical
//! [`Workout`](crate::models::Workout) model. The upstream API has shipped
//! several field spellings over time (`start_time` vs `started_at` vs
//! `startTime`, nested vs inline exercise objects, `weight_kg` vs `weight`),
//! so every field is resolved by trying an ordered list of accessors and
//! taking the first present value.
//!
//! Normalization never fails: unparseable fields fall back to defaults and
//! malformed logs are dropped while their siblings continue. A record with an
//! unreadable start timestamp is stamped with the current UTC instant rather
//! than rejected.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{Exercise, ExerciseLog, SetEntry, Workout};

/// Name used when no display name can be resolved for an exercise log.
const UNKNOWN_EXERCISE: &str = "Unknown";

/// Which weight-field chain applies: the list endpoint reports `weight_kg`
/// first, the detail endpoint uses bare `weight`/`kg`/`lbs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightChain {
    Primary,
    Detail,
}

impl WeightChain {
    fn keys(self) -> &'static [&'static str] {
        match self {
            WeightChain::Primary => &["weight_kg", "weight"],
            WeightChain::Detail => &["weight", "kg", "lbs"],
        }
    }
}

/// Normalize one raw upstream workout record.
///
/// The returned workout may have zero logs; the orchestrator then falls back
/// to the per-workout detail endpoint and [`normalize_detail_logs`].
pub fn normalize_workout(raw: &Value) -> Workout {
    let started = first_value(raw, &["start_time", "started_at", "startTime"])
        .and_then(parse_timestamp);
    let ended = first_value(raw, &["end_time", "ended_at", "endTime"])
        .and_then(parse_timestamp);

    let logs = first_value(raw, &["exercises", "logs", "exerciseLogs"])
        .map(|v| parse_logs(v, WeightChain::Primary))
        .unwrap_or_default();

    Workout {
        id: value_to_string(raw.get("id")).unwrap_or_default(),
        title: raw.get("title").and_then(Value::as_str).map(str::to_string),
        started_at: started.unwrap_or_else(Utc::now),
        ended_at: ended,
        notes: raw.get("notes").and_then(Value::as_str).map(str::to_string),
        logs,
    }
}

/// Re-run log resolution against a per-workout detail payload.
///
/// The detail endpoint nests everything under the exercise object and spells
/// weights differently, so the id/name chains differ slightly from the
/// primary parse.
pub fn normalize_detail_logs(detail: &Value) -> Vec<ExerciseLog> {
    let Some(raw_logs) = first_value(detail, &["logs", "exerciseLogs", "exercises"]) else {
        return Vec::new();
    };
    let Some(items) = raw_logs.as_array() else {
        return Vec::new();
    };

    let mut logs = Vec::new();
    for rl in items {
        let ex = rl.get("exercise").cloned().unwrap_or(Value::Null);

        let id = first_value(&ex, &["id", "exerciseId", "_id", "uuid", "name"])
            .and_then(|v| value_to_string(Some(v)))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let name = first_value(&ex, &["name"])
            .or_else(|| first_value(rl, &["name", "exerciseName"]))
            .and_then(|v| value_to_string(Some(v)))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_EXERCISE.to_string());

        if id.is_empty() && name.is_empty() {
            continue;
        }

        logs.push(ExerciseLog {
            sets: parse_sets(rl, WeightChain::Detail),
            exercise: Exercise {
                id: if id.is_empty() { name.clone() } else { id },
                name,
            },
        });
    }
    logs
}

fn parse_logs(raw_logs: &Value, chain: WeightChain) -> Vec<ExerciseLog> {
    let Some(items) = raw_logs.as_array() else {
        return Vec::new();
    };

    let mut logs = Vec::new();
    for rl in items {
        let ex = rl.get("exercise").cloned().unwrap_or(Value::Null);

        // Template id may sit on the log itself or on the nested exercise.
        let id = first_value(rl, &["exercise_template_id"])
            .or_else(|| first_value(&ex, &["exercise_template_id", "id", "exerciseId", "_id", "uuid"]))
            .and_then(|v| value_to_string(Some(v)))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let name = first_value(rl, &["title"])
            .or_else(|| first_value(&ex, &["title", "name"]))
            .or_else(|| first_value(rl, &["name", "exerciseName"]))
            .and_then(|v| value_to_string(Some(v)))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_EXERCISE.to_string());

        // A log with neither an id nor a real name carries no signal.
        if id.is_empty() && name == UNKNOWN_EXERCISE {
            continue;
        }

        logs.push(ExerciseLog {
            sets: parse_sets(rl, chain),
            exercise: Exercise {
                id: if id.is_empty() { name.clone() } else { id },
                name,
            },
        });
    }
    logs
}

fn parse_sets(raw_log: &Value, chain: WeightChain) -> Vec<SetEntry> {
    let Some(items) = first_value(raw_log, &["sets", "set"]).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .map(|s| SetEntry {
            weight_kg: first_value(s, chain.keys())
                .and_then(value_to_f64)
                .unwrap_or(0.0),
            reps: first_value(s, &["reps", "rep"])
                .and_then(value_to_i64)
                .unwrap_or(0),
            rpe: s.get("rpe").and_then(value_to_f64),
        })
        .collect()
}

/// First present, non-null value among `keys`, in order.
fn first_value<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Parse an ISO-8601 timestamp; a trailing `Z` means UTC.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;
    let normalized = if s.ends_with('Z') {
        format!("{}+00:00", &s[..s.len() - 1])
    } else {
        s.to_string()
    };
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Stringify ids that may arrive as strings or bare numbers.
fn value_to_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_priority_and_zulu() {
        let raw = json!({
            "id": "w1",
            "start_time": "2024-03-01T10:00:00Z",
            "started_at": "2020-01-01T00:00:00Z"
        });
        let w = normalize_workout(&raw);
        assert_eq!(w.started_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert!(w.ended_at.is_none());
    }

    #[test]
    fn test_unparsable_start_defaults_to_now() {
        let before = Utc::now();
        let w = normalize_workout(&json!({ "id": "w1", "start_time": "not a date" }));
        assert!(w.started_at >= before);
        assert!(w.started_at <= Utc::now());
    }

    #[test]
    fn test_log_field_resolution() {
        let raw = json!({
            "id": "w1",
            "started_at": "2024-03-01T10:00:00Z",
            "exercises": [
                {
                    "exercise_template_id": "tmpl-1",
                    "title": "Bench Press",
                    "sets": [
                        { "weight_kg": 50, "reps": 5 },
                        { "weight": 52.5, "reps": "3", "rpe": 9.0 }
                    ]
                },
                {
                    "exercise": { "name": "Squat", "id": "tmpl-2" },
                    "sets": [{ "weight_kg": "100", "reps": 5 }]
                }
            ]
        });
        let w = normalize_workout(&raw);
        assert_eq!(w.logs.len(), 2);

        let bench = &w.logs[0];
        assert_eq!(bench.exercise.id, "tmpl-1");
        assert_eq!(bench.exercise.name, "Bench Press");
        assert_eq!(bench.sets[0], SetEntry { weight_kg: 50.0, reps: 5, rpe: None });
        assert_eq!(bench.sets[1], SetEntry { weight_kg: 52.5, reps: 3, rpe: Some(9.0) });

        let squat = &w.logs[1];
        assert_eq!(squat.exercise.id, "tmpl-2");
        assert_eq!(squat.sets[0].weight_kg, 100.0);
    }

    #[test]
    fn test_missing_weight_and_reps_default_to_zero() {
        let raw = json!({
            "id": "w1",
            "logs": [{ "title": "Plank", "sets": [{}] }]
        });
        let w = normalize_workout(&raw);
        assert_eq!(w.logs[0].sets[0], SetEntry { weight_kg: 0.0, reps: 0, rpe: None });
    }

    #[test]
    fn test_unnamed_log_without_id_is_dropped() {
        let raw = json!({
            "id": "w1",
            "exercises": [
                { "sets": [{ "weight_kg": 10, "reps": 1 }] },
                { "title": "Curl", "sets": [] }
            ]
        });
        let w = normalize_workout(&raw);
        assert_eq!(w.logs.len(), 1);
        assert_eq!(w.logs[0].exercise.name, "Curl");
        // No template id anywhere: the name becomes the identifier.
        assert_eq!(w.logs[0].exercise.id, "Curl");
    }

    #[test]
    fn test_detail_fallback_weight_chain() {
        let detail = json!({
            "logs": [{
                "exercise": { "id": "e9", "name": "Deadlift" },
                "sets": [
                    { "kg": 140, "reps": 3 },
                    { "lbs": 225, "reps": 5 }
                ]
            }]
        });
        let logs = normalize_detail_logs(&detail);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].sets[0].weight_kg, 140.0);
        // The detail chain takes whichever unit field is present verbatim.
        assert_eq!(logs[0].sets[1].weight_kg, 225.0);
    }

    #[test]
    fn test_numeric_workout_id_stringified() {
        let w = normalize_workout(&json!({ "id": 42, "started_at": "2024-01-01T00:00:00Z" }));
        assert_eq!(w.id, "42");
    }
}
