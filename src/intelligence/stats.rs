// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Descriptive statistics: weekly counts, activity heatmap, lifetime
//! summary with streaks, top exercises, workout split, and per-exercise
//! progress with personal-record tracking.

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::muscle_groups::{categorize, MuscleGroup};
use super::{kg_to_lb, round1, week_key, week_start};
use crate::models::TrainingEntry;

/// Workout counts per ISO week over the trailing 12 weeks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyWorkoutsResponse {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
}

/// One day of the activity heatmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapDay {
    pub date: String,
    pub count: i64,
}

/// Daily workout counts for the trailing 365 days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapResponse {
    pub start: String,
    pub end: String,
    pub days: Vec<HeatmapDay>,
}

/// Lifetime training totals and weekly streaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub total_workouts: usize,
    pub total_exercises: usize,
    pub total_sets: usize,
    pub total_volume_lb: f64,
    pub current_streak_weeks: usize,
    pub longest_streak_weeks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopExercise {
    pub exercise_id: String,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopExercisesResponse {
    pub exercises: Vec<TopExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitGroup {
    pub group: MuscleGroup,
    pub workouts: usize,
    pub exercises: usize,
    pub volume_lb: f64,
}

/// Training distribution across muscle groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSplitResponse {
    pub groups: Vec<SplitGroup>,
}

/// One training session for a single exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSession {
    pub date: String,
    pub volume_lb: f64,
    pub max_weight_lb: f64,
    pub total_reps: i64,
    pub sets: usize,
}

/// A session that strictly exceeded every previous top weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrEvent {
    pub date: String,
    pub weight_lb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseProgressResponse {
    pub exercise_id: String,
    pub name: String,
    pub sessions: Vec<ProgressSession>,
    pub prs: Vec<PrEvent>,
    pub max_weight_lb: f64,
}

/// Count workouts per ISO week over the 12 weeks ending at `now`. Weeks with
/// no activity are present with a zero count so chart axes stay stable.
pub fn weekly_workouts(dates: &[DateTime<Utc>], now: DateTime<Utc>) -> WeeklyWorkoutsResponse {
    let window_start = now - Duration::weeks(12);

    let mut buckets: BTreeMap<String, i64> = BTreeMap::new();
    for i in 0..12 {
        buckets.insert(week_key(window_start + Duration::weeks(i)), 0);
    }
    for date in dates {
        if *date >= window_start && *date <= now {
            *buckets.entry(week_key(*date)).or_insert(0) += 1;
        }
    }

    let (labels, data) = buckets.into_iter().unzip();
    WeeklyWorkoutsResponse { labels, data }
}

/// Daily workout counts over the trailing 365 days, every day present.
pub fn heatmap(dates: &[DateTime<Utc>], now: DateTime<Utc>) -> HeatmapResponse {
    let end = now.date_naive();
    let start = end - Days::new(364);

    let mut counts: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut day = start;
    while day <= end {
        counts.insert(day, 0);
        day = day + Days::new(1);
    }
    for date in dates {
        let day = date.date_naive();
        if day >= start && day <= end {
            *counts.entry(day).or_insert(0) += 1;
        }
    }

    HeatmapResponse {
        start: start.format("%Y-%m-%d").to_string(),
        end: end.format("%Y-%m-%d").to_string(),
        days: counts
            .into_iter()
            .map(|(date, count)| HeatmapDay {
                date: date.format("%Y-%m-%d").to_string(),
                count,
            })
            .collect(),
    }
}

/// Lifetime totals plus current and longest weekly streaks. A streak is a run
/// of consecutive ISO weeks each containing at least one workout; the current
/// streak counts back from the week containing `now` and is zero as soon as
/// that week's predecessor chain breaks.
pub fn summary(
    dates: &[DateTime<Utc>],
    entries: &[TrainingEntry],
    now: DateTime<Utc>,
) -> SummaryResponse {
    let exercise_ids: HashSet<&str> = entries.iter().map(|e| e.exercise_id.as_str()).collect();
    let total_sets: usize = entries.iter().map(|e| e.sets.len()).sum();
    let total_volume_lb = round1(kg_to_lb(entries.iter().map(|e| e.volume_kg()).sum()));

    let weeks: BTreeSet<NaiveDate> = dates.iter().map(|d| week_start(*d)).collect();

    let mut current_streak = 0;
    let mut cursor = week_start(now);
    while weeks.contains(&cursor) {
        current_streak += 1;
        cursor = cursor - Duration::weeks(1);
    }

    let mut longest_streak = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for week in &weeks {
        run = match previous {
            Some(prev) if *week - prev == Duration::weeks(1) => run + 1,
            _ => 1,
        };
        longest_streak = longest_streak.max(run);
        previous = Some(*week);
    }

    SummaryResponse {
        total_workouts: dates.len(),
        total_exercises: exercise_ids.len(),
        total_sets,
        total_volume_lb,
        current_streak_weeks: current_streak,
        longest_streak_weeks: longest_streak,
    }
}

/// The `limit` most frequently performed exercises. Frequency is the number
/// of workouts containing the exercise; ties break alphabetically by name.
pub fn top_exercises(entries: &[TrainingEntry], limit: usize) -> TopExercisesResponse {
    let mut counts: HashMap<&str, (String, usize)> = HashMap::new();
    for entry in entries {
        counts
            .entry(entry.exercise_id.as_str())
            .or_insert_with(|| (entry.exercise_name.clone(), 0))
            .1 += 1;
    }

    let mut exercises: Vec<TopExercise> = counts
        .into_iter()
        .map(|(id, (name, count))| TopExercise {
            exercise_id: id.to_string(),
            name,
            count,
        })
        .collect();
    exercises.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    exercises.truncate(limit);

    TopExercisesResponse { exercises }
}

/// Training distribution across all muscle groups: workouts touched, exercise
/// instances performed, and total volume per group. Every group appears even
/// when empty.
pub fn workout_split(entries: &[TrainingEntry]) -> WorkoutSplitResponse {
    let mut workouts: HashMap<MuscleGroup, HashSet<&str>> = HashMap::new();
    let mut instances: HashMap<MuscleGroup, usize> = HashMap::new();
    let mut volume: HashMap<MuscleGroup, f64> = HashMap::new();

    for entry in entries {
        let group = categorize(&entry.exercise_name);
        workouts
            .entry(group)
            .or_default()
            .insert(entry.workout_id.as_str());
        *instances.entry(group).or_insert(0) += 1;
        *volume.entry(group).or_insert(0.0) += entry.volume_kg();
    }

    let groups = MuscleGroup::ALL
        .iter()
        .map(|group| SplitGroup {
            group: *group,
            workouts: workouts.get(group).map_or(0, |w| w.len()),
            exercises: instances.get(group).copied().unwrap_or(0),
            volume_lb: round1(kg_to_lb(volume.get(group).copied().unwrap_or(0.0))),
        })
        .collect();

    WorkoutSplitResponse { groups }
}

/// Chronological session history for one exercise, with a personal-record
/// ladder. A PR event is recorded only when a session's top weight strictly
/// exceeds every previous session's top weight.
pub fn exercise_progress(entries: &[TrainingEntry], exercise_id: &str) -> ExerciseProgressResponse {
    let mut history: Vec<&TrainingEntry> = entries
        .iter()
        .filter(|e| e.exercise_id == exercise_id)
        .collect();
    history.sort_by_key(|e| e.started_at);

    let name = history
        .first()
        .map(|e| e.exercise_name.clone())
        .unwrap_or_default();

    let mut sessions = Vec::with_capacity(history.len());
    let mut prs = Vec::new();
    let mut best_kg = 0.0_f64;

    for entry in &history {
        let max_kg = entry.max_weight_kg();
        sessions.push(ProgressSession {
            date: entry.started_at.format("%Y-%m-%d").to_string(),
            volume_lb: round1(kg_to_lb(entry.volume_kg())),
            max_weight_lb: round1(kg_to_lb(max_kg)),
            total_reps: entry.total_reps(),
            sets: entry.sets.len(),
        });
        if max_kg > best_kg {
            best_kg = max_kg;
            prs.push(PrEvent {
                date: entry.started_at.format("%Y-%m-%d").to_string(),
                weight_lb: round1(kg_to_lb(max_kg)),
            });
        }
    }

    ExerciseProgressResponse {
        exercise_id: exercise_id.to_string(),
        name,
        sessions,
        prs,
        max_weight_lb: round1(kg_to_lb(best_kg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SetEntry;
    use chrono::TimeZone;

    fn entry(
        workout_id: &str,
        exercise_id: &str,
        name: &str,
        started_at: DateTime<Utc>,
        sets: Vec<(f64, i64)>,
    ) -> TrainingEntry {
        TrainingEntry {
            workout_id: workout_id.to_string(),
            started_at,
            exercise_id: exercise_id.to_string(),
            exercise_name: name.to_string(),
            sets: sets
                .into_iter()
                .map(|(weight_kg, reps)| SetEntry {
                    weight_kg,
                    reps,
                    rpe: None,
                })
                .collect(),
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_weekly_workouts_always_twelve_buckets_when_empty() {
        let resp = weekly_workouts(&[], at(2024, 6, 1));
        assert_eq!(resp.labels.len(), 12);
        assert_eq!(resp.data.len(), 12);
        assert!(resp.data.iter().all(|c| *c == 0));
    }

    #[test]
    fn test_weekly_workouts_counts_and_window() {
        let now = at(2024, 6, 14);
        let dates = vec![
            at(2024, 6, 10),
            at(2024, 6, 12),
            at(2024, 6, 3),
            // Outside the 12-week window.
            at(2024, 1, 1),
        ];
        let resp = weekly_workouts(&dates, now);
        let total: i64 = resp.data.iter().sum();
        assert_eq!(total, 3);
        // Current week ("2024-W24") holds two workouts.
        let idx = resp.labels.iter().position(|l| l == "2024-W24").unwrap();
        assert_eq!(resp.data[idx], 2);
    }

    #[test]
    fn test_heatmap_covers_365_days() {
        let resp = heatmap(&[at(2024, 6, 1)], at(2024, 6, 14));
        assert_eq!(resp.days.len(), 365);
        assert_eq!(resp.end, "2024-06-14");
        let hit = resp.days.iter().find(|d| d.date == "2024-06-01").unwrap();
        assert_eq!(hit.count, 1);
    }

    #[test]
    fn test_heatmap_ignores_dates_outside_window() {
        let resp = heatmap(&[at(2020, 1, 1)], at(2024, 6, 14));
        assert!(resp.days.iter().all(|d| d.count == 0));
    }

    #[test]
    fn test_summary_totals() {
        let entries = vec![
            entry("w1", "e1", "Bench Press", at(2024, 6, 10), vec![(100.0, 5), (100.0, 5)]),
            entry("w1", "e2", "Squat", at(2024, 6, 10), vec![(140.0, 3)]),
            entry("w2", "e1", "Bench Press", at(2024, 6, 12), vec![(102.5, 5)]),
        ];
        let dates = vec![at(2024, 6, 10), at(2024, 6, 12)];
        let resp = summary(&dates, &entries, at(2024, 6, 14));
        assert_eq!(resp.total_workouts, 2);
        assert_eq!(resp.total_exercises, 2);
        assert_eq!(resp.total_sets, 4);
        let expected_kg = 100.0 * 5.0 + 100.0 * 5.0 + 140.0 * 3.0 + 102.5 * 5.0;
        assert!((resp.total_volume_lb - round1(kg_to_lb(expected_kg))).abs() < 0.2);
    }

    #[test]
    fn test_streaks_with_gap() {
        // Weeks W01, W02, W04 of 2024; "now" lands much later so the current
        // streak is broken while the longest run is two weeks.
        let dates = vec![at(2024, 1, 2), at(2024, 1, 9), at(2024, 1, 23)];
        let resp = summary(&dates, &[], at(2024, 6, 14));
        assert_eq!(resp.longest_streak_weeks, 2);
        assert_eq!(resp.current_streak_weeks, 0);
    }

    #[test]
    fn test_current_streak_counts_back_from_now() {
        let now = at(2024, 6, 14);
        let dates = vec![at(2024, 6, 12), at(2024, 6, 5), at(2024, 5, 29)];
        let resp = summary(&dates, &[], now);
        assert_eq!(resp.current_streak_weeks, 3);
    }

    #[test]
    fn test_top_exercises_ranking_and_tiebreak() {
        let entries = vec![
            entry("w1", "e1", "Bench Press", at(2024, 6, 1), vec![(100.0, 5)]),
            entry("w2", "e1", "Bench Press", at(2024, 6, 3), vec![(100.0, 5)]),
            entry("w1", "e2", "Squat", at(2024, 6, 1), vec![(140.0, 3)]),
            entry("w2", "e3", "Arnold Press", at(2024, 6, 3), vec![(30.0, 10)]),
        ];
        let resp = top_exercises(&entries, 10);
        assert_eq!(resp.exercises.len(), 3);
        assert_eq!(resp.exercises[0].exercise_id, "e1");
        assert_eq!(resp.exercises[0].count, 2);
        // Tie between Squat and Arnold Press breaks alphabetically.
        assert_eq!(resp.exercises[1].name, "Arnold Press");
    }

    #[test]
    fn test_top_exercises_respects_limit() {
        let entries = vec![
            entry("w1", "e1", "Bench Press", at(2024, 6, 1), vec![(100.0, 5)]),
            entry("w1", "e2", "Squat", at(2024, 6, 1), vec![(140.0, 3)]),
        ];
        assert_eq!(top_exercises(&entries, 1).exercises.len(), 1);
    }

    #[test]
    fn test_workout_split_groups() {
        let entries = vec![
            entry("w1", "e1", "Bench Press", at(2024, 6, 1), vec![(100.0, 5)]),
            entry("w2", "e1", "Bench Press", at(2024, 6, 3), vec![(100.0, 5)]),
            entry("w1", "e2", "Hammer Curl", at(2024, 6, 1), vec![(20.0, 10)]),
        ];
        let resp = workout_split(&entries);
        assert_eq!(resp.groups.len(), MuscleGroup::ALL.len());
        let chest = resp
            .groups
            .iter()
            .find(|g| g.group == MuscleGroup::Chest)
            .unwrap();
        assert_eq!(chest.workouts, 2);
        assert_eq!(chest.exercises, 2);
        let legs = resp
            .groups
            .iter()
            .find(|g| g.group == MuscleGroup::Legs)
            .unwrap();
        assert_eq!(legs.workouts, 0);
        assert_eq!(legs.volume_lb, 0.0);
    }

    #[test]
    fn test_exercise_progress_pr_ladder() {
        let entries = vec![
            entry("w3", "e1", "Bench Press", at(2024, 6, 10), vec![(100.0, 5)]),
            entry("w1", "e1", "Bench Press", at(2024, 6, 1), vec![(100.0, 5)]),
            entry("w2", "e1", "Bench Press", at(2024, 6, 5), vec![(105.0, 3)]),
            entry("w1", "e2", "Squat", at(2024, 6, 1), vec![(140.0, 3)]),
        ];
        let resp = exercise_progress(&entries, "e1");
        assert_eq!(resp.sessions.len(), 3);
        // Sessions come back chronological regardless of input order.
        assert_eq!(resp.sessions[0].date, "2024-06-01");
        assert_eq!(resp.sessions[2].date, "2024-06-10");
        // Equal-weight sessions do not produce new PR events.
        assert_eq!(resp.prs.len(), 2);
        assert_eq!(resp.prs[1].date, "2024-06-05");
        assert!((resp.max_weight_lb - round1(kg_to_lb(105.0))).abs() < 0.2);
    }

    #[test]
    fn test_pr_ladder_strictly_increasing() {
        let maxes = [100.0, 95.0, 110.0, 110.0, 120.0];
        let entries: Vec<_> = maxes
            .iter()
            .enumerate()
            .map(|(i, kg)| {
                entry(
                    &format!("w{i}"),
                    "e1",
                    "Bench Press",
                    at(2024, 6, 1 + i as u32),
                    vec![(*kg, 1)],
                )
            })
            .collect();
        let resp = exercise_progress(&entries, "e1");
        let pr_dates: Vec<&str> = resp.prs.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(pr_dates, ["2024-06-01", "2024-06-03", "2024-06-05"]);
    }

    #[test]
    fn test_volume_conversion_round_trip() {
        // 50 kg x 5 reps stays kilograms in storage and converts to
        // roughly 551.155 lb at presentation time.
        let e = entry("w1", "e1", "Bench Press", at(2024, 6, 1), vec![(50.0, 5)]);
        assert_eq!(e.volume_kg(), 250.0);
        let lb = round1(kg_to_lb(e.volume_kg()));
        assert!((lb - 551.155).abs() < 0.06);
    }

    #[test]
    fn test_exercise_progress_unknown_exercise() {
        let resp = exercise_progress(&[], "missing");
        assert!(resp.sessions.is_empty());
        assert!(resp.prs.is_empty());
        assert_eq!(resp.max_weight_lb, 0.0);
        assert_eq!(resp.name, "");
    }
}
