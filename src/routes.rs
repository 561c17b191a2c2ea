// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! HTTP route handlers for dashboard statistics, sync triggers, and
//! settings. Handlers are transport-agnostic: the warp wiring in the server
//! binary maps them onto paths and turns `Result` into status codes.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::database::Database;
use crate::intelligence::deload::{deload_status, DeloadResponse};
use crate::intelligence::predictions::{workout_predictions, PredictionsResponse};
use crate::intelligence::stats::{
    exercise_progress, heatmap, summary, top_exercises, weekly_workouts, workout_split,
    ExerciseProgressResponse, HeatmapResponse, SummaryResponse, TopExercisesResponse,
    WeeklyWorkoutsResponse, WorkoutSplitResponse,
};
use crate::intelligence::suggestions::{next_workout, NextWorkoutResponse};
use crate::intelligence::trends::{volume_trends, VolumeTrendsResponse, DEFAULT_TREND_WEEKS};
use crate::scheduler::SYNC_INTERVAL_KEY;
use crate::sync::{SyncService, DEFAULT_SYNC_LIMIT};

/// How many exercises the top-exercises endpoint returns.
const TOP_EXERCISES_LIMIT: usize = 10;

/// Widest trend window a request may ask for.
const MAX_TREND_WEEKS: usize = 52;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub fetched: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub fetch_failure: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncIntervalSetting {
    pub minutes: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Read-only analytics over persisted history.
#[derive(Clone)]
pub struct StatsRoutes {
    database: Database,
}

impl StatsRoutes {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "ok".to_string(),
            service: "hevy-dashboard-server".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub async fn weekly_workouts(&self) -> Result<WeeklyWorkoutsResponse> {
        let dates = self.database.workout_dates().await?;
        Ok(weekly_workouts(&dates, Utc::now()))
    }

    pub async fn heatmap(&self) -> Result<HeatmapResponse> {
        let dates = self.database.workout_dates().await?;
        Ok(heatmap(&dates, Utc::now()))
    }

    pub async fn summary(&self) -> Result<SummaryResponse> {
        let dates = self.database.workout_dates().await?;
        let entries = self.database.load_history().await?;
        Ok(summary(&dates, &entries, Utc::now()))
    }

    pub async fn top_exercises(&self) -> Result<TopExercisesResponse> {
        let entries = self.database.load_history().await?;
        Ok(top_exercises(&entries, TOP_EXERCISES_LIMIT))
    }

    pub async fn workout_split(&self) -> Result<WorkoutSplitResponse> {
        let entries = self.database.load_history().await?;
        Ok(workout_split(&entries))
    }

    pub async fn exercise_progress(&self, exercise_id: &str) -> Result<ExerciseProgressResponse> {
        let entries = self.database.load_history().await?;
        Ok(exercise_progress(&entries, exercise_id))
    }

    /// `weeks` outside 2..=52 clamps rather than erroring.
    pub async fn volume_trends(&self, weeks: Option<usize>) -> Result<VolumeTrendsResponse> {
        let weeks = weeks
            .unwrap_or(DEFAULT_TREND_WEEKS)
            .clamp(2, MAX_TREND_WEEKS);
        let entries = self.database.load_history().await?;
        Ok(volume_trends(&entries, weeks, Utc::now()))
    }

    pub async fn predictions(&self) -> Result<PredictionsResponse> {
        let entries = self.database.load_history().await?;
        Ok(workout_predictions(&entries, Utc::now()))
    }

    pub async fn deload(&self) -> Result<DeloadResponse> {
        let dates = self.database.workout_dates().await?;
        let entries = self.database.load_history().await?;
        Ok(deload_status(&dates, &entries, Utc::now()))
    }

    pub async fn next_workout(&self) -> Result<NextWorkoutResponse> {
        let now = Utc::now();
        let dates = self.database.workout_dates().await?;
        let entries = self.database.load_history().await?;
        let deload = deload_status(&dates, &entries, now);
        let predictions = workout_predictions(&entries, now);
        Ok(next_workout(&entries, &deload, &predictions, now))
    }
}

/// Sync triggers and sync-related settings.
#[derive(Clone)]
pub struct SyncRoutes {
    database: Database,
    service: Arc<SyncService>,
}

impl SyncRoutes {
    pub fn new(database: Database, service: Arc<SyncService>) -> Self {
        Self { database, service }
    }

    /// Incremental sync of the most recent workouts.
    pub async fn sync(&self) -> Result<SyncResponse> {
        info!("Manual sync requested");
        let report = self.service.sync_latest(DEFAULT_SYNC_LIMIT).await?;
        Ok(SyncResponse {
            success: report.fetch_failure.is_none(),
            fetched: report.fetched,
            inserted: report.inserted,
            skipped: report.skipped,
            fetch_failure: report.fetch_failure,
        })
    }

    /// Full history backfill.
    pub async fn backfill(&self) -> Result<SyncResponse> {
        info!("Backfill requested");
        let report = self.service.sync_all().await?;
        Ok(SyncResponse {
            success: report.fetch_failure.is_none(),
            fetched: report.fetched,
            inserted: report.inserted,
            skipped: report.skipped,
            fetch_failure: report.fetch_failure,
        })
    }

    pub async fn get_sync_interval(&self, default_minutes: u64) -> Result<SyncIntervalSetting> {
        let minutes = match self.database.get_setting(SYNC_INTERVAL_KEY).await? {
            Some(raw) => raw.parse::<u64>().unwrap_or(default_minutes),
            None => default_minutes,
        };
        Ok(SyncIntervalSetting { minutes })
    }

    pub async fn set_sync_interval(&self, setting: SyncIntervalSetting) -> Result<SyncIntervalSetting> {
        if setting.minutes < 1 {
            return Err(anyhow::anyhow!("Sync interval must be at least 1 minute"));
        }
        self.database
            .set_setting(SYNC_INTERVAL_KEY, &setting.minutes.to_string())
            .await?;
        info!(minutes = setting.minutes, "Sync interval updated");
        Ok(setting)
    }
}
