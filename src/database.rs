// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Database Management
//!
//! SQLite persistence for workout history. Handles schema migration, the
//! transactional reconciliation merge, and the read queries the metrics
//! engine is built on.
//!
//! Reconciliation is lookup-before-insert keyed on upstream identifiers:
//! a workout id observed before is skipped wholesale, which makes repeated
//! ingestion of the same payload a no-op (no duplicate link or set rows).
//! The whole batch commits in one transaction; an interrupted run leaves
//! previously committed batches intact.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use tracing::debug;

use crate::models::{SetEntry, TrainingEntry, Workout};

/// Counts reported by one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Workouts newly inserted this run.
    pub inserted: usize,
    /// Workouts that already existed and were left untouched.
    pub skipped: usize,
}

/// Database manager for workout, exercise, link and set storage.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workouts (
                id TEXT PRIMARY KEY,
                title TEXT,
                started_at TEXT NOT NULL,
                ended_at TEXT,
                notes TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workout_exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workout_id TEXT NOT NULL REFERENCES workouts(id),
                exercise_id TEXT NOT NULL REFERENCES exercises(id),
                UNIQUE(workout_id, exercise_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workout_exercise_id INTEGER NOT NULL REFERENCES workout_exercises(id),
                weight_kg REAL NOT NULL,
                reps INTEGER NOT NULL,
                rpe REAL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_workouts_started_at ON workouts(started_at)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_we_workout ON workout_exercises(workout_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_we_exercise ON workout_exercises(exercise_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sets_we ON sets(workout_exercise_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Merge a batch of canonical workouts into storage.
    ///
    /// The entire batch commits atomically. A workout whose id already exists
    /// is skipped entirely: its exercises and sets are not revisited, so
    /// re-ingestion can never duplicate set rows.
    pub async fn reconcile(&self, workouts: &[Workout]) -> Result<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();
        let mut tx = self.pool.begin().await?;

        for workout in workouts {
            if workout.id.is_empty() {
                continue;
            }

            let exists = sqlx::query("SELECT id FROM workouts WHERE id = ?1")
                .bind(&workout.id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_some() {
                summary.skipped += 1;
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO workouts (id, title, started_at, ended_at, notes)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&workout.id)
            .bind(&workout.title)
            .bind(workout.started_at.to_rfc3339())
            .bind(workout.ended_at.map(|t| t.to_rfc3339()))
            .bind(&workout.notes)
            .execute(&mut *tx)
            .await?;
            summary.inserted += 1;
            debug!(
                workout.id = %workout.id,
                workout.logs = workout.logs.len(),
                "inserting workout"
            );

            for log in &workout.logs {
                let exercise_exists = sqlx::query("SELECT id FROM exercises WHERE id = ?1")
                    .bind(&log.exercise.id)
                    .fetch_optional(&mut *tx)
                    .await?;
                if exercise_exists.is_none() {
                    sqlx::query("INSERT INTO exercises (id, name) VALUES (?1, ?2)")
                        .bind(&log.exercise.id)
                        .bind(&log.exercise.name)
                        .execute(&mut *tx)
                        .await?;
                }

                let link = sqlx::query(
                    "SELECT id FROM workout_exercises WHERE workout_id = ?1 AND exercise_id = ?2",
                )
                .bind(&workout.id)
                .bind(&log.exercise.id)
                .fetch_optional(&mut *tx)
                .await?;

                let link_id: i64 = match link {
                    Some(row) => row.try_get("id")?,
                    None => {
                        let result = sqlx::query(
                            "INSERT INTO workout_exercises (workout_id, exercise_id) VALUES (?1, ?2)",
                        )
                        .bind(&workout.id)
                        .bind(&log.exercise.id)
                        .execute(&mut *tx)
                        .await?;
                        result.last_insert_rowid()
                    }
                };

                for set in &log.sets {
                    sqlx::query(
                        "INSERT INTO sets (workout_exercise_id, weight_kg, reps, rpe) VALUES (?1, ?2, ?3, ?4)",
                    )
                    .bind(link_id)
                    .bind(set.weight_kg)
                    .bind(set.reps)
                    .bind(set.rpe)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(summary)
    }

    /// Start timestamps of every workout, oldest first.
    pub async fn workout_dates(&self) -> Result<Vec<DateTime<Utc>>> {
        let rows = sqlx::query("SELECT started_at FROM workouts ORDER BY started_at")
            .fetch_all(&self.pool)
            .await?;

        let mut dates = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.try_get("started_at")?;
            dates.push(DateTime::parse_from_rfc3339(&raw)?.with_timezone(&Utc));
        }
        Ok(dates)
    }

    /// Full training history as flattened link rows with their sets,
    /// chronological by workout start.
    pub async fn load_history(&self) -> Result<Vec<TrainingEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT we.id AS link_id, w.id AS workout_id, w.started_at,
                   e.id AS exercise_id, e.name AS exercise_name,
                   s.weight_kg, s.reps, s.rpe
            FROM workout_exercises we
            JOIN workouts w ON w.id = we.workout_id
            JOIN exercises e ON e.id = we.exercise_id
            LEFT JOIN sets s ON s.workout_exercise_id = we.id
            ORDER BY w.started_at, we.id, s.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries: Vec<TrainingEntry> = Vec::new();
        let mut current_link: Option<i64> = None;

        for row in rows {
            let link_id: i64 = row.try_get("link_id")?;
            if current_link != Some(link_id) {
                let raw_started: String = row.try_get("started_at")?;
                entries.push(TrainingEntry {
                    workout_id: row.try_get("workout_id")?,
                    started_at: DateTime::parse_from_rfc3339(&raw_started)?.with_timezone(&Utc),
                    exercise_id: row.try_get("exercise_id")?,
                    exercise_name: row.try_get("exercise_name")?,
                    sets: Vec::new(),
                });
                current_link = Some(link_id);
            }

            let weight: Option<f64> = row.try_get("weight_kg")?;
            if let Some(weight_kg) = weight {
                let entry = entries.last_mut().expect("entry pushed above");
                entry.sets.push(SetEntry {
                    weight_kg,
                    reps: row.try_get("reps")?,
                    rpe: row.try_get("rpe")?,
                });
            }
        }

        Ok(entries)
    }

    /// Read a settings value.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    /// Write (or overwrite) a settings value.
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
