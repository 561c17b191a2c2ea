// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Sync orchestration: fetch from the provider, reconcile into storage.
//!
//! All sync paths funnel through a single in-process mutex, so at most one
//! reconciliation runs at a time regardless of how many HTTP requests or
//! scheduler ticks ask for one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::database::Database;
use crate::models::Workout;
use crate::providers::{FetchOutcome, WorkoutProvider};

/// Default number of workouts pulled by an incremental sync.
pub const DEFAULT_SYNC_LIMIT: usize = 10;

/// Result of one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Workouts returned by the provider.
    pub fetched: usize,
    /// Workouts newly persisted this run.
    pub inserted: usize,
    /// Workouts already present and left untouched.
    pub skipped: usize,
    /// Reason the fetch ended early, if it did. Workouts collected before
    /// the failure are still reconciled.
    pub fetch_failure: Option<String>,
}

/// Serializes provider fetches and database reconciliation.
pub struct SyncService {
    database: Database,
    provider: Arc<dyn WorkoutProvider>,
    lock: Mutex<()>,
}

impl SyncService {
    pub fn new(database: Database, provider: Arc<dyn WorkoutProvider>) -> Self {
        Self {
            database,
            provider,
            lock: Mutex::new(()),
        }
    }

    /// Incremental sync: fetch the most recent workouts and reconcile them.
    /// Blocks until any in-flight sync finishes.
    pub async fn sync_latest(&self, limit: usize) -> anyhow::Result<SyncReport> {
        let _guard = self.lock.lock().await;
        let outcome = self.provider.fetch_latest(limit).await;
        self.reconcile(outcome).await
    }

    /// Full backfill: page through the provider's entire history.
    pub async fn sync_all(&self) -> anyhow::Result<SyncReport> {
        let _guard = self.lock.lock().await;
        let outcome = self.provider.fetch_all().await;
        self.reconcile(outcome).await
    }

    /// Incremental sync that refuses to wait: returns `None` when another
    /// sync already holds the lock. Used by the background scheduler so a
    /// slow manual sync never stacks up tick work behind it.
    pub async fn try_sync_latest(&self, limit: usize) -> anyhow::Result<Option<SyncReport>> {
        let Ok(_guard) = self.lock.try_lock() else {
            return Ok(None);
        };
        let outcome = self.provider.fetch_latest(limit).await;
        self.reconcile(outcome).await.map(Some)
    }

    async fn reconcile(&self, outcome: FetchOutcome) -> anyhow::Result<SyncReport> {
        if let Some(failure) = &outcome.failure {
            warn!(
                provider = self.provider.provider_name(),
                pages = outcome.pages,
                fetched = outcome.workouts.len(),
                error = %failure,
                "Fetch ended early, reconciling what was collected"
            );
        }

        let summary = self.database.reconcile(&outcome.workouts).await?;
        let sets: usize = outcome.workouts.iter().map(Workout::set_count).sum();
        info!(
            provider = self.provider.provider_name(),
            fetched = outcome.workouts.len(),
            sets,
            inserted = summary.inserted,
            skipped = summary.skipped,
            "Sync complete"
        );

        Ok(SyncReport {
            fetched: outcome.workouts.len(),
            inserted: summary.inserted,
            skipped: summary.skipped,
            fetch_failure: outcome.failure.map(|f| f.to_string()),
        })
    }
}
