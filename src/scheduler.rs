// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Background sync scheduler.
//!
//! Runs an incremental sync on a fixed cadence. The interval is re-read from
//! the settings table on every tick, so a change made through the settings
//! endpoint takes effect at the next wakeup without a restart.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::database::Database;
use crate::sync::{SyncService, DEFAULT_SYNC_LIMIT};

/// Settings key holding the sync cadence in minutes.
pub const SYNC_INTERVAL_KEY: &str = "sync_interval_minutes";

/// Periodically triggers incremental syncs until shut down.
pub struct SyncScheduler {
    database: Database,
    service: Arc<SyncService>,
    default_interval_minutes: u64,
}

/// Handle for stopping a running scheduler.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the scheduler to stop and wait for its task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl SyncScheduler {
    pub fn new(database: Database, service: Arc<SyncService>, default_interval_minutes: u64) -> Self {
        Self {
            database,
            service,
            default_interval_minutes: default_interval_minutes.max(1),
        }
    }

    /// Spawn the scheduler loop on the current runtime.
    pub fn start(self) -> SchedulerHandle {
        let (tx, mut rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            info!(
                interval_minutes = self.default_interval_minutes,
                "Sync scheduler started"
            );
            loop {
                let interval = self.current_interval().await;
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = rx.changed() => {
                        if *rx.borrow() {
                            info!("Sync scheduler stopping");
                            return;
                        }
                    }
                }
                self.tick().await;
            }
        });
        SchedulerHandle { shutdown: tx, task }
    }

    /// Interval for the next tick, from settings when present and valid.
    async fn current_interval(&self) -> Duration {
        let minutes = match self.database.get_setting(SYNC_INTERVAL_KEY).await {
            Ok(Some(raw)) => match raw.parse::<u64>() {
                Ok(m) if m >= 1 => m,
                _ => {
                    warn!(value = %raw, "Ignoring invalid sync interval setting");
                    self.default_interval_minutes
                }
            },
            Ok(None) => self.default_interval_minutes,
            Err(e) => {
                warn!(error = %e, "Failed to read sync interval setting");
                self.default_interval_minutes
            }
        };
        Duration::from_secs(minutes * 60)
    }

    async fn tick(&self) {
        match self.service.try_sync_latest(DEFAULT_SYNC_LIMIT).await {
            Ok(Some(report)) => {
                info!(
                    fetched = report.fetched,
                    inserted = report.inserted,
                    "Scheduled sync finished"
                );
            }
            Ok(None) => {
                info!("Scheduled sync skipped, another sync is in progress");
            }
            Err(e) => {
                error!(error = %e, "Scheduled sync failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{FetchOutcome, WorkoutProvider};
    use async_trait::async_trait;

    struct EmptyProvider;

    #[async_trait]
    impl WorkoutProvider for EmptyProvider {
        async fn fetch_latest(&self, _limit: usize) -> FetchOutcome {
            FetchOutcome::default()
        }

        async fn fetch_all(&self) -> FetchOutcome {
            FetchOutcome::default()
        }

        fn provider_name(&self) -> &'static str {
            "empty"
        }
    }

    async fn scheduler() -> SyncScheduler {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let service = Arc::new(SyncService::new(db.clone(), Arc::new(EmptyProvider)));
        SyncScheduler::new(db, service, 15)
    }

    #[tokio::test]
    async fn test_interval_defaults_when_unset() {
        let s = scheduler().await;
        assert_eq!(s.current_interval().await, Duration::from_secs(15 * 60));
    }

    #[tokio::test]
    async fn test_interval_reads_setting() {
        let s = scheduler().await;
        s.database.set_setting(SYNC_INTERVAL_KEY, "5").await.unwrap();
        assert_eq!(s.current_interval().await, Duration::from_secs(5 * 60));
    }

    #[tokio::test]
    async fn test_invalid_setting_falls_back() {
        let s = scheduler().await;
        s.database
            .set_setting(SYNC_INTERVAL_KEY, "zero")
            .await
            .unwrap();
        assert_eq!(s.current_interval().await, Duration::from_secs(15 * 60));
        s.database.set_setting(SYNC_INTERVAL_KEY, "0").await.unwrap();
        assert_eq!(s.current_interval().await, Duration::from_secs(15 * 60));
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        let s = scheduler().await;
        let handle = s.start();
        handle.shutdown().await;
    }
}
