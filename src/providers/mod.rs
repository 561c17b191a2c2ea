// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Workout;

pub mod hevy;

/// Why a fetch stopped short. Callers still degrade to "zero new workouts",
/// but the reason is reportable instead of being swallowed.
#[derive(Debug, Clone, Error)]
pub enum FetchFailure {
    #[error("upstream rejected credentials (401 after fallback)")]
    Unauthorized,
    #[error("upstream returned HTTP {0}")]
    Http(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("response body was not the expected JSON shape: {0}")]
    Decode(String),
}

/// Result of a paged fetch. `workouts` holds everything parsed before any
/// failure; a partial page plus a `failure` is a valid outcome.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub workouts: Vec<Workout>,
    pub pages: usize,
    pub failure: Option<FetchFailure>,
}

impl FetchOutcome {
    pub fn failed(failure: FetchFailure) -> Self {
        Self {
            workouts: Vec::new(),
            pages: 0,
            failure: Some(failure),
        }
    }
}

/// Seam between the sync engine and the upstream workout source.
#[async_trait]
pub trait WorkoutProvider: Send + Sync {
    /// Fetch up to `limit` workouts, newest first.
    async fn fetch_latest(&self, limit: usize) -> FetchOutcome;

    /// Fetch the complete workout history.
    async fn fetch_all(&self) -> FetchOutcome;

    fn provider_name(&self) -> &'static str;
}
