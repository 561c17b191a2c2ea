// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Hevy Dashboard Server
//!
//! Sync and analytics engine for a personal fitness dashboard. Pulls workout
//! history from the Hevy API, reconciles it into a local SQLite database,
//! and serves derived training metrics over HTTP.
//!
//! ## Architecture
//!
//! - **providers**: Hevy API client behind the [`providers::WorkoutProvider`]
//!   seam, with auth fallback and tolerant pagination
//! - **normalizer**: lossy upstream JSON to canonical workout structs
//! - **models**: canonical domain types shared across the crate
//! - **database**: SQLite persistence and idempotent reconciliation
//! - **sync**: serialized fetch-and-reconcile orchestration
//! - **scheduler**: periodic background sync
//! - **intelligence**: pure analytics over persisted history
//! - **routes**: transport-agnostic HTTP handlers
//! - **config**: environment-driven configuration
//! - **logging**: structured tracing setup

pub mod config;
pub mod database;
pub mod intelligence;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod providers;
pub mod routes;
pub mod scheduler;
pub mod sync;
