// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Hevy dashboard server binary: configuration, database, background
//! scheduler, and the warp HTTP surface.

use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use warp::{Filter, Reply};

use hevy_dashboard_server::config::ServerConfig;
use hevy_dashboard_server::database::Database;
use hevy_dashboard_server::logging;
use hevy_dashboard_server::providers::hevy::HevyProvider;
use hevy_dashboard_server::routes::{ErrorResponse, StatsRoutes, SyncIntervalSetting, SyncRoutes};
use hevy_dashboard_server::scheduler::SyncScheduler;
use hevy_dashboard_server::sync::SyncService;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sync and analytics server for Hevy workout data", long_about = None)]
struct Args {
    /// HTTP port (overrides HTTP_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(short, long)]
    database_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrendQuery {
    weeks: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let args = Args::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    config.validate()?;
    info!("{}", config.summary());

    let database = Database::new(&config.database_url).await?;
    database.migrate().await?;

    let provider = Arc::new(HevyProvider::new(&config.hevy));
    let service = Arc::new(SyncService::new(database.clone(), provider));
    let scheduler = SyncScheduler::new(
        database.clone(),
        service.clone(),
        config.sync_interval_minutes,
    );
    let scheduler_handle = scheduler.start();

    let stats = StatsRoutes::new(database.clone());
    let sync = SyncRoutes::new(database, service);
    let default_interval = config.sync_interval_minutes;

    let healthz = warp::path("healthz")
        .and(warp::get())
        .and(with_stats(stats.clone()))
        .map(|stats: StatsRoutes| warp::reply::json(&stats.health()));

    let weekly = warp::path!("api" / "weekly-workouts")
        .and(warp::get())
        .and(with_stats(stats.clone()))
        .and_then(|stats: StatsRoutes| async move { respond(stats.weekly_workouts().await) });

    let heatmap = warp::path!("api" / "heatmap")
        .and(warp::get())
        .and(with_stats(stats.clone()))
        .and_then(|stats: StatsRoutes| async move { respond(stats.heatmap().await) });

    let summary = warp::path!("api" / "summary")
        .and(warp::get())
        .and(with_stats(stats.clone()))
        .and_then(|stats: StatsRoutes| async move { respond(stats.summary().await) });

    let top_exercises = warp::path!("api" / "top-exercises")
        .and(warp::get())
        .and(with_stats(stats.clone()))
        .and_then(|stats: StatsRoutes| async move { respond(stats.top_exercises().await) });

    let split = warp::path!("api" / "split")
        .and(warp::get())
        .and(with_stats(stats.clone()))
        .and_then(|stats: StatsRoutes| async move { respond(stats.workout_split().await) });

    let progress = warp::path!("api" / "progress" / String)
        .and(warp::get())
        .and(with_stats(stats.clone()))
        .and_then(|exercise_id: String, stats: StatsRoutes| async move {
            respond(stats.exercise_progress(&exercise_id).await)
        });

    let volume_trends = warp::path!("api" / "volume-trends")
        .and(warp::get())
        .and(warp::query::<TrendQuery>())
        .and(with_stats(stats.clone()))
        .and_then(|query: TrendQuery, stats: StatsRoutes| async move {
            respond(stats.volume_trends(query.weeks).await)
        });

    let predictions = warp::path!("api" / "predictions")
        .and(warp::get())
        .and(with_stats(stats.clone()))
        .and_then(|stats: StatsRoutes| async move { respond(stats.predictions().await) });

    let deload = warp::path!("api" / "deload")
        .and(warp::get())
        .and(with_stats(stats.clone()))
        .and_then(|stats: StatsRoutes| async move { respond(stats.deload().await) });

    let next_workout = warp::path!("api" / "next-workout")
        .and(warp::get())
        .and(with_stats(stats))
        .and_then(|stats: StatsRoutes| async move { respond(stats.next_workout().await) });

    let sync_now = warp::path!("api" / "sync")
        .and(warp::post())
        .and(with_sync(sync.clone()))
        .and_then(|sync: SyncRoutes| async move { respond(sync.sync().await) });

    let backfill = warp::path!("api" / "backfill")
        .and(warp::post())
        .and(with_sync(sync.clone()))
        .and_then(|sync: SyncRoutes| async move { respond(sync.backfill().await) });

    let get_interval = warp::path!("api" / "settings" / "sync-interval")
        .and(warp::get())
        .and(with_sync(sync.clone()))
        .and_then(move |sync: SyncRoutes| async move {
            respond(sync.get_sync_interval(default_interval).await)
        });

    let put_interval = warp::path!("api" / "settings" / "sync-interval")
        .and(warp::put())
        .and(warp::body::json())
        .and(with_sync(sync))
        .and_then(|setting: SyncIntervalSetting, sync: SyncRoutes| async move {
            match sync.set_sync_interval(setting).await {
                Ok(body) => {
                    Ok::<_, warp::Rejection>(warp::reply::json(&body).into_response())
                }
                Err(e) => {
                    let body = ErrorResponse {
                        error: "invalid_request".to_string(),
                        message: e.to_string(),
                    };
                    Ok(warp::reply::with_status(
                        warp::reply::json(&body),
                        warp::http::StatusCode::BAD_REQUEST,
                    )
                    .into_response())
                }
            }
        });

    let api = healthz
        .or(weekly)
        .or(heatmap)
        .or(summary)
        .or(top_exercises)
        .or(split)
        .or(progress)
        .or(volume_trends)
        .or(predictions)
        .or(deload)
        .or(next_workout)
        .or(sync_now)
        .or(backfill)
        .or(get_interval)
        .or(put_interval);

    info!(port = config.http_port, "HTTP server listening");
    let (_, server) =
        warp::serve(api).bind_with_graceful_shutdown(([0, 0, 0, 0], config.http_port), async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        });
    server.await;

    scheduler_handle.shutdown().await;
    info!("Server stopped");
    Ok(())
}

fn with_stats(
    stats: StatsRoutes,
) -> impl Filter<Extract = (StatsRoutes,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || stats.clone())
}

fn with_sync(
    sync: SyncRoutes,
) -> impl Filter<Extract = (SyncRoutes,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || sync.clone())
}

/// Map a handler result onto a JSON reply, surfacing failures as HTTP 500.
fn respond<T: Serialize>(result: Result<T>) -> Result<warp::reply::Response, warp::Rejection> {
    match result {
        Ok(body) => Ok(warp::reply::json(&body).into_response()),
        Err(e) => {
            tracing::error!(error = %e, "Request handler failed");
            let body = ErrorResponse {
                error: "internal_error".to_string(),
                message: e.to_string(),
            };
            Ok(warp::reply::with_status(
                warp::reply::json(&body),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response())
        }
    }
}
