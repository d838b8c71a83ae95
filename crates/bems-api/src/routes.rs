//! # Routes
//!
//! - `GET /health`
//! - `GET /api/history` raw readings for one channel
//! - `GET /api/series` aggregated chart series for one channel
//! - `GET /api/latest` latest reading and status of every channel

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use bems_core::{AggregatedPoint, Aggregator, Channel, Granularity, Status};
use bems_redis::{read_latest, read_recent, read_window, Reading};
use chrono::{DateTime, Utc};
use redis::Client;
use serde::Serialize;
use tokio::task::spawn_blocking;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::ApiError;
use crate::query::{Fetch, HistoryParams, Limits};

#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    pub aggregator: Aggregator,
    pub limits: Limits,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub channel: Channel,
    pub label: &'static str,
    pub unit: &'static str,
    pub range: &'static str,
    pub granularity: Option<Granularity>,
    pub points: Vec<AggregatedPoint>,
}

#[derive(Debug, Serialize)]
pub struct LatestEntry {
    pub channel: Channel,
    pub label: &'static str,
    pub unit: &'static str,
    pub value: Option<f64>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub status: Option<Status>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/history", get(history))
        .route("/api/series", get(series))
        .route("/api/latest", get(latest))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health_check() -> &'static str {
    "OK"
}

async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    let plan = params.plan(Utc::now(), state.limits)?;
    let readings = load_readings(&state.client, plan.channel, plan.fetch).await?;
    Ok(Json(readings))
}

async fn series(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<SeriesResponse>, ApiError> {
    let plan = params.plan(Utc::now(), state.limits)?;
    let readings = load_readings(&state.client, plan.channel, plan.fetch).await?;
    let points = state.aggregator.aggregate(&readings, &plan.request);
    debug!(channel = %plan.channel, raw = readings.len(), points = points.len(), "aggregated series");

    Ok(Json(SeriesResponse {
        channel: plan.channel,
        label: plan.channel.label(),
        unit: plan.channel.unit(),
        range: plan.request.selector.label(),
        granularity: state.aggregator.granularity(&plan.request),
        points,
    }))
}

async fn latest(State(state): State<AppState>) -> Result<Json<Vec<LatestEntry>>, ApiError> {
    let client = state.client.clone();
    let entries = spawn_blocking(move || -> Result<Vec<LatestEntry>> {
        let mut con = client.get_connection().context("failed to connect to redis")?;
        Channel::ALL
            .into_iter()
            .map(|channel| {
                let reading = read_latest(&mut con, channel)?;
                Ok(LatestEntry {
                    channel,
                    label: channel.label(),
                    unit: channel.unit(),
                    value: reading.as_ref().map(|r| r.value),
                    recorded_at: reading.as_ref().map(|r| r.recorded_at),
                    status: reading.and_then(|r| channel.status(r.value)),
                })
            })
            .collect()
    })
    .await
    .context("latest task panicked")??;

    Ok(Json(entries))
}

/// Runs the storage read on the blocking pool. `Fetch::Nothing` never touches Redis.
async fn load_readings(client: &Client, channel: Channel, fetch: Fetch) -> Result<Vec<Reading>> {
    if fetch == Fetch::Nothing {
        return Ok(Vec::new());
    }
    let client = client.clone();
    spawn_blocking(move || {
        let mut con = client.get_connection().context("failed to connect to redis")?;
        match fetch {
            Fetch::Recent(limit) => read_recent(&mut con, channel, limit),
            Fetch::Window(window) => read_window(&mut con, channel, &window),
            Fetch::Nothing => Ok(Vec::new()),
        }
    })
    .await
    .context("history task panicked")?
}
