// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout routes: sync, cached summaries and detail enrichment.

use crate::db::WorkoutStore;
use crate::error::{AppError, Result};
use crate::models::{LocalWorkout, LocalWorkoutDetail, WorkoutSummary};
use crate::services::SyncOutcome;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use geo::{BoundingRect, CoordsIter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes<S: WorkoutStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/api/workouts", get(list_workouts::<S>))
        .route("/api/workouts/sync", post(sync_workouts::<S>))
        .route("/api/workouts/summaries", get(get_summaries::<S>))
        .route("/api/workouts/{id}", get(get_workout::<S>))
        .route("/api/workouts/{id}/detail", get(get_detail::<S>))
}

// ─── Sync ────────────────────────────────────────────────────

/// Fetch summaries for the linked account and merge them locally.
async fn sync_workouts<S: WorkoutStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<SyncOutcome>> {
    let account = state.session.current().await;
    let outcome = state.reconciler.sync(account).await?;
    Ok(Json(outcome))
}

#[derive(Serialize)]
pub struct SummariesResponse {
    pub workouts: Vec<WorkoutSummary>,
}

/// Cached summaries, newest first. Never touches the network.
async fn get_summaries<S: WorkoutStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<SummariesResponse> {
    Json(SummariesResponse {
        workouts: state.reconciler.cached_summaries().await,
    })
}

// ─── Local Workouts ──────────────────────────────────────────

#[derive(Serialize)]
pub struct WorkoutListResponse {
    pub workouts: Vec<LocalWorkout>,
}

/// Workouts in the durable store, most recent first. Details are omitted.
async fn list_workouts<S: WorkoutStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<WorkoutListResponse>> {
    let workouts = state.store.list_workouts().await?;
    Ok(Json(WorkoutListResponse { workouts }))
}

// ─── Single Workout ──────────────────────────────────────────

/// Bounding box of a decoded route, as `[min_lng, min_lat, max_lng, max_lat]`.
#[derive(Serialize)]
pub struct RouteInfo {
    pub points: usize,
    pub bounds: [f64; 4],
}

impl RouteInfo {
    fn from_detail(detail: &LocalWorkoutDetail) -> Option<Self> {
        let line = detail.route()?;
        let rect = line.bounding_rect()?;
        Some(Self {
            points: line.coords_count(),
            bounds: [rect.min().x, rect.min().y, rect.max().x, rect.max().y],
        })
    }
}

#[derive(Serialize)]
pub struct WorkoutResponse {
    #[serde(flatten)]
    pub workout: LocalWorkout,
    pub route: Option<RouteInfo>,
}

async fn get_workout<S: WorkoutStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<WorkoutResponse>> {
    let workout = state
        .store
        .get_workout(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workout {}", id)))?;

    let route = workout.detail.as_ref().and_then(RouteInfo::from_detail);
    Ok(Json(WorkoutResponse { workout, route }))
}

#[derive(Deserialize, Default)]
pub struct DetailQuery {
    #[serde(default)]
    pub refresh: bool,
}

/// Return the stored detail, fetching it first if missing or if `refresh` is set.
async fn get_detail<S: WorkoutStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<LocalWorkoutDetail>> {
    let account = state.session.current().await;
    let detail = state
        .enricher
        .enrich_by_id(id, account, query.refresh)
        .await?;
    Ok(Json(detail))
}
