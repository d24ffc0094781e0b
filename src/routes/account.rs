// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account linking and disconnect.

use crate::db::WorkoutStore;
use crate::error::{AppError, Result};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes<S: WorkoutStore>() -> Router<Arc<AppState<S>>> {
    Router::new().route("/api/account", post(link_account::<S>).delete(disconnect::<S>))
}

#[derive(Deserialize)]
pub struct LinkAccountRequest {
    pub athlete_id: u64,
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub athlete_id: Option<u64>,
    /// Workouts deleted because a different athlete was linked before.
    pub deleted: usize,
}

/// Link the athlete whose workouts are synced.
///
/// Switching to a different athlete wipes the previous one's local data.
async fn link_account<S: WorkoutStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<LinkAccountRequest>,
) -> Result<Json<AccountResponse>> {
    if request.athlete_id == 0 {
        return Err(AppError::BadRequest("athlete_id must be non-zero".to_string()));
    }

    let deleted = state
        .reconciler
        .link(&state.session, request.athlete_id)
        .await?;

    Ok(Json(AccountResponse {
        athlete_id: Some(request.athlete_id),
        deleted,
    }))
}

#[derive(Serialize)]
pub struct DisconnectResponse {
    pub success: bool,
    pub deleted: usize,
}

/// Unlink the account and delete every locally stored workout and detail.
async fn disconnect<S: WorkoutStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<DisconnectResponse>> {
    let deleted = state.reconciler.disconnect(&state.session).await?;

    Ok(Json(DisconnectResponse {
        success: true,
        deleted,
    }))
}
