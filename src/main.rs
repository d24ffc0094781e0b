// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout-Sync API Server
//!
//! Imports workout summaries from a fitness provider into a local store
//! and enriches individual workouts with detail records on demand.

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workout_sync::{
    config::Config,
    db::{FirestoreDb, InMemoryStore, WorkoutStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Workout-Sync API");

    match config.gcp_project_id.clone() {
        Some(project_id) => {
            let db = FirestoreDb::new(&project_id)
                .await
                .with_context(|| format!("Failed to connect to Firestore project {}", project_id))?;
            serve(config, db).await
        }
        None => {
            tracing::warn!("GCP_PROJECT_ID not set, using in-memory workout store");
            serve(config, InMemoryStore::new()).await
        }
    }
}

/// Build shared state over `store`, warm the cache and run the server.
async fn serve<S: WorkoutStore>(config: Config, store: S) -> anyhow::Result<()> {
    let port = config.port;
    let state = Arc::new(AppState::new(config, store));

    let warmed = state.reconciler.warm_start().await;
    tracing::info!(
        count = warmed,
        linked = state.session.current().await.is_some(),
        "Summary cache ready"
    );

    // Build router
    let app = workout_sync::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("workout_sync=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
