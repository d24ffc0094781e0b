// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout-Sync: import third-party workouts into a local store
//!
//! This crate fetches workout summaries from a fitness provider, reconciles
//! them against a cache and a durable store, and enriches individual
//! workouts with detail records on demand.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::WorkoutStore;
use services::{
    AccountSession, ApplyLock, DetailEnricher, SnapshotStore, SummaryReconciler, WorkoutApiClient,
};

/// Shared application state.
pub struct AppState<S: WorkoutStore> {
    pub config: Config,
    pub session: AccountSession,
    pub store: S,
    pub reconciler: SummaryReconciler<S>,
    pub enricher: DetailEnricher<S>,
}

impl<S: WorkoutStore> AppState<S> {
    /// Wire both sync components to one store, one API client and one apply lock.
    pub fn new(config: Config, store: S) -> Self {
        let client = WorkoutApiClient::new(
            config.summaries_endpoint.clone(),
            config.detail_endpoint.clone(),
        );
        let apply_lock = ApplyLock::default();

        let reconciler = SummaryReconciler::new(
            client.clone(),
            store.clone(),
            SnapshotStore::new(&config.snapshot_path),
            apply_lock.clone(),
        );
        let enricher = DetailEnricher::new(client, store.clone(), apply_lock);

        Self {
            session: AccountSession::new(config.athlete_id),
            config,
            store,
            reconciler,
            enricher,
        }
    }
}
