// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::sync::Arc;
use tempfile::TempDir;
use workout_sync::config::Config;
use workout_sync::db::{FirestoreDb, InMemoryStore};
use workout_sync::models::WorkoutSummary;
use workout_sync::routes::create_router;
use workout_sync::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// A test app backed by the in-memory store.
///
/// Keep `_snapshot_dir` alive for the duration of the test.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState<InMemoryStore>>,
    pub store: InMemoryStore,
    pub _snapshot_dir: TempDir,
}

/// Config pointing both provider endpoints at `base_url` and the snapshot into `dir`.
#[allow(dead_code)]
pub fn test_config(base_url: &str, dir: &TempDir) -> Config {
    Config {
        summaries_endpoint: format!("{}/workouts", base_url),
        detail_endpoint: format!("{}/workout", base_url),
        snapshot_path: dir.path().join("workout_snapshot.json"),
        ..Config::test_default()
    }
}

/// Create a test app whose provider endpoints live under `base_url`.
#[allow(dead_code)]
pub fn create_test_app(base_url: &str, athlete_id: Option<u64>) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config {
        athlete_id,
        ..test_config(base_url, &dir)
    };

    let store = InMemoryStore::new();
    let state = Arc::new(AppState::new(config, store.clone()));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        _snapshot_dir: dir,
    }
}

#[allow(dead_code)]
pub fn summary(id: i64, distance: f64, date: &str, activity_type: &str) -> WorkoutSummary {
    WorkoutSummary {
        id,
        distance,
        date: date.to_string(),
        activity_type: activity_type.to_string(),
    }
}

/// Summaries endpoint body for the given workouts.
#[allow(dead_code)]
pub fn summaries_body(workouts: &[WorkoutSummary]) -> String {
    serde_json::json!({ "workouts": workouts }).to_string()
}
