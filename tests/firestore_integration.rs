// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set). The store is cleared at the end, so
//! everything that touches the emulator runs inside one test.

use chrono::TimeZone;
use workout_sync::db::{WorkoutStore, WriteBatch, WriteOp};
use workout_sync::error::SyncError;
use workout_sync::models::{LocalWorkout, LocalWorkoutDetail, WorkoutField};

mod common;
use common::{summary, test_db, test_db_offline};

/// Generate a unique workout ID for test isolation.
fn unique_workout_id() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    (SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
        % 1_000_000_000_000) as i64
}

#[tokio::test]
async fn test_offline_store_reports_store_error() {
    let db = test_db_offline();

    assert!(matches!(db.get_workout(1).await, Err(SyncError::Store(_))));
    assert!(matches!(db.clear_all().await, Err(SyncError::Store(_))));

    let mut batch = WriteBatch::new();
    batch.push(WriteOp::Insert(LocalWorkout::from_summary(&summary(
        1,
        1.0,
        "2024-01-01",
        "Run",
    ))));
    assert!(db.commit(batch).await.is_err());
}

#[tokio::test]
async fn test_workout_store_lifecycle() {
    require_emulator!();

    let db = test_db().await;
    let older = unique_workout_id();
    let newer = older + 1;

    // Initially, workout should not exist
    assert!(db.get_workout(older).await.unwrap().is_none());

    // Insert two workouts in one batch
    let mut batch = WriteBatch::new();
    batch.push(WriteOp::Insert(LocalWorkout::from_summary(&summary(
        older,
        3000.0,
        "2024-03-01T08:00:00Z",
        "Run",
    ))));
    batch.push(WriteOp::Insert(LocalWorkout::from_summary(&summary(
        newer,
        5000.0,
        "2024-03-02T08:00:00Z",
        "Ride",
    ))));
    db.commit(batch).await.unwrap();

    let stored = db.get_workout(older).await.unwrap().expect("inserted");
    assert_eq!(stored.distance, 3000.0);
    assert_eq!(
        stored.date,
        Some(chrono::Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap())
    );
    assert!(stored.detail.is_none());

    // Attach a detail
    let detail = LocalWorkoutDetail {
        workout_id: older,
        athlete_id: 42,
        name: "Lunch Run".to_string(),
        moving_time: 1200,
        ..Default::default()
    };
    let mut batch = WriteBatch::new();
    batch.push(WriteOp::ReplaceDetail(detail.clone()));
    db.commit(batch).await.unwrap();

    // Field-masked update leaves the type and the detail alone
    let mut changed = stored.clone();
    changed.distance = 3100.0;
    changed.activity_type = Some("Walk".to_string());
    let mut batch = WriteBatch::new();
    batch.push(WriteOp::Update {
        workout: changed,
        fields: vec![WorkoutField::Distance],
    });
    db.commit(batch).await.unwrap();

    let updated = db.get_workout(older).await.unwrap().unwrap();
    assert_eq!(updated.distance, 3100.0);
    assert_eq!(updated.activity_type.as_deref(), Some("Run"));
    assert_eq!(updated.detail, Some(detail));

    // Newest first
    let ids: Vec<i64> = db
        .list_workouts()
        .await
        .unwrap()
        .iter()
        .map(|w| w.id)
        .filter(|id| *id == older || *id == newer)
        .collect();
    assert_eq!(ids, vec![newer, older]);

    // Bulk clear
    let deleted = db.clear_all().await.unwrap();
    assert!(deleted >= 2);
    assert!(db.get_workout(older).await.unwrap().is_none());
    assert!(db.get_workout(newer).await.unwrap().is_none());
}
