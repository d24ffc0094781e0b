// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process workout store.
//!
//! Used when no GCP project is configured and throughout the tests.
//! Batches are validated in full before any write is applied, and commits
//! are serialized, so a batch is all-or-nothing just like a Firestore
//! transaction.

use crate::db::{WorkoutStore, WriteBatch, WriteOp};
use crate::error::SyncError;
use crate::models::{LocalWorkout, LocalWorkoutDetail, WorkoutField};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// DashMap-backed store with the same layout as the Firestore collections.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    workouts: Arc<DashMap<i64, LocalWorkout>>,
    details: Arc<DashMap<i64, LocalWorkoutDetail>>,
    commit_lock: Arc<Mutex<()>>,
    reject_commits: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following commit fail (simulates an unavailable store).
    pub fn reject_commits(&self, reject: bool) {
        self.reject_commits.store(reject, Ordering::SeqCst);
    }

    /// Number of stored workouts.
    pub fn workout_count(&self) -> usize {
        self.workouts.len()
    }

    /// Number of stored details.
    pub fn detail_count(&self) -> usize {
        self.details.len()
    }

    /// Check that every op in the batch can be applied.
    fn validate(&self, batch: &WriteBatch) -> Result<(), SyncError> {
        // Workouts inserted earlier in the same batch count as present.
        let mut inserted = HashSet::new();

        for op in batch.ops() {
            match op {
                WriteOp::Insert(workout) => {
                    if self.workouts.contains_key(&workout.id) || !inserted.insert(workout.id) {
                        return Err(SyncError::StoreCommitFailed(format!(
                            "workout {} already exists",
                            workout.id
                        )));
                    }
                }
                WriteOp::Update { workout, .. } => {
                    if !self.workouts.contains_key(&workout.id) && !inserted.contains(&workout.id)
                    {
                        return Err(SyncError::StoreCommitFailed(format!(
                            "workout {} does not exist",
                            workout.id
                        )));
                    }
                }
                WriteOp::ReplaceDetail(detail) => {
                    if !self.workouts.contains_key(&detail.workout_id)
                        && !inserted.contains(&detail.workout_id)
                    {
                        return Err(SyncError::StoreCommitFailed(format!(
                            "detail references missing workout {}",
                            detail.workout_id
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

impl WorkoutStore for InMemoryStore {
    async fn get_workout(&self, id: i64) -> Result<Option<LocalWorkout>, SyncError> {
        let Some(mut workout) = self.workouts.get(&id).map(|w| w.value().clone()) else {
            return Ok(None);
        };
        workout.detail = self.details.get(&id).map(|d| d.value().clone());
        Ok(Some(workout))
    }

    async fn list_workouts(&self) -> Result<Vec<LocalWorkout>, SyncError> {
        let mut workouts: Vec<LocalWorkout> =
            self.workouts.iter().map(|w| w.value().clone()).collect();
        // Most recent first; undated workouts last.
        workouts.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(workouts)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), SyncError> {
        let _guard = self.commit_lock.lock().await;

        if self.reject_commits.load(Ordering::SeqCst) {
            return Err(SyncError::StoreCommitFailed(
                "store is rejecting writes".to_string(),
            ));
        }

        self.validate(&batch)?;

        for op in batch.ops() {
            match op {
                WriteOp::Insert(workout) => {
                    let mut record = workout.clone();
                    record.detail = None;
                    self.workouts.insert(record.id, record);
                }
                WriteOp::Update { workout, fields } => {
                    if let Some(mut stored) = self.workouts.get_mut(&workout.id) {
                        for field in fields {
                            match field {
                                WorkoutField::Distance => stored.distance = workout.distance,
                                WorkoutField::Date => stored.date = workout.date,
                                WorkoutField::ActivityType => {
                                    stored.activity_type = workout.activity_type.clone()
                                }
                            }
                        }
                    }
                }
                WriteOp::ReplaceDetail(detail) => {
                    self.details.insert(detail.workout_id, detail.clone());
                }
            }
        }

        tracing::debug!(ops = batch.len(), "In-memory batch committed");
        Ok(())
    }

    async fn clear_all(&self) -> Result<usize, SyncError> {
        let _guard = self.commit_lock.lock().await;

        if self.reject_commits.load(Ordering::SeqCst) {
            return Err(SyncError::StoreCommitFailed(
                "store is rejecting writes".to_string(),
            ));
        }

        let count = self.workouts.len();
        self.details.clear();
        self.workouts.clear();
        Ok(count)
    }
}
