// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the durable workout store and its implementations.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::InMemoryStore;

use crate::error::SyncError;
use crate::models::{LocalWorkout, LocalWorkoutDetail, WorkoutField};
use std::future::Future;

/// Collection names as constants.
pub mod collections {
    pub const WORKOUTS: &str = "workouts";
    /// Workout details (keyed by workout id)
    pub const WORKOUT_DETAILS: &str = "workout_details";
}

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Create a workout that was not stored before.
    Insert(LocalWorkout),
    /// Overwrite only `fields` of an existing workout with values from `workout`.
    Update {
        workout: LocalWorkout,
        fields: Vec<WorkoutField>,
    },
    /// Replace the detail of an existing workout as a whole.
    ReplaceDetail(LocalWorkoutDetail),
}

/// Writes committed together: either all of them land or none do.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Durable keyed store for workouts and their details.
///
/// Workouts and details live in separate keyed tables; details reference
/// their workout by id. Reads assemble `LocalWorkout::detail`.
pub trait WorkoutStore: Clone + Send + Sync + 'static {
    /// Look up a workout (with its detail) by id.
    fn get_workout(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<LocalWorkout>, SyncError>> + Send;

    /// All stored workouts, most recent first. Details are not attached.
    fn list_workouts(&self) -> impl Future<Output = Result<Vec<LocalWorkout>, SyncError>> + Send;

    /// Apply a batch atomically.
    fn commit(&self, batch: WriteBatch) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Delete every workout and every detail. Returns the number of workouts removed.
    fn clear_all(&self) -> impl Future<Output = Result<usize, SyncError>> + Send;
}
