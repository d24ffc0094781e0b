// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed workout store.
//!
//! Layout:
//! - `workouts/{id}`: one document per workout
//! - `workout_details/{id}`: the detail of workout `id`, if fetched

use crate::db::{collections, WorkoutStore, WriteBatch, WriteOp};
use crate::error::SyncError;
use crate::models::{LocalWorkout, LocalWorkoutDetail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Stored workout document. The detail lives in its own collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkoutDocument {
    id: i64,
    date: Option<DateTime<Utc>>,
    distance: f64,
    activity_type: Option<String>,
}

impl From<&LocalWorkout> for WorkoutDocument {
    fn from(workout: &LocalWorkout) -> Self {
        Self {
            id: workout.id,
            date: workout.date,
            distance: workout.distance,
            activity_type: workout.activity_type.clone(),
        }
    }
}

impl WorkoutDocument {
    fn into_workout(self, detail: Option<LocalWorkoutDetail>) -> LocalWorkout {
        LocalWorkout {
            id: self.id,
            date: self.date,
            distance: self.distance,
            activity_type: self.activity_type,
            detail,
        }
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, SyncError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| SyncError::Store(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, SyncError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            SyncError::Store(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, SyncError> {
        self.client
            .as_ref()
            .ok_or_else(|| SyncError::Store("Database not connected (offline mode)".to_string()))
    }

    /// Get the stored detail for a workout.
    async fn get_detail(&self, workout_id: i64) -> Result<Option<LocalWorkoutDetail>, SyncError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WORKOUT_DETAILS)
            .obj()
            .one(&workout_id.to_string())
            .await
            .map_err(|e| SyncError::Store(e.to_string()))
    }

    /// Helper to batch delete documents using transactions.
    ///
    /// Up to `BATCH_SIZE` documents go into one transaction; larger sets are
    /// deleted in consecutive transactions, in the order given.
    async fn batch_delete(&self, docs: &[(&'static str, String)]) -> Result<(), SyncError> {
        let client = self.get_client()?;

        for chunk in docs.chunks(BATCH_SIZE) {
            let mut transaction = client.begin_transaction().await.map_err(|e| {
                SyncError::StoreCommitFailed(format!("Failed to begin transaction: {}", e))
            })?;

            for (collection, doc_id) in chunk {
                client
                    .fluent()
                    .delete()
                    .from(*collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        SyncError::StoreCommitFailed(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                SyncError::StoreCommitFailed(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

impl WorkoutStore for FirestoreDb {
    async fn get_workout(&self, id: i64) -> Result<Option<LocalWorkout>, SyncError> {
        let client = self.get_client()?;
        let doc_id = id.to_string();

        let workout_fut = client
            .fluent()
            .select()
            .by_id_in(collections::WORKOUTS)
            .obj::<WorkoutDocument>()
            .one(&doc_id);

        let (workout, detail) =
            futures_util::future::join(workout_fut, self.get_detail(id)).await;

        let workout = workout.map_err(|e| SyncError::Store(e.to_string()))?;
        let detail = detail?;
        Ok(workout.map(|doc| doc.into_workout(detail)))
    }

    async fn list_workouts(&self) -> Result<Vec<LocalWorkout>, SyncError> {
        let docs: Vec<WorkoutDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUTS)
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?;

        Ok(docs.into_iter().map(|doc| doc.into_workout(None)).collect())
    }

    /// Commit a batch in a single Firestore transaction.
    async fn commit(&self, batch: WriteBatch) -> Result<(), SyncError> {
        if batch.is_empty() {
            return Ok(());
        }

        let client = self.get_client()?;

        let mut transaction = client.begin_transaction().await.map_err(|e| {
            SyncError::StoreCommitFailed(format!("Failed to begin transaction: {}", e))
        })?;

        for op in batch.ops() {
            match op {
                WriteOp::Insert(workout) => {
                    client
                        .fluent()
                        .update()
                        .in_col(collections::WORKOUTS)
                        .document_id(workout.id.to_string())
                        .object(&WorkoutDocument::from(workout))
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| {
                            SyncError::StoreCommitFailed(format!(
                                "Failed to add workout {} to transaction: {}",
                                workout.id, e
                            ))
                        })?;
                }
                WriteOp::Update { workout, fields } => {
                    // Field mask: only the differing fields are written.
                    client
                        .fluent()
                        .update()
                        .fields(fields.iter().map(|f| f.as_str()))
                        .in_col(collections::WORKOUTS)
                        .document_id(workout.id.to_string())
                        .object(&WorkoutDocument::from(workout))
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| {
                            SyncError::StoreCommitFailed(format!(
                                "Failed to add workout update {} to transaction: {}",
                                workout.id, e
                            ))
                        })?;
                }
                WriteOp::ReplaceDetail(detail) => {
                    client
                        .fluent()
                        .update()
                        .in_col(collections::WORKOUT_DETAILS)
                        .document_id(detail.workout_id.to_string())
                        .object(detail)
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| {
                            SyncError::StoreCommitFailed(format!(
                                "Failed to add detail {} to transaction: {}",
                                detail.workout_id, e
                            ))
                        })?;
                }
            }
        }

        transaction
            .commit()
            .await
            .map_err(|e| SyncError::StoreCommitFailed(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(ops = batch.len(), "Workout batch committed");
        Ok(())
    }

    /// Delete every workout and detail.
    ///
    /// The document list is read first, outside any transaction. Up to
    /// `BATCH_SIZE` documents are then deleted in a single transaction.
    /// Larger stores are deleted in consecutive transactions, so a failure
    /// part way leaves some documents behind; details are ordered before
    /// workouts so that what remains never includes a detail without its
    /// workout.
    async fn clear_all(&self) -> Result<usize, SyncError> {
        let client = self.get_client()?;

        let details: Vec<LocalWorkoutDetail> = client
            .fluent()
            .select()
            .from(collections::WORKOUT_DETAILS)
            .obj()
            .query()
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?;

        let workouts: Vec<WorkoutDocument> = client
            .fluent()
            .select()
            .from(collections::WORKOUTS)
            .obj()
            .query()
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?;

        let docs = deletion_order(
            details.iter().map(|d| d.workout_id),
            workouts.iter().map(|w| w.id),
        );
        if docs.len() > BATCH_SIZE {
            tracing::warn!(
                documents = docs.len(),
                "Store too large for one transaction, clearing in batches"
            );
        }

        self.batch_delete(&docs).await?;

        tracing::info!(
            workouts = workouts.len(),
            details = details.len(),
            "Local workout store cleared"
        );
        Ok(workouts.len())
    }
}

/// Documents to delete for a full clear: every detail, then every workout.
fn deletion_order(
    detail_ids: impl IntoIterator<Item = i64>,
    workout_ids: impl IntoIterator<Item = i64>,
) -> Vec<(&'static str, String)> {
    detail_ids
        .into_iter()
        .map(|id| (collections::WORKOUT_DETAILS, id.to_string()))
        .chain(
            workout_ids
                .into_iter()
                .map(|id| (collections::WORKOUTS, id.to_string())),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deletion_order_details_first() {
        let docs = deletion_order([2, 1], [1, 2, 3]);
        assert_eq!(docs.len(), 5);
        assert!(docs[..2].iter().all(|(c, _)| *c == collections::WORKOUT_DETAILS));
        assert!(docs[2..].iter().all(|(c, _)| *c == collections::WORKOUTS));
        assert_eq!(docs[0].1, "2");
    }

    #[test]
    fn test_small_store_clears_in_one_transaction() {
        let docs = deletion_order(0..150, 0..250);
        assert_eq!(docs.len(), BATCH_SIZE);
        assert_eq!(docs.chunks(BATCH_SIZE).count(), 1);
    }

    #[test]
    fn test_large_store_never_orphans_details() {
        let docs = deletion_order(0..300, 0..300);
        let chunks: Vec<_> = docs.chunks(BATCH_SIZE).collect();
        assert_eq!(chunks.len(), 2);
        // All details go in the first transaction.
        assert_eq!(
            chunks[0]
                .iter()
                .filter(|(c, _)| *c == collections::WORKOUT_DETAILS)
                .count(),
            300
        );
        assert!(chunks[1].iter().all(|(c, _)| *c == collections::WORKOUTS));
    }
}
