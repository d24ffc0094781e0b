// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Summary reconciliation.
//!
//! Handles the core sync workflow:
//! 1. Fetch the remote summary list for the linked athlete
//! 2. Merge it into the in-memory cache and report new/changed summaries
//! 3. Re-sort the cache (newest first) and write the warm-start snapshot
//! 4. Merge new/changed summaries into the durable store in one commit

use crate::db::{WorkoutStore, WriteBatch, WriteOp};
use crate::error::SyncError;
use crate::models::{LocalWorkout, WorkoutSummary};
use crate::services::{AccountSession, SnapshotStore, WorkoutApiClient};
use crate::time_utils::parse_workout_date;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Serializes every mutation of cache and store made by this crate.
///
/// Fetches happen outside the lock; results are applied inside it. The
/// guarded value is the account epoch, bumped on every disconnect: a
/// result fetched under an older epoch is discarded instead of applied.
pub type ApplyLock = Arc<Mutex<u64>>;

/// Reject a fetched result whose epoch is no longer current.
pub(crate) fn check_epoch(current: u64, fetched_at: u64) -> Result<(), SyncError> {
    if current != fetched_at {
        tracing::warn!(
            current,
            fetched_at,
            "Account disconnected during fetch, discarding result"
        );
        return Err(SyncError::NoAccount);
    }
    Ok(())
}

/// Cached summaries, newest first.
pub type SummaryCache = Arc<RwLock<Vec<WorkoutSummary>>>;

/// Outcome of merging summaries into the durable store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Result of a full sync pass.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub changed: Vec<WorkoutSummary>,
    pub report: MergeReport,
}

/// Reconciles remote summaries against the cache and the durable store.
#[derive(Clone)]
pub struct SummaryReconciler<S: WorkoutStore> {
    client: WorkoutApiClient,
    store: S,
    snapshot: SnapshotStore,
    cache: SummaryCache,
    apply_lock: ApplyLock,
}

impl<S: WorkoutStore> SummaryReconciler<S> {
    pub fn new(
        client: WorkoutApiClient,
        store: S,
        snapshot: SnapshotStore,
        apply_lock: ApplyLock,
    ) -> Self {
        Self {
            client,
            store,
            snapshot,
            cache: Arc::new(RwLock::new(Vec::new())),
            apply_lock,
        }
    }

    /// Fill the cache from the on-disk snapshot without touching the network.
    ///
    /// Returns the number of cached summaries. A missing or unreadable
    /// snapshot leaves the cache empty.
    pub async fn warm_start(&self) -> usize {
        let summaries = match self.snapshot.load().await {
            Ok(Some(summaries)) => summaries,
            Ok(None) => {
                tracing::debug!(path = %self.snapshot.path().display(), "No summary snapshot");
                return 0;
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.snapshot.path().display(),
                    error = %e,
                    "Ignoring unreadable summary snapshot"
                );
                return 0;
            }
        };

        let _guard = self.apply_lock.lock().await;
        let mut cache = self.cache.write().await;
        *cache = summaries;
        sort_newest_first(&mut cache);

        tracing::info!(count = cache.len(), "Summary cache warmed from snapshot");
        cache.len()
    }

    /// Copy of the cached summaries, newest first.
    pub async fn cached_summaries(&self) -> Vec<WorkoutSummary> {
        self.cache.read().await.clone()
    }

    /// Fetch summaries and merge them into the cache.
    ///
    /// Returns only the summaries that are new or whose distance or date
    /// changed. Fetch and decode failures leave the cache untouched.
    pub async fn reconcile(&self, account: Option<u64>) -> Result<Vec<WorkoutSummary>, SyncError> {
        self.reconcile_at_epoch(account).await.map(|(changed, _)| changed)
    }

    /// [`reconcile`](Self::reconcile), also returning the epoch it applied under.
    async fn reconcile_at_epoch(
        &self,
        account: Option<u64>,
    ) -> Result<(Vec<WorkoutSummary>, u64), SyncError> {
        let athlete_id = account.ok_or(SyncError::NoAccount)?;
        let epoch = *self.apply_lock.lock().await;

        let fetched = self.client.fetch_summaries(athlete_id).await?;
        let fetched_count = fetched.len();

        let guard = self.apply_lock.lock().await;
        check_epoch(*guard, epoch)?;

        let (changed, cached) = {
            let mut cache = self.cache.write().await;
            let changed = merge_summaries(&mut cache, fetched);
            (changed, cache.clone())
        };

        if let Err(e) = self.snapshot.save(&cached).await {
            tracing::warn!(error = %e, "Failed to write summary snapshot");
        }

        tracing::info!(
            athlete_id,
            fetched = fetched_count,
            changed = changed.len(),
            cached = cached.len(),
            "Summaries reconciled"
        );

        Ok((changed, epoch))
    }

    /// Merge new/changed summaries into the durable store.
    ///
    /// Missing workouts are created; existing ones get only their differing
    /// fields overwritten. Everything goes into one commit. A failed commit
    /// does not roll back the cache.
    pub async fn persist(&self, changed: &[WorkoutSummary]) -> Result<MergeReport, SyncError> {
        self.persist_at_epoch(changed, None).await
    }

    async fn persist_at_epoch(
        &self,
        changed: &[WorkoutSummary],
        epoch: Option<u64>,
    ) -> Result<MergeReport, SyncError> {
        let guard = self.apply_lock.lock().await;
        if let Some(epoch) = epoch {
            check_epoch(*guard, epoch)?;
        }

        // Last one wins if the caller passes the same id twice.
        let mut latest: HashMap<i64, &WorkoutSummary> = HashMap::new();
        let mut order = Vec::new();
        for summary in changed {
            if latest.insert(summary.id, summary).is_none() {
                order.push(summary.id);
            }
        }

        let mut batch = WriteBatch::new();
        let mut report = MergeReport::default();

        for id in order {
            let summary = latest[&id];

            match self.store.get_workout(id).await? {
                None => {
                    let workout = LocalWorkout::from_summary(summary);
                    if workout.date.is_none() {
                        tracing::warn!(
                            workout_id = id,
                            date = %summary.date,
                            "Unparseable workout date, storing without date"
                        );
                    }
                    batch.push(WriteOp::Insert(workout));
                    report.created += 1;
                }
                Some(mut existing) => {
                    let fields = existing.apply_summary(summary);
                    if fields.is_empty() {
                        report.unchanged += 1;
                        continue;
                    }
                    tracing::debug!(workout_id = id, fields = ?fields, "Workout changed");
                    existing.detail = None;
                    batch.push(WriteOp::Update {
                        workout: existing,
                        fields,
                    });
                    report.updated += 1;
                }
            }
        }

        if !batch.is_empty() {
            self.store.commit(batch).await.map_err(|e| {
                tracing::error!(error = %e, "Workout merge commit failed");
                match e {
                    SyncError::StoreCommitFailed(_) => e,
                    other => SyncError::StoreCommitFailed(other.to_string()),
                }
            })?;
        }

        tracing::info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            "Workouts merged into store"
        );

        Ok(report)
    }

    /// Reconcile, then persist the changed subset.
    pub async fn sync(&self, account: Option<u64>) -> Result<SyncOutcome, SyncError> {
        let (changed, epoch) = self.reconcile_at_epoch(account).await?;
        let report = self.persist_at_epoch(&changed, Some(epoch)).await?;
        Ok(SyncOutcome { changed, report })
    }

    /// Unlink the account and wipe all local workout state.
    ///
    /// Clears the session, the cache and the snapshot, then deletes every
    /// workout and detail from the store. Fetches still in flight are
    /// discarded when they complete. Failures are logged and returned;
    /// nothing is retried.
    pub async fn disconnect(&self, session: &AccountSession) -> Result<usize, SyncError> {
        let mut epoch = self.apply_lock.lock().await;

        let athlete_id = session.clear().await;
        let count = self.wipe(&mut epoch, athlete_id).await?;

        tracing::info!(athlete_id = ?athlete_id, deleted = count, "Account disconnected");
        Ok(count)
    }

    /// Link `athlete_id`. Returns the number of workouts deleted.
    ///
    /// Replacing a different linked athlete wipes local state first, as
    /// [`disconnect`](Self::disconnect) does, so two accounts never share
    /// the cache or the store. Relinking the same athlete deletes nothing.
    pub async fn link(&self, session: &AccountSession, athlete_id: u64) -> Result<usize, SyncError> {
        let mut epoch = self.apply_lock.lock().await;

        let previous = session.current().await;
        let deleted = match previous {
            Some(previous) if previous != athlete_id => {
                session.clear().await;
                self.wipe(&mut epoch, Some(previous)).await?
            }
            _ => 0,
        };

        session.link(athlete_id).await;
        Ok(deleted)
    }

    /// Bump the epoch and clear cache, snapshot and store. Caller holds the apply lock.
    async fn wipe(&self, epoch: &mut u64, athlete_id: Option<u64>) -> Result<usize, SyncError> {
        *epoch += 1;
        self.cache.write().await.clear();

        if let Err(e) = self.snapshot.clear().await {
            tracing::warn!(error = %e, "Failed to remove summary snapshot");
        }

        self.store.clear_all().await.map_err(|e| {
            tracing::error!(
                athlete_id = ?athlete_id,
                error = %e,
                "Failed to clear local workouts"
            );
            e
        })
    }
}

/// Merge fetched summaries into `cache`, returning the new or changed ones.
///
/// A cached summary is replaced only when its distance or date differ.
/// The cache is left sorted newest first.
pub fn merge_summaries(
    cache: &mut Vec<WorkoutSummary>,
    fetched: Vec<WorkoutSummary>,
) -> Vec<WorkoutSummary> {
    let mut index: HashMap<i64, usize> = cache
        .iter()
        .enumerate()
        .map(|(pos, summary)| (summary.id, pos))
        .collect();

    let mut changed: Vec<WorkoutSummary> = Vec::new();
    let mut changed_index: HashMap<i64, usize> = HashMap::new();

    for summary in fetched {
        let is_change = match index.get(&summary.id) {
            Some(&pos) if cache[pos].same_distance_and_date(&summary) => false,
            Some(&pos) => {
                cache[pos] = summary.clone();
                true
            }
            None => {
                index.insert(summary.id, cache.len());
                cache.push(summary.clone());
                true
            }
        };

        if is_change {
            match changed_index.get(&summary.id) {
                Some(&pos) => changed[pos] = summary,
                None => {
                    changed_index.insert(summary.id, changed.len());
                    changed.push(summary);
                }
            }
        }
    }

    sort_newest_first(cache);
    changed
}

/// Sort by parsed date descending; undated summaries go last.
fn sort_newest_first(summaries: &mut [WorkoutSummary]) {
    summaries.sort_by_cached_key(|s| Reverse((parse_workout_date(&s.date), s.date.clone())));
}
