// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;
pub mod api_client;
pub mod enricher;
pub mod reconciler;
pub mod snapshot;

pub use account::AccountSession;
pub use api_client::WorkoutApiClient;
pub use enricher::DetailEnricher;
pub use reconciler::{ApplyLock, MergeReport, SummaryReconciler, SyncOutcome};
pub use snapshot::{SnapshotError, SnapshotStore};
