// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! On-demand workout detail enrichment.

use crate::db::{WorkoutStore, WriteBatch, WriteOp};
use crate::error::SyncError;
use crate::models::{LocalWorkout, LocalWorkoutDetail};
use crate::services::reconciler::{check_epoch, ApplyLock};
use crate::services::WorkoutApiClient;
use crate::time_utils::format_utc_rfc3339;
use serde_json::{Map, Value};

/// Fetches workout details and stores them against the local workout.
#[derive(Clone)]
pub struct DetailEnricher<S: WorkoutStore> {
    client: WorkoutApiClient,
    store: S,
    apply_lock: ApplyLock,
}

impl<S: WorkoutStore> DetailEnricher<S> {
    pub fn new(client: WorkoutApiClient, store: S, apply_lock: ApplyLock) -> Self {
        Self {
            client,
            store,
            apply_lock,
        }
    }

    /// Return the detail for `workout`, fetching it if needed.
    ///
    /// Without `force_refresh`, an existing detail is returned as-is with no
    /// I/O. A fetched detail replaces the stored one as a whole; on any
    /// error the stored detail is left unchanged. A fetch overtaken by a
    /// disconnect fails with `NoAccount` and stores nothing.
    pub async fn enrich(
        &self,
        workout: &LocalWorkout,
        account: Option<u64>,
        force_refresh: bool,
    ) -> Result<LocalWorkoutDetail, SyncError> {
        if !force_refresh {
            if let Some(detail) = &workout.detail {
                tracing::debug!(workout_id = workout.id, "Detail cache hit");
                return Ok(detail.clone());
            }
        }

        let athlete_id = account.ok_or(SyncError::NoAccount)?;
        let epoch = *self.apply_lock.lock().await;

        let raw = self.client.fetch_detail_raw(athlete_id, workout.id).await?;
        let detail = parse_detail(&raw, workout.id, athlete_id)?;

        let guard = self.apply_lock.lock().await;
        check_epoch(*guard, epoch)?;

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::ReplaceDetail(detail.clone()));
        self.store.commit(batch).await.map_err(|e| {
            tracing::error!(workout_id = workout.id, error = %e, "Detail commit failed");
            match e {
                SyncError::StoreCommitFailed(_) => e,
                other => SyncError::StoreCommitFailed(other.to_string()),
            }
        })?;

        tracing::info!(
            athlete_id,
            workout_id = workout.id,
            refreshed = workout.detail.is_some(),
            "Workout detail stored"
        );

        Ok(detail)
    }

    /// Look the workout up in the store, then [`enrich`](Self::enrich) it.
    pub async fn enrich_by_id(
        &self,
        workout_id: i64,
        account: Option<u64>,
        force_refresh: bool,
    ) -> Result<LocalWorkoutDetail, SyncError> {
        let workout = self
            .store
            .get_workout(workout_id)
            .await?
            .ok_or(SyncError::NotFound(workout_id))?;

        self.enrich(&workout, account, force_refresh).await
    }
}

/// Replace empty field values (`"key": ,` and `"key":,`) with `null`.
///
/// The provider sometimes emits these for absent values. This is a plain
/// text substitution applied before parsing; it does not look at string
/// boundaries.
pub fn repair_json(raw: &str) -> String {
    raw.replace(": ,", ": null,").replace(":,", ": null,")
}

/// Repair and parse a raw detail payload.
///
/// Parsing is schema-free: missing or mistyped fields fall back to 0 or "".
pub fn parse_detail(
    raw: &str,
    workout_id: i64,
    athlete_id: u64,
) -> Result<LocalWorkoutDetail, SyncError> {
    let repaired = repair_json(raw);

    let value: Value = serde_json::from_str(&repaired).map_err(|e| {
        tracing::warn!(
            workout_id,
            error = %e,
            body_prefix = %repaired.chars().take(500).collect::<String>(),
            "Failed to parse workout detail"
        );
        SyncError::ParseFailed(e.to_string())
    })?;

    let Value::Object(obj) = value else {
        return Err(SyncError::ParseFailed(
            "detail payload is not a JSON object".to_string(),
        ));
    };

    if let Some(remote_id) = obj.get("workout_id").and_then(as_integer) {
        if remote_id != workout_id {
            tracing::warn!(
                workout_id,
                remote_id,
                "Detail payload reports a different workout id"
            );
        }
    }

    let summary_polyline = obj
        .get("map")
        .and_then(|m| m.get("summary_polyline"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(LocalWorkoutDetail {
        workout_id,
        athlete_id,
        name: text(&obj, "name"),
        sport_type: text(&obj, "sport_type"),
        activity_type: text(&obj, "type"),
        average_heartrate: number(&obj, "average_heartrate"),
        max_heartrate: number(&obj, "max_heartrate"),
        average_speed: number(&obj, "average_speed"),
        max_speed: number(&obj, "max_speed"),
        elapsed_time: integer(&obj, "elapsed_time"),
        moving_time: integer(&obj, "moving_time"),
        total_elevation_gain: number(&obj, "total_elevation_gain"),
        elevation_high: number(&obj, "elevation_high"),
        elevation_low: number(&obj, "elevation_low"),
        time_zone: text(&obj, "time_zone"),
        start_date: text(&obj, "start_date"),
        start_date_local: text(&obj, "start_date_local"),
        summary_polyline,
        fetched_at: format_utc_rfc3339(chrono::Utc::now()),
    })
}

fn number(obj: &Map<String, Value>, key: &str) -> f64 {
    obj.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn integer(obj: &Map<String, Value>, key: &str) -> i64 {
    obj.get(key).and_then(as_integer).unwrap_or(0)
}

fn text(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Integers may arrive as floats (`120.0`).
fn as_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_spaced_empty_value() {
        assert_eq!(
            repair_json(r#"{"max_heartrate": ,"moving_time":120}"#),
            r#"{"max_heartrate": null,"moving_time":120}"#
        );
    }

    #[test]
    fn test_repair_unspaced_empty_value() {
        assert_eq!(
            repair_json(r#"{"a":,"b":1}"#),
            r#"{"a": null,"b":1}"#
        );
    }

    #[test]
    fn test_repair_leaves_valid_json_alone() {
        let valid = r#"{"a": 1, "b": "x"}"#;
        assert_eq!(repair_json(valid), valid);
    }

    #[test]
    fn test_parse_malformed_payload() {
        let raw = r#"{"name": "Lunch Run", "max_heartrate": ,"moving_time":120, "average_speed": 3.2}"#;
        let detail = parse_detail(raw, 7, 42).unwrap();
        assert_eq!(detail.workout_id, 7);
        assert_eq!(detail.athlete_id, 42);
        assert_eq!(detail.name, "Lunch Run");
        assert_eq!(detail.max_heartrate, 0.0);
        assert_eq!(detail.moving_time, 120);
        assert_eq!(detail.average_speed, 3.2);
    }

    #[test]
    fn test_parse_defaults_for_missing_and_mistyped_fields() {
        let raw = r#"{"name": 12, "elapsed_time": "long", "elevation_high": 101}"#;
        let detail = parse_detail(raw, 1, 1).unwrap();
        assert_eq!(detail.name, "");
        assert_eq!(detail.elapsed_time, 0);
        assert_eq!(detail.elevation_high, 101.0);
        assert_eq!(detail.time_zone, "");
        assert_eq!(detail.summary_polyline, "");
    }

    #[test]
    fn test_parse_float_integer_fields() {
        let detail = parse_detail(r#"{"moving_time": 120.0}"#, 1, 1).unwrap();
        assert_eq!(detail.moving_time, 120);
    }

    #[test]
    fn test_parse_extracts_polyline() {
        let raw = r#"{"map": {"summary_polyline": "_p~iF~ps|U_ulLnnqC_mqNvxq`@"}}"#;
        let detail = parse_detail(raw, 1, 1).unwrap();
        assert_eq!(detail.summary_polyline, "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(
            parse_detail("[1, 2, 3]", 1, 1),
            Err(SyncError::ParseFailed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unrepairable_payload() {
        assert!(matches!(
            parse_detail(r#"{"name": "x""#, 1, 1),
            Err(SyncError::ParseFailed(_))
        ));
    }
}
