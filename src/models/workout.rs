// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout models: remote summaries and locally stored records.

use chrono::{DateTime, Utc};
use geo::{BoundingRect, LineString, Rect};
use serde::{Deserialize, Serialize};

/// Workout summary as returned by the provider's list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    /// Provider workout ID
    #[serde(rename = "workout_id")]
    pub id: i64,
    /// Distance in meters
    pub distance: f64,
    /// Start date (ISO 8601, as sent by the provider)
    #[serde(rename = "start_date_local")]
    pub date: String,
    /// Sport type (Run, Ride, Swim, etc.)
    #[serde(rename = "sport_type")]
    pub activity_type: String,
}

impl WorkoutSummary {
    /// True if this summary carries the same distance and date as `other`.
    ///
    /// Activity type is deliberately not part of the cache comparison.
    pub fn same_distance_and_date(&self, other: &WorkoutSummary) -> bool {
        self.distance == other.distance && self.date == other.date
    }
}

/// Locally stored workout record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalWorkout {
    /// Provider workout ID (primary key)
    pub id: i64,
    /// Start timestamp, `None` if the provider date could not be parsed
    pub date: Option<DateTime<Utc>>,
    /// Distance in meters
    pub distance: f64,
    /// Sport type
    pub activity_type: Option<String>,
    /// Enriched detail, if it has been fetched
    #[serde(default)]
    pub detail: Option<LocalWorkoutDetail>,
}

impl LocalWorkout {
    /// Build a new record from a summary. Unparseable dates become `None`.
    pub fn from_summary(summary: &WorkoutSummary) -> Self {
        Self {
            id: summary.id,
            date: crate::time_utils::parse_workout_date(&summary.date),
            distance: summary.distance,
            activity_type: Some(summary.activity_type.clone()),
            detail: None,
        }
    }

    /// Copy the fields of `summary` that differ from this record.
    ///
    /// Returns the fields that were overwritten; an empty list means the
    /// record already matched.
    pub fn apply_summary(&mut self, summary: &WorkoutSummary) -> Vec<WorkoutField> {
        let mut changed = Vec::new();

        if self.distance != summary.distance {
            self.distance = summary.distance;
            changed.push(WorkoutField::Distance);
        }

        let date = crate::time_utils::parse_workout_date(&summary.date);
        if self.date != date {
            self.date = date;
            changed.push(WorkoutField::Date);
        }

        if self.activity_type.as_deref() != Some(summary.activity_type.as_str()) {
            self.activity_type = Some(summary.activity_type.clone());
            changed.push(WorkoutField::ActivityType);
        }

        changed
    }
}

/// Mergeable fields of a [`LocalWorkout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkoutField {
    Distance,
    Date,
    ActivityType,
}

impl WorkoutField {
    /// Stored field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutField::Distance => "distance",
            WorkoutField::Date => "date",
            WorkoutField::ActivityType => "activity_type",
        }
    }
}

/// Enriched workout detail, replaced wholesale on every fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalWorkoutDetail {
    /// Owning workout (foreign key to `LocalWorkout::id`)
    pub workout_id: i64,
    /// Athlete whose account fetched this detail
    pub athlete_id: u64,
    pub name: String,
    pub sport_type: String,
    /// Legacy activity type (`type` in the provider payload)
    pub activity_type: String,
    pub average_heartrate: f64,
    pub max_heartrate: f64,
    /// Meters per second
    pub average_speed: f64,
    pub max_speed: f64,
    /// Seconds
    pub elapsed_time: i64,
    pub moving_time: i64,
    /// Meters
    pub total_elevation_gain: f64,
    pub elevation_high: f64,
    pub elevation_low: f64,
    pub time_zone: String,
    pub start_date: String,
    pub start_date_local: String,
    /// Encoded route (Google polyline, precision 5)
    pub summary_polyline: String,
    /// When this detail was fetched (RFC3339)
    pub fetched_at: String,
}

impl LocalWorkoutDetail {
    /// Decode the route polyline. Empty or corrupt polylines yield `None`.
    pub fn route(&self) -> Option<LineString<f64>> {
        if self.summary_polyline.is_empty() {
            return None;
        }

        match polyline::decode_polyline(&self.summary_polyline, 5) {
            Ok(line) => Some(line),
            Err(e) => {
                tracing::debug!(
                    workout_id = self.workout_id,
                    error = %e,
                    "Failed to decode route polyline"
                );
                None
            }
        }
    }

    /// Bounding box of the route, if there is one.
    pub fn route_bounds(&self) -> Option<Rect<f64>> {
        self.route().and_then(|line| line.bounding_rect())
    }
}
