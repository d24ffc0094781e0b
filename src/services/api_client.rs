// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the workout provider API.
//!
//! Handles:
//! - Summary list fetching (`GET {summaries}?athleteId=`)
//! - Raw detail fetching (`GET {detail}?athlete_id=&workout_id=`)
//!
//! One request per call: no retries, no explicit timeout beyond the
//! transport default.

use crate::error::SyncError;
use crate::models::WorkoutSummary;
use serde::Deserialize;
use url::Url;

/// Envelope returned by the summaries endpoint.
#[derive(Debug, Deserialize)]
struct SummariesResponse {
    workouts: Vec<WorkoutSummary>,
}

/// Workout provider API client.
#[derive(Clone)]
pub struct WorkoutApiClient {
    http: reqwest::Client,
    summaries_endpoint: String,
    detail_endpoint: String,
}

impl WorkoutApiClient {
    pub fn new(summaries_endpoint: String, detail_endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            summaries_endpoint,
            detail_endpoint,
        }
    }

    /// Build the summaries URL for an athlete.
    pub fn summaries_url(&self, athlete_id: u64) -> Result<Url, SyncError> {
        Url::parse_with_params(
            &self.summaries_endpoint,
            &[("athleteId", athlete_id.to_string())],
        )
        .map_err(|e| SyncError::InvalidUrl(format!("{}: {}", self.summaries_endpoint, e)))
    }

    /// Build the detail URL for one workout.
    pub fn detail_url(&self, athlete_id: u64, workout_id: i64) -> Result<Url, SyncError> {
        Url::parse_with_params(
            &self.detail_endpoint,
            &[
                ("athlete_id", athlete_id.to_string()),
                ("workout_id", workout_id.to_string()),
            ],
        )
        .map_err(|e| SyncError::InvalidUrl(format!("{}: {}", self.detail_endpoint, e)))
    }

    /// Fetch the summary list for an athlete.
    pub async fn fetch_summaries(&self, athlete_id: u64) -> Result<Vec<WorkoutSummary>, SyncError> {
        let url = self.summaries_url(athlete_id)?;
        let body = self.get_text(url).await?;

        let parsed: SummariesResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(
                athlete_id,
                error = %e,
                body_prefix = %body.chars().take(500).collect::<String>(),
                "Failed to decode workout summaries"
            );
            SyncError::DecodeFailed(e.to_string())
        })?;

        tracing::debug!(athlete_id, count = parsed.workouts.len(), "Fetched summaries");
        Ok(parsed.workouts)
    }

    /// Fetch the raw (unparsed) detail payload for a workout.
    ///
    /// The body is returned as text because it may need repair before it
    /// is valid JSON.
    pub async fn fetch_detail_raw(
        &self,
        athlete_id: u64,
        workout_id: i64,
    ) -> Result<String, SyncError> {
        let url = self.detail_url(athlete_id, workout_id)?;
        self.get_text(url).await
    }

    /// GET a URL and return the body of a successful response.
    async fn get_text(&self, url: Url) -> Result<String, SyncError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                tracing::warn!("Workout API rate limit hit (429)");
            }
            return Err(status_error(status, &body));
        }

        response
            .text()
            .await
            .map_err(|e| SyncError::FetchFailed(e.to_string()))
    }
}

/// Upstream error bodies are cut to this many characters.
const ERROR_BODY_LIMIT: usize = 200;

/// `FetchFailed` for a non-success response. Only a prefix of the body is
/// kept since the message reaches API clients.
fn status_error(status: reqwest::StatusCode, body: &str) -> SyncError {
    let mut prefix: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    if prefix.len() < body.len() {
        prefix.push_str("...");
    }
    tracing::warn!(%status, body_prefix = %prefix, "Workout API request failed");
    SyncError::FetchFailed(format!("HTTP {}: {}", status, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summaries_url_has_athlete_param() {
        let client = WorkoutApiClient::new(
            "https://api.example.com/workouts".to_string(),
            "https://api.example.com/workout".to_string(),
        );
        let url = client.summaries_url(42).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/workouts?athleteId=42");
    }

    #[test]
    fn test_detail_url_has_both_params() {
        let client = WorkoutApiClient::new(
            "https://api.example.com/workouts".to_string(),
            "https://api.example.com/workout".to_string(),
        );
        let url = client.detail_url(42, 1001).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/workout?athlete_id=42&workout_id=1001"
        );
    }

    #[test]
    fn test_malformed_endpoint_is_invalid_url() {
        let client = WorkoutApiClient::new("not a url".to_string(), "::".to_string());
        assert!(matches!(
            client.summaries_url(1),
            Err(SyncError::InvalidUrl(_))
        ));
        assert!(matches!(
            client.detail_url(1, 2),
            Err(SyncError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_status_error_truncates_body() {
        let body = "x".repeat(10_000);
        let err = status_error(reqwest::StatusCode::BAD_GATEWAY, &body);
        let SyncError::FetchFailed(msg) = err else {
            panic!("expected FetchFailed");
        };
        assert!(msg.starts_with("HTTP 502 Bad Gateway: xxx"));
        assert!(msg.ends_with("..."));
        assert!(msg.len() < ERROR_BODY_LIMIT + 50);
    }

    #[test]
    fn test_status_error_keeps_short_body() {
        let err = status_error(reqwest::StatusCode::NOT_FOUND, "no such athlete");
        assert!(matches!(
            err,
            SyncError::FetchFailed(msg) if msg == "HTTP 404 Not Found: no such athlete"
        ));
    }
}
