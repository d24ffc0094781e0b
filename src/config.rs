// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider endpoint returning the workout summary list
    pub summaries_endpoint: String,
    /// Provider endpoint returning a single workout detail
    pub detail_endpoint: String,
    /// Bearer token required on `/api/*` routes
    pub api_token: String,
    /// GCP project ID. When unset the in-memory store is used.
    pub gcp_project_id: Option<String>,
    /// Where the warm-start summary snapshot is kept
    pub snapshot_path: PathBuf,
    /// Account linked at startup, if any
    pub athlete_id: Option<u64>,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Config for tests. Endpoints point at an unroutable host.
    pub fn test_default() -> Self {
        Self {
            summaries_endpoint: "http://127.0.0.1:9/workouts".to_string(),
            detail_endpoint: "http://127.0.0.1:9/workout".to_string(),
            api_token: "test_api_token".to_string(),
            gcp_project_id: None,
            snapshot_path: env::temp_dir().join("workout_sync_test_snapshot.json"),
            athlete_id: None,
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let athlete_id = match env::var("ATHLETE_ID") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("ATHLETE_ID"))?,
            ),
            _ => None,
        };

        Ok(Self {
            summaries_endpoint: env::var("SUMMARIES_ENDPOINT")
                .map_err(|_| ConfigError::Missing("SUMMARIES_ENDPOINT"))?,
            detail_endpoint: env::var("DETAIL_ENDPOINT")
                .map_err(|_| ConfigError::Missing("DETAIL_ENDPOINT"))?,
            api_token: env::var("API_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("API_TOKEN"))?,
            gcp_project_id: env::var("GCP_PROJECT_ID")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("workout_snapshot.json")),
            athlete_id,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
