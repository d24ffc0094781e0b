// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod workout;

pub use workout::{LocalWorkout, LocalWorkoutDetail, WorkoutField, WorkoutSummary};
