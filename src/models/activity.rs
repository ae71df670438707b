// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Logged activity model for storage and API.

use serde::{Deserialize, Serialize};

/// Stored activity log in `activities`, keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    /// Owner (normalized email)
    pub email: String,
    /// Meal, Exercise, Water, ...
    pub activity_type: String,
    /// Minutes spent
    pub time_spent: f64,
    /// Uploaded photo file name, if any
    #[serde(default)]
    pub image_name: Option<String>,
    /// MIME type of the photo
    #[serde(default)]
    pub image_type: Option<String>,
    /// When the activity was logged (ISO 8601)
    pub logged_at: String,
}
