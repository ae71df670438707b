// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity logging routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{normalize_email, ActivityLog, StreakData};
use crate::routes::extract::{lenient_number, text, ApiJson};
use crate::time_utils::{local_today, now_sortable_rfc3339};
use crate::AppState;

/// How many logs `GET /api/activities/{email}` returns.
const RECENT_ACTIVITY_LIMIT: u32 = 50;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", post(log_activity))
        .route("/api/activities/{email}", get(list_activities))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogActivityRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    activity_type: Option<String>,
    #[serde(default)]
    time_spent: Option<Value>,
    #[serde(default)]
    image_name: Option<String>,
    #[serde(default)]
    image_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogActivityResponse {
    pub success: bool,
    pub message: String,
    pub activity: ActivityLog,
    pub streak: StreakData,
}

#[derive(Debug, Serialize)]
pub struct ActivityListResponse {
    pub success: bool,
    pub activities: Vec<ActivityLog>,
}

async fn log_activity(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LogActivityRequest>,
) -> Result<(StatusCode, Json<LogActivityResponse>)> {
    let (Some(email), Some(activity_type), true) = (
        text(&req.email),
        text(&req.activity_type),
        req.time_spent.as_ref().is_some_and(|v| !v.is_null()),
    ) else {
        return Err(AppError::BadRequest(
            "Email, activity type and time spent are required".to_string(),
        ));
    };

    let time_spent = match lenient_number(&req.time_spent) {
        Ok(Some(minutes)) if minutes > 0.0 => minutes,
        _ => {
            return Err(AppError::BadRequest(
                "Time spent must be a positive number of minutes".to_string(),
            ))
        }
    };

    let email = normalize_email(email);
    if state.db.get_account(&email).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let activity = ActivityLog {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.clone(),
        activity_type: activity_type.to_string(),
        time_spent,
        image_name: text(&req.image_name).map(str::to_string),
        image_type: text(&req.image_type).map(str::to_string),
        logged_at: now_sortable_rfc3339(),
    };
    state.db.insert_activity(&activity).await?;

    let streak = state.db.record_streak_log(&email, local_today()).await?;

    tracing::info!(
        email = %email,
        activity_type = %activity.activity_type,
        current_streak = streak.current_streak,
        "Activity logged"
    );

    Ok((
        StatusCode::CREATED,
        Json(LogActivityResponse {
            success: true,
            message: "Activity logged successfully".to_string(),
            activity,
            streak,
        }),
    ))
}

async fn list_activities(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<ActivityListResponse>> {
    let email = normalize_email(&email);
    if state.db.get_account(&email).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let activities = state
        .db
        .recent_activities(&email, RECENT_ACTIVITY_LIMIT)
        .await?;

    Ok(Json(ActivityListResponse {
        success: true,
        activities,
    }))
}
