// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Focus session logging.

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::session_user;
use crate::models::{normalize_email, FocusSession};
use crate::routes::extract::{text, ApiJson};
use crate::AppState;

/// Longest accepted session: one day.
pub const MAX_FOCUS_SECONDS: u32 = 86_400;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/focus-sessions", post(log_focus_session))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSessionRequest {
    #[serde(default)]
    duration_in_seconds: Option<Value>,
    #[serde(default)]
    ended_reason: Option<String>,
    /// Used only when there is no session.
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSessionResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
}

/// A positive whole number of seconds, at most [`MAX_FOCUS_SECONDS`].
fn parse_duration(value: Option<&Value>) -> Option<u32> {
    let seconds = match value? {
        Value::Number(n) => match n.as_u64() {
            Some(s) => s,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || f < 0.0 {
                    return None;
                }
                f as u64
            }
        },
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };

    u32::try_from(seconds)
        .ok()
        .filter(|s| (1..=MAX_FOCUS_SECONDS).contains(s))
}

async fn log_focus_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    ApiJson(req): ApiJson<FocusSessionRequest>,
) -> Result<Json<FocusSessionResponse>> {
    let user_id = match session_user(&jar, &headers, &state.config.jwt_signing_key) {
        Some(user) => user.email,
        None => text(&req.user_id)
            .map(normalize_email)
            .ok_or_else(AppError::not_authenticated)?,
    };

    let duration = parse_duration(req.duration_in_seconds.as_ref()).ok_or_else(|| {
        AppError::BadRequest(format!(
            "durationInSeconds must be a positive integer no greater than {}",
            MAX_FOCUS_SECONDS
        ))
    })?;

    let session = FocusSession::ending_at(
        uuid::Uuid::new_v4().to_string(),
        user_id,
        duration,
        text(&req.ended_reason).map(str::to_string),
        chrono::Utc::now(),
    );
    state.db.insert_focus_session(&session).await?;

    tracing::info!(
        user_id = %session.user_id,
        duration_in_seconds = duration,
        "Focus session logged"
    );

    Ok(Json(FocusSessionResponse {
        success: true,
        message: "Focus session saved".to_string(),
        session_id: session.id,
    }))
}
