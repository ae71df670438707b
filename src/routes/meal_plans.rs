// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal plan routes.

use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{require_auth, AuthUser};
use crate::models::{normalize_email, MealPlan};
use crate::routes::extract::ApiJson;
use crate::services::MealPlanPreferences;
use crate::AppState;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let session_routes = Router::new()
        .route("/api/meal-plans/generate", post(generate_meal_plan))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/api/meal-plans/{email}", get(get_latest_meal_plan))
        .merge(session_routes)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub meal_plan: MealPlan,
}

/// A body field as text: trimmed strings, or numbers as written.
fn field_text(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether the body names an account other than `session_email`.
///
/// Any non-null `email` that is not a blank string or the session's own
/// address counts, whatever its type.
fn names_other_account(body: &Value, session_email: &str) -> bool {
    match body.get("email") {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => {
            let s = s.trim();
            !s.is_empty() && normalize_email(s) != session_email
        }
        Some(_) => true,
    }
}

/// Generate a plan for the signed-in user.
///
/// The body is taken untyped so ownership is checked before any field is
/// validated: a cross-account request is always a 403.
pub async fn generate_meal_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<MealPlanResponse>> {
    if names_other_account(&body, &user.email) {
        tracing::warn!(
            session = %user.email,
            requested = %body["email"],
            "Cross-account meal plan request"
        );
        return Err(AppError::Forbidden(
            "You can only generate meal plans for your own account".to_string(),
        ));
    }

    let (Some(email), Some(goal), Some(duration)) = (
        field_text(&body, "email"),
        field_text(&body, "goal"),
        field_text(&body, "duration"),
    ) else {
        return Err(AppError::BadRequest(
            "Email, goal and duration are required".to_string(),
        ));
    };
    let email = normalize_email(&email);

    if state.db.get_account(&email).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let prefs = MealPlanPreferences {
        goal,
        duration,
        restrictions: field_text(&body, "restrictions").unwrap_or_default(),
        allergies: field_text(&body, "allergies").unwrap_or_default(),
        budget: field_text(&body, "budget").unwrap_or_default(),
        description: field_text(&body, "description").unwrap_or_default(),
    };

    let meal_plan = state.meal_plans.generate(&state.db, &email, &prefs).await?;

    Ok(Json(MealPlanResponse {
        success: true,
        message: Some("Meal plan generated successfully".to_string()),
        meal_plan,
    }))
}

/// The most recently generated plan.
async fn get_latest_meal_plan(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<MealPlanResponse>> {
    let meal_plan = state
        .db
        .latest_meal_plan(&normalize_email(&email))
        .await?
        .ok_or_else(|| AppError::NotFound("No meal plan found".to_string()))?;

    Ok(Json(MealPlanResponse {
        success: true,
        message: None,
        meal_plan,
    }))
}
