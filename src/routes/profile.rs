// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile, pet and streak routes.

use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{require_auth, AuthUser};
use crate::models::{normalize_email, PetData, Profile, StreakData};
use crate::routes::extract::ApiJson;
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let session_routes = Router::new()
        .route("/api/profile", put(update_profile))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/api/profile/{email}", get(get_profile))
        .route("/api/pet/{email}", get(get_pet))
        .route("/api/streak/{email}", get(get_streak))
        .merge(session_routes)
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct PetResponse {
    pub success: bool,
    pub pet: PetData,
}

#[derive(Debug, Serialize)]
pub struct StreakResponse {
    pub success: bool,
    pub streak: StreakData,
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .db
        .get_profile(&normalize_email(&email))
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    Ok(Json(ProfileResponse {
        success: true,
        profile,
    }))
}

/// Partial profile update; absent fields are left alone.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    date_of_birth: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
}

impl ProfileUpdateRequest {
    fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.date_of_birth.is_none()
            && self.bio.is_none()
            && self.avatar.is_none()
    }

    fn apply(self, profile: &mut Profile) {
        if let Some(v) = self.first_name {
            profile.first_name = v.trim().to_string();
        }
        if let Some(v) = self.last_name {
            profile.last_name = v.trim().to_string();
        }
        if let Some(v) = self.date_of_birth {
            profile.date_of_birth = v.trim().to_string();
        }
        if let Some(v) = self.bio {
            profile.bio = v;
        }
        if let Some(v) = self.avatar {
            profile.avatar = v.trim().to_string();
        }
    }
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<ProfileUpdateRequest>,
) -> Result<Json<ProfileResponse>> {
    if let Some(email) = req.email.as_deref() {
        if normalize_email(email) != user.email {
            return Err(AppError::Forbidden(
                "You can only update your own profile".to_string(),
            ));
        }
    }
    if req.is_empty() {
        return Err(AppError::BadRequest(
            "No profile fields to update".to_string(),
        ));
    }

    let mut profile = state
        .db
        .get_profile(&user.email)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    req.apply(&mut profile);
    profile.updated_at = now_rfc3339();
    state.db.set_profile(&profile).await?;

    tracing::info!(email = %user.email, "Profile updated");

    Ok(Json(ProfileResponse {
        success: true,
        profile,
    }))
}

async fn get_pet(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<PetResponse>> {
    let pet = state
        .db
        .get_pet(&normalize_email(&email))
        .await?
        .ok_or_else(|| AppError::NotFound("Pet not found".to_string()))?;

    Ok(Json(PetResponse { success: true, pet }))
}

async fn get_streak(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<StreakResponse>> {
    let streak = state
        .db
        .get_streak(&normalize_email(&email))
        .await?
        .ok_or_else(|| AppError::NotFound("Streak not found".to_string()))?;

    Ok(Json(StreakResponse {
        success: true,
        streak,
    }))
}
