// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: signup, signin, session lookup, logout, password reset.

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::ValidateEmail;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::SignupConflict;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, removal_cookie, require_auth, session_cookie, AuthUser};
use crate::models::{normalize_email, Account, PasswordResetToken, Profile};
use crate::routes::extract::{text, ApiJson};
use crate::services::password::{
    generate_reset_token, hash_password, hash_reset_token, verify_password, MIN_PASSWORD_LEN,
};
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let session_routes = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/signin", post(signin))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .merge(session_routes)
}

// ─── Responses ───────────────────────────────────────────────

/// Public view of an account.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserResponse {
    fn new(account: &Account, profile: Option<&Profile>) -> Self {
        Self {
            email: account.email.clone(),
            username: account.username.clone(),
            first_name: profile.map(|p| p.first_name.clone()).unwrap_or_default(),
            last_name: profile.map(|p| p.last_name.clone()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub success: bool,
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Run CPU-heavy password work off the async workers.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password task failed: {}", e)))?
}

// ─── Signup / Signin ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    date_of_birth: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    confirm_password: Option<String>,
}

async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>)> {
    let (
        Some(first_name),
        Some(last_name),
        Some(username),
        Some(email),
        Some(date_of_birth),
        Some(password),
        Some(confirm_password),
    ) = (
        text(&req.first_name),
        text(&req.last_name),
        text(&req.username),
        text(&req.email),
        text(&req.date_of_birth),
        req.password.as_deref().filter(|p| !p.is_empty()),
        req.confirm_password.as_deref().filter(|p| !p.is_empty()),
    )
    else {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    };

    if password != confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }

    let email = normalize_email(email);
    if !email.validate_email() {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    let password = password.to_string();
    let password_hash = blocking(move || hash_password(&password)).await?;

    let now = now_rfc3339();
    let account = Account {
        email: email.clone(),
        username: username.to_string(),
        password_hash,
        created_at: now.clone(),
    };
    let profile = Profile {
        email: email.clone(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        date_of_birth: date_of_birth.to_string(),
        bio: String::new(),
        avatar: String::new(),
        username: username.to_string(),
        updated_at: now,
    };

    match state.db.create_account(&account, &profile).await? {
        Ok(()) => {}
        Err(SignupConflict::Email) => {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ))
        }
        Err(SignupConflict::Username) => {
            return Err(AppError::Conflict("Username is already taken".to_string()))
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            success: true,
            message: "Account created successfully".to_string(),
            user: UserResponse::new(&account, Some(&profile)),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

async fn signin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiJson(req): ApiJson<SigninRequest>,
) -> Result<(CookieJar, Json<UserEnvelope>)> {
    let (Some(email), Some(password)) = (
        text(&req.email),
        req.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let email = normalize_email(email);
    let account = state.db.get_account(&email).await?.ok_or_else(invalid)?;

    let password = password.to_string();
    let stored_hash = account.password_hash.clone();
    if !blocking(move || Ok(verify_password(&password, &stored_hash))).await? {
        tracing::info!(email = %email, "Signin rejected");
        return Err(invalid());
    }

    let token = create_jwt(&account.email, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let profile = state.db.get_profile(&account.email).await?;

    tracing::info!(email = %account.email, "Signed in");

    Ok((
        jar.add(session_cookie(token)),
        Json(UserEnvelope {
            success: true,
            message: "Signed in successfully".to_string(),
            user: UserResponse::new(&account, profile.as_ref()),
        }),
    ))
}

/// Current session's user.
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserEnvelope>> {
    // A valid token for a deleted account is treated as no session.
    let account = state
        .db
        .get_account(&user.email)
        .await?
        .ok_or_else(AppError::not_authenticated)?;
    let profile = state.db.get_profile(&account.email).await?;

    Ok(Json(UserEnvelope {
        success: true,
        message: "Authenticated".to_string(),
        user: UserResponse::new(&account, profile.as_ref()),
    }))
}

async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(removal_cookie()),
        MessageResponse::ok("Logged out successfully"),
    )
}

// ─── Password Reset ──────────────────────────────────────────

const RESET_REQUESTED_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent.";

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    email: Option<String>,
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let email = text(&req.email)
        .map(normalize_email)
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

    if state.db.get_account(&email).await?.is_none() {
        tracing::info!(email = %email, "Password reset requested for unknown email");
        return Ok(MessageResponse::ok(RESET_REQUESTED_MESSAGE));
    }

    let reset = generate_reset_token()?;
    let record = PasswordResetToken::issue(reset.token_hash, &email, chrono::Utc::now());
    state.db.insert_reset_token(&record).await?;

    let link = format!(
        "{}/reset-password?token={}",
        state.config.frontend_url.trim_end_matches('/'),
        urlencoding::encode(&reset.token)
    );
    state.mailer.send_password_reset(&email, &link).await?;

    tracing::info!(email = %email, "Password reset link sent");
    Ok(MessageResponse::ok(RESET_REQUESTED_MESSAGE))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    confirm_password: Option<String>,
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let (Some(token), Some(password)) = (
        text(&req.token),
        req.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Token and password are required".to_string(),
        ));
    };

    if let Some(confirm) = req.confirm_password.as_deref() {
        if confirm != password {
            return Err(AppError::BadRequest("Passwords do not match".to_string()));
        }
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }

    // Hash before consuming so a hashing failure leaves the token usable.
    let password = password.to_string();
    let password_hash = blocking(move || hash_password(&password)).await?;

    let consumed = state
        .db
        .consume_reset_token(&hash_reset_token(token), chrono::Utc::now())
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

    state
        .db
        .set_password_hash(&consumed.email, &password_hash)
        .await?;

    tracing::info!(email = %consumed.email, "Password reset completed");
    Ok(MessageResponse::ok("Password has been reset successfully"))
}
