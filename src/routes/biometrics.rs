// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Biometrics routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{normalize_email, BiometricRecord, BiometricsUpdate};
use crate::routes::extract::{lenient_number, text, ApiJson};
use crate::services::bmi::{formula_estimate, BmiEstimate};
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/biometrics/update", post(update_biometrics))
        .route("/api/biometrics/{email}", get(get_biometrics))
}

const NOT_NUMERIC: &str = "Height, weight and age must be numeric";
const NOT_POSITIVE: &str = "Height, weight and age must be positive";
const HEIGHT_WEIGHT_REQUIRED: &str = "Height (cm) and weight (lbs) are required";

/// Stored record plus the response envelope fields.
#[derive(Debug, Serialize)]
pub struct BiometricsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub biometrics: BiometricRecord,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricsRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default, alias = "heightCm")]
    height: Option<Value>,
    #[serde(default, alias = "weightLbs")]
    weight: Option<Value>,
    #[serde(default)]
    age: Option<Value>,
    #[serde(default)]
    sex: Option<String>,
    #[serde(default)]
    ethnicity: Option<String>,
    #[serde(default)]
    ethnicity_other: Option<String>,
}

impl BiometricsRequest {
    /// Parse the numeric fields. Values must be finite and positive; age is
    /// rounded to whole years first, so it must round to at least 1.
    fn to_update(&self) -> Result<BiometricsUpdate> {
        let numeric = |v: &Option<Value>| {
            lenient_number(v).map_err(|_| AppError::BadRequest(NOT_NUMERIC.to_string()))
        };
        let positive = |n: Option<f64>| match n {
            Some(n) if n <= 0.0 => Err(AppError::BadRequest(NOT_POSITIVE.to_string())),
            other => Ok(other),
        };

        let height_cm = positive(numeric(&self.height)?)?;
        let weight_lbs = positive(numeric(&self.weight)?)?;
        let age = positive(numeric(&self.age)?.map(f64::round))?
            .map(|a| a.min(f64::from(u32::MAX)) as u32);

        Ok(BiometricsUpdate {
            height_cm,
            weight_lbs,
            sex: text(&self.sex).map(str::to_string),
            ethnicity: text(&self.ethnicity).map(str::to_string),
            ethnicity_other: text(&self.ethnicity_other).map(str::to_string),
            age,
        })
    }
}

/// Everything the BMI estimate depends on, for detecting concurrent edits.
type BmiInputs<'a> = (
    Option<f64>,
    Option<f64>,
    Option<u32>,
    Option<&'a str>,
    Option<&'a str>,
);

fn bmi_inputs(record: &BiometricRecord) -> BmiInputs<'_> {
    (
        record.height_cm,
        record.weight_lbs,
        record.age,
        record.sex.as_deref(),
        record.effective_ethnicity(),
    )
}

async fn update_biometrics(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<BiometricsRequest>,
) -> Result<Json<BiometricsResponse>> {
    let email = text(&req.email)
        .map(normalize_email)
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;
    let update = req.to_update()?;

    if state.db.get_account(&email).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let previous = state.db.get_biometrics(&email).await?;
    let draft = BiometricRecord::merged(&email, previous.as_ref(), &update);
    if draft.height_cm.is_none() || draft.weight_lbs.is_none() {
        return Err(AppError::BadRequest(HEIGHT_WEIGHT_REQUIRED.to_string()));
    }

    // The model call happens outside the atomic section.
    let estimate = state.bmi.estimate(&draft).await;

    let key = email.clone();
    let record = state
        .db
        .update_biometrics_atomic(&key, move |current| {
            let mut fresh = BiometricRecord::merged(&email, current.as_ref(), &update);
            let (Some(height_cm), Some(weight_lbs)) = (fresh.height_cm, fresh.weight_lbs) else {
                return Err(AppError::BadRequest(HEIGHT_WEIGHT_REQUIRED.to_string()));
            };

            // Another update landed in between: the estimate is stale.
            let estimate: Option<BmiEstimate> = if bmi_inputs(&fresh) == bmi_inputs(&draft) {
                estimate
            } else {
                formula_estimate(height_cm, weight_lbs)
            };

            let now = now_rfc3339();
            if let Some(estimate) = estimate {
                fresh.bmi = Some(estimate.bmi);
                fresh.bmi_source = Some(estimate.source);
                fresh.last_calculated = Some(now.clone());
            }
            fresh.updated_at = now;
            Ok(fresh)
        })
        .await?;

    tracing::info!(
        email = %record.email,
        bmi = ?record.bmi,
        source = ?record.bmi_source,
        "Biometrics updated"
    );

    Ok(Json(BiometricsResponse {
        success: true,
        message: Some("Biometrics updated successfully".to_string()),
        biometrics: record,
    }))
}

async fn get_biometrics(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<BiometricsResponse>> {
    let email = normalize_email(&email);
    if state.db.get_account(&email).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let biometrics = state
        .db
        .get_biometrics(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("Biometrics not found".to_string()))?;

    Ok(Json(BiometricsResponse {
        success: true,
        message: None,
        biometrics,
    }))
}
