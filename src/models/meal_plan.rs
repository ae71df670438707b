// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Meal plan model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A single meal within a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    /// Breakfast, Lunch, Dinner, Snack, ...
    #[serde(rename = "type")]
    pub meal_type: String,
    pub name: String,
    pub calories: i64,
    #[serde(default)]
    pub description: String,
}

/// One calendar day of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// `MM/DD/YYYY`; empty until the schedule is normalized
    #[serde(default)]
    pub date: String,
    pub meals: Vec<Meal>,
    /// Stated day total. Absent when the source did not provide one.
    #[serde(default)]
    pub total_calories: Option<i64>,
}

/// Stored plan, in `meal_plans` keyed by `id`. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: String,
    pub email: String,
    pub goal: String,
    /// Duration label as entered, e.g. "30-Day Plan"
    pub duration: String,
    #[serde(default)]
    pub restrictions: String,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub description: String,
    pub daily_calories: i64,
    pub schedule: Vec<DayPlan>,
    pub start_date: String,
    pub end_date: String,
    /// Creation time (ISO 8601); the latest one is the current plan
    pub created_at: String,
}
