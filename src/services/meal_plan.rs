// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal plan generation.
//!
//! One model attempt per request. Any failure on that path (not configured,
//! transport, unparseable or rejected output) falls back to the
//! deterministic schedule, so a plan is always produced.

use crate::db::Db;
use crate::error::AppError;
use crate::models::{BiometricRecord, DayPlan, MealPlan};
use crate::services::groq::{ChatMessage, GroqClient, LlmError};
use crate::services::nutrition::estimate_daily_calories;
use crate::services::sanitize::sanitize_input;
use crate::services::schedule::{
    fallback_schedule, normalize_schedule, parse_duration_days, validate_schedule,
};
use crate::time_utils::{format_plan_date, local_today, now_sortable_rfc3339};
use chrono::NaiveDate;
use serde_json::json;

const SYSTEM_PROMPT: &str = "You are a nutrition planner. Return only valid JSON, no markdown, \
no code fences and no commentary.";

/// User preferences for a plan, as submitted.
#[derive(Debug, Clone, Default)]
pub struct MealPlanPreferences {
    pub goal: String,
    pub duration: String,
    pub restrictions: String,
    pub allergies: String,
    pub budget: String,
    pub description: String,
}

/// Where the schedule of a generated plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSource {
    Llm,
    Fallback,
}

impl ScheduleSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleSource::Llm => "llm",
            ScheduleSource::Fallback => "fallback",
        }
    }
}

/// Builds, validates and stores meal plans.
#[derive(Clone)]
pub struct MealPlanService {
    groq: GroqClient,
}

impl MealPlanService {
    pub fn new(groq: GroqClient) -> Self {
        Self { groq }
    }

    /// Generate and persist a plan for an existing account.
    ///
    /// The caller has already validated the request and checked ownership.
    pub async fn generate(
        &self,
        db: &Db,
        email: &str,
        prefs: &MealPlanPreferences,
    ) -> Result<MealPlan, AppError> {
        let days = parse_duration_days(&prefs.duration);
        let biometrics = db.get_biometrics(email).await?;
        let daily_calories = estimate_daily_calories(biometrics.as_ref(), &prefs.goal);

        let (base, source) = match self
            .generate_ai_schedule(days, daily_calories, prefs, biometrics.as_ref())
            .await
        {
            Ok(schedule) if !schedule.is_empty() => (schedule, ScheduleSource::Llm),
            Ok(_) => {
                tracing::warn!(email, "Model returned an empty schedule, using fallback");
                (fallback_schedule(daily_calories, days), ScheduleSource::Fallback)
            }
            Err(e) => {
                tracing::warn!(email, error = %e, "AI meal plan unavailable, using fallback");
                (fallback_schedule(daily_calories, days), ScheduleSource::Fallback)
            }
        };

        let plan = build_plan(email, prefs, daily_calories, &base, days, local_today());
        db.insert_meal_plan(&plan).await?;

        tracing::info!(
            email,
            plan_id = %plan.id,
            days,
            daily_calories,
            source = source.as_str(),
            "Meal plan generated"
        );

        Ok(plan)
    }

    /// Ask the model for a schedule and validate it.
    pub async fn generate_ai_schedule(
        &self,
        days: u32,
        daily_calories: i64,
        prefs: &MealPlanPreferences,
        biometrics: Option<&BiometricRecord>,
    ) -> Result<Vec<DayPlan>, LlmError> {
        if !self.groq.is_configured() {
            return Err(LlmError::NotConfigured);
        }

        let messages = build_prompt(days, daily_calories, prefs, biometrics);
        let response = self.groq.complete_json(&messages).await?;

        validate_schedule(&response, days).map_err(|rejection| {
            tracing::debug!(reason = %rejection, "Model schedule rejected");
            LlmError::Rejected(rejection.to_string())
        })
    }
}

/// Build the chat turns for a plan request.
///
/// The user turn is a single JSON document; every free-text field is
/// sanitized and length-capped before it is embedded.
pub fn build_prompt(
    days: u32,
    daily_calories: i64,
    prefs: &MealPlanPreferences,
    biometrics: Option<&BiometricRecord>,
) -> Vec<ChatMessage> {
    let snapshot = json!({
        "age": biometrics.and_then(|b| b.age),
        "sex": sanitize_input(biometrics.and_then(|b| b.sex.as_deref()), 20),
        "heightCm": biometrics.and_then(|b| b.height_cm),
        "weightLbs": biometrics.and_then(|b| b.weight_lbs),
        "bmi": biometrics.and_then(|b| b.bmi),
    });

    let payload = json!({
        "task": "Create a personalized meal plan.",
        "days": days,
        "dailyCalories": daily_calories,
        "preferences": {
            "goal": sanitize_input(Some(&prefs.goal), 100),
            "duration": sanitize_input(Some(&prefs.duration), 50),
            "restrictions": sanitize_input(Some(&prefs.restrictions), 200),
            "allergies": sanitize_input(Some(&prefs.allergies), 200),
            "budget": sanitize_input(Some(&prefs.budget), 50),
            "description": sanitize_input(Some(&prefs.description), 500),
        },
        "biometrics": snapshot,
        "rules": [
            format!("Return exactly {days} days in \"schedule\"."),
            "Each day has Breakfast, Lunch and Dinner; snacks are optional.",
            "Respect every allergy and restriction.",
            "Calories are whole numbers; totalCalories is the sum for the day.",
        ],
        "outputFormat": {
            "schedule": [{
                "meals": [
                    {"type": "Breakfast", "name": "string", "calories": 0, "description": "string"}
                ],
                "totalCalories": 0
            }]
        }
    });

    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(payload.to_string()),
    ]
}

/// Assemble the stored plan from a base schedule.
fn build_plan(
    email: &str,
    prefs: &MealPlanPreferences,
    daily_calories: i64,
    base: &[DayPlan],
    days: u32,
    start: NaiveDate,
) -> MealPlan {
    let schedule = normalize_schedule(base, days, start);
    let end = start
        .checked_add_days(chrono::Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or(start);

    MealPlan {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.to_string(),
        goal: prefs.goal.clone(),
        duration: prefs.duration.clone(),
        restrictions: prefs.restrictions.clone(),
        allergies: prefs.allergies.clone(),
        budget: prefs.budget.clone(),
        description: prefs.description.clone(),
        daily_calories,
        schedule,
        start_date: format_plan_date(start),
        end_date: format_plan_date(end),
        created_at: now_sortable_rfc3339(),
    }
}
