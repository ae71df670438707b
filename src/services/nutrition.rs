// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calorie and BMI arithmetic.

use crate::models::BiometricRecord;

/// Daily target used when biometrics are incomplete.
pub const DEFAULT_DAILY_CALORIES: i64 = 2000;

const LBS_TO_KG: f64 = 0.453592;
/// Moderately active.
const ACTIVITY_FACTOR: f64 = 1.55;
const WEIGHT_LOSS_ADJUSTMENT: f64 = -500.0;
const MUSCLE_GAIN_ADJUSTMENT: f64 = 300.0;

/// Estimate a daily calorie target (Mifflin-St Jeor, fixed activity factor).
///
/// Both goal adjustments are independent substring checks, so a goal that
/// mentions weight loss and muscle gain gets both. The result is not floored.
pub fn estimate_daily_calories(biometrics: Option<&BiometricRecord>, goal: &str) -> i64 {
    let Some(b) = biometrics else {
        return DEFAULT_DAILY_CALORIES;
    };
    let (Some(height_cm), Some(weight_lbs), Some(age)) = (b.height_cm, b.weight_lbs, b.age) else {
        return DEFAULT_DAILY_CALORIES;
    };

    let is_male = b
        .sex
        .as_deref()
        .map(|s| s.eq_ignore_ascii_case("male"))
        .unwrap_or(false);

    let weight_kg = weight_lbs * LBS_TO_KG;
    let bmr = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age)
        + if is_male { 5.0 } else { -161.0 };

    let mut calories = bmr * ACTIVITY_FACTOR;

    let goal = goal.to_lowercase();
    if goal.contains("weight loss") {
        calories += WEIGHT_LOSS_ADJUSTMENT;
    }
    if goal.contains("muscle gain") {
        calories += MUSCLE_GAIN_ADJUSTMENT;
    }

    calories.round() as i64
}

/// BMI from height (cm) and weight (lb), rounded to 2 decimals.
///
/// Returns `None` for non-positive or non-finite inputs.
pub fn formula_bmi(height_cm: f64, weight_lbs: f64) -> Option<f64> {
    if !(height_cm.is_finite() && weight_lbs.is_finite()) || height_cm <= 0.0 || weight_lbs <= 0.0
    {
        return None;
    }
    let height_m = height_cm / 100.0;
    let bmi = weight_lbs * LBS_TO_KG / (height_m * height_m);
    Some((bmi * 100.0).round() / 100.0)
}
