// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal schedule building blocks: duration parsing, the deterministic
//! fallback, validation of model output, and normalization to calendar days.

use crate::models::{DayPlan, Meal};
use crate::time_utils::format_plan_date;
use chrono::{Days, NaiveDate};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

pub const DEFAULT_PLAN_DAYS: u32 = 7;
pub const MIN_PLAN_DAYS: u32 = 1;
pub const MAX_PLAN_DAYS: u32 = 30;

pub const MAX_MEAL_CALORIES: f64 = 5000.0;
pub const MAX_DAY_CALORIES: f64 = 20000.0;

const MIN_FALLBACK_MEAL_CALORIES: i64 = 100;
const MAX_MEAL_TYPE_LEN: usize = 50;
const MAX_MEAL_NAME_LEN: usize = 200;
const MAX_MEAL_DESCRIPTION_LEN: usize = 500;
const DEFAULT_MEAL_TYPE: &str = "Meal";

static FIRST_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid integer regex"));

/// Number of days requested by a duration label such as "30-Day Plan".
///
/// Takes the first run of digits, defaults to 7 when there is none, and
/// clamps to 1..=30. Digit runs too large for `u64` clamp to the maximum.
pub fn parse_duration_days(label: &str) -> u32 {
    let Some(digits) = FIRST_INTEGER.find(label) else {
        return DEFAULT_PLAN_DAYS;
    };
    let days = digits.as_str().parse::<u64>().unwrap_or(u64::MAX);
    days.clamp(u64::from(MIN_PLAN_DAYS), u64::from(MAX_PLAN_DAYS)) as u32
}

/// Deterministic plan used whenever the model path fails.
///
/// Breakfast and lunch get a third of the target each (at least 100), dinner
/// gets what is left (never negative). The stated day total is the target
/// itself, which can differ from the sum of the meals.
pub fn fallback_schedule(daily_calories: i64, days: u32) -> Vec<DayPlan> {
    let per_meal = ((daily_calories as f64 / 3.0).round() as i64).max(MIN_FALLBACK_MEAL_CALORIES);
    let dinner = (daily_calories - 2 * per_meal).max(0);

    let day = DayPlan {
        date: String::new(),
        meals: vec![
            Meal {
                meal_type: "Breakfast".to_string(),
                name: "Balanced Breakfast".to_string(),
                calories: per_meal,
                description: "Whole grains, a protein source and fruit.".to_string(),
            },
            Meal {
                meal_type: "Lunch".to_string(),
                name: "Balanced Lunch".to_string(),
                calories: per_meal,
                description: "Lean protein, vegetables and a complex carbohydrate.".to_string(),
            },
            Meal {
                meal_type: "Dinner".to_string(),
                name: "Balanced Dinner".to_string(),
                calories: dinner,
                description: "Vegetables, lean protein and healthy fats.".to_string(),
            },
        ],
        total_calories: Some(daily_calories),
    };

    vec![day; days as usize]
}

/// Why a model response was not accepted as a schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleRejection {
    #[error("response has no schedule array")]
    MissingSchedule,
    #[error("schedule is empty")]
    EmptySchedule,
    #[error("schedule has {len} days, more than the allowed {max}")]
    TooManyDays { len: usize, max: usize },
    #[error("day {0} is not an object")]
    DayNotObject(usize),
    #[error("day {0} has no meals")]
    MissingMeals(usize),
    #[error("day {day} meal {meal} has no name")]
    MealMissingName { day: usize, meal: usize },
    #[error("day {day} meal {meal} calories out of range")]
    MealCaloriesOutOfRange { day: usize, meal: usize },
    #[error("day {0} total calories out of range")]
    DayTotalOutOfRange(usize),
}

fn in_range(value: Option<&Value>, max: f64) -> Option<f64> {
    value
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && (0.0..=max).contains(v))
}

/// Check a parsed model response and turn it into day plans.
///
/// Lenient: any number of meals per day and anywhere from 1 to
/// `2 * requested_days` days are accepted. Dates are left empty.
pub fn validate_schedule(
    response: &Value,
    requested_days: u32,
) -> Result<Vec<DayPlan>, ScheduleRejection> {
    let days = response
        .get("schedule")
        .and_then(Value::as_array)
        .ok_or(ScheduleRejection::MissingSchedule)?;

    if days.is_empty() {
        return Err(ScheduleRejection::EmptySchedule);
    }
    let max = 2 * requested_days as usize;
    if days.len() > max {
        return Err(ScheduleRejection::TooManyDays {
            len: days.len(),
            max,
        });
    }

    days.iter()
        .enumerate()
        .map(|(day_idx, day)| {
            let day = day
                .as_object()
                .ok_or(ScheduleRejection::DayNotObject(day_idx))?;

            let meals = day
                .get("meals")
                .and_then(Value::as_array)
                .filter(|meals| !meals.is_empty())
                .ok_or(ScheduleRejection::MissingMeals(day_idx))?;

            let meals = meals
                .iter()
                .enumerate()
                .map(|(meal_idx, meal)| {
                    let name = meal.get("name").and_then(Value::as_str).ok_or(
                        ScheduleRejection::MealMissingName {
                            day: day_idx,
                            meal: meal_idx,
                        },
                    )?;
                    let calories = in_range(meal.get("calories"), MAX_MEAL_CALORIES).ok_or(
                        ScheduleRejection::MealCaloriesOutOfRange {
                            day: day_idx,
                            meal: meal_idx,
                        },
                    )?;

                    Ok(Meal {
                        meal_type: meal
                            .get("type")
                            .and_then(Value::as_str)
                            .unwrap_or(DEFAULT_MEAL_TYPE)
                            .to_string(),
                        name: name.to_string(),
                        calories: calories.round() as i64,
                        description: meal
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let total = in_range(day.get("totalCalories"), MAX_DAY_CALORIES)
                .ok_or(ScheduleRejection::DayTotalOutOfRange(day_idx))?;

            Ok(DayPlan {
                date: String::new(),
                meals,
                total_calories: Some(total.round() as i64),
            })
        })
        .collect()
}

fn truncate(value: &str, max_len: usize) -> String {
    value.chars().take(max_len).collect()
}

/// Stretch or cut `base` to exactly `days` entries dated from `start`.
///
/// Entries cycle through `base` (`base[i % base.len()]`). Meal fields are
/// capped again, calories are floored at 0, and a day without a stated
/// total gets the sum of its meals. An empty `base` yields an empty plan.
pub fn normalize_schedule(base: &[DayPlan], days: u32, start: NaiveDate) -> Vec<DayPlan> {
    if base.is_empty() {
        return Vec::new();
    }

    (0..days as usize)
        .map(|i| {
            let source = &base[i % base.len()];
            let meals: Vec<Meal> = source
                .meals
                .iter()
                .map(|meal| Meal {
                    meal_type: truncate(&meal.meal_type, MAX_MEAL_TYPE_LEN),
                    name: truncate(&meal.name, MAX_MEAL_NAME_LEN),
                    calories: meal.calories.max(0),
                    description: truncate(&meal.description, MAX_MEAL_DESCRIPTION_LEN),
                })
                .collect();

            let total = source
                .total_calories
                .unwrap_or_else(|| meals.iter().map(|m| m.calories).sum());

            let date = start
                .checked_add_days(Days::new(i as u64))
                .unwrap_or(start);

            DayPlan {
                date: format_plan_date(date),
                meals,
                total_calories: Some(total),
            }
        })
        .collect()
}
