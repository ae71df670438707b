// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod bmi;
pub mod groq;
pub mod mailer;
pub mod meal_plan;
pub mod nutrition;
pub mod password;
pub mod sanitize;
pub mod schedule;

pub use bmi::{BmiEstimate, BmiService};
pub use groq::{GroqClient, LlmError};
pub use mailer::{Mailer, OutgoingMail};
pub use meal_plan::{MealPlanPreferences, MealPlanService};
