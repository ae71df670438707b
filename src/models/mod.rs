// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod account;
pub mod activity;
pub mod biometrics;
pub mod focus;
pub mod gamification;
pub mod meal_plan;
pub mod password_reset;

pub use account::{normalize_email, Account, Profile, UsernameClaim};
pub use activity::ActivityLog;
pub use biometrics::{BiometricRecord, BiometricsUpdate, BmiSource};
pub use focus::FocusSession;
pub use gamification::{PetData, StreakData};
pub use meal_plan::{DayPlan, Meal, MealPlan};
pub use password_reset::PasswordResetToken;
