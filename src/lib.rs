// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! NourishPet: nutrition and habit tracking API
//!
//! This crate provides the backend API for accounts, biometrics, activity
//! and focus logging, pet and streak state, and AI-assisted meal plans.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{BmiService, GroqClient, Mailer, MealPlanService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub meal_plans: MealPlanService,
    pub bmi: BmiService,
    pub mailer: Mailer,
}

impl AppState {
    /// Wire up services from configuration.
    pub fn new(config: Config, db: Db, mailer: Mailer) -> Self {
        let groq = GroqClient::from_config(&config);
        Self {
            meal_plans: MealPlanService::new(groq.clone()),
            bmi: BmiService::new(groq),
            config,
            db,
            mailer,
        }
    }
}
