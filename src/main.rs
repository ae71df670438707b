// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! NourishPet API Server
//!
//! Serves accounts, biometrics, activity logging and AI-assisted meal plans
//! for the NourishPet front end.

use nourishpet::{config::Config, db::Db, services::Mailer, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(port = config.port, "Starting NourishPet API");

    // Connect the document store once, up front
    let db = Db::from_config(&config.database);
    if let Err(e) = db.connect().await {
        tracing::error!(error = %e, backend = db.backend_name(), "Failed to connect to database");
        std::process::exit(1);
    }
    tracing::info!(backend = db.backend_name(), "Database ready");

    if config.groq_api_key.is_none() || config.groq_model.is_none() {
        tracing::warn!("GROQ_API_KEY/GROQ_MODEL not set; meal plans and BMI use fallbacks");
    }
    if config.mail_api_url.is_none() {
        tracing::warn!("MAIL_API_URL not set; password reset mail will fail");
    }

    let mailer = Mailer::from_config(&config);
    let state = Arc::new(AppState::new(config.clone(), db, mailer));

    // Build router
    let app = nourishpet::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nourishpet=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
