// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. The Groq and mail settings are
//! optional: without them the AI paths fall back to deterministic output and
//! password-reset mail fails with a 500.

use std::env;

/// Groq's OpenAI-compatible endpoint.
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default timeout for a single Groq request.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// Which document store backs the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseBackend {
    /// Google Cloud Firestore (production).
    Firestore { project_id: String },
    /// Process-local store (tests and local development).
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL (CORS origin and password-reset links)
    pub frontend_url: String,
    /// True when `APP_ENV=test`
    pub test_mode: bool,
    /// Document store selection
    pub database: DatabaseBackend,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    /// Groq API key (AI meal plans and BMI)
    pub groq_api_key: Option<String>,
    /// Groq model identifier
    pub groq_model: Option<String>,
    /// Base URL of the chat-completions API
    pub groq_base_url: String,
    /// Timeout applied to each Groq request
    pub llm_timeout_secs: u64,

    /// HTTP mail relay endpoint
    pub mail_api_url: Option<String>,
    /// Bearer key for the mail relay
    pub mail_api_key: Option<String>,
    /// Sender address for outgoing mail
    pub mail_from: String,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            test_mode: true,
            database: DatabaseBackend::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            groq_api_key: None,
            groq_model: None,
            groq_base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            mail_api_url: None,
            mail_api_key: None,
            mail_from: "NourishPet <no-reply@nourishpet.test>".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Outside test mode a Firestore project is mandatory unless
    /// `DATABASE_BACKEND=memory` is set explicitly.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let test_mode = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("test"))
            .unwrap_or(false);

        let database = match env::var("DATABASE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => DatabaseBackend::Memory,
            "firestore" => match non_empty_var("GCP_PROJECT_ID") {
                Some(project_id) => DatabaseBackend::Firestore { project_id },
                None if test_mode => DatabaseBackend::Memory,
                None => return Err(ConfigError::Missing("GCP_PROJECT_ID")),
            },
            other => return Err(ConfigError::Invalid("DATABASE_BACKEND", other.to_string())),
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            test_mode,
            database,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),

            groq_api_key: non_empty_var("GROQ_API_KEY"),
            groq_model: non_empty_var("GROQ_MODEL"),
            groq_base_url: non_empty_var("GROQ_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            llm_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),

            mail_api_url: non_empty_var("MAIL_API_URL"),
            mail_api_key: non_empty_var("MAIL_API_KEY"),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "NourishPet <no-reply@nourishpet.app>".to_string()),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("DATABASE_BACKEND", "memory");
        env::set_var("GROQ_API_KEY", "  ");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.database, DatabaseBackend::Memory);
        assert_eq!(config.groq_api_key, None);
        assert_eq!(config.llm_timeout_secs, DEFAULT_LLM_TIMEOUT_SECS);
        assert_eq!(config.port, 8080);
    }
}
