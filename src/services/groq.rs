// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Groq chat-completions client (OpenAI-compatible API).
//!
//! Handles:
//! - Request construction with optional JSON output mode
//! - A hard per-request timeout
//! - Recovering JSON from replies wrapped in markdown fences

use crate::config::Config;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

/// Model families that accept `response_format: json_object`.
const JSON_MODE_MODEL_MARKERS: &[&str] = &["llama-3.1", "llama3.1", "mixtral"];

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```\s*(?:json)?\s*(.*?)\s*```").expect("valid fence regex")
});

/// Failures on the model path. None of these reach an HTTP response; the
/// callers fall back to deterministic output.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM provider not configured")]
    NotConfigured,

    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM transport error: {0}")]
    Transport(String),

    #[error("LLM API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned no content")]
    EmptyContent,

    #[error("LLM content is not valid JSON")]
    Unparseable,

    #[error("LLM output rejected: {0}")]
    Rejected(String),
}

/// Chat message (OpenAI-compatible)
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    /// Usually a string; some gateways hand back an object in JSON mode.
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Groq API client. `None` credentials make every call fail fast with
/// [`LlmError::NotConfigured`].
#[derive(Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl GroqClient {
    /// Build a client from configuration (API key + model both required).
    pub fn from_config(config: &Config) -> Self {
        let credentials = match (&config.groq_api_key, &config.groq_model) {
            (Some(key), Some(model)) => Some((key.clone(), model.clone())),
            _ => None,
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for Groq");
                reqwest::Client::new()
            });

        Self {
            http,
            base_url: config.groq_base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Send a chat completion and return the first choice's content.
    ///
    /// JSON output mode is requested only for models known to support it.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, LlmError> {
        let (api_key, model) = self.credentials.as_ref().ok_or(LlmError::NotConfigured)?;

        let request = CompletionRequest {
            model,
            messages,
            temperature: 0.4,
            response_format: supports_json_mode(model).then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Transport(e.to_string())
            }
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|_| LlmError::Unparseable)?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyContent)?;

        match &content {
            Value::Null => Err(LlmError::EmptyContent),
            Value::String(s) if s.trim().is_empty() => Err(LlmError::EmptyContent),
            _ => Ok(content),
        }
    }

    /// Complete and decode the reply as JSON (see [`parse_model_json`]).
    pub async fn complete_json(&self, messages: &[ChatMessage]) -> Result<Value, LlmError> {
        let content = self.complete(messages).await?;
        parse_model_json(&content).ok_or(LlmError::Unparseable)
    }
}

/// Whether a model name belongs to a family with JSON output mode.
pub fn supports_json_mode(model: &str) -> bool {
    let model = model.to_lowercase();
    JSON_MODE_MODEL_MARKERS.iter().any(|m| model.contains(m))
}

/// Decode model content into JSON.
///
/// Structured content is used as-is. A string is parsed directly, then by
/// looking inside the first markdown code fence. Anything else is `None`.
pub fn parse_model_json(content: &Value) -> Option<Value> {
    match content {
        Value::Object(_) | Value::Array(_) => Some(content.clone()),
        Value::String(text) => serde_json::from_str(text.trim()).ok().or_else(|| {
            FENCED_BLOCK
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|inner| serde_json::from_str(inner.as_str()).ok())
        }),
        _ => None,
    }
}
