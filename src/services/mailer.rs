// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outgoing mail.
//!
//! Production posts JSON to an HTTP mail relay. Tests capture messages in an
//! in-process outbox instead.

use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::error::AppError;

/// A single outgoing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Clone)]
pub enum Mailer {
    /// Relay over HTTP. `None` endpoint means mail is not configured.
    Http {
        http: reqwest::Client,
        endpoint: Option<String>,
        api_key: Option<String>,
        from: String,
    },
    /// Capture messages in memory.
    Outbox {
        from: String,
        sent: Arc<Mutex<Vec<OutgoingMail>>>,
    },
}

impl Mailer {
    pub fn from_config(config: &Config) -> Self {
        Mailer::Http {
            http: reqwest::Client::new(),
            endpoint: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            from: config.mail_from.clone(),
        }
    }

    /// Create a capturing mailer for tests.
    pub fn outbox() -> Self {
        Mailer::Outbox {
            from: "NourishPet <no-reply@nourishpet.test>".to_string(),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Messages captured so far (empty for the HTTP relay).
    pub fn sent(&self) -> Vec<OutgoingMail> {
        match self {
            Mailer::Outbox { sent, .. } => sent.lock().map(|s| s.clone()).unwrap_or_default(),
            Mailer::Http { .. } => Vec::new(),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), AppError> {
        match self {
            Mailer::Http {
                http,
                endpoint,
                api_key,
                from,
            } => {
                let endpoint = endpoint
                    .as_deref()
                    .ok_or_else(|| AppError::Mail("MAIL_API_URL is not configured".to_string()))?;

                let mail = OutgoingMail {
                    from: from.clone(),
                    to: to.to_string(),
                    subject: subject.to_string(),
                    text: text.to_string(),
                };

                let mut request = http.post(endpoint).json(&mail);
                if let Some(key) = api_key {
                    request = request.bearer_auth(key);
                }

                let response = request
                    .send()
                    .await
                    .map_err(|e| AppError::Mail(format!("Mail relay request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::Mail(format!(
                        "Mail relay returned {}: {}",
                        status, body
                    )));
                }

                tracing::info!(to, subject, "Mail sent");
                Ok(())
            }
            Mailer::Outbox { from, sent } => {
                let mail = OutgoingMail {
                    from: from.clone(),
                    to: to.to_string(),
                    subject: subject.to_string(),
                    text: text.to_string(),
                };
                sent.lock()
                    .map_err(|_| AppError::Mail("Outbox lock poisoned".to_string()))?
                    .push(mail);
                Ok(())
            }
        }
    }

    /// Send the password reset link.
    pub async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), AppError> {
        let text = format!(
            "We received a request to reset your NourishPet password.\n\n\
             Open this link within one hour to choose a new one:\n{}\n\n\
             If you did not ask for this, you can ignore this message.",
            link
        );
        self.send(to, "Reset your NourishPet password", &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outbox_captures_mail() {
        let mailer = Mailer::outbox();
        mailer
            .send_password_reset("a@b.com", "http://localhost:5173/reset-password?token=abc")
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.com");
        assert!(sent[0].text.contains("reset-password?token=abc"));
    }

    #[tokio::test]
    async fn test_unconfigured_relay_is_mail_error() {
        let mailer = Mailer::from_config(&Config::test_default());
        let err = mailer.send("a@b.com", "hi", "body").await.unwrap_err();
        assert!(matches!(err, AppError::Mail(_)));
    }
}
