// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! BMI estimation: ask the model first, fall back to `kg / m²`.

use crate::models::{BiometricRecord, BmiSource};
use crate::services::groq::{ChatMessage, GroqClient, LlmError};
use crate::services::nutrition::formula_bmi;
use crate::services::sanitize::{sanitize_input, DEFAULT_MAX_INPUT_LEN};
use serde_json::{json, Value};

const SYSTEM_PROMPT: &str = "You estimate body mass index. Reply with only a JSON object of \
the form {\"bmi\": number}. No markdown.";

/// A computed BMI and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmiEstimate {
    pub bmi: f64,
    pub source: BmiSource,
}

#[derive(Clone)]
pub struct BmiService {
    groq: GroqClient,
}

impl BmiService {
    pub fn new(groq: GroqClient) -> Self {
        Self { groq }
    }

    /// Estimate BMI for a merged record.
    ///
    /// Returns `None` only when height or weight is missing or unusable.
    /// Model failures are logged and swallowed.
    pub async fn estimate(&self, record: &BiometricRecord) -> Option<BmiEstimate> {
        let (height_cm, weight_lbs) = (record.height_cm?, record.weight_lbs?);

        match self.ask_model(record).await {
            Ok(bmi) => {
                return Some(BmiEstimate {
                    bmi,
                    source: BmiSource::Llm,
                })
            }
            Err(LlmError::NotConfigured) => {}
            Err(e) => {
                tracing::warn!(email = %record.email, error = %e, "LLM BMI failed, using formula");
            }
        }

        formula_estimate(height_cm, weight_lbs)
    }

    async fn ask_model(&self, record: &BiometricRecord) -> Result<f64, LlmError> {
        if !self.groq.is_configured() {
            return Err(LlmError::NotConfigured);
        }

        let response = self.groq.complete_json(&build_prompt(record)).await?;
        extract_bmi(&response)
            .ok_or_else(|| LlmError::Rejected(format!("unusable bmi value: {}", response["bmi"])))
    }
}

/// Formula-only estimate, used when the model is unavailable or wrong.
pub fn formula_estimate(height_cm: f64, weight_lbs: f64) -> Option<BmiEstimate> {
    formula_bmi(height_cm, weight_lbs).map(|bmi| BmiEstimate {
        bmi,
        source: BmiSource::Formula,
    })
}

fn build_prompt(record: &BiometricRecord) -> Vec<ChatMessage> {
    let payload = json!({
        "heightCm": record.height_cm,
        "weightLbs": record.weight_lbs,
        "age": record.age,
        "sex": sanitize_input(record.sex.as_deref(), 20),
        "ethnicity": sanitize_input(record.effective_ethnicity(), DEFAULT_MAX_INPUT_LEN),
    });

    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(payload.to_string()),
    ]
}

/// Pull a finite, positive `bmi` out of a model reply, rounded to 2 decimals.
fn extract_bmi(response: &Value) -> Option<f64> {
    let bmi = match &response["bmi"] {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    (bmi.is_finite() && bmi > 0.0).then(|| (bmi * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn record() -> BiometricRecord {
        BiometricRecord {
            email: "a@b.com".to_string(),
            height_cm: Some(175.0),
            weight_lbs: Some(170.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_bmi() {
        assert_eq!(extract_bmi(&json!({"bmi": 22.456})), Some(22.46));
        assert_eq!(extract_bmi(&json!({"bmi": "24.1"})), Some(24.1));
        assert_eq!(extract_bmi(&json!({"bmi": 0})), None);
        assert_eq!(extract_bmi(&json!({"bmi": -3.2})), None);
        assert_eq!(extract_bmi(&json!({"bmi": "tall"})), None);
        assert_eq!(extract_bmi(&json!({"value": 22})), None);
    }

    #[tokio::test]
    async fn test_unconfigured_uses_formula() {
        let service = BmiService::new(GroqClient::from_config(&Config::test_default()));

        let estimate = service.estimate(&record()).await.unwrap();

        assert_eq!(estimate.source, BmiSource::Formula);
        assert_eq!(estimate.bmi, formula_bmi(175.0, 170.0).unwrap());
    }

    #[tokio::test]
    async fn test_missing_inputs_yield_none() {
        let service = BmiService::new(GroqClient::from_config(&Config::test_default()));
        let mut partial = record();
        partial.weight_lbs = None;

        assert!(service.estimate(&partial).await.is_none());
    }

    #[test]
    fn test_prompt_uses_free_text_ethnicity() {
        let mut r = record();
        r.ethnicity = Some("Other".to_string());
        r.ethnicity_other = Some("Pacific  Islander".to_string());

        let messages = build_prompt(&r);
        let payload: Value = serde_json::from_str(&messages[1].content).unwrap();

        assert_eq!(payload["ethnicity"], "Pacific Islander");
        assert_eq!(payload["heightCm"], 175.0);
    }
}
