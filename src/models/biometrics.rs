// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Biometric record and merge semantics.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Where the stored BMI came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "lowercase")]
pub enum BmiSource {
    Llm,
    Formula,
}

/// Biometrics stored in `biometrics`, keyed by normalized email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct BiometricRecord {
    pub email: String,
    /// Height in centimeters
    #[serde(default)]
    pub height_cm: Option<f64>,
    /// Weight in pounds
    #[serde(default)]
    pub weight_lbs: Option<f64>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub ethnicity: Option<String>,
    /// Free text used when ethnicity is "Other"
    #[serde(default)]
    pub ethnicity_other: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub bmi_source: Option<BmiSource>,
    /// When the BMI was last computed (ISO 8601)
    #[serde(default)]
    pub last_calculated: Option<String>,
    #[serde(default)]
    pub updated_at: String,
}

/// A partial update; `None` keeps whatever was stored before.
#[derive(Debug, Clone, Default)]
pub struct BiometricsUpdate {
    pub height_cm: Option<f64>,
    pub weight_lbs: Option<f64>,
    pub sex: Option<String>,
    pub ethnicity: Option<String>,
    pub ethnicity_other: Option<String>,
    pub age: Option<u32>,
}

impl BiometricRecord {
    /// Merge an update over the previous record (if any).
    ///
    /// BMI fields are carried over untouched; the caller recomputes them.
    pub fn merged(email: &str, previous: Option<&BiometricRecord>, update: &BiometricsUpdate) -> Self {
        let base = previous.cloned().unwrap_or_default();

        Self {
            email: email.to_string(),
            height_cm: update.height_cm.or(base.height_cm),
            weight_lbs: update.weight_lbs.or(base.weight_lbs),
            sex: update.sex.clone().or(base.sex),
            ethnicity: update.ethnicity.clone().or(base.ethnicity),
            ethnicity_other: update.ethnicity_other.clone().or(base.ethnicity_other),
            age: update.age.or(base.age),
            bmi: base.bmi,
            bmi_source: base.bmi_source,
            last_calculated: base.last_calculated,
            updated_at: base.updated_at,
        }
    }

    /// Ethnicity as shown to the model: the free-text variant wins when set.
    pub fn effective_ethnicity(&self) -> Option<&str> {
        self.ethnicity_other
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.ethnicity.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> BiometricRecord {
        BiometricRecord {
            email: "a@b.com".to_string(),
            height_cm: Some(170.0),
            weight_lbs: Some(160.0),
            sex: Some("Female".to_string()),
            ethnicity: Some("Asian".to_string()),
            ethnicity_other: None,
            age: Some(30),
            bmi: Some(25.1),
            bmi_source: Some(BmiSource::Formula),
            last_calculated: Some("2026-01-01T00:00:00Z".to_string()),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_merge_keeps_missing_fields() {
        let previous = stored();
        let update = BiometricsUpdate {
            weight_lbs: Some(150.0),
            ..Default::default()
        };

        let merged = BiometricRecord::merged("a@b.com", Some(&previous), &update);

        assert_eq!(merged.weight_lbs, Some(150.0));
        assert_eq!(merged.height_cm, Some(170.0));
        assert_eq!(merged.age, Some(30));
        assert_eq!(merged.sex.as_deref(), Some("Female"));
        assert_eq!(merged.bmi, Some(25.1));
    }

    #[test]
    fn test_merge_without_previous() {
        let update = BiometricsUpdate {
            age: Some(41),
            ..Default::default()
        };

        let merged = BiometricRecord::merged("new@b.com", None, &update);

        assert_eq!(merged.email, "new@b.com");
        assert_eq!(merged.age, Some(41));
        assert!(merged.height_cm.is_none());
        assert!(merged.bmi.is_none());
    }

    #[test]
    fn test_effective_ethnicity_prefers_free_text() {
        let mut record = stored();
        assert_eq!(record.effective_ethnicity(), Some("Asian"));

        record.ethnicity_other = Some("Pacific Islander".to_string());
        assert_eq!(record.effective_ethnicity(), Some("Pacific Islander"));

        record.ethnicity_other = Some("  ".to_string());
        assert_eq!(record.effective_ethnicity(), Some("Asian"));
    }
}
