// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request extractors and lenient field parsing shared by the handlers.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;

/// `Json<T>` whose rejection is an [`AppError::BadRequest`] with the usual
/// `{ success, message }` body.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Rejected request body");
                Err(AppError::BadRequest(rejection_message(&rejection)))
            }
        }
    }
}

fn rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected a JSON body (Content-Type: application/json)".to_string()
        }
        _ => "Invalid JSON body".to_string(),
    }
}

/// Non-blank string field: trimmed, `None` when absent or empty.
pub fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// A numeric field sent as a JSON number or a numeric string.
///
/// `Ok(None)` when absent, null or blank; `Err(())` when present but not a
/// finite number.
pub fn lenient_number(value: &Option<Value>) -> Result<Option<f64>, ()> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).map(Some).ok_or(()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or(()),
        Some(_) => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_trims_and_drops_blank() {
        assert_eq!(text(&Some("  hi ".to_string())), Some("hi"));
        assert_eq!(text(&Some("   ".to_string())), None);
        assert_eq!(text(&None), None);
    }

    #[test]
    fn test_lenient_number() {
        assert_eq!(lenient_number(&None), Ok(None));
        assert_eq!(lenient_number(&Some(Value::Null)), Ok(None));
        assert_eq!(lenient_number(&Some(json!(180))), Ok(Some(180.0)));
        assert_eq!(lenient_number(&Some(json!("72.5"))), Ok(Some(72.5)));
        assert_eq!(lenient_number(&Some(json!(" "))), Ok(None));
        assert_eq!(lenient_number(&Some(json!("tall"))), Err(()));
        assert_eq!(lenient_number(&Some(json!("NaN"))), Err(()));
        assert_eq!(lenient_number(&Some(json!(true))), Err(()));
    }
}
