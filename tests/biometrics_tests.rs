// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Biometrics capture and BMI estimation through the API.

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{get_request, json_request, send, FakeGroq};

#[tokio::test]
async fn test_update_then_get_round_trip() {
    let (app, state) = common::create_test_app();
    common::signup(&app, &state, "ada@example.com", "ada").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/biometrics/update",
            json!({"email": "ada@example.com", "height": 180, "weight": 150}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, get_request("/api/biometrics/ada@example.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["heightCm"], 180.0);
    assert_eq!(body["weightLbs"], 150.0);
    assert_eq!(body["bmi"], 21.0);
    assert_eq!(body["bmiSource"], "formula");
    assert!(body["lastCalculated"].is_string());
}

#[tokio::test]
async fn test_age_only_for_new_account_requires_height_and_weight() {
    let (app, state) = common::create_test_app();
    common::signup(&app, &state, "ada@example.com", "ada").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/biometrics/update",
            json!({"email": "ada@example.com", "age": 30}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Height (cm) and weight (lbs) are required");

    let (status, _) = send(&app, get_request("/api/biometrics/ada@example.com")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_validation() {
    let (app, state) = common::create_test_app();
    common::signup(&app, &state, "ada@example.com", "ada").await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/biometrics/update", json!({"height": 170}), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email is required");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/biometrics/update",
            json!({"email": "ghost@example.com", "height": 170, "weight": 150}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/biometrics/update",
            json!({"email": "ada@example.com", "height": "tall", "weight": 150}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Height, weight and age must be numeric");

    // Would be stored as age 0 if rounding came after the check
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/biometrics/update",
            json!({"email": "ada@example.com", "height": 170, "weight": 150, "age": 0.3}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Height, weight and age must be positive");
}

#[tokio::test]
async fn test_partial_update_merges_with_previous() {
    let (app, state) = common::create_test_app();
    common::signup(&app, &state, "ada@example.com", "ada").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/biometrics/update",
            json!({
                "email": "ada@example.com",
                "height": "165",
                "weight": "140",
                "sex": "Female",
                "ethnicity": "Other",
                "ethnicityOther": "Basque"
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/biometrics/update",
            json!({"email": "ada@example.com", "age": 36}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["heightCm"], 165.0);
    assert_eq!(body["weightLbs"], 140.0);
    assert_eq!(body["age"], 36);
    assert_eq!(body["sex"], "Female");
    assert_eq!(body["ethnicityOther"], "Basque");
}

#[tokio::test]
async fn test_concurrent_updates_do_not_lose_fields() {
    let (app, state) = common::create_test_app();
    common::signup(&app, &state, "ada@example.com", "ada").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/biometrics/update",
            json!({"email": "ada@example.com", "height": 170, "weight": 150}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let bodies = [
        json!({"email": "ada@example.com", "age": 40}),
        json!({"email": "ada@example.com", "sex": "Male"}),
        json!({"email": "ada@example.com", "ethnicity": "Asian"}),
    ];
    let handles: Vec<_> = bodies
        .into_iter()
        .map(|body| {
            let app = app.clone();
            tokio::spawn(async move {
                send(&app, json_request("POST", "/api/biometrics/update", body, None)).await
            })
        })
        .collect();
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, get_request("/api/biometrics/ada@example.com")).await;
    assert_eq!(body["age"], 40);
    assert_eq!(body["sex"], "Male");
    assert_eq!(body["ethnicity"], "Asian");
    assert_eq!(body["heightCm"], 170.0);
}

#[tokio::test]
async fn test_model_bmi_is_used_when_available() {
    let groq = FakeGroq::start(json!("{\"bmi\": 23.456}")).await;
    let (app, state) = common::create_test_app_with_config(groq.config());
    common::signup(&app, &state, "ada@example.com", "ada").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/biometrics/update",
            json!({"email": "ada@example.com", "height": 180, "weight": 150}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bmi"], 23.46);
    assert_eq!(body["bmiSource"], "llm");
    assert_eq!(groq.call_count(), 1);
}

#[tokio::test]
async fn test_model_failure_falls_back_to_formula() {
    let groq = FakeGroq::start_with_status(StatusCode::SERVICE_UNAVAILABLE, json!(null)).await;
    let (app, state) = common::create_test_app_with_config(groq.config());
    common::signup(&app, &state, "ada@example.com", "ada").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/biometrics/update",
            json!({"email": "ada@example.com", "height": 180, "weight": 150}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bmi"], 21.0);
    assert_eq!(body["bmiSource"], "formula");
}

#[tokio::test]
async fn test_model_nonsense_bmi_falls_back_to_formula() {
    let groq = FakeGroq::start(json!("{\"bmi\": -4}")).await;
    let (app, state) = common::create_test_app_with_config(groq.config());
    common::signup(&app, &state, "ada@example.com", "ada").await;

    let (_, body) = send(
        &app,
        json_request(
            "POST",
            "/api/biometrics/update",
            json!({"email": "ada@example.com", "height": 180, "weight": 150}),
            None,
        ),
    )
    .await;

    assert_eq!(body["bmiSource"], "formula");
}
