// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use nourishpet::config::Config;
use nourishpet::db::Db;
use nourishpet::routes::create_router;
use nourishpet::services::Mailer;
use nourishpet::AppState;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test app backed by the in-memory store and a capturing mailer.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, Db::memory(), Mailer::outbox()));
    (create_router(state.clone()), state)
}

/// Create a session token the same way signin does.
#[allow(dead_code)]
pub fn create_test_jwt(email: &str, signing_key: &[u8]) -> String {
    nourishpet::middleware::auth::create_jwt(email, signing_key).unwrap()
}

/// Build a JSON request, optionally carrying a bearer session.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Send one request and return status plus JSON body.
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// Sign up a user through the API and return a session token for them.
#[allow(dead_code)]
pub async fn signup(app: &Router, state: &AppState, email: &str, username: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/signup",
            json!({
                "firstName": "Test",
                "lastName": "User",
                "username": username,
                "email": email,
                "dateOfBirth": "01/02/1990",
                "password": "secret123",
                "confirmPassword": "secret123"
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

    create_test_jwt(&email.to_lowercase(), &state.config.jwt_signing_key)
}

/// Stand-in for the Groq chat-completions API.
#[allow(dead_code)]
pub struct FakeGroq {
    pub base_url: String,
    pub calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FakeGroq {
    /// Serve `content` as the first choice of every completion.
    pub async fn start(content: Value) -> Self {
        Self::start_with_status(StatusCode::OK, content).await
    }

    pub async fn start_with_status(status: StatusCode, content: Value) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let app = Router::new().route(
            "/chat/completions",
            post(move |Json(_request): Json<Value>| {
                let counter = counter.clone();
                let content = content.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if status.is_success() {
                        (
                            status,
                            Json(json!({
                                "choices": [{"message": {"role": "assistant", "content": content}}]
                            })),
                        )
                    } else {
                        (
                            status,
                            Json(json!({"error": {"message": "upstream unavailable"}})),
                        )
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            calls,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Test config pointed at this server.
    pub fn config(&self) -> Config {
        let mut config = Config::test_default();
        config.groq_api_key = Some("test-groq-key".to_string());
        config.groq_model = Some("llama-3.1-8b-instant".to_string());
        config.groq_base_url = self.base_url.clone();
        config.llm_timeout_secs = 5;
        config
    }
}

/// Firestore store pointed at the emulator.
#[allow(dead_code)]
pub async fn test_db() -> Db {
    let db = Db::firestore("test-project");
    db.connect().await.expect("Failed to connect to Firestore emulator");
    db
}

/// Email unique to this test run, for isolation on a shared emulator.
#[allow(dead_code)]
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, uuid::Uuid::new_v4().simple())
}
