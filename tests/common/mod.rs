// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::routing::post;
use axum::Json;
use gym_portal::config::Config;
use gym_portal::db::FirestoreDb;
use gym_portal::middleware::auth::create_jwt;
use gym_portal::models::Role;
use gym_portal::routes::create_router;
use gym_portal::AppState;
use std::sync::Arc;

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

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), test_db_offline()));
    (create_router(state.clone()), state)
}

/// Create a test app backed by the emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), test_db().await));
    (create_router(state.clone()), state)
}

/// Serve a stand-in for the gateway orders API on an ephemeral port.
///
/// Every order is accepted and echoes the requested amount and currency.
/// Returns the base URL to use as `razorpay_api_url`.
#[allow(dead_code)]
pub async fn spawn_stub_gateway() -> String {
    async fn create_order(Json(req): Json<serde_json::Value>) -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "id": format!("order_{}", unique_suffix()),
            "amount": req["amount"],
            "currency": req["currency"],
            "status": "created",
        }))
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new().route("/v1/orders", post(create_order));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

/// Emulator-backed app whose gateway client talks to `gateway_url`.
#[allow(dead_code)]
pub async fn create_emulator_app_with_gateway(
    gateway_url: String,
) -> (axum::Router, Arc<AppState>) {
    let config = Config {
        razorpay_api_url: gateway_url,
        ..Config::test_default()
    };
    let state = Arc::new(AppState::new(config, test_db().await));
    (create_router(state.clone()), state)
}

/// Token for `subject` signed with the test key.
#[allow(dead_code)]
pub fn token_for(subject: &str, role: Role) -> String {
    create_jwt(subject, role, &Config::test_default().jwt_signing_key).unwrap()
}

/// Unique suffix for test isolation.
#[allow(dead_code)]
pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Build a JSON request, optionally authenticated.
#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a bodyless request, optionally authenticated.
#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
