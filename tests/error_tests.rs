// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use gym_portal::error::AppError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_status_and_code_mapping() {
    let cases = [
        (AppError::Validation("x".into()), 400, "validation_error"),
        (AppError::Conflict("x".into()), 400, "conflict"),
        (AppError::InvalidCredentials, 400, "invalid_credentials"),
        (AppError::SignatureInvalid, 400, "signature_invalid"),
        (AppError::Unauthorized, 401, "unauthorized"),
        (AppError::InvalidToken, 401, "invalid_token"),
        (AppError::Forbidden, 403, "forbidden"),
        (AppError::NotFound("x".into()), 404, "not_found"),
        (AppError::Gateway("x".into()), 500, "upstream_failure"),
        (AppError::Database("x".into()), 500, "database_error"),
    ];

    for (err, status, code) in cases {
        assert_eq!(err.code(), code);
        let (got_status, body) = render(err).await;
        assert_eq!(got_status.as_u16(), status, "{}", code);
        assert_eq!(body["error"], code);
    }
}

#[tokio::test]
async fn test_client_errors_carry_details() {
    let (_, body) = render(AppError::Conflict("Username is already taken".into())).await;
    assert_eq!(body["details"], "Username is already taken");

    let (_, body) = render(AppError::NotFound("Event e1 not found".into())).await;
    assert_eq!(body["details"], "Event e1 not found");
}

#[tokio::test]
async fn test_server_errors_hide_details() {
    for err in [
        AppError::Database("connection refused to 10.0.0.3:8080".into()),
        AppError::Gateway("HTTP 401: bad key rzp_live_x".into()),
        AppError::Internal(anyhow::anyhow!("stack: at foo.rs:12")),
    ] {
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("details").is_none(), "leaked: {}", body);
    }
}

#[tokio::test]
async fn test_auth_errors_have_no_details() {
    let (_, body) = render(AppError::InvalidCredentials).await;
    assert!(body.get("details").is_none());
}

#[test]
fn test_validation_errors_list_fields() {
    use validator::Validate;

    #[derive(Validate)]
    struct ReviewForm {
        #[validate(length(min = 3))]
        name: String,
        #[validate(range(min = 1, max = 5))]
        stars: u8,
    }

    let errors = ReviewForm {
        name: "x".into(),
        stars: 9,
    }
    .validate()
    .unwrap_err();

    match AppError::from(errors) {
        AppError::Validation(msg) => assert_eq!(msg, "invalid fields: name, stars"),
        other => panic!("unexpected {:?}", other),
    }
}
