// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment signature tests.
//!
//! Activation is allowed only when the signature is the hex HMAC-SHA256 of
//! `"{order}|{payment}"` under the gateway secret. Any single-character change
//! to the signature or either reference must be refused.

use axum::http::StatusCode;
use gym_portal::models::Role;
use gym_portal::services::gateway::{sign, verify_signature};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, json_request, token_for};

const SECRET: &[u8] = b"test_gateway_secret";
const ORDER: &str = "order_NXa1b2c3d4e5f6";
const PAYMENT: &str = "pay_NXz9y8x7w6v5u4";

/// Every string that differs from `s` in exactly one position.
fn single_char_mutations(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut out = Vec::new();
    for i in 0..chars.len() {
        let mut mutated = chars.clone();
        mutated[i] = if chars[i] == 'a' { 'b' } else { 'a' };
        out.push(mutated.into_iter().collect());
    }
    out
}

#[test]
fn test_signature_is_lowercase_hex() {
    let sig = sign(SECRET, ORDER, PAYMENT).unwrap();
    assert_eq!(sig.len(), 64);
    assert!(sig.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));

    // Upper-casing a single digit is still a mutation.
    let upper = sig.to_uppercase();
    assert!(upper != sig);
    assert!(!verify_signature(SECRET, ORDER, PAYMENT, &upper));
    assert!(!verify_signature(SECRET, ORDER, PAYMENT, &format!(" {}", sig)));
}

#[test]
fn test_signature_mutations_rejected() {
    let sig = sign(SECRET, ORDER, PAYMENT).unwrap();
    assert!(verify_signature(SECRET, ORDER, PAYMENT, &sig));

    for mutated in single_char_mutations(&sig) {
        assert!(
            !verify_signature(SECRET, ORDER, PAYMENT, &mutated),
            "mutated signature {} accepted",
            mutated
        );
    }
}

#[test]
fn test_reference_mutations_rejected() {
    let sig = sign(SECRET, ORDER, PAYMENT).unwrap();

    for order in single_char_mutations(ORDER) {
        assert!(!verify_signature(SECRET, &order, PAYMENT, &sig), "{}", order);
    }
    for payment in single_char_mutations(PAYMENT) {
        assert!(!verify_signature(SECRET, ORDER, &payment, &sig), "{}", payment);
    }
}

#[test]
fn test_swapped_references_rejected() {
    let sig = sign(SECRET, ORDER, PAYMENT).unwrap();
    assert!(!verify_signature(SECRET, PAYMENT, ORDER, &sig));
}

#[tokio::test]
async fn test_verify_endpoint_rejects_bad_signature() {
    let (app, _) = create_test_app();
    let token = token_for("member-1", Role::Member);
    let mut sig = sign(SECRET, ORDER, PAYMENT).unwrap();
    sig.replace_range(0..1, if sig.starts_with('0') { "1" } else { "0" });

    let response = app
        .oneshot(json_request(
            "POST",
            "/verify-payment",
            Some(&token),
            json!({"orderRef": ORDER, "paymentRef": PAYMENT, "signature": sig}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "signature_invalid");
}

#[tokio::test]
async fn test_verify_endpoint_accepts_valid_signature() {
    let (app, _) = create_test_app();
    let token = token_for("member-1", Role::Member);
    let sig = sign(SECRET, ORDER, PAYMENT).unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/verify-payment",
            Some(&token),
            json!({"orderRef": ORDER, "paymentRef": PAYMENT, "signature": sig}),
        ))
        .await
        .unwrap();

    // Past the signature check, the offline database is the next failure.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "database_error");
}
