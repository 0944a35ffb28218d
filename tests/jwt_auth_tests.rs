// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication tests.
//!
//! These tests pin the token wire format and check that the verifier fails
//! closed on anything it did not issue itself.

use gym_portal::middleware::auth::{
    create_jwt, verify_jwt, AccessError, Claims, TOKEN_TTL_SECS,
};
use gym_portal::models::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn sign_raw<T: Serialize>(claims: &T, alg: Algorithm, key: &[u8]) -> String {
    encode(&Header::new(alg), claims, &EncodingKey::from_secret(key)).unwrap()
}

#[test]
fn test_jwt_roundtrip() {
    let token = create_jwt("member-42", Role::Member, SIGNING_KEY).unwrap();

    // Decode as a third party would.
    let key = DecodingKey::from_secret(SIGNING_KEY);
    let data = decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256)).unwrap();

    assert_eq!(data.claims.sub, "member-42");
    assert_eq!(data.claims.role, Role::Member);
    assert_eq!(data.claims.exp - data.claims.iat, TOKEN_TTL_SECS);
}

#[test]
fn test_role_claim_is_lowercase_string() {
    let token = create_jwt("t-1", Role::Trainer, SIGNING_KEY).unwrap();
    let key = DecodingKey::from_secret(SIGNING_KEY);
    let data =
        decode::<serde_json::Value>(&token, &key, &Validation::new(Algorithm::HS256)).unwrap();
    assert_eq!(data.claims["role"], "trainer");
}

#[test]
fn test_wrong_algorithm_rejected() {
    let claims = Claims {
        sub: "member-1".to_string(),
        role: Role::Member,
        exp: now() + 600,
        iat: now(),
    };
    let token = sign_raw(&claims, Algorithm::HS512, SIGNING_KEY);
    assert_eq!(
        verify_jwt(&token, SIGNING_KEY),
        Err(AccessError::InvalidToken)
    );
}

#[test]
fn test_missing_claims_rejected() {
    #[derive(Serialize)]
    struct NoRole {
        sub: String,
        exp: u64,
    }
    let token = sign_raw(
        &NoRole {
            sub: "member-1".to_string(),
            exp: now() + 600,
        },
        Algorithm::HS256,
        SIGNING_KEY,
    );
    assert_eq!(
        verify_jwt(&token, SIGNING_KEY),
        Err(AccessError::InvalidToken)
    );

    #[derive(Serialize)]
    struct NoExpiry {
        sub: String,
        role: &'static str,
    }
    let token = sign_raw(
        &NoExpiry {
            sub: "member-1".to_string(),
            role: "member",
        },
        Algorithm::HS256,
        SIGNING_KEY,
    );
    assert_eq!(
        verify_jwt(&token, SIGNING_KEY),
        Err(AccessError::InvalidToken)
    );
}

#[test]
fn test_unknown_role_rejected() {
    #[derive(Serialize)]
    struct Forged {
        sub: String,
        role: &'static str,
        exp: u64,
        iat: u64,
    }
    let token = sign_raw(
        &Forged {
            sub: "member-1".to_string(),
            role: "superuser",
            exp: now() + 600,
            iat: now(),
        },
        Algorithm::HS256,
        SIGNING_KEY,
    );
    assert_eq!(
        verify_jwt(&token, SIGNING_KEY),
        Err(AccessError::InvalidToken)
    );
}

#[test]
fn test_tampered_payload_rejected() {
    let token = create_jwt("member-1", Role::Member, SIGNING_KEY).unwrap();
    let forged_admin = create_jwt("member-1", Role::Admin, b"attacker_key_that_is_32_bytes!!!").unwrap();

    // Splice the attacker's payload onto the genuine signature.
    let genuine: Vec<&str> = token.split('.').collect();
    let forged: Vec<&str> = forged_admin.split('.').collect();
    let spliced = format!("{}.{}.{}", genuine[0], forged[1], genuine[2]);

    assert_eq!(
        verify_jwt(&spliced, SIGNING_KEY),
        Err(AccessError::InvalidToken)
    );
}

#[test]
fn test_empty_subject_rejected() {
    let claims = Claims {
        sub: String::new(),
        role: Role::Member,
        exp: now() + 600,
        iat: now(),
    };
    let token = sign_raw(&claims, Algorithm::HS256, SIGNING_KEY);
    assert_eq!(
        verify_jwt(&token, SIGNING_KEY),
        Err(AccessError::InvalidToken)
    );
}
