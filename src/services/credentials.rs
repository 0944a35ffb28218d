// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and credential checks.
//!
//! Passwords are hashed with Argon2id and a per-password random salt. Hashing
//! runs on the blocking pool so request tasks are not stalled.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use subtle::ConstantTimeEq;

use crate::config::AdminCredentials;
use crate::error::AppError;

/// Well-formed Argon2id hash with the default cost parameters whose digest
/// is all zeros. Verifying against it costs the same as checking a real
/// password and never succeeds in practice.
pub const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a raw password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

/// Check a raw password against a stored PHC string.
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::error!("Stored password hash is malformed");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_async(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_async(password: String, stored_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Verification task failed: {}", e)))
}

/// Compare submitted admin credentials in constant time.
///
/// Always false when no admin is configured.
pub fn check_admin(admin: Option<&AdminCredentials>, username: &str, password: &str) -> bool {
    let Some(admin) = admin else {
        return false;
    };
    let user_ok = admin.username.as_bytes().ct_eq(username.as_bytes());
    let pass_ok = admin.password.as_bytes().ct_eq(password.as_bytes());
    (user_ok & pass_ok).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("correct horse"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("correct horse batterY", &hash));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let a = hash_password("repeatable").unwrap();
        let b = hash_password("repeatable").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dummy_hash_matches_real_cost() {
        let parsed = PasswordHash::new(DUMMY_PASSWORD_HASH).unwrap();
        let params = argon2::Params::try_from(&parsed).unwrap();
        assert_eq!(params.m_cost(), argon2::Params::DEFAULT_M_COST);
        assert_eq!(params.t_cost(), argon2::Params::DEFAULT_T_COST);
        assert_eq!(params.p_cost(), argon2::Params::DEFAULT_P_COST);

        let real = hash_password("x").unwrap();
        assert_eq!(
            PasswordHash::new(&real).unwrap().algorithm,
            parsed.algorithm
        );
        assert!(!verify_password("", DUMMY_PASSWORD_HASH));
        assert!(!verify_password("correct horse", DUMMY_PASSWORD_HASH));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn test_check_admin() {
        let admin = AdminCredentials {
            username: "admin".to_string(),
            password: "s3cret-admin-pass".to_string(),
        };
        assert!(check_admin(Some(&admin), "admin", "s3cret-admin-pass"));
        assert!(!check_admin(Some(&admin), "admin", "s3cret-admin-pasS"));
        assert!(!check_admin(Some(&admin), "Admin", "s3cret-admin-pass"));
        assert!(!check_admin(None, "admin", "s3cret-admin-pass"));
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let hash = hash_password_async("from the pool".to_string()).await.unwrap();
        assert!(verify_password_async("from the pool".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_async("wrong".to_string(), hash).await.unwrap());
    }
}
