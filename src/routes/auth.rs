// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signup and login routes.

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::create_jwt;
use crate::models::account::validate_phone;
use crate::models::{Account, AccountSummary, Member, Membership, Role, Trainer};
use crate::services::credentials::{
    check_admin, hash_password_async, verify_password_async, DUMMY_PASSWORD_HASH,
};
use crate::time_utils::now_sortable;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Subject id carried by admin tokens.
pub const ADMIN_SUBJECT: &str = "admin";

/// Auth routes (public).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/admin/login", post(admin_login))
}

fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset"))
    }
}

/// Signup body: identity, credentials, role, and optional profile fields.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 32), custom(function = "validate_username"))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    pub role: Role,

    #[validate(range(min = 10, max = 120))]
    pub age: Option<u32>,
    #[validate(length(max = 32))]
    pub gender: Option<String>,

    // Member profile
    #[validate(length(max = 100))]
    pub emergency_contact: Option<String>,
    #[validate(length(max = 1000))]
    pub health_conditions: Option<String>,

    // Trainer profile
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(max = 100))]
    pub specialization: Option<String>,
    #[validate(range(max = 80))]
    pub experience: Option<u32>,
    #[validate(length(max = 200))]
    pub certification: Option<String>,
    pub fee_per_month: Option<u32>,
    #[validate(length(max = 200))]
    pub availability: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Account plus a fresh token.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub account: AccountSummary,
    pub token: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub token: String,
}

/// Register a member or trainer and log them in.
async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    if req.role == Role::Admin {
        return Err(AppError::Validation(
            "role must be 'member' or 'trainer'".to_string(),
        ));
    }

    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();

    if state.db.find_account_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username is already taken".to_string()));
    }
    if state.db.find_account_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = hash_password_async(req.password).await?;
    let now = now_sortable();

    let account = Account {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        email,
        password_hash,
        phone: req.phone,
        role: req.role,
        created_at: now.clone(),
    };

    match account.role {
        Role::Member => {
            let member = Member {
                id: account.id.clone(),
                username: account.username.clone(),
                email: account.email.clone(),
                phone: account.phone.clone(),
                age: req.age,
                gender: req.gender,
                emergency_contact: req.emergency_contact,
                health_conditions: req.health_conditions,
                membership: Membership::default(),
                assigned_trainer: None,
                created_at: now.clone(),
                updated_at: now,
            };
            state.db.create_member_account(&account, &member).await?;
        }
        Role::Trainer => {
            let trainer = Trainer {
                id: account.id.clone(),
                username: account.username.clone(),
                email: account.email.clone(),
                phone: account.phone.clone(),
                full_name: req.full_name,
                age: req.age,
                gender: req.gender,
                specialization: req.specialization,
                experience: req.experience,
                certification: req.certification,
                fee_per_month: req.fee_per_month,
                availability: req.availability,
                photo: None,
                rating: 0.0,
                reviews: Vec::new(),
                created_at: now.clone(),
                updated_at: now,
            };
            state.db.create_trainer_account(&account, &trainer).await?;
        }
        Role::Admin => {
            return Err(AppError::Validation(
                "role must be 'member' or 'trainer'".to_string(),
            ))
        }
    }

    let token = create_jwt(&account.id, account.role, &state.config.jwt_signing_key)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            account: AccountSummary::from(&account),
            token,
        }),
    ))
}

/// Log in as a member or trainer.
///
/// Unknown username, wrong role, and wrong password are indistinguishable.
async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let Some(account) = state
        .db
        .find_account_by_username(req.username.trim())
        .await?
    else {
        // Spend the same hashing work as a wrong password.
        verify_password_async(req.password, DUMMY_PASSWORD_HASH.to_string()).await?;
        tracing::debug!("Login for unknown username");
        return Err(AppError::InvalidCredentials);
    };

    let password_ok = verify_password_async(req.password, account.password_hash.clone()).await?;
    if !password_ok || account.role != req.role {
        tracing::debug!(account_id = %account.id, "Login rejected");
        return Err(AppError::InvalidCredentials);
    }

    let token = create_jwt(&account.id, account.role, &state.config.jwt_signing_key)?;
    tracing::info!(account_id = %account.id, role = %account.role, "Login succeeded");

    Ok(Json(AuthResponse {
        account: AccountSummary::from(&account),
        token,
    }))
}

/// Log in with the configured admin credentials.
async fn admin_login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<AdminLoginRequest>,
) -> Result<Json<TokenResponse>> {
    if !check_admin(state.config.admin.as_ref(), &req.username, &req.password) {
        tracing::warn!("Admin login rejected");
        return Err(AppError::InvalidCredentials);
    }

    let token = create_jwt(ADMIN_SUBJECT, Role::Admin, &state.config.jwt_signing_key)?;
    tracing::info!("Admin login succeeded");

    Ok(Json(TokenResponse { token }))
}
