// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin back-office: coupons and member management.

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::models::coupon::normalize_code;
use crate::models::{Coupon, MemberProfile, Role};
use crate::routes::AckResponse;
use crate::time_utils::{now_sortable, parse_utc};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};

/// Admin routes (auth applied in routes/mod.rs, role checked per handler).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/coupons", get(list_coupons).post(create_coupon))
        .route("/admin/coupons/{code}", delete(delete_coupon))
        .route("/admin/members", get(list_members))
        .route("/admin/members/{id}", delete(delete_member))
}

fn validate_coupon_code(code: &str) -> std::result::Result<(), ValidationError> {
    let code = code.trim();
    if (3..=32).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        Err(ValidationError::new("coupon_code"))
    }
}

fn validate_expiry(raw: &str) -> std::result::Result<(), ValidationError> {
    parse_utc(raw)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("date_format"))
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    #[validate(custom(function = "validate_coupon_code"))]
    pub code: String,
    #[validate(range(min = 1, max = 100))]
    pub discount_percent: u8,
    #[validate(custom(function = "validate_expiry"))]
    pub expiry_date: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMemberResponse {
    pub success: bool,
    pub deleted_documents: usize,
}

async fn list_coupons(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Coupon>>> {
    user.require_role(&[Role::Admin])?;
    Ok(Json(state.db.list_coupons().await?))
}

async fn create_coupon(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Coupon>)> {
    user.require_role(&[Role::Admin])?;

    let code = normalize_code(&req.code);
    if state.db.get_coupon(&code).await?.is_some() {
        return Err(AppError::Conflict(format!("Coupon {} already exists", code)));
    }

    let expiry_date = parse_utc(&req.expiry_date)
        .ok_or_else(|| AppError::Validation("invalid expiryDate".to_string()))?;

    let coupon = Coupon {
        code,
        discount_percent: req.discount_percent,
        expiry_date,
        is_active: req.is_active,
        created_at: now_sortable(),
    };
    state.db.upsert_coupon(&coupon).await?;

    tracing::info!(
        code = %coupon.code,
        discount_percent = coupon.discount_percent,
        "Coupon created"
    );
    Ok((StatusCode::CREATED, Json(coupon)))
}

async fn delete_coupon(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(code): Path<String>,
) -> Result<Json<AckResponse>> {
    user.require_role(&[Role::Admin])?;

    if state.db.get_coupon(&code).await?.is_none() {
        return Err(AppError::NotFound(format!("Coupon {} not found", code)));
    }
    state.db.delete_coupon(&code).await?;

    tracing::info!(code = %normalize_code(&code), "Coupon deleted");
    Ok(AckResponse::ok("Coupon deleted"))
}

async fn list_members(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<MemberProfile>>> {
    user.require_role(&[Role::Admin])?;
    let now = chrono::Utc::now();
    let members = state.db.list_members().await?;
    Ok(Json(
        members
            .into_iter()
            .map(|m| MemberProfile::from_member(m, now))
            .collect(),
    ))
}

async fn delete_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(member_id): Path<String>,
) -> Result<Json<DeleteMemberResponse>> {
    user.require_role(&[Role::Admin])?;

    if state.db.get_member(&member_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Member {} not found", member_id)));
    }

    tracing::info!(member_id = %member_id, "Admin-initiated member deletion");
    let deleted_documents = state.db.delete_member_data(&member_id).await?;

    Ok(Json(DeleteMemberResponse {
        success: true,
        deleted_documents,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_request_validation() {
        let req: CreateCouponRequest = serde_json::from_str(
            r#"{"code":"summer-25","discountPercent":25,"expiryDate":"2030-01-01"}"#,
        )
        .unwrap();
        assert!(req.is_active);
        assert!(req.validate().is_ok());

        let req: CreateCouponRequest = serde_json::from_str(
            r#"{"code":"x","discountPercent":0,"expiryDate":"soon","isActive":false}"#,
        )
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("code"));
        assert!(fields.contains_key("discount_percent"));
        assert!(fields.contains_key("expiry_date"));
    }
}
