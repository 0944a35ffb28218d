// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coupon validation, order creation, and payment verification routes.
//!
//! Orders are priced on the server from the plan catalog and any coupon.
//! Verification checks the gateway signature and then consumes the payment
//! exactly once.

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::models::coupon::normalize_code;
use crate::models::payment::{discounted_price, find_plan, MembershipPlan, CURRENCY};
use crate::models::{Membership, Order, OrderStatus, Role};
use crate::routes::members::load_member;
use crate::time_utils::{now_sortable, sortable_timestamp};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Public coupon lookup.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/coupons/{code}", get(validate_coupon))
}

/// Member payment routes (auth applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create-order", post(create_order))
        .route("/verify-payment", post(verify_payment))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CouponResponse {
    pub code: String,
    pub discount_percent: u8,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 64))]
    pub plan_name: String,
    #[validate(length(max = 64))]
    pub coupon_code: Option<String>,
    /// Client-computed price; must agree with the server's if present.
    pub amount: Option<u64>,
}

/// Everything the checkout widget needs to open a payment.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OrderResponse {
    pub order_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub amount: u64,
    pub currency: String,
    pub plan_name: String,
    pub key_id: String,
    /// Present when the order cost nothing and the membership is already
    /// active; no checkout is needed.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(optional))]
    pub membership: Option<Membership>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, max = 128))]
    pub order_ref: String,
    #[validate(length(min = 1, max = 128))]
    pub payment_ref: String,
    #[validate(length(min = 1, max = 256))]
    pub signature: String,
    pub plan_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub membership: Membership,
}

/// Resolve a coupon code to its current discount.
async fn coupon_discount(state: &AppState, code: &str) -> Result<(String, u8)> {
    let code = normalize_code(code);
    let invalid = || AppError::Validation("Invalid or expired coupon".to_string());
    if code.is_empty() {
        return Err(invalid());
    }

    let coupon = state.db.get_coupon(&code).await?.ok_or_else(invalid)?;
    let percent = coupon.discount_at(chrono::Utc::now()).ok_or_else(invalid)?;
    Ok((coupon.code, percent))
}

/// Price a plan with an optional coupon.
async fn quote(
    state: &AppState,
    plan: &MembershipPlan,
    coupon_code: Option<&str>,
) -> Result<(u64, Option<String>)> {
    match coupon_code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => {
            let (code, percent) = coupon_discount(state, code).await?;
            Ok((discounted_price(plan.price, percent), Some(code)))
        }
        None => Ok((plan.price, None)),
    }
}

async fn validate_coupon(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<CouponResponse>> {
    let (code, discount_percent) = coupon_discount(&state, &code).await?;
    Ok(Json(CouponResponse {
        code,
        discount_percent,
    }))
}

/// Open a gateway order for a membership plan and mark the member pending.
///
/// A fully discounted order never reaches the gateway; it is recorded and
/// redeemed at once.
async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<CreateOrderRequest>,
) -> Result<Json<OrderResponse>> {
    user.require_role(&[Role::Member])?;

    let plan = find_plan(&req.plan_name)
        .ok_or_else(|| AppError::Validation(format!("Unknown plan '{}'", req.plan_name)))?;
    let (amount, coupon_code) = quote(&state, plan, req.coupon_code.as_deref()).await?;

    if let Some(client_amount) = req.amount {
        if client_amount != amount {
            tracing::warn!(
                member_id = %user.subject_id,
                client_amount,
                amount,
                "Client price disagrees with server price"
            );
            return Err(AppError::Validation(format!(
                "amount {} does not match price {}",
                client_amount, amount
            )));
        }
    }

    let member = load_member(&state, &user.subject_id).await?;

    let order_ref = if amount == 0 {
        format!("free_{}", uuid::Uuid::new_v4().simple())
    } else {
        let receipt = format!("rcpt_{}", uuid::Uuid::new_v4().simple());
        state
            .gateway
            .create_order(amount, CURRENCY, &receipt, &member.id, plan.name)
            .await?
            .id
    };

    let now = now_sortable();
    let order = Order {
        order_ref,
        member_id: member.id.clone(),
        plan_name: plan.name.to_string(),
        amount,
        currency: CURRENCY.to_string(),
        coupon_code,
        status: OrderStatus::Created,
        created_at: now.clone(),
        paid_at: None,
    };

    let member = state
        .db
        .create_order_atomic(&order, &member.id, &now)
        .await?;

    tracing::info!(
        member_id = %member.id,
        order_ref = %order.order_ref,
        plan = %order.plan_name,
        amount,
        "Order created"
    );

    // Nothing to collect: consume the order immediately, keyed by its own ref.
    let membership = if amount == 0 {
        let member = state
            .db
            .redeem_payment_atomic(
                &order.order_ref,
                &order.order_ref,
                &member.id,
                chrono::Utc::now(),
            )
            .await?;
        Some(member.membership)
    } else {
        None
    };

    Ok(Json(OrderResponse {
        order_id: order.order_ref,
        amount,
        currency: order.currency,
        plan_name: order.plan_name,
        key_id: state.gateway.key_id().to_string(),
        membership,
    }))
}

/// Verify a checkout signature and activate the membership.
async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    user.require_role(&[Role::Member])?;

    if !state
        .gateway
        .verify_signature(&req.order_ref, &req.payment_ref, &req.signature)
    {
        tracing::warn!(
            member_id = %user.subject_id,
            order_ref = %req.order_ref,
            "Payment signature mismatch"
        );
        return Err(AppError::SignatureInvalid);
    }

    if let Some(plan_name) = req.plan_name.as_deref() {
        let order = state
            .db
            .get_order(&req.order_ref)
            .await?
            .filter(|o| o.member_id == user.subject_id)
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", req.order_ref)))?;
        if !order.plan_name.eq_ignore_ascii_case(plan_name.trim()) {
            return Err(AppError::Validation(format!(
                "planName '{}' does not match the order",
                plan_name
            )));
        }
    }

    let now = chrono::Utc::now();
    let member = state
        .db
        .redeem_payment_atomic(&req.order_ref, &req.payment_ref, &user.subject_id, now)
        .await?;

    tracing::debug!(
        member_id = %member.id,
        activated_at = %sortable_timestamp(now),
        "Payment verified"
    );

    Ok(Json(VerifyPaymentResponse {
        success: true,
        membership: member.membership,
    }))
}
