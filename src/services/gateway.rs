// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment gateway client (Razorpay-compatible orders API).
//!
//! Handles:
//! - Order creation (`POST {base}/orders`, HTTP basic auth with key id/secret)
//! - Checkout signature verification: hex HMAC-SHA256 of
//!   `"{order_id}|{payment_id}"` keyed with the gateway secret

use crate::error::AppError;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Payment gateway client.
#[derive(Clone)]
pub struct PaymentGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

/// Order creation request body.
#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    /// Minor currency units
    amount: u64,
    currency: &'a str,
    receipt: &'a str,
    notes: OrderNotes<'a>,
}

#[derive(Debug, Serialize)]
struct OrderNotes<'a> {
    member_id: &'a str,
    plan_name: &'a str,
}

/// Order as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl PaymentGateway {
    /// Create a new gateway client with API credentials.
    pub fn new(base_url: String, key_id: String, key_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id,
            key_secret,
        }
    }

    /// Public key id (handed to the frontend checkout).
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create an order for `amount` minor units.
    pub async fn create_order(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
        member_id: &str,
        plan_name: &str,
    ) -> Result<GatewayOrder, AppError> {
        let url = format!("{}/orders", self.base_url);
        let body = CreateOrderRequest {
            amount,
            currency,
            receipt,
            notes: OrderNotes {
                member_id,
                plan_name,
            },
        };

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Order request failed: {}", e)))?;

        let order: GatewayOrder = self.check_response_json(response).await?;

        if order.amount != amount || !order.currency.eq_ignore_ascii_case(currency) {
            return Err(AppError::Gateway(format!(
                "Gateway order {} is {} {}, requested {} {}",
                order.id, order.amount, order.currency, amount, currency
            )));
        }

        tracing::info!(
            order_ref = %order.id,
            amount,
            status = ?order.status,
            "Gateway order created"
        );

        Ok(order)
    }

    /// Verify a checkout signature with this gateway's secret.
    pub fn verify_signature(&self, order_ref: &str, payment_ref: &str, signature: &str) -> bool {
        verify_signature(
            self.key_secret.as_bytes(),
            order_ref,
            payment_ref,
            signature,
        )
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::Gateway(
                    "Gateway rejected API credentials".to_string(),
                ));
            }

            return Err(AppError::Gateway(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("JSON parse error: {}", e)))
    }
}

/// Hex signature the gateway produces for an order/payment pair.
pub fn sign(secret: &[u8], order_ref: &str, payment_ref: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(format!("{}|{}", order_ref, payment_ref).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a hex HMAC-SHA256 signature over `"{order_ref}|{payment_ref}"`.
///
/// The comparison is constant time. Only the exact lowercase hex form the
/// gateway emits is accepted, so an upper-cased digit is a mismatch too.
pub fn verify_signature(secret: &[u8], order_ref: &str, payment_ref: &str, signature: &str) -> bool {
    if !signature
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return false;
    }
    let Ok(provided) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(format!("{}|{}", order_ref, payment_ref).as_bytes());
    mac.verify_slice(&provided).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    const SECRET: &[u8] = b"gateway_secret";

    // base64("key_1:secret_1")
    const BASIC_AUTH: &str = "Basic a2V5XzE6c2VjcmV0XzE=";

    /// Serve `app` on an ephemeral port and return a client pointed at it.
    async fn gateway_for(app: Router) -> PaymentGateway {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        PaymentGateway::new(
            format!("http://{}/v1/", addr),
            "key_1".to_string(),
            "secret_1".to_string(),
        )
    }

    /// Echoes the requested amount back, like the real orders API.
    async fn echo_order(headers: HeaderMap, Json(req): Json<Value>) -> impl IntoResponse {
        if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(BASIC_AUTH) {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
        }
        assert_eq!(req["notes"]["member_id"], "m1");
        assert_eq!(req["notes"]["plan_name"], "Basic");
        (
            StatusCode::OK,
            Json(json!({
                "id": "order_echo1",
                "amount": req["amount"],
                "currency": req["currency"],
                "status": "created"
            })),
        )
    }

    fn fixed_reply(status: StatusCode, body: &'static str) -> Router {
        Router::new().route("/v1/orders", post(move || async move { (status, body) }))
    }

    #[tokio::test]
    async fn test_create_order_success() {
        let gateway = gateway_for(Router::new().route("/v1/orders", post(echo_order))).await;
        let order = gateway
            .create_order(99_900, "INR", "rcpt_1", "m1", "Basic")
            .await
            .unwrap();
        assert_eq!(order.id, "order_echo1");
        assert_eq!(order.amount, 99_900);
        assert_eq!(order.currency, "INR");
        assert_eq!(order.status.as_deref(), Some("created"));
    }

    #[tokio::test]
    async fn test_create_order_bad_credentials() {
        let mut gateway = gateway_for(Router::new().route("/v1/orders", post(echo_order))).await;
        gateway.key_secret = "wrong".to_string();
        match gateway.create_order(100, "INR", "r", "m1", "Basic").await {
            Err(AppError::Gateway(msg)) => assert!(msg.contains("credentials"), "{}", msg),
            other => panic!("unexpected {:?}", other.map(|o| o.id)),
        }
    }

    #[tokio::test]
    async fn test_create_order_upstream_error() {
        let gateway =
            gateway_for(fixed_reply(StatusCode::BAD_GATEWAY, r#"{"error":"down"}"#)).await;
        match gateway.create_order(100, "INR", "r", "m1", "Basic").await {
            Err(AppError::Gateway(msg)) => assert!(msg.contains("502"), "{}", msg),
            other => panic!("unexpected {:?}", other.map(|o| o.id)),
        }
    }

    #[tokio::test]
    async fn test_create_order_unparseable_body() {
        let gateway = gateway_for(fixed_reply(StatusCode::OK, "not json")).await;
        match gateway.create_order(100, "INR", "r", "m1", "Basic").await {
            Err(AppError::Gateway(msg)) => assert!(msg.contains("JSON"), "{}", msg),
            other => panic!("unexpected {:?}", other.map(|o| o.id)),
        }
    }

    #[tokio::test]
    async fn test_create_order_amount_or_currency_mismatch() {
        let gateway = gateway_for(fixed_reply(
            StatusCode::OK,
            r#"{"id":"order_x","amount":1,"currency":"INR"}"#,
        ))
        .await;
        assert!(matches!(
            gateway.create_order(100, "INR", "r", "m1", "Basic").await,
            Err(AppError::Gateway(_))
        ));

        let gateway = gateway_for(fixed_reply(
            StatusCode::OK,
            r#"{"id":"order_x","amount":100,"currency":"USD"}"#,
        ))
        .await;
        assert!(matches!(
            gateway.create_order(100, "INR", "r", "m1", "Basic").await,
            Err(AppError::Gateway(_))
        ));
    }

    #[test]
    fn test_signature_roundtrip() {
        let sig = sign(SECRET, "order_123", "pay_456").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify_signature(SECRET, "order_123", "pay_456", &sig));
    }

    #[test]
    fn test_signature_wrong_secret() {
        let sig = sign(SECRET, "order_123", "pay_456").unwrap();
        assert!(!verify_signature(b"other_secret", "order_123", "pay_456", &sig));
    }

    #[test]
    fn test_signature_rejects_non_hex_and_truncated() {
        let sig = sign(SECRET, "order_123", "pay_456").unwrap();
        assert!(!verify_signature(SECRET, "order_123", "pay_456", "zz"));
        assert!(!verify_signature(SECRET, "order_123", "pay_456", &sig[..62]));
        assert!(!verify_signature(SECRET, "order_123", "pay_456", ""));
    }

    #[test]
    fn test_separator_is_significant() {
        // "a|bc" and "ab|c" must not collide.
        let sig = sign(SECRET, "a", "bc").unwrap();
        assert!(!verify_signature(SECRET, "ab", "c", &sig));
    }
}
