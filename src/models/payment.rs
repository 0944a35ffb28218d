//! Membership plans, orders, and payment redemptions.

use serde::{Deserialize, Serialize};

/// Currency for every order.
pub const CURRENCY: &str = "INR";

/// A purchasable membership plan. Prices are in minor units (paise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPlan {
    pub name: &'static str,
    pub price: u64,
}

/// Plan catalog; orders are always priced from here, never from the client.
pub const PLAN_CATALOG: &[MembershipPlan] = &[
    MembershipPlan {
        name: "Basic",
        price: 99_900,
    },
    MembershipPlan {
        name: "Standard",
        price: 199_900,
    },
    MembershipPlan {
        name: "Premium",
        price: 299_900,
    },
];

/// Case-insensitive plan lookup.
pub fn find_plan(name: &str) -> Option<&'static MembershipPlan> {
    let name = name.trim();
    PLAN_CATALOG
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Price after a percentage discount, rounded down.
pub fn discounted_price(base: u64, discount_percent: u8) -> u64 {
    let percent = u64::from(discount_percent.min(100));
    base * (100 - percent) / 100
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Paid,
}

/// Order stored in the `orders` collection, keyed by the gateway order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_ref: String,
    pub member_id: String,
    /// Canonical catalog name
    pub plan_name: String,
    /// Server-derived amount in minor units
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
    pub status: OrderStatus,
    pub created_at: String,
    #[serde(default)]
    pub paid_at: Option<String>,
}

/// Proof that a payment was consumed, stored in `payment_redemptions`
/// keyed by the gateway payment id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub payment_ref: String,
    pub order_ref: String,
    pub member_id: String,
    pub plan_name: String,
    pub amount: u64,
    pub redeemed_at: String,
}
