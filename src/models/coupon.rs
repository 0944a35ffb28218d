//! Discount coupons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coupon stored in the `coupons` collection, keyed by [`coupon_doc_id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Canonical (uppercase) code
    pub code: String,
    /// 1..=100
    pub discount_percent: u8,
    pub expiry_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: String,
}

impl Coupon {
    /// Discount granted at `now`, or `None` if the coupon is inactive or
    /// expired. A coupon is still valid at exactly its expiry instant.
    pub fn discount_at(&self, now: DateTime<Utc>) -> Option<u8> {
        (self.is_active && self.expiry_date >= now).then_some(self.discount_percent)
    }
}

/// Canonical form used for case-insensitive matching.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Firestore document id for a coupon code.
pub fn coupon_doc_id(code: &str) -> String {
    urlencoding::encode(&normalize_code(code)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(expiry: DateTime<Utc>, is_active: bool) -> Coupon {
        Coupon {
            code: "SUMMER25".to_string(),
            discount_percent: 25,
            expiry_date: expiry,
            is_active,
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn test_active_future_coupon_grants_discount() {
        let now = Utc::now();
        assert_eq!(coupon(now + Duration::days(10), true).discount_at(now), Some(25));
        assert_eq!(coupon(now, true).discount_at(now), Some(25));
    }

    #[test]
    fn test_expired_or_inactive_coupon_is_invalid() {
        let now = Utc::now();
        assert_eq!(coupon(now - Duration::seconds(1), true).discount_at(now), None);
        assert_eq!(coupon(now + Duration::days(10), false).discount_at(now), None);
    }

    #[test]
    fn test_code_lookup_is_case_insensitive() {
        assert_eq!(coupon_doc_id("summer25"), coupon_doc_id("SUMMER25"));
        assert_eq!(coupon_doc_id(" Summer25 "), "SUMMER25");
        assert_eq!(coupon_doc_id("A/B"), "A%2FB");
    }
}
