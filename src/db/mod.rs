//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// Credential records (keyed by account id)
    pub const ACCOUNTS: &str = "accounts";
    /// Member profiles (keyed by account id)
    pub const MEMBERS: &str = "members";
    /// Trainer profiles (keyed by account id)
    pub const TRAINERS: &str = "trainers";
    pub const WORKOUT_PLANS: &str = "workout_plans";
    pub const DIET_PLANS: &str = "diet_plans";
    pub const EVENTS: &str = "events";
    /// Coupons (keyed by normalized, URL-encoded code)
    pub const COUPONS: &str = "coupons";
    /// Gateway orders (keyed by gateway order id)
    pub const ORDERS: &str = "orders";
    /// Consumed payments (keyed by gateway payment id)
    pub const PAYMENT_REDEMPTIONS: &str = "payment_redemptions";
}
