//! Account model: the single credential record behind every member/trainer.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::ValidationError;

/// Role carried by an account and embedded in its tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Role {
    Member,
    Trainer,
    /// Configured back-office operator; never stored in Firestore.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Trainer => "trainer",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact phone: 7..=20 characters of digits, spaces, and `+-()`, with at
/// least one digit.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let len = phone.chars().count();
    let charset_ok = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if (7..=20).contains(&len) && charset_ok && phone.chars().any(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_format"))
    }
}

/// Credential record stored in the `accounts` collection.
///
/// The role profile (`members/{id}` or `trainers/{id}`) shares the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account ID (also used as document ID)
    pub id: String,
    pub username: String,
    /// Lowercased email address
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub phone: String,
    pub role: Role,
    pub created_at: String,
}

/// Account fields safe to return to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AccountSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            role: account.role,
        }
    }
}
