//! Calendar events, strictly scoped to their owner.

use serde::{Deserialize, Serialize};

/// Event stored in the `events` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    /// Account id of the owner (member, trainer, or the admin subject)
    pub owner_id: String,
    pub title: String,
    /// ISO-8601 date/time
    pub date: chrono::DateTime<chrono::Utc>,
    pub created_at: String,
}
