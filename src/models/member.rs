//! Member profile and membership state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::account::validate_phone;

/// Length of a paid membership period.
pub const MEMBERSHIP_PERIOD_DAYS: i64 = 30;

/// Membership lifecycle: `inactive → pending → active`.
///
/// Nothing moves `active` back to `inactive` when `end_date` passes; readers
/// use [`Membership::is_expired`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    #[default]
    Inactive,
    /// An order has been created and awaits payment verification
    Pending,
    Active,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub plan_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: MembershipStatus,
}

impl Membership {
    /// Activate for one period starting at `now`.
    pub fn activate(&mut self, plan_type: &str, now: DateTime<Utc>) {
        self.plan_type = Some(plan_type.to_string());
        self.start_date = Some(now);
        self.end_date = Some(now + Duration::days(MEMBERSHIP_PERIOD_DAYS));
        self.status = MembershipStatus::Active;
    }

    /// Record that an order is outstanding. An active membership stays active
    /// until the new payment is verified. Returns true if the status changed.
    pub fn mark_pending(&mut self) -> bool {
        if self.status == MembershipStatus::Inactive {
            self.status = MembershipStatus::Pending;
            return true;
        }
        false
    }

    /// True when the stored status is active but the period has ended.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == MembershipStatus::Active && self.end_date.is_some_and(|end| end < now)
    }
}

/// Member profile stored in the `members` collection (id = account id).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub health_conditions: Option<String>,
    #[serde(default)]
    pub membership: Membership,
    /// Trainer id; the trainer's client list is derived from this field
    #[serde(default)]
    pub assigned_trainer: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Member {
    /// Apply an allow-listed patch. Returns true if any field changed.
    pub fn apply_patch(&mut self, patch: MemberPatch) -> bool {
        let before = (
            self.phone.clone(),
            self.age,
            self.gender.clone(),
            self.emergency_contact.clone(),
            self.health_conditions.clone(),
        );

        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(age) = patch.age {
            self.age = Some(age);
        }
        if let Some(gender) = patch.gender {
            self.gender = Some(gender);
        }
        if let Some(contact) = patch.emergency_contact {
            self.emergency_contact = Some(contact);
        }
        if let Some(conditions) = patch.health_conditions {
            self.health_conditions = Some(conditions);
        }

        before
            != (
                self.phone.clone(),
                self.age,
                self.gender.clone(),
                self.emergency_contact.clone(),
                self.health_conditions.clone(),
            )
    }
}

/// Fields a member may change on their own profile. Any other key is rejected.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MemberPatch {
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(range(min = 10, max = 120))]
    pub age: Option<u32>,
    #[validate(length(max = 32))]
    pub gender: Option<String>,
    #[validate(length(max = 100))]
    pub emergency_contact: Option<String>,
    #[validate(length(max = 1000))]
    pub health_conditions: Option<String>,
}

/// Member profile as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub emergency_contact: Option<String>,
    pub health_conditions: Option<String>,
    pub role: &'static str,
    pub membership: Membership,
    /// Computed at read time; the stored status is not changed
    pub membership_expired: bool,
    pub assigned_trainer: Option<String>,
}

impl MemberProfile {
    pub fn from_member(member: Member, now: DateTime<Utc>) -> Self {
        let membership_expired = member.membership.is_expired(now);
        Self {
            id: member.id,
            username: member.username,
            email: member.email,
            phone: member.phone,
            age: member.age,
            gender: member.gender,
            emergency_contact: member.emergency_contact,
            health_conditions: member.health_conditions,
            role: "member",
            membership: member.membership,
            membership_expired,
            assigned_trainer: member.assigned_trainer,
        }
    }
}
