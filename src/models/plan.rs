//! Workout and diet weekly plans.
//!
//! Both plan kinds share the same document shape and operations; only the
//! per-day payload differs. [`PlanDay`] ties a day type to its collection.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::db::collections;

/// Maximum number of day entries in a weekly plan.
pub const MAX_PLAN_DAYS: usize = 7;
/// Maximum exercises or meals in a single day.
pub const MAX_ITEMS_PER_DAY: usize = 50;

/// A day entry of some plan kind.
pub trait PlanDay: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Firestore collection holding plans of this kind.
    const COLLECTION: &'static str;
    /// Human-readable kind, used in logs and error messages.
    const KIND: &'static str;

    fn day(&self) -> &str;
    fn item_count(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDay {
    pub day: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl PlanDay for WorkoutDay {
    const COLLECTION: &'static str = collections::WORKOUT_PLANS;
    const KIND: &'static str = "workout";

    fn day(&self) -> &str {
        &self.day
    }

    fn item_count(&self) -> usize {
        self.exercises.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub name: String,
    pub quantity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    /// Breakfast, lunch, snack, ...
    #[serde(rename = "type")]
    pub meal_type: String,
    #[serde(default)]
    pub foods: Vec<Food>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietDay {
    pub day: String,
    #[serde(default)]
    pub meals: Vec<Meal>,
}

impl PlanDay for DietDay {
    const COLLECTION: &'static str = collections::DIET_PLANS;
    const KIND: &'static str = "diet";

    fn day(&self) -> &str {
        &self.day
    }

    fn item_count(&self) -> usize {
        self.meals.len()
    }
}

/// A stored weekly plan. The newest by `created_at` for a member is current.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "D: PlanDay")]
pub struct Plan<D: PlanDay> {
    pub id: String,
    pub member_id: String,
    pub trainer_id: String,
    pub weekly_plan: Vec<D>,
    pub created_at: String,
    pub updated_at: String,
}

/// Structural checks on a client-supplied weekly plan.
///
/// Day names are not checked for distinctness or full-week coverage.
pub fn validate_weekly_plan<D: PlanDay>(days: &[D]) -> Result<(), String> {
    if days.len() > MAX_PLAN_DAYS {
        return Err(format!(
            "weeklyPlan has {} days, at most {} allowed",
            days.len(),
            MAX_PLAN_DAYS
        ));
    }
    for (i, day) in days.iter().enumerate() {
        if day.day().trim().is_empty() {
            return Err(format!("weeklyPlan[{}].day must not be empty", i));
        }
        if day.item_count() > MAX_ITEMS_PER_DAY {
            return Err(format!(
                "weeklyPlan[{}] has more than {} entries",
                i, MAX_ITEMS_PER_DAY
            ));
        }
    }
    Ok(())
}
