//! Trainer profile, reviews, and directory views.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::account::validate_phone;

/// A member's review of a trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub member_id: String,
    /// 1..=5
    pub rating: u8,
    pub comment: String,
    pub created_at: String,
}

/// Trainer profile stored in the `trainers` collection (id = account id).
///
/// There is no stored client list: clients are the members whose
/// `assignedTrainer` points here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trainer {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    /// Years of experience
    #[serde(default)]
    pub experience: Option<u32>,
    #[serde(default)]
    pub certification: Option<String>,
    #[serde(default)]
    pub fee_per_month: Option<u32>,
    #[serde(default)]
    pub availability: Option<String>,
    /// Public path of the uploaded photo
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub created_at: String,
    pub updated_at: String,
}

impl Trainer {
    /// Add or replace `review.member_id`'s review and recompute the rating.
    pub fn upsert_review(&mut self, review: Review) {
        match self
            .reviews
            .iter_mut()
            .find(|r| r.member_id == review.member_id)
        {
            Some(existing) => *existing = review,
            None => self.reviews.push(review),
        }
        self.rating = average_rating(&self.reviews);
    }

    pub fn apply_patch(&mut self, patch: TrainerPatch) {
        if let Some(full_name) = patch.full_name {
            self.full_name = Some(full_name);
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(age) = patch.age {
            self.age = Some(age);
        }
        if let Some(gender) = patch.gender {
            self.gender = Some(gender);
        }
        if let Some(specialization) = patch.specialization {
            self.specialization = Some(specialization);
        }
        if let Some(experience) = patch.experience {
            self.experience = Some(experience);
        }
        if let Some(certification) = patch.certification {
            self.certification = Some(certification);
        }
        if let Some(fee) = patch.fee_per_month {
            self.fee_per_month = Some(fee);
        }
        if let Some(availability) = patch.availability {
            self.availability = Some(availability);
        }
    }
}

/// Mean rating rounded to one decimal place; 0 with no reviews.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    let mean = f64::from(sum) / reviews.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// Fields a trainer may change on their own profile. Any other key is rejected.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrainerPatch {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(range(min = 16, max = 100))]
    pub age: Option<u32>,
    #[validate(length(max = 32))]
    pub gender: Option<String>,
    #[validate(length(max = 100))]
    pub specialization: Option<String>,
    #[validate(range(max = 80))]
    pub experience: Option<u32>,
    #[validate(length(max = 200))]
    pub certification: Option<String>,
    pub fee_per_month: Option<u32>,
    #[validate(length(max = 200))]
    pub availability: Option<String>,
}

/// Public directory entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerSummary {
    pub id: String,
    pub full_name: Option<String>,
    pub specialization: Option<String>,
    pub experience: Option<u32>,
    pub fee_per_month: Option<u32>,
    pub availability: Option<String>,
    pub photo: Option<String>,
    pub rating: f64,
    pub review_count: usize,
}

impl From<&Trainer> for TrainerSummary {
    fn from(t: &Trainer) -> Self {
        Self {
            id: t.id.clone(),
            full_name: t.full_name.clone(),
            specialization: t.specialization.clone(),
            experience: t.experience,
            fee_per_month: t.fee_per_month,
            availability: t.availability.clone(),
            photo: t.photo.clone(),
            rating: t.rating,
            review_count: t.reviews.len(),
        }
    }
}

/// Full trainer profile (no credentials). Contact details are included only
/// for the trainer themself and their assigned members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerProfile {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub specialization: Option<String>,
    pub experience: Option<u32>,
    pub certification: Option<String>,
    pub fee_per_month: Option<u32>,
    pub availability: Option<String>,
    pub photo: Option<String>,
    pub role: &'static str,
    pub rating: f64,
    pub reviews: Vec<Review>,
}

impl TrainerProfile {
    pub fn new(trainer: Trainer, include_contact: bool) -> Self {
        let (email, phone) = if include_contact {
            (Some(trainer.email), Some(trainer.phone))
        } else {
            (None, None)
        };
        Self {
            id: trainer.id,
            username: trainer.username,
            email,
            phone,
            full_name: trainer.full_name,
            age: trainer.age,
            gender: trainer.gender,
            specialization: trainer.specialization,
            experience: trainer.experience,
            certification: trainer.certification,
            fee_per_month: trainer.fee_per_month,
            availability: trainer.availability,
            photo: trainer.photo,
            role: "trainer",
            rating: trainer.rating,
            reviews: trainer.reviews,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(member: &str, rating: u8) -> Review {
        Review {
            member_id: member.to_string(),
            rating,
            comment: String::new(),
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
        }
    }

    fn trainer() -> Trainer {
        Trainer {
            id: "t1".to_string(),
            username: "coach".to_string(),
            email: "coach@example.com".to_string(),
            phone: "5550002".to_string(),
            full_name: Some("Coach Carter".to_string()),
            age: None,
            gender: None,
            specialization: Some("strength".to_string()),
            experience: Some(5),
            certification: None,
            fee_per_month: Some(2000),
            availability: None,
            photo: None,
            rating: 0.0,
            reviews: vec![],
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn test_average_rating_rounds_to_one_decimal() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[review("a", 5), review("b", 4), review("c", 4)]), 4.3);
    }

    #[test]
    fn test_rereview_replaces_previous() {
        let mut t = trainer();
        t.upsert_review(review("m1", 2));
        t.upsert_review(review("m2", 4));
        t.upsert_review(review("m1", 5));

        assert_eq!(t.reviews.len(), 2);
        assert_eq!(t.reviews[0].rating, 5);
        assert_eq!(t.rating, 4.5);
    }

    #[test]
    fn test_public_profile_hides_contact() {
        let public = serde_json::to_value(TrainerProfile::new(trainer(), false)).unwrap();
        assert!(public.get("email").is_none());
        assert!(public.get("phone").is_none());

        let private = serde_json::to_value(TrainerProfile::new(trainer(), true)).unwrap();
        assert_eq!(private["email"], "coach@example.com");
    }

    #[test]
    fn test_patch_rejects_rating_and_reviews() {
        assert!(serde_json::from_str::<TrainerPatch>(r#"{"rating":5}"#).is_err());
        assert!(serde_json::from_str::<TrainerPatch>(r#"{"reviews":[]}"#).is_err());
        assert!(serde_json::from_str::<TrainerPatch>(r#"{"feePerMonth":1500}"#).is_ok());
    }

    #[test]
    fn test_patch_phone_format() {
        let patch: TrainerPatch = serde_json::from_str(r#"{"phone":"+1 (555) 010-0000"}"#).unwrap();
        assert!(patch.validate().is_ok());
        let patch: TrainerPatch = serde_json::from_str(r#"{"phone":"ring ring"}"#).unwrap();
        assert!(patch.validate().is_err());
    }
}
