// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trainer directory, trainer profile, clients, photo, and review routes.

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::models::{
    MemberProfile, Review, Role, Trainer, TrainerPatch, TrainerProfile, TrainerSummary,
};
use crate::routes::members::load_member;
use crate::services::uploads::MAX_PHOTO_BYTES;
use crate::time_utils::now_sortable;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Multipart framing allowance on top of the photo itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Public directory routes.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trainers", get(list_trainers))
        .route("/trainers/{id}", get(get_trainer))
}

/// Authenticated trainer routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trainers/profile", get(get_profile).put(update_profile))
        .route("/trainers/clients", get(list_clients))
        .route(
            "/trainers/photo",
            post(upload_photo).layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES + MULTIPART_OVERHEAD)),
        )
        .route("/trainers/{id}/reviews", post(add_review))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub comment: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PhotoResponse {
    pub photo: String,
}

async fn load_trainer(state: &AppState, trainer_id: &str) -> Result<Trainer> {
    state
        .db
        .get_trainer(trainer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trainer {} not found", trainer_id)))
}

/// Public trainer directory, best rated first.
async fn list_trainers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TrainerSummary>>> {
    let trainers = state.db.list_trainers().await?;
    Ok(Json(trainers.iter().map(TrainerSummary::from).collect()))
}

/// Public trainer profile (no contact details).
async fn get_trainer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TrainerProfile>> {
    let trainer = load_trainer(&state, &id).await?;
    Ok(Json(TrainerProfile::new(trainer, false)))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TrainerProfile>> {
    user.require_role(&[Role::Trainer])?;
    let trainer = load_trainer(&state, &user.subject_id).await?;
    Ok(Json(TrainerProfile::new(trainer, true)))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(patch): ValidatedJson<TrainerPatch>,
) -> Result<Json<TrainerProfile>> {
    user.require_role(&[Role::Trainer])?;
    let mut trainer = load_trainer(&state, &user.subject_id).await?;

    let new_phone = patch.phone.clone();
    trainer.apply_patch(patch);
    trainer.updated_at = now_sortable();
    state.db.update_trainer_profile(&trainer).await?;

    if let Some(phone) = new_phone {
        if let Some(mut account) = state.db.get_account(&trainer.id).await? {
            if account.phone != phone {
                account.phone = phone;
                state.db.update_account_phone(&account).await?;
            }
        }
    }

    tracing::info!(trainer_id = %trainer.id, "Trainer profile updated");
    Ok(Json(TrainerProfile::new(trainer, true)))
}

/// Members currently assigned to the caller.
async fn list_clients(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<MemberProfile>>> {
    user.require_role(&[Role::Trainer])?;
    let now = chrono::Utc::now();
    let members = state.db.list_members_for_trainer(&user.subject_id).await?;
    Ok(Json(
        members
            .into_iter()
            .map(|m| MemberProfile::from_member(m, now))
            .collect(),
    ))
}

/// Replace the caller's profile photo (multipart field `photo`).
async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<PhotoResponse>> {
    user.require_role(&[Role::Trainer])?;
    let mut trainer = load_trainer(&state, &user.subject_id).await?;

    let mut stored = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some("photo") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("photo has no content type".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        stored = Some(state.photos.save(&content_type, &bytes).await?);
        break;
    }

    let photo = stored.ok_or_else(|| AppError::Validation("missing 'photo' field".to_string()))?;

    let previous = trainer.photo.replace(photo.clone());
    trainer.updated_at = now_sortable();
    state.db.update_trainer_photo(&trainer).await?;

    if let Some(old) = previous {
        state.photos.remove(&old).await;
    }

    tracing::info!(trainer_id = %trainer.id, photo = %photo, "Trainer photo updated");
    Ok(Json(PhotoResponse { photo }))
}

/// Rate a trainer. Only members assigned to that trainer may review, and a
/// member's later review replaces their earlier one.
async fn add_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(trainer_id): Path<String>,
    ValidatedJson(req): ValidatedJson<ReviewRequest>,
) -> Result<Json<TrainerProfile>> {
    user.require_role(&[Role::Member])?;

    let member = load_member(&state, &user.subject_id).await?;
    let trainer = load_trainer(&state, &trainer_id).await?;

    if member.assigned_trainer.as_deref() != Some(trainer.id.as_str()) {
        return Err(AppError::Forbidden);
    }

    let review = Review {
        member_id: member.id,
        rating: req.rating,
        comment: req.comment.trim().to_string(),
        created_at: now_sortable(),
    };
    let trainer = state.db.add_review_atomic(&trainer.id, review).await?;

    tracing::info!(trainer_id = %trainer.id, rating = trainer.rating, "Review recorded");
    Ok(Json(TrainerProfile::new(trainer, false)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_rating_bounds() {
        for (json, ok) in [
            (r#"{"rating":0}"#, false),
            (r#"{"rating":1,"comment":"ok"}"#, true),
            (r#"{"rating":5}"#, true),
            (r#"{"rating":6}"#, false),
        ] {
            let req: ReviewRequest = serde_json::from_str(json).unwrap();
            assert_eq!(req.validate().is_ok(), ok, "{}", json);
        }
        assert!(serde_json::from_str::<ReviewRequest>(r#"{"rating":-1}"#).is_err());
    }
}
