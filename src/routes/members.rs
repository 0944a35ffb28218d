// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member profile and trainer assignment routes.

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::models::{Member, MemberPatch, MemberProfile, Role, TrainerProfile};
use crate::routes::AckResponse;
use crate::time_utils::now_sortable;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Member routes (auth applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/members/profile", get(get_profile).put(update_profile))
        .route("/members/select-trainer", post(select_trainer))
        .route("/members/trainer", get(get_my_trainer))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectTrainerRequest {
    #[validate(length(min = 1, max = 128))]
    pub trainer_id: String,
}

/// Load the caller's member document.
pub(crate) async fn load_member(state: &AppState, member_id: &str) -> Result<Member> {
    state
        .db
        .get_member(member_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member {} not found", member_id)))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MemberProfile>> {
    user.require_role(&[Role::Member])?;
    let member = load_member(&state, &user.subject_id).await?;
    Ok(Json(MemberProfile::from_member(member, chrono::Utc::now())))
}

/// Patch the allow-listed profile fields.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(patch): ValidatedJson<MemberPatch>,
) -> Result<Json<MemberProfile>> {
    user.require_role(&[Role::Member])?;
    let mut member = load_member(&state, &user.subject_id).await?;

    let new_phone = patch.phone.clone();
    if member.apply_patch(patch) {
        member.updated_at = now_sortable();
        state.db.update_member_profile(&member).await?;

        // Keep the credential record's contact phone in step.
        if let Some(phone) = new_phone {
            if let Some(mut account) = state.db.get_account(&member.id).await? {
                if account.phone != phone {
                    account.phone = phone;
                    state.db.update_account_phone(&account).await?;
                }
            }
        }
        tracing::info!(member_id = %member.id, "Member profile updated");
    }

    Ok(Json(MemberProfile::from_member(member, chrono::Utc::now())))
}

/// Assign the caller to a trainer. Re-selecting the same trainer is a no-op.
async fn select_trainer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<SelectTrainerRequest>,
) -> Result<Json<AckResponse>> {
    user.require_role(&[Role::Member])?;

    let mut member = load_member(&state, &user.subject_id).await?;
    if state.db.get_trainer(&req.trainer_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Trainer {} not found",
            req.trainer_id
        )));
    }

    if member.assigned_trainer.as_deref() != Some(req.trainer_id.as_str()) {
        let previous = member.assigned_trainer.replace(req.trainer_id.clone());
        member.updated_at = now_sortable();
        state.db.update_member_trainer(&member).await?;
        tracing::info!(
            member_id = %member.id,
            trainer_id = %req.trainer_id,
            previous = ?previous,
            "Trainer assigned"
        );
    }

    Ok(AckResponse::ok("Trainer selected"))
}

/// The caller's assigned trainer, with contact details.
async fn get_my_trainer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TrainerProfile>> {
    user.require_role(&[Role::Member])?;
    let member = load_member(&state, &user.subject_id).await?;

    let trainer_id = member
        .assigned_trainer
        .ok_or_else(|| AppError::NotFound("No trainer assigned".to_string()))?;
    let trainer = state
        .db
        .get_trainer(&trainer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trainer {} not found", trainer_id)))?;

    Ok(Json(TrainerProfile::new(trainer, true)))
}
