// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout and diet plan routes.
//!
//! Both plan kinds are served by the same generic handlers, instantiated per
//! [`PlanDay`] type.

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::models::plan::{validate_weekly_plan, DietDay, WorkoutDay};
use crate::models::{Plan, PlanDay, Role};
use crate::time_utils::now_sortable;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Plan routes (auth applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(plan_routes::<WorkoutDay>("/workout-plans"))
        .merge(plan_routes::<DietDay>("/diet-plans"))
}

fn plan_routes<D: PlanDay>(base: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(base, get(list_plans::<D>).post(create_plan::<D>))
        // GET takes a member id, PUT a plan id
        .route(
            &format!("{}/{{id}}", base),
            get(get_latest_plan::<D>).put(update_plan::<D>),
        )
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest<D> {
    #[validate(length(min = 1, max = 128))]
    pub member_id: String,
    pub weekly_plan: Vec<D>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest<D> {
    pub weekly_plan: Vec<D>,
}

/// Create a plan for a member, authored by the calling trainer.
async fn create_plan<D: PlanDay>(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<CreatePlanRequest<D>>,
) -> Result<(StatusCode, Json<Plan<D>>)> {
    user.require_role(&[Role::Trainer])?;
    validate_weekly_plan(&req.weekly_plan).map_err(AppError::Validation)?;

    if state.db.get_member(&req.member_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Member {} not found",
            req.member_id
        )));
    }

    let now = now_sortable();
    let plan = Plan {
        id: uuid::Uuid::new_v4().to_string(),
        member_id: req.member_id,
        trainer_id: user.subject_id,
        weekly_plan: req.weekly_plan,
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.upsert_plan(&plan).await?;

    tracing::info!(
        kind = D::KIND,
        plan_id = %plan.id,
        member_id = %plan.member_id,
        trainer_id = %plan.trainer_id,
        "Plan created"
    );

    Ok((StatusCode::CREATED, Json(plan)))
}

/// Plans authored by the calling trainer, newest first.
async fn list_plans<D: PlanDay>(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Plan<D>>>> {
    user.require_role(&[Role::Trainer])?;
    Ok(Json(state.db.plans_for_trainer(&user.subject_id).await?))
}

/// A member's current plan: the newest one, whoever wrote it.
async fn get_latest_plan<D: PlanDay>(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(member_id): Path<String>,
) -> Result<Json<Plan<D>>> {
    match user.role {
        Role::Trainer => {}
        Role::Member if user.subject_id == member_id => {}
        _ => return Err(AppError::Forbidden),
    }

    state
        .db
        .latest_plan_for_member(&member_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No {} plan for member {}", D::KIND, member_id)))
}

/// Replace the days of a plan the caller authored.
async fn update_plan<D: PlanDay>(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdatePlanRequest<D>>,
) -> Result<Json<Plan<D>>> {
    user.require_role(&[Role::Trainer])?;
    validate_weekly_plan(&req.weekly_plan).map_err(AppError::Validation)?;

    // Another trainer's plan looks the same as a missing one.
    let mut plan: Plan<D> = state
        .db
        .get_plan(&plan_id)
        .await?
        .filter(|p: &Plan<D>| p.trainer_id == user.subject_id)
        .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", plan_id)))?;

    plan.weekly_plan = req.weekly_plan;
    plan.updated_at = now_sortable();
    state.db.upsert_plan(&plan).await?;

    tracing::info!(kind = D::KIND, plan_id = %plan.id, "Plan updated");
    Ok(Json(plan))
}
