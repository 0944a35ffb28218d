// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar event routes, scoped to the calling subject.

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::models::Event;
use crate::routes::AckResponse;
use crate::time_utils::{now_sortable, parse_utc};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::{Validate, ValidationError};

const MAX_TITLE_CHARS: usize = 200;

/// Event routes (auth applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", put(update_event).delete(delete_event))
}

fn validate_title(title: &str) -> std::result::Result<(), ValidationError> {
    let len = title.trim().chars().count();
    if (1..=MAX_TITLE_CHARS).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::new("title_length"))
    }
}

fn validate_date(date: &str) -> std::result::Result<(), ValidationError> {
    parse_utc(date)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("date_format"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    /// RFC3339 or `YYYY-MM-DD`
    #[validate(custom(function = "validate_date"))]
    pub date: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateEventRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_date"))]
    pub date: Option<String>,
}

fn parse_date(raw: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    parse_utc(raw).ok_or_else(|| AppError::Validation(format!("invalid date '{}'", raw)))
}

/// Fetch an event owned by `owner_id`; other owners' events are NotFound.
async fn load_owned_event(state: &AppState, owner_id: &str, event_id: &str) -> Result<Event> {
    state
        .db
        .get_event(event_id)
        .await?
        .filter(|e| e.owner_id == owner_id)
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Event>>> {
    Ok(Json(state.db.list_events_for_owner(&user.subject_id).await?))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)> {
    let event = Event {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: user.subject_id,
        title: req.title.trim().to_string(),
        date: parse_date(&req.date)?,
        created_at: now_sortable(),
    };
    state.db.upsert_event(&event).await?;

    tracing::debug!(event_id = %event.id, owner_id = %event.owner_id, "Event created");
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateEventRequest>,
) -> Result<Json<Event>> {
    let mut event = load_owned_event(&state, &user.subject_id, &event_id).await?;

    if let Some(title) = req.title {
        event.title = title.trim().to_string();
    }
    if let Some(date) = req.date {
        event.date = parse_date(&date)?;
    }
    state.db.upsert_event(&event).await?;

    Ok(Json(event))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> Result<Json<AckResponse>> {
    let event = load_owned_event(&state, &user.subject_id, &event_id).await?;
    state.db.delete_event(&event.id).await?;

    tracing::debug!(event_id = %event.id, "Event deleted");
    Ok(AckResponse::ok("Event deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_trimmed_before_length_check() {
        assert!(validate_title("Leg day").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_CHARS)).is_ok());
        assert!(validate_title(&"x".repeat(MAX_TITLE_CHARS + 1)).is_err());
    }

    #[test]
    fn test_update_rejects_unknown_fields() {
        assert!(serde_json::from_str::<UpdateEventRequest>(r#"{"ownerId":"someone"}"#).is_err());

        let req: UpdateEventRequest = serde_json::from_str(r#"{"date":"tomorrow"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: UpdateEventRequest = serde_json::from_str(r#"{"date":"2024-07-04"}"#).unwrap();
        assert!(req.validate().is_ok());
    }
}
