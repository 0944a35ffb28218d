// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym Portal API Server
//!
//! Serves member/trainer accounts, plans, events, and membership payments.

use gym_portal::{config::Config, db::FirestoreDb, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment; missing secrets abort startup
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Gym Portal API");

    if config.admin.is_none() {
        tracing::warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set, admin login disabled");
    }

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tracing::info!(path = %config.upload_dir.display(), "Photo upload directory ready");

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db));

    // Build router
    let app = gym_portal::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gym_portal=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
