// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! EuDorama API Server
//!
//! Hands out shared streaming logins to subscribed clients and serves the
//! admin panel that manages them.

use eudorama::{config::Config, db::FirestoreDb, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting EuDorama API");

    if config.admin_master_password.is_none() {
        tracing::warn!("ADMIN_MASTER_PASSWORD not set, admin login uses admin_users only");
    }

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;
    tracing::info!(project = %config.gcp_project_id, "Firestore connected");

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), Arc::new(db)));

    // Build router
    let app = eudorama::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("eudorama=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
