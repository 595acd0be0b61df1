// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin panel routes (require an admin session).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthAdmin;
use crate::models::{ClientRecord, Credential, SystemConfig, UserProfile};
use crate::services::admin::{ClientInput, DashboardStats, TrialPasswordInfo};
use crate::services::credential::{CredentialOverview, CredentialUpdate};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/admin/credentials",
            get(list_credentials).post(create_credential),
        )
        .route("/admin/credentials/bulk", post(import_credentials))
        .route(
            "/admin/credentials/{id}",
            put(update_credential).delete(delete_credential),
        )
        .route(
            "/admin/credentials/{id}/toggle-visibility",
            post(toggle_credential),
        )
        .route("/admin/credentials/{id}/clients", get(credential_clients))
        .route("/admin/clients", get(list_clients).post(create_client))
        .route("/admin/clients/demo", post(create_demo_client))
        .route("/admin/clients/reset-passwords", post(reset_passwords))
        .route(
            "/admin/clients/{id}",
            put(update_client).delete(delete_client),
        )
        .route("/admin/clients/{id}/toggle-override", post(toggle_override))
        .route("/admin/profiles/{phone}", get(client_profile))
        .route("/admin/stats", get(stats))
        .route(
            "/admin/system-config",
            get(get_system_config).put(put_system_config),
        )
        .route("/admin/trial", get(get_trial).put(put_trial))
}

// ─── Credentials ─────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct NewCredentialRequest {
    #[validate(length(min = 1, max = 64))]
    pub service: String,
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct BulkImportRequest {
    #[validate(length(min = 1, max = 64))]
    pub service: String,
    /// One `email:password` per line
    pub text: String,
}

#[derive(Serialize)]
pub struct BulkImportResponse {
    pub created: usize,
    pub credentials: Vec<Credential>,
}

async fn list_credentials(State(state): State<Arc<AppState>>) -> Json<Vec<CredentialOverview>> {
    Json(state.credentials.overview(Utc::now()).await)
}

async fn create_credential(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthAdmin>,
    Json(request): Json<NewCredentialRequest>,
) -> Result<(StatusCode, Json<Credential>)> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let credential = state
        .credentials
        .create(
            request.service.trim(),
            request.email.trim(),
            request.password.trim(),
            Utc::now(),
        )
        .await?;

    tracing::info!(admin = %admin.username, id = %credential.id, "Admin published credential");
    Ok((StatusCode::CREATED, Json(credential)))
}

async fn import_credentials(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkImportRequest>,
) -> Result<(StatusCode, Json<BulkImportResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let credentials = state
        .credentials
        .import_bulk(request.service.trim(), &request.text, Utc::now())
        .await?;

    if credentials.is_empty() {
        return Err(AppError::BadRequest(
            "no email:password lines found".to_string(),
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(BulkImportResponse {
            created: credentials.len(),
            credentials,
        }),
    ))
}

async fn update_credential(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<CredentialUpdate>,
) -> Result<Json<Credential>> {
    Ok(Json(state.credentials.update(&id, update, Utc::now()).await?))
}

async fn delete_credential(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthAdmin>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.credentials.delete(&id).await?;
    tracing::info!(admin = %admin.username, id = %id, "Admin deleted credential");
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_credential(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Credential>> {
    Ok(Json(state.credentials.toggle_visibility(&id).await?))
}

/// Who is currently routed to this credential.
async fn credential_clients(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ClientRecord>>> {
    let credential = state.credentials.get(&id).await?;
    Ok(Json(
        state.credentials.assigned_clients(&credential, None).await,
    ))
}

// ─── Clients ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ResetResponse {
    pub reset: usize,
}

async fn list_clients(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ClientRecord>>> {
    Ok(Json(state.admin.list_clients().await?))
}

async fn create_client(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ClientInput>,
) -> Result<(StatusCode, Json<ClientRecord>)> {
    let row = state.admin.create_client(input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<ClientInput>,
) -> Result<Json<ClientRecord>> {
    Ok(Json(state.admin.update_client(&id, input).await?))
}

async fn delete_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.admin.delete_client(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_override(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClientRecord>> {
    Ok(Json(state.admin.toggle_override(&id).await?))
}

async fn create_demo_client(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ClientRecord>)> {
    // StdRng is Send; the thread-local generator cannot cross the await.
    let mut rng = StdRng::from_entropy();
    let row = state.admin.create_demo_client(Utc::now(), &mut rng).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn reset_passwords(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthAdmin>,
) -> Result<Json<ResetResponse>> {
    let reset = state.admin.reset_all_passwords().await?;
    tracing::warn!(admin = %admin.username, reset, "Admin reset all passwords");
    Ok(Json(ResetResponse { reset }))
}

async fn client_profile(
    State(state): State<Arc<AppState>>,
    Path(phone): Path<String>,
) -> Result<Json<UserProfile>> {
    state
        .admin
        .client_profile(&phone)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("client {}", phone)))
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct ServiceCount {
    pub service: String,
    pub visible: usize,
}

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub credentials: Vec<ServiceCount>,
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>> {
    let (stats, counts) = tokio::join!(
        state.admin.stats(Utc::now()),
        state.credentials.visible_counts()
    );

    Ok(Json(StatsResponse {
        stats: stats?,
        credentials: counts
            .into_iter()
            .map(|(service, visible)| ServiceCount { service, visible })
            .collect(),
    }))
}

async fn get_system_config(State(state): State<Arc<AppState>>) -> Json<SystemConfig> {
    Json(state.admin.system_config().await)
}

async fn put_system_config(
    State(state): State<Arc<AppState>>,
    Json(config): Json<SystemConfig>,
) -> Result<Json<SystemConfig>> {
    state.admin.save_system_config(&config).await?;
    Ok(Json(config))
}

// ─── Trial account ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct TrialUpdateRequest {
    /// Empty leaves only the rotating password
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub services: Vec<String>,
}

async fn get_trial(State(state): State<Arc<AppState>>) -> Result<Json<TrialPasswordInfo>> {
    Ok(Json(state.admin.trial_password_info(Utc::now()).await?))
}

async fn put_trial(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrialUpdateRequest>,
) -> Result<Json<TrialPasswordInfo>> {
    let now = Utc::now();
    state
        .admin
        .update_trial_account(&request.password, &request.services, now)
        .await?;
    Ok(Json(state.admin.trial_password_info(now).await?))
}
