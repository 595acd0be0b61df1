// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated clients.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::client::TRIAL_PHONE;
use crate::models::{
    Credential, Dorama, ListType, SubscriptionStatus, SystemConfig, UserProfile, WatchStatus,
    Watchlists,
};
use crate::services::account::ProfilePreferences;
use crate::services::assignment::{status_for_age, CredentialStatus, RotationAlert};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Client-side placeholder ids, never persisted.
const TEMP_ID_PREFIX: &str = "temp-";

/// API routes (require a client session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).patch(update_me))
        .route("/api/credentials", get(get_credentials))
        .route("/api/credentials/{service}", get(get_credential))
        .route("/api/system-config", get(get_system_config))
        .route("/api/watchlist", get(get_watchlist).post(add_watchlist_item))
        .route(
            "/api/watchlist/{id}",
            put(update_watchlist_item).delete(delete_watchlist_item),
        )
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ServiceSubscription {
    pub service: String,
    #[serde(flatten)]
    pub status: SubscriptionStatus,
}

/// Current client response.
#[derive(Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub subscriptions: Vec<ServiceSubscription>,
}

impl MeResponse {
    fn new(profile: UserProfile) -> Self {
        let now = Utc::now();
        let subscriptions = profile
            .services
            .iter()
            .map(|service| ServiceSubscription {
                service: service.clone(),
                status: profile.subscription_status(service, now),
            })
            .collect();

        Self {
            profile,
            subscriptions,
        }
    }
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let profile = state.accounts.refresh_profile(&user.phone_number).await?;
    Ok(Json(MeResponse::new(profile)))
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(preferences): Json<ProfilePreferences>,
) -> Result<Json<MeResponse>> {
    state
        .accounts
        .update_preferences(&user.phone_number, &preferences)
        .await?;

    let profile = state.accounts.refresh_profile(&user.phone_number).await?;
    Ok(Json(MeResponse::new(profile)))
}

// ─── Credentials ─────────────────────────────────────────────

/// The login a client should use for one service.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CredentialResponse {
    pub service: String,
    /// Withheld while the subscription is blocked
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub credential: Option<Credential>,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub alert: Option<RotationAlert>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub days_active: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub status: CredentialStatus,
    pub blocked: bool,
}

async fn get_credentials(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<CredentialResponse>>> {
    let profile = state.accounts.refresh_profile(&user.phone_number).await?;
    let now = Utc::now();

    let results = state
        .credentials
        .assign_all(&user.phone_number, &profile.services, now)
        .await;

    let response = results
        .into_iter()
        .map(|(service, result)| {
            let blocked = profile.subscription_status(&service, now).is_blocked;
            CredentialResponse {
                status: status_for_age(&service, result.days_active),
                credential: if blocked { None } else { result.credential },
                alert: result.alert,
                days_active: result.days_active,
                blocked,
                service,
            }
        })
        .collect();

    Ok(Json(response))
}

async fn get_credential(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(service): Path<String>,
) -> Result<Json<CredentialResponse>> {
    let profile = state.accounts.refresh_profile(&user.phone_number).await?;
    let subscribed = profile
        .services
        .iter()
        .any(|s| s.eq_ignore_ascii_case(&service));
    // The trial account may ask for anything; the engine answers "not eligible".
    if !subscribed && user.phone_number != TRIAL_PHONE {
        return Err(AppError::Forbidden(format!("no subscription for {}", service)));
    }

    let now = Utc::now();
    let result = state
        .credentials
        .assign(&user.phone_number, &service, None, None, now)
        .await;
    let blocked = profile.subscription_status(&service, now).is_blocked;

    Ok(Json(CredentialResponse {
        status: status_for_age(&service, result.days_active),
        credential: if blocked { None } else { result.credential },
        alert: result.alert,
        days_active: result.days_active,
        blocked,
        service,
    }))
}

async fn get_system_config(State(state): State<Arc<AppState>>) -> Json<SystemConfig> {
    Json(state.admin.system_config().await)
}

// ─── Watch-lists ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct WatchlistItemRequest {
    pub list_type: ListType,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub thumbnail: String,
    pub status: WatchStatus,
    #[serde(default)]
    pub episodes_watched: Option<u32>,
    #[serde(default)]
    pub total_episodes: Option<u32>,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<u8>,
}

impl WatchlistItemRequest {
    fn into_item(self, id: String, phone_number: &str, created_at: Option<String>) -> Dorama {
        Dorama {
            id,
            phone_number: phone_number.to_string(),
            list_type: self.list_type,
            title: self.title.trim().to_string(),
            genre: self.genre,
            thumbnail: self.thumbnail,
            status: self.status,
            episodes_watched: self.episodes_watched,
            total_episodes: self.total_episodes,
            season: self.season,
            rating: self.rating,
            created_at,
        }
    }
}

async fn get_watchlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Watchlists>> {
    let items = state.store.list_doramas(&user.phone_number).await?;
    Ok(Json(Watchlists::from_items(items)))
}

async fn add_watchlist_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<WatchlistItemRequest>,
) -> Result<(StatusCode, Json<Dorama>)> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let item = request.into_item(
        uuid::Uuid::new_v4().to_string(),
        &user.phone_number,
        Some(format_utc_rfc3339(Utc::now())),
    );
    state.store.save_dorama(&item).await?;

    tracing::debug!(phone = %user.phone_number, title = %item.title, "Watch-list item added");
    Ok((StatusCode::CREATED, Json(item)))
}

/// Load an item owned by the caller.
async fn owned_item(state: &AppState, user: &AuthUser, id: &str) -> Result<Dorama> {
    state
        .store
        .get_dorama(id)
        .await?
        .filter(|item| item.phone_number == user.phone_number)
        .ok_or_else(|| AppError::NotFound(format!("watch-list item {}", id)))
}

async fn update_watchlist_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<WatchlistItemRequest>,
) -> Result<StatusCode> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if id.starts_with(TEMP_ID_PREFIX) {
        return Ok(StatusCode::NO_CONTENT);
    }

    let existing = owned_item(&state, &user, &id).await?;
    let item = request.into_item(existing.id, &user.phone_number, existing.created_at);
    state.store.save_dorama(&item).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_watchlist_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if id.starts_with(TEMP_ID_PREFIX) {
        return Ok(StatusCode::NO_CONTENT);
    }

    owned_item(&state, &user, &id).await?;
    state.store.delete_dorama(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
