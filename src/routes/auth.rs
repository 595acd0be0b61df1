// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, registration and logout routes.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, Role, SESSION_COOKIE};
use crate::models::client::TRIAL_PHONE;
use crate::models::UserProfile;
use crate::services::account::UserStatus;
use crate::AppState;

/// Trial sessions end with the rotation window, whatever the configured TTL.
const TRIAL_SESSION_SECS: u64 = 60 * 60;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/status", post(status))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/trial", post(trial_login))
        .route("/auth/admin", post(admin_login))
        .route("/auth/logout", get(logout))
}

#[derive(Deserialize, Validate)]
pub struct StatusRequest {
    #[validate(length(min = 4, max = 20))]
    pub last_digits: String,
}

#[derive(Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 4, max = 20))]
    pub phone_number: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Deserialize)]
pub struct TrialRequest {
    pub password: String,
}

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub registered: bool,
}

/// Session cookie matching the frontend's scheme.
fn session_cookie(frontend_url: &str, token: String, ttl_secs: u64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(frontend_url.starts_with("https://"))
        .max_age(time::Duration::seconds(ttl_secs as i64))
        .build()
}

fn start_session(
    state: &AppState,
    jar: CookieJar,
    subject: &str,
    role: Role,
    ttl_secs: u64,
) -> Result<(CookieJar, String)> {
    let token = create_jwt(subject, role, ttl_secs, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = session_cookie(&state.config.frontend_url, token.clone(), ttl_secs);
    Ok((jar.add(cookie), token))
}

/// Does a phone ending in these digits exist, and does it have a password yet?
async fn status(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<UserStatus>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(
        state.accounts.check_user_status(&request.last_digits).await?,
    ))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<RegisterResponse>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let registered = state
        .accounts
        .register_password(&request.phone_number, &request.password)
        .await?;

    Ok(Json(RegisterResponse { registered }))
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<CredentialsRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let profile = state
        .accounts
        .login_with_password(&request.phone_number, &request.password, Utc::now())
        .await?;

    // The trial phone never gets a long-lived session.
    let ttl = if request.phone_number == TRIAL_PHONE {
        TRIAL_SESSION_SECS
    } else {
        state.config.session_ttl_hours * 3600
    };

    let (jar, token) = start_session(&state, jar, &request.phone_number, Role::Client, ttl)?;
    tracing::info!(phone = %request.phone_number, "Client logged in");

    Ok((
        jar,
        Json(SessionResponse {
            token,
            user: Some(profile),
        }),
    ))
}

async fn trial_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<TrialRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let profile = state
        .accounts
        .trial_login(&request.password, Utc::now())
        .await?;

    let (jar, token) = start_session(&state, jar, TRIAL_PHONE, Role::Client, TRIAL_SESSION_SECS)?;
    tracing::info!("Trial session started");

    Ok((
        jar,
        Json(SessionResponse {
            token,
            user: Some(profile),
        }),
    ))
}

async fn admin_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<AdminLoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let ok = state
        .accounts
        .verify_admin(
            &request.username,
            &request.password,
            state.config.admin_master_password.as_deref(),
        )
        .await?;

    if !ok {
        tracing::warn!(username = %request.username, "Admin login rejected");
        return Err(AppError::Unauthorized);
    }

    let ttl = state.config.session_ttl_hours * 3600;
    let (jar, token) = start_session(&state, jar, request.username.trim(), Role::Admin, ttl)?;

    Ok((jar, Json(SessionResponse { token, user: None })))
}

/// Clear the session cookie with the same attributes it was set with.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let removal = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.frontend_url.starts_with("https://"))
        .build();

    (jar.remove(removal), StatusCode::NO_CONTENT)
}
