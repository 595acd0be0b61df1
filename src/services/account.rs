// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client login, registration and profile maintenance.
//!
//! A phone number may own several rows (one per purchase). The first
//! non-empty password found on any row is the account password; rows
//! without one are backfilled on every successful login or refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::db::Store;
use crate::error::AppError;
use crate::models::client::{normalize_phone, TRIAL_PHONE};
use crate::models::{ClientRecord, UserProfile};
use crate::services::rotation::current_trial_password;

/// Login failures shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("User not found")]
    NotFound,

    #[error("Access revoked. Please contact support.")]
    AccessRevoked,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Incorrect trial password")]
    WrongTrialPassword,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::NotFound => AppError::NotFound("user".to_string()),
            LoginError::AccessRevoked => AppError::Forbidden(err.to_string()),
            LoginError::WrongPassword | LoginError::WrongTrialPassword => AppError::Unauthorized,
            LoginError::Store(inner) => inner,
        }
    }
}

/// Login screen preview for a phone suffix.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserStatus {
    pub exists: bool,
    pub has_password: bool,
    /// Distinct full phone numbers ending with the suffix
    pub phone_matches: Vec<String>,
    pub profile: Option<ProfilePreview>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfilePreview {
    pub name: Option<String>,
    pub photo: Option<String>,
}

/// Profile fields a client may change. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePreferences {
    pub client_name: Option<String>,
    pub theme_color: Option<String>,
    pub background_image: Option<String>,
    pub profile_image: Option<String>,
}

impl ProfilePreferences {
    fn is_empty(&self) -> bool {
        self.client_name.is_none()
            && self.theme_color.is_none()
            && self.background_image.is_none()
            && self.profile_image.is_none()
    }

    fn apply(&self, row: &mut ClientRecord) {
        if let Some(name) = &self.client_name {
            row.client_name = Some(name.trim().to_string());
        }
        if let Some(color) = &self.theme_color {
            row.theme_color = Some(color.clone());
        }
        if let Some(image) = &self.background_image {
            row.background_image = Some(image.clone());
        }
        if let Some(image) = &self.profile_image {
            row.profile_image = Some(image.clone());
        }
    }
}

fn passwords_match(stored: &str, given: &str) -> bool {
    stored.trim().as_bytes().ct_eq(given.trim().as_bytes()).into()
}

/// First non-empty password on any row.
fn account_password(rows: &[ClientRecord]) -> Option<String> {
    rows.iter()
        .find_map(|r| r.stored_password())
        .map(str::to_string)
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Look up non-deleted rows whose phone ends with `last_digits`.
    pub async fn check_user_status(&self, last_digits: &str) -> Result<UserStatus, LoginError> {
        let digits = normalize_phone(last_digits);
        if digits.is_empty() {
            return Ok(UserStatus::default());
        }

        let rows: Vec<ClientRecord> = self
            .store
            .clients_by_phone_suffix(&digits)
            .await?
            .into_iter()
            .filter(ClientRecord::is_active)
            .collect();

        if rows.is_empty() {
            return Ok(UserStatus::default());
        }

        let mut phone_matches: Vec<String> = Vec::new();
        for row in &rows {
            if !phone_matches.contains(&row.phone_number) {
                phone_matches.push(row.phone_number.clone());
            }
        }

        // Prefer the most complete profile: photo and name, then name only.
        let preview_row = rows
            .iter()
            .find(|r| r.profile_image.is_some() && r.client_name.is_some())
            .or_else(|| rows.iter().find(|r| r.client_name.is_some()))
            .unwrap_or(&rows[0]);

        Ok(UserStatus {
            exists: true,
            has_password: rows.iter().any(|r| r.stored_password().is_some()),
            phone_matches,
            profile: Some(ProfilePreview {
                name: preview_row.client_name.clone(),
                photo: preview_row.profile_image.clone(),
            }),
        })
    }

    /// Set the password on every row of `phone_number`. Returns `false` if the phone has no rows.
    pub async fn register_password(
        &self,
        phone_number: &str,
        password: &str,
    ) -> Result<bool, LoginError> {
        let mut rows = self.store.clients_by_phone(phone_number).await?;
        if rows.is_empty() {
            return Ok(false);
        }

        for row in &mut rows {
            row.client_password = Some(password.trim().to_string());
        }
        self.store.save_clients(&rows).await?;

        tracing::info!(phone = %phone_number, rows = rows.len(), "Password registered");
        Ok(true)
    }

    /// Verify a password and return the merged profile.
    pub async fn login_with_password(
        &self,
        phone_number: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, LoginError> {
        let rows = self.store.clients_by_phone(phone_number).await?;
        if rows.is_empty() {
            return Err(LoginError::NotFound);
        }
        if !rows.iter().any(ClientRecord::is_active) {
            return Err(LoginError::AccessRevoked);
        }

        if phone_number == TRIAL_PHONE {
            return self.verify_trial(&rows, password, now);
        }

        let stored = account_password(&rows).ok_or(LoginError::WrongPassword)?;
        if !passwords_match(&stored, password) {
            tracing::debug!(phone = %phone_number, "Password mismatch");
            return Err(LoginError::WrongPassword);
        }

        self.backfill_password(&rows, &stored).await;
        UserProfile::from_rows(&rows).ok_or(LoginError::AccessRevoked)
    }

    /// Log in as the shared free-trial account.
    pub async fn trial_login(
        &self,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, LoginError> {
        self.login_with_password(TRIAL_PHONE, password, now).await
    }

    /// The trial row accepts its manual password or the current rotation
    /// password (case-insensitive).
    fn verify_trial(
        &self,
        rows: &[ClientRecord],
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, LoginError> {
        let manual_ok = account_password(rows).is_some_and(|p| passwords_match(&p, password));
        let rotating_ok = passwords_match(
            &current_trial_password(now),
            &password.trim().to_uppercase(),
        );

        if !(manual_ok || rotating_ok) {
            return Err(LoginError::WrongTrialPassword);
        }

        UserProfile::from_rows(rows).ok_or(LoginError::AccessRevoked)
    }

    /// Re-read and merge the rows of an already authenticated phone.
    pub async fn refresh_profile(&self, phone_number: &str) -> Result<UserProfile, LoginError> {
        let rows = self.store.clients_by_phone(phone_number).await?;
        if rows.is_empty() {
            return Err(LoginError::NotFound);
        }

        if let Some(stored) = account_password(&rows) {
            self.backfill_password(&rows, &stored).await;
        }

        UserProfile::from_rows(&rows).ok_or(LoginError::AccessRevoked)
    }

    /// Copy the account password onto rows that lack one.
    ///
    /// Failures are logged and do not fail the login.
    async fn backfill_password(&self, rows: &[ClientRecord], password: &str) {
        let missing: Vec<ClientRecord> = rows
            .iter()
            .filter(|r| r.stored_password().is_none())
            .cloned()
            .map(|mut r| {
                r.client_password = Some(password.to_string());
                r
            })
            .collect();

        if missing.is_empty() {
            return;
        }

        match self.store.save_clients(&missing).await {
            Ok(()) => tracing::info!(rows = missing.len(), "Backfilled missing passwords"),
            Err(e) => tracing::warn!(error = %e, "Password backfill failed"),
        }
    }

    /// Apply display-name and image preferences to every row of a phone.
    pub async fn update_preferences(
        &self,
        phone_number: &str,
        preferences: &ProfilePreferences,
    ) -> Result<bool, LoginError> {
        if preferences.is_empty() {
            return Ok(false);
        }

        let mut rows = self.store.clients_by_phone(phone_number).await?;
        if rows.is_empty() {
            return Ok(false);
        }

        for row in &mut rows {
            preferences.apply(row);
        }
        self.store.save_clients(&rows).await?;
        Ok(true)
    }

    /// Admin panel login: the configured master password, else an `admin_users` row.
    pub async fn verify_admin(
        &self,
        username: &str,
        password: &str,
        master_password: Option<&str>,
    ) -> Result<bool, LoginError> {
        if let Some(master) = master_password.filter(|m| !m.is_empty()) {
            if passwords_match(master, password) {
                tracing::info!(username, "Admin login with master password");
                return Ok(true);
            }
        }

        let Some(admin) = self.store.find_admin(username.trim()).await? else {
            return Ok(false);
        };
        Ok(passwords_match(&admin.password, password))
    }
}
