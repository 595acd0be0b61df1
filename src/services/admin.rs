// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin panel operations on clients, the trial account and the banner.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::client::{normalize_phone, DEMO_PHONE_PREFIX, TRIAL_PHONE};
use crate::models::{ClientRecord, SubscriptionStatus, Subscriptions, SystemConfig, UserProfile};
use crate::services::rotation::{current_trial_password, rotation_window};
use crate::time_utils::format_utc_rfc3339;

/// Monthly price used for the revenue estimate.
const PRICE_PER_CLIENT: u64 = 15;

/// Clients whose plan ends within this many days count as expiring.
const EXPIRING_WITHIN_DAYS: i64 = 7;

const DEMO_SERVICES: [&str; 2] = ["Viki Pass", "Kocowa+"];
const DEMO_PASSWORD: &str = "123";
const DEMO_NAME: &str = "Demo account";

/// Client row as entered in the admin form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClientInput {
    #[validate(length(min = 4, max = 20))]
    pub phone_number: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_password: Option<String>,
    #[serde(default)]
    pub subscriptions: Vec<String>,
    /// Defaults to now on create
    #[serde(default)]
    pub purchase_date: Option<String>,
    #[validate(range(min = 1, max = 36))]
    #[serde(default = "default_months")]
    pub duration_months: u32,
    #[serde(default)]
    pub is_debtor: bool,
    #[serde(default)]
    pub is_contacted: bool,
    #[serde(default)]
    pub override_expiration: bool,
}

fn default_months() -> u32 {
    1
}

impl ClientInput {
    fn apply(self, row: &mut ClientRecord) {
        row.phone_number = normalize_phone(&self.phone_number);
        row.client_name = self.client_name.filter(|n| !n.trim().is_empty());
        row.client_password = self.client_password;
        row.subscriptions = Subscriptions::from_list(self.subscriptions);
        if let Some(date) = self.purchase_date.filter(|d| !d.trim().is_empty()) {
            row.purchase_date = date;
        }
        row.duration_months = self.duration_months;
        row.is_debtor = self.is_debtor;
        row.is_contacted = self.is_contacted;
        row.override_expiration = self.override_expiration;
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Non-deleted rows
    pub total_clients: usize,
    /// Non-deleted, non-debtor rows
    pub active_clients: usize,
    pub debtors: usize,
    /// Active rows whose plan ends within a week
    pub expiring_soon: usize,
    pub estimated_revenue: u64,
}

impl DashboardStats {
    pub fn compute(clients: &[ClientRecord], now: DateTime<Utc>) -> Self {
        let live: Vec<&ClientRecord> = clients.iter().filter(|c| c.is_active()).collect();
        let active: Vec<&ClientRecord> = live.iter().copied().filter(|c| !c.is_debtor).collect();

        let expiring_soon = active
            .iter()
            .filter_map(|c| c.expires_at())
            .map(|expiry| SubscriptionStatus::evaluate(expiry, now, false, false).days_left)
            .filter(|days| (0..=EXPIRING_WITHIN_DAYS).contains(days))
            .count();

        Self {
            total_clients: live.len(),
            active_clients: active.len(),
            debtors: live.len() - active.len(),
            expiring_soon,
            estimated_revenue: active.len() as u64 * PRICE_PER_CLIENT,
        }
    }
}

/// What the admin needs to hand out the trial login.
#[derive(Debug, Clone, Serialize)]
pub struct TrialPasswordInfo {
    /// Rotation password valid right now
    pub current: String,
    pub valid_from: String,
    pub valid_until: String,
    /// Manual password stored on the trial row, if any
    pub manual_override: Option<String>,
    /// Services enabled on the trial row
    pub services: Vec<String>,
}

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // ─── Clients ─────────────────────────────────────────────────

    /// Non-deleted rows sorted by phone number.
    pub async fn list_clients(&self) -> Result<Vec<ClientRecord>> {
        let mut clients: Vec<ClientRecord> = self
            .store
            .list_clients()
            .await?
            .into_iter()
            .filter(ClientRecord::is_active)
            .collect();
        clients.sort_by(|a, b| a.phone_number.cmp(&b.phone_number));
        Ok(clients)
    }

    async fn get_client(&self, id: &str) -> Result<ClientRecord> {
        self.store
            .get_client(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("client {}", id)))
    }

    pub async fn create_client(
        &self,
        input: ClientInput,
        now: DateTime<Utc>,
    ) -> Result<ClientRecord> {
        input
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let mut row = ClientRecord::new("", Subscriptions::default(), now);
        input.apply(&mut row);
        self.store.save_client(&row).await?;

        tracing::info!(id = %row.id, phone = %row.phone_number, "Client created");
        Ok(row)
    }

    pub async fn update_client(&self, id: &str, input: ClientInput) -> Result<ClientRecord> {
        input
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let mut row = self.get_client(id).await?;
        input.apply(&mut row);
        self.store.save_client(&row).await?;

        tracing::info!(id = %row.id, "Client updated");
        Ok(row)
    }

    /// Soft delete: the row stays for history but leaves every roster.
    pub async fn delete_client(&self, id: &str) -> Result<()> {
        let mut row = self.get_client(id).await?;
        row.deleted = true;
        self.store.save_client(&row).await?;

        tracing::info!(id, phone = %row.phone_number, "Client deleted");
        Ok(())
    }

    pub async fn toggle_override(&self, id: &str) -> Result<ClientRecord> {
        let mut row = self.get_client(id).await?;
        row.override_expiration = !row.override_expiration;
        self.store.save_client(&row).await?;
        Ok(row)
    }

    /// Create a one-month demo client on a random `99999xxxx` phone.
    pub async fn create_demo_client<R: Rng + ?Sized>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<ClientRecord> {
        let suffix: u32 = rng.gen_range(0..10_000);
        let phone = format!("{}{:04}", DEMO_PHONE_PREFIX, suffix);

        let mut row = ClientRecord::new(&phone, Subscriptions::from_list(DEMO_SERVICES), now);
        row.client_name = Some(DEMO_NAME.to_string());
        row.client_password = Some(DEMO_PASSWORD.to_string());
        self.store.save_client(&row).await?;

        tracing::info!(phone = %phone, "Demo client created");
        Ok(row)
    }

    /// Clear every client password; clients register again on next login.
    pub async fn reset_all_passwords(&self) -> Result<usize> {
        let mut rows = self.store.list_clients().await?;
        for row in &mut rows {
            row.client_password = Some(String::new());
        }
        self.store.save_clients(&rows).await?;

        tracing::warn!(rows = rows.len(), "All client passwords reset");
        Ok(rows.len())
    }

    /// Merged profiles for one phone with per-service status, for the admin detail view.
    pub async fn client_profile(&self, phone_number: &str) -> Result<Option<UserProfile>> {
        let rows = self.store.clients_by_phone(phone_number).await?;
        Ok(UserProfile::from_rows(&rows))
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let clients = self.store.list_clients().await?;
        Ok(DashboardStats::compute(&clients, now))
    }

    // ─── Trial account ───────────────────────────────────────────

    pub async fn trial_password_info(&self, now: DateTime<Utc>) -> Result<TrialPasswordInfo> {
        let rows = self.store.clients_by_phone(TRIAL_PHONE).await?;
        let trial = rows.iter().find(|r| r.is_active());
        let (start, end) = rotation_window(now);

        Ok(TrialPasswordInfo {
            current: current_trial_password(now),
            valid_from: format_utc_rfc3339(start),
            valid_until: format_utc_rfc3339(end),
            manual_override: trial
                .and_then(|r| r.stored_password())
                .map(str::to_string),
            services: trial
                .map(|r| r.subscriptions.service_names().map(str::to_string).collect())
                .unwrap_or_default(),
        })
    }

    /// Set the trial row's manual password (empty = rotation only) and
    /// services, creating the row on first use.
    pub async fn update_trial_account(
        &self,
        password: &str,
        services: &[String],
        now: DateTime<Utc>,
    ) -> Result<ClientRecord> {
        let rows = self.store.clients_by_phone(TRIAL_PHONE).await?;
        let mut row = match rows.into_iter().find(|r| r.is_active()) {
            Some(row) => row,
            None => ClientRecord::new(TRIAL_PHONE, Subscriptions::default(), now),
        };

        row.client_password = Some(password.trim().to_string());
        row.subscriptions = Subscriptions::from_list(services);
        self.store.save_client(&row).await?;
        Ok(row)
    }

    // ─── System config ───────────────────────────────────────────

    /// Current banner. Falls back to the default if the store is unreachable.
    pub async fn system_config(&self) -> SystemConfig {
        match self.store.get_system_config().await {
            Ok(Some(config)) => config,
            Ok(None) => SystemConfig::default(),
            Err(e) => {
                tracing::warn!(error = %e, "System config fetch failed, using default");
                SystemConfig::default()
            }
        }
    }

    pub async fn save_system_config(&self, config: &SystemConfig) -> Result<()> {
        self.store.save_system_config(config).await?;
        tracing::info!(banner_active = config.banner_active, "System config saved");
        Ok(())
    }
}
