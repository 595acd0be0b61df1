// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Store-backed credential service.
//!
//! Reads for assignment never fail: a store error is logged and treated as
//! an empty pool or roster, so the dashboard shows "nothing assigned" rather
//! than an error page. Admin writes propagate errors as usual.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{ClientRecord, Credential, SERVICE_CATALOG};
use crate::services::assignment::{
    self, days_active, status_for_age, AssignmentResult, CredentialStatus, Snapshot,
};

/// Admin list entry for one credential.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialOverview {
    #[serde(flatten)]
    pub credential: Credential,
    pub days_active: i64,
    pub status: CredentialStatus,
    pub assigned_count: usize,
}

/// Fields an admin may change on an existing credential.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialUpdate {
    pub service: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn Store>,
}

impl CredentialService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // ─── Reads (errors absorbed) ─────────────────────────────────

    /// All credentials, or an empty list if the store is unreachable.
    pub async fn fetch_credentials(&self) -> Vec<Credential> {
        match self.store.list_credentials().await {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::warn!(error = %e, "Credential fetch failed, treating pool as empty");
                Vec::new()
            }
        }
    }

    /// All client rows, or an empty list if the store is unreachable.
    pub async fn fetch_clients(&self) -> Vec<ClientRecord> {
        match self.store.list_clients().await {
            Ok(clients) => clients,
            Err(e) => {
                tracing::warn!(error = %e, "Client fetch failed, treating roster as empty");
                Vec::new()
            }
        }
    }

    /// Fetch both collections concurrently.
    pub async fn snapshot(&self) -> Snapshot {
        let (credentials, clients) = tokio::join!(self.fetch_credentials(), self.fetch_clients());
        Snapshot::new(credentials, clients)
    }

    /// Credential for `phone_number` on `service`.
    ///
    /// Preloaded lists skip the matching store call; the result is the same
    /// either way.
    pub async fn assign(
        &self,
        phone_number: &str,
        service: &str,
        preloaded_credentials: Option<&[Credential]>,
        preloaded_clients: Option<&[ClientRecord]>,
        now: DateTime<Utc>,
    ) -> AssignmentResult {
        let fetched_credentials;
        let credentials = match preloaded_credentials {
            Some(list) => list,
            None => {
                fetched_credentials = self.fetch_credentials().await;
                &fetched_credentials
            }
        };

        let fetched_clients;
        let clients = match preloaded_clients {
            Some(list) => list,
            None => {
                fetched_clients = self.fetch_clients().await;
                &fetched_clients
            }
        };

        assignment::assign(
            phone_number,
            service,
            credentials,
            clients,
            now,
            &mut rand::thread_rng(),
        )
    }

    /// Assignments for several services from one snapshot.
    pub async fn assign_all(
        &self,
        phone_number: &str,
        services: &[String],
        now: DateTime<Utc>,
    ) -> Vec<(String, AssignmentResult)> {
        let snapshot = self.snapshot().await;
        let mut rng = rand::thread_rng();

        services
            .iter()
            .map(|service| {
                let result = snapshot.assign(phone_number, service, now, &mut rng);
                (service.clone(), result)
            })
            .collect()
    }

    /// Clients currently assigned to `credential`.
    pub async fn assigned_clients(
        &self,
        credential: &Credential,
        preloaded_clients: Option<&[ClientRecord]>,
    ) -> Vec<ClientRecord> {
        let credentials = self.fetch_credentials().await;

        let fetched_clients;
        let clients = match preloaded_clients {
            Some(list) => list,
            None => {
                fetched_clients = self.fetch_clients().await;
                &fetched_clients
            }
        };

        assignment::assigned_clients(credential, &credentials, clients)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn assigned_count(
        &self,
        credential: &Credential,
        preloaded_clients: Option<&[ClientRecord]>,
    ) -> usize {
        self.assigned_clients(credential, preloaded_clients)
            .await
            .len()
    }

    /// Every credential with its age, colour and assignee count.
    pub async fn overview(&self, now: DateTime<Utc>) -> Vec<CredentialOverview> {
        let snapshot = self.snapshot().await;

        let mut entries: Vec<CredentialOverview> = snapshot
            .credentials
            .iter()
            .map(|credential| {
                let day = days_active(credential, now);
                CredentialOverview {
                    credential: credential.clone(),
                    days_active: day,
                    status: status_for_age(&credential.service, day),
                    assigned_count: snapshot.assigned_clients(credential).len(),
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            a.credential
                .service
                .cmp(&b.credential.service)
                .then(a.credential.published_at.cmp(&b.credential.published_at))
        });
        entries
    }

    /// Visible credentials per catalog service. Unknown labels count under
    /// their own name.
    pub async fn visible_counts(&self) -> Vec<(String, usize)> {
        let credentials = self.fetch_credentials().await;

        let mut counts: Vec<(String, usize)> = SERVICE_CATALOG
            .iter()
            .map(|s| (s.to_string(), 0))
            .collect();

        for credential in credentials.iter().filter(|c| c.is_visible) {
            let name = SERVICE_CATALOG
                .iter()
                .find(|s| credential.service.contains(*s))
                .map(|s| s.to_string())
                .unwrap_or_else(|| credential.service.clone());

            match counts.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name, 1)),
            }
        }
        counts
    }

    // ─── Admin writes ────────────────────────────────────────────

    pub async fn get(&self, id: &str) -> Result<Credential> {
        self.store
            .get_credential(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("credential {}", id)))
    }

    /// Publish a new visible credential dated `now`.
    pub async fn create(
        &self,
        service: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Credential> {
        let credential = Credential::new(service, email, password, now);
        self.store.save_credential(&credential).await?;

        tracing::info!(
            id = %credential.id,
            service = %credential.service,
            "Credential published"
        );
        Ok(credential)
    }

    /// Publish one credential per `email:password` line.
    ///
    /// Fields may be separated by `:`, `|`, `;` or whitespace. Lines with
    /// fewer than two fields are skipped.
    pub async fn import_bulk(
        &self,
        service: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Credential>> {
        let mut created = Vec::new();
        for line in text.lines() {
            let fields: Vec<&str> = line
                .split(|c: char| c == ':' || c == '|' || c == ';' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .collect();

            if let [email, password, ..] = fields.as_slice() {
                created.push(self.create(service, email, password, now).await?);
            }
        }
        Ok(created)
    }

    /// Replace a credential's login.
    ///
    /// A new login starts a new lifecycle, so the credential is republished
    /// at `now` and made visible again.
    pub async fn update(
        &self,
        id: &str,
        update: CredentialUpdate,
        now: DateTime<Utc>,
    ) -> Result<Credential> {
        let mut credential = self.get(id).await?;

        if let Some(service) = update.service {
            credential.service = service.trim().to_string();
        }
        if let Some(email) = update.email {
            credential.email = email.trim().to_string();
        }
        if let Some(password) = update.password {
            credential.password = password.trim().to_string();
        }
        credential.published_at = now;
        credential.is_visible = true;

        self.store.save_credential(&credential).await?;
        tracing::info!(id = %credential.id, "Credential republished");
        Ok(credential)
    }

    /// Flip visibility. Hidden credentials leave the pool; their clients move
    /// to other credentials on the next read.
    pub async fn toggle_visibility(&self, id: &str) -> Result<Credential> {
        let mut credential = self.get(id).await?;
        credential.is_visible = !credential.is_visible;
        self.store.save_credential(&credential).await?;

        tracing::info!(
            id = %credential.id,
            visible = credential.is_visible,
            "Credential visibility changed"
        );
        Ok(credential)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.get(id).await?;
        self.store.delete_credential(id).await?;
        tracing::info!(id, "Credential deleted");
        Ok(())
    }
}
