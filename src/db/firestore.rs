// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing the store traits.
//!
//! Collections:
//! - `app_credentials` (shared streaming logins)
//! - `clients` (one row per purchase, soft-deleted)
//! - `admin_users` (admin panel logins)
//! - `user_doramas` (watch-list items)
//! - `system_config` (banner document)

use async_trait::async_trait;
use futures_util::{stream, StreamExt};

use crate::db::{
    collections, AdminStore, ClientStore, CredentialStore, SystemConfigStore, WatchlistStore,
    SYSTEM_CONFIG_DOC_ID,
};
use crate::error::AppError;
use crate::models::{AdminUser, ClientRecord, Credential, Dorama, SystemConfig};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Emulator connection with a dummy bearer token.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJlbXVsYXRvciJ9."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore emulator");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Offline client for tests. Every operation returns a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn connection(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

// ─── Credential Operations ──────────────────────────────────────

#[async_trait]
impl CredentialStore for FirestoreDb {
    async fn list_credentials(&self) -> Result<Vec<Credential>, AppError> {
        let rows: Vec<Credential> = self
            .connection()?
            .fluent()
            .select()
            .from(collections::CREDENTIALS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().filter(|c| !c.is_system_config()).collect())
    }

    async fn get_credential(&self, id: &str) -> Result<Option<Credential>, AppError> {
        let row: Option<Credential> = self
            .connection()?
            .fluent()
            .select()
            .by_id_in(collections::CREDENTIALS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.filter(|c| !c.is_system_config()))
    }

    async fn save_credential(&self, credential: &Credential) -> Result<(), AppError> {
        let _: () = self
            .connection()?
            .fluent()
            .update()
            .in_col(collections::CREDENTIALS)
            .document_id(&credential.id)
            .object(credential)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_credential(&self, id: &str) -> Result<(), AppError> {
        self.connection()?
            .fluent()
            .delete()
            .from(collections::CREDENTIALS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─── Client Operations ──────────────────────────────────────────

#[async_trait]
impl ClientStore for FirestoreDb {
    async fn list_clients(&self) -> Result<Vec<ClientRecord>, AppError> {
        self.connection()?
            .fluent()
            .select()
            .from(collections::CLIENTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_client(&self, id: &str) -> Result<Option<ClientRecord>, AppError> {
        self.connection()?
            .fluent()
            .select()
            .by_id_in(collections::CLIENTS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn clients_by_phone(&self, phone_number: &str) -> Result<Vec<ClientRecord>, AppError> {
        let phone_number = phone_number.to_string();
        self.connection()?
            .fluent()
            .select()
            .from(collections::CLIENTS)
            .filter(move |q| q.for_all([q.field("phone_number").eq(phone_number.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Firestore has no suffix operator, so this scans the collection.
    async fn clients_by_phone_suffix(&self, suffix: &str) -> Result<Vec<ClientRecord>, AppError> {
        let rows = self.list_clients().await?;
        Ok(rows
            .into_iter()
            .filter(|c| c.phone_number.ends_with(suffix))
            .collect())
    }

    async fn save_client(&self, client: &ClientRecord) -> Result<(), AppError> {
        let _: () = self
            .connection()?
            .fluent()
            .update()
            .in_col(collections::CLIENTS)
            .document_id(&client.id)
            .object(client)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Concurrent writes with a limit to avoid overloading Firestore.
    async fn save_clients(&self, clients: &[ClientRecord]) -> Result<(), AppError> {
        let db = self.connection()?;

        // Each future owns its row so the boxed trait future stays `Send`.
        stream::iter(clients.to_vec())
            .map(|client| async move {
                let _: () = db
                    .fluent()
                    .update()
                    .in_col(collections::CLIENTS)
                    .document_id(&client.id)
                    .object(&client)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::debug!(count = clients.len(), "Saved client rows");
        Ok(())
    }
}

// ─── Admin Operations ───────────────────────────────────────────

#[async_trait]
impl AdminStore for FirestoreDb {
    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>, AppError> {
        let username = username.to_string();
        let admins: Vec<AdminUser> = self
            .connection()?
            .fluent()
            .select()
            .from(collections::ADMIN_USERS)
            .filter(move |q| q.for_all([q.field("username").eq(username.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(admins.into_iter().next())
    }
}

// ─── System Config Operations ───────────────────────────────────

#[async_trait]
impl SystemConfigStore for FirestoreDb {
    async fn get_system_config(&self) -> Result<Option<SystemConfig>, AppError> {
        self.connection()?
            .fluent()
            .select()
            .by_id_in(collections::SYSTEM_CONFIG)
            .obj()
            .one(SYSTEM_CONFIG_DOC_ID)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn save_system_config(&self, config: &SystemConfig) -> Result<(), AppError> {
        let _: () = self
            .connection()?
            .fluent()
            .update()
            .in_col(collections::SYSTEM_CONFIG)
            .document_id(SYSTEM_CONFIG_DOC_ID)
            .object(config)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─── Watch-list Operations ──────────────────────────────────────

#[async_trait]
impl WatchlistStore for FirestoreDb {
    async fn list_doramas(&self, phone_number: &str) -> Result<Vec<Dorama>, AppError> {
        let phone_number = phone_number.to_string();
        self.connection()?
            .fluent()
            .select()
            .from(collections::USER_DORAMAS)
            .filter(move |q| q.for_all([q.field("phone_number").eq(phone_number.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_dorama(&self, id: &str) -> Result<Option<Dorama>, AppError> {
        self.connection()?
            .fluent()
            .select()
            .by_id_in(collections::USER_DORAMAS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn save_dorama(&self, item: &Dorama) -> Result<(), AppError> {
        let _: () = self
            .connection()?
            .fluent()
            .update()
            .in_col(collections::USER_DORAMAS)
            .document_id(&item.id)
            .object(item)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_dorama(&self, id: &str) -> Result<(), AppError> {
        self.connection()?
            .fluent()
            .delete()
            .from(collections::USER_DORAMAS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
