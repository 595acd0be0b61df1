// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Services depend on the store traits below, never on a concrete backend.
//! [`FirestoreDb`] serves production; [`MemoryStore`] backs tests and
//! offline runs.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AdminUser, ClientRecord, Credential, Dorama, SystemConfig};

/// Collection names as constants.
pub mod collections {
    pub const CLIENTS: &str = "clients";
    pub const CREDENTIALS: &str = "app_credentials";
    pub const ADMIN_USERS: &str = "admin_users";
    /// Watch-list items, keyed by item id
    pub const USER_DORAMAS: &str = "user_doramas";
    pub const SYSTEM_CONFIG: &str = "system_config";
}

/// Document ID of the single system-config document.
pub const SYSTEM_CONFIG_DOC_ID: &str = "current";

/// Shared streaming logins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// All credential rows, visible or not. Legacy system-config rows are skipped.
    async fn list_credentials(&self) -> Result<Vec<Credential>>;

    async fn get_credential(&self, id: &str) -> Result<Option<Credential>>;

    /// Insert or replace by `credential.id`.
    async fn save_credential(&self, credential: &Credential) -> Result<()>;

    /// Hard delete.
    async fn delete_credential(&self, id: &str) -> Result<()>;
}

/// Client rows, including soft-deleted ones.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn list_clients(&self) -> Result<Vec<ClientRecord>>;

    async fn get_client(&self, id: &str) -> Result<Option<ClientRecord>>;

    /// Rows whose phone number equals `phone_number` exactly.
    async fn clients_by_phone(&self, phone_number: &str) -> Result<Vec<ClientRecord>>;

    /// Rows whose phone number ends with `suffix`.
    async fn clients_by_phone_suffix(&self, suffix: &str) -> Result<Vec<ClientRecord>>;

    /// Insert or replace by `client.id`.
    async fn save_client(&self, client: &ClientRecord) -> Result<()>;

    /// Write several rows. Not atomic.
    async fn save_clients(&self, clients: &[ClientRecord]) -> Result<()>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>>;
}

#[async_trait]
pub trait SystemConfigStore: Send + Sync {
    /// `None` until an admin saves the banner for the first time.
    async fn get_system_config(&self) -> Result<Option<SystemConfig>>;

    async fn save_system_config(&self, config: &SystemConfig) -> Result<()>;
}

#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn list_doramas(&self, phone_number: &str) -> Result<Vec<Dorama>>;

    async fn get_dorama(&self, id: &str) -> Result<Option<Dorama>>;

    async fn save_dorama(&self, item: &Dorama) -> Result<()>;

    async fn delete_dorama(&self, id: &str) -> Result<()>;
}

/// Everything the application reads and writes.
pub trait Store:
    CredentialStore + ClientStore + AdminStore + SystemConfigStore + WatchlistStore
{
}

impl<T> Store for T where
    T: CredentialStore + ClientStore + AdminStore + SystemConfigStore + WatchlistStore
{
}
