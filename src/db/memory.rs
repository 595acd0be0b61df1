// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for tests and offline runs.
//!
//! Mirrors the Firestore adapter's rules (system-config rows hidden,
//! upsert by id) so services behave identically over both backends.
//! [`MemoryStore::set_unavailable`] makes every call fail like a dropped
//! connection.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::db::{AdminStore, ClientStore, CredentialStore, SystemConfigStore, WatchlistStore};
use crate::error::{AppError, Result};
use crate::models::{AdminUser, ClientRecord, Credential, Dorama, SystemConfig};

#[derive(Default)]
pub struct MemoryStore {
    credentials: RwLock<BTreeMap<String, Credential>>,
    clients: RwLock<BTreeMap<String, ClientRecord>>,
    admins: RwLock<Vec<AdminUser>>,
    doramas: RwLock<BTreeMap<String, Dorama>>,
    system_config: RwLock<Option<SystemConfig>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with credentials and clients.
    pub fn with_data(credentials: Vec<Credential>, clients: Vec<ClientRecord>) -> Self {
        Self {
            credentials: RwLock::new(credentials.into_iter().map(|c| (c.id.clone(), c)).collect()),
            clients: RwLock::new(clients.into_iter().map(|c| (c.id.clone(), c)).collect()),
            ..Self::default()
        }
    }

    pub async fn add_admin(&self, admin: AdminUser) {
        self.admins.write().await.push(admin);
    }

    /// Simulate an outage (`true`) or recovery (`false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database("Store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn list_credentials(&self) -> Result<Vec<Credential>> {
        self.check_available()?;
        Ok(self
            .credentials
            .read()
            .await
            .values()
            .filter(|c| !c.is_system_config())
            .cloned()
            .collect())
    }

    async fn get_credential(&self, id: &str) -> Result<Option<Credential>> {
        self.check_available()?;
        Ok(self
            .credentials
            .read()
            .await
            .get(id)
            .filter(|c| !c.is_system_config())
            .cloned())
    }

    async fn save_credential(&self, credential: &Credential) -> Result<()> {
        self.check_available()?;
        self.credentials
            .write()
            .await
            .insert(credential.id.clone(), credential.clone());
        Ok(())
    }

    async fn delete_credential(&self, id: &str) -> Result<()> {
        self.check_available()?;
        self.credentials.write().await.remove(id);
        Ok(())
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn list_clients(&self) -> Result<Vec<ClientRecord>> {
        self.check_available()?;
        Ok(self.clients.read().await.values().cloned().collect())
    }

    async fn get_client(&self, id: &str) -> Result<Option<ClientRecord>> {
        self.check_available()?;
        Ok(self.clients.read().await.get(id).cloned())
    }

    async fn clients_by_phone(&self, phone_number: &str) -> Result<Vec<ClientRecord>> {
        self.check_available()?;
        Ok(self
            .clients
            .read()
            .await
            .values()
            .filter(|c| c.phone_number == phone_number)
            .cloned()
            .collect())
    }

    async fn clients_by_phone_suffix(&self, suffix: &str) -> Result<Vec<ClientRecord>> {
        self.check_available()?;
        Ok(self
            .clients
            .read()
            .await
            .values()
            .filter(|c| c.phone_number.ends_with(suffix))
            .cloned()
            .collect())
    }

    async fn save_client(&self, client: &ClientRecord) -> Result<()> {
        self.check_available()?;
        self.clients
            .write()
            .await
            .insert(client.id.clone(), client.clone());
        Ok(())
    }

    async fn save_clients(&self, clients: &[ClientRecord]) -> Result<()> {
        self.check_available()?;
        let mut rows = self.clients.write().await;
        for client in clients {
            rows.insert(client.id.clone(), client.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>> {
        self.check_available()?;
        Ok(self
            .admins
            .read()
            .await
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }
}

#[async_trait]
impl SystemConfigStore for MemoryStore {
    async fn get_system_config(&self) -> Result<Option<SystemConfig>> {
        self.check_available()?;
        Ok(self.system_config.read().await.clone())
    }

    async fn save_system_config(&self, config: &SystemConfig) -> Result<()> {
        self.check_available()?;
        *self.system_config.write().await = Some(config.clone());
        Ok(())
    }
}

#[async_trait]
impl WatchlistStore for MemoryStore {
    async fn list_doramas(&self, phone_number: &str) -> Result<Vec<Dorama>> {
        self.check_available()?;
        Ok(self
            .doramas
            .read()
            .await
            .values()
            .filter(|d| d.phone_number == phone_number)
            .cloned()
            .collect())
    }

    async fn get_dorama(&self, id: &str) -> Result<Option<Dorama>> {
        self.check_available()?;
        Ok(self.doramas.read().await.get(id).cloned())
    }

    async fn save_dorama(&self, item: &Dorama) -> Result<()> {
        self.check_available()?;
        self.doramas
            .write()
            .await
            .insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn delete_dorama(&self, id: &str) -> Result<()> {
        self.check_available()?;
        self.doramas.write().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credential::SYSTEM_CONFIG_SERVICE;
    use chrono::Utc;

    #[tokio::test]
    async fn test_system_config_rows_are_hidden() {
        let mut marker = Credential::new("Viki Pass", "a@b.c", "x", Utc::now());
        marker.service = SYSTEM_CONFIG_SERVICE.to_string();
        let real = Credential::new("Viki Pass", "d@e.f", "y", Utc::now());

        let store = MemoryStore::with_data(vec![marker.clone(), real.clone()], vec![]);

        let listed = store.list_credentials().await.unwrap();
        assert_eq!(listed, vec![real]);
        assert!(store.get_credential(&marker.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.list_clients().await,
            Err(AppError::Database(_))
        ));

        store.set_unavailable(false);
        assert!(store.list_clients().await.unwrap().is_empty());
    }
}
