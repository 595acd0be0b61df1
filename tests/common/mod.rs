// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, TimeZone, Utc};
use eudorama::config::Config;
use eudorama::db::{FirestoreDb, MemoryStore};
use eudorama::middleware::auth::{create_jwt, Role};
use eudorama::models::{ClientRecord, Credential, Subscriptions};
use eudorama::routes::create_router;
use eudorama::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Fixed instant for deterministic tests.
#[allow(dead_code)]
pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Active client row for `phone` subscribed to `services`.
#[allow(dead_code)]
pub fn client(phone: &str, services: &[&str]) -> ClientRecord {
    ClientRecord::new(phone, Subscriptions::from_list(services), Utc::now())
}

/// Visible credential published at `published_at`.
#[allow(dead_code)]
pub fn credential(service: &str, email: &str, published_at: DateTime<Utc>) -> Credential {
    Credential::new(service, email, "secret", published_at)
}

/// Session token signed with the test config key.
#[allow(dead_code)]
pub fn token_for(subject: &str, role: Role) -> String {
    let config = Config::test_default();
    create_jwt(subject, role, 3600, &config.jwt_signing_key).unwrap()
}

/// Create a test app over an empty in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    create_test_app_with_store(MemoryStore::new(), Config::test_default())
}

/// Create a test app with a specific frontend URL (cookie `Secure` flag).
#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(
    frontend_url: &str,
) -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_store(MemoryStore::new(), config)
}

/// Create a test app over a pre-populated store.
#[allow(dead_code)]
pub fn create_test_app_with_store(
    store: MemoryStore,
    config: Config,
) -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(store);
    let state = Arc::new(AppState::new(config, store.clone()));
    (create_router(state.clone()), state, store)
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
