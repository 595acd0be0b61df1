// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with: FIRESTORE_EMULATOR_HOST=localhost:8081 cargo test
//!
//! The emulator is shared between runs, so every test uses unique phones and ids.

use chrono::Utc;
use eudorama::db::{
    AdminStore, ClientStore, CredentialStore, SystemConfigStore, WatchlistStore,
};
use eudorama::error::AppError;
use eudorama::models::{
    BannerType, ClientRecord, Credential, Dorama, ListType, Subscriptions, SystemConfig,
    WatchStatus,
};

mod common;
use common::{test_db, test_db_offline};

/// Unique 11-digit phone for test isolation.
fn unique_phone() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("8{:010}", nanos % 10_000_000_000)
}

// ═══════════════════════════════════════════════════════════════════════════
// CREDENTIAL TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_credential_crud() {
    require_emulator!();

    let db = test_db().await;
    let credential = Credential::new("Viki Pass", "emu@viki", "pw", Utc::now());

    db.save_credential(&credential).await.unwrap();
    let fetched = db.get_credential(&credential.id).await.unwrap().unwrap();
    assert_eq!(fetched.email, "emu@viki");
    assert!(fetched.is_visible);

    db.delete_credential(&credential.id).await.unwrap();
    assert!(db.get_credential(&credential.id).await.unwrap().is_none());

    println!("✓ Credential round trip: id={}", credential.id);
}

#[tokio::test]
async fn test_system_config_marker_hidden_from_credentials() {
    require_emulator!();

    let db = test_db().await;
    let marker = Credential::new("SYSTEM_CONFIG", "", "", Utc::now());
    db.save_credential(&marker).await.unwrap();

    let all = db.list_credentials().await.unwrap();
    assert!(all.iter().all(|c| c.id != marker.id));
}

// ═══════════════════════════════════════════════════════════════════════════
// CLIENT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_clients_by_phone_and_suffix() {
    require_emulator!();

    let db = test_db().await;
    let phone = unique_phone();
    let rows = vec![
        ClientRecord::new(&phone, Subscriptions::from_list(["Viki Pass"]), Utc::now()),
        ClientRecord::new(&phone, Subscriptions::from_list(["WeTV"]), Utc::now()),
    ];
    db.save_clients(&rows).await.unwrap();

    let by_phone = db.clients_by_phone(&phone).await.unwrap();
    assert_eq!(by_phone.len(), 2);

    let suffix = &phone[phone.len() - 4..];
    let by_suffix = db.clients_by_phone_suffix(suffix).await.unwrap();
    assert!(by_suffix.iter().any(|r| r.phone_number == phone));
}

#[tokio::test]
async fn test_legacy_delimited_subscriptions() {
    require_emulator!();

    let db = test_db().await;
    let mut row = ClientRecord::new(
        &unique_phone(),
        Subscriptions::parse_delimited("\"Viki Pass\"+Kocowa+"),
        Utc::now(),
    );
    row.client_name = Some("Legacy".to_string());
    db.save_client(&row).await.unwrap();

    let fetched = db.get_client(&row.id).await.unwrap().unwrap();
    assert!(fetched.subscriptions.includes("viki pass"));
    assert!(fetched.subscriptions.includes("kocowa"));
}

// ═══════════════════════════════════════════════════════════════════════════
// ADMIN / CONFIG / WATCH-LIST TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_unknown_admin() {
    require_emulator!();

    let db = test_db().await;
    let admin = db.find_admin(&format!("nobody-{}", unique_phone())).await;
    assert!(admin.unwrap().is_none());
}

#[tokio::test]
async fn test_system_config_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let mut config = SystemConfig::default();
    config.banner_text = "Emulator banner".to_string();
    config.banner_type = BannerType::Warning;
    config.banner_active = true;

    db.save_system_config(&config).await.unwrap();
    let fetched = db.get_system_config().await.unwrap().unwrap();
    assert_eq!(fetched, config);
}

#[tokio::test]
async fn test_watchlist_scoped_to_phone() {
    require_emulator!();

    let db = test_db().await;
    let phone = unique_phone();
    let item = Dorama {
        id: uuid::Uuid::new_v4().to_string(),
        phone_number: phone.clone(),
        list_type: ListType::Watching,
        title: "Vincenzo".to_string(),
        genre: String::new(),
        thumbnail: String::new(),
        status: WatchStatus::Watching,
        episodes_watched: Some(2),
        total_episodes: Some(20),
        season: None,
        rating: None,
        created_at: Some(eudorama::time_utils::format_utc_rfc3339(Utc::now())),
    };
    db.save_dorama(&item).await.unwrap();

    let mine = db.list_doramas(&phone).await.unwrap();
    assert_eq!(mine, vec![item.clone()]);

    db.delete_dorama(&item.id).await.unwrap();
    assert!(db.list_doramas(&phone).await.unwrap().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// OFFLINE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_offline_db_reports_database_error() {
    let db = test_db_offline();

    let err = db.list_credentials().await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
}
