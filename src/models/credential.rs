// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared streaming-account credential model and service naming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Services sold in the shop, in display order.
pub const SERVICE_CATALOG: [&str; 5] = ["Viki Pass", "Kocowa+", "IQIYI", "WeTV", "DramaBox"];

/// Marker used by legacy rows that stored the system configuration in the
/// credentials collection. Such rows are never part of the credential pool.
pub const SYSTEM_CONFIG_SERVICE: &str = "SYSTEM_CONFIG";

/// Canonical service tag derived from a free-text service name.
///
/// Catalog names drift ("Viki Pass", "Viki", "viki pass 2"), so the policy
/// tables key off a loose containment match rather than exact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKey {
    Viki,
    Kocowa,
    Iqiyi,
    WeTv,
    DramaBox,
    Other,
}

impl ServiceKey {
    /// Classify a service name. Checked most specific first.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("viki") {
            ServiceKey::Viki
        } else if lower.contains("kocowa") {
            ServiceKey::Kocowa
        } else if lower.contains("iqiyi") {
            ServiceKey::Iqiyi
        } else if lower.contains("wetv") {
            ServiceKey::WeTv
        } else if lower.contains("dramabox") {
            ServiceKey::DramaBox
        } else {
            ServiceKey::Other
        }
    }
}

/// Identity of the credential pool and client roster a service name belongs to.
///
/// Catalog services group by [`ServiceKey`], so "Viki Pass 2" and "Viki" share
/// one partition with "Viki Pass". Anything else groups by its trimmed,
/// lowercased name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RosterKey {
    Catalog(ServiceKey),
    Named(String),
}

impl RosterKey {
    pub fn from_name(name: &str) -> Self {
        match ServiceKey::from_name(name) {
            ServiceKey::Other => RosterKey::Named(name.trim().to_lowercase()),
            key => RosterKey::Catalog(key),
        }
    }
}

/// Case-insensitive containment: does `service` satisfy a request for `requested`?
///
/// "Viki Pass 2" satisfies "viki pass", but "Viki" does not satisfy "Viki Pass".
pub fn service_matches(service: &str, requested: &str) -> bool {
    service.to_lowercase().contains(&requested.to_lowercase())
}

fn unknown_service() -> String {
    "Unknown service".to_string()
}

fn default_visible() -> bool {
    true
}

/// A third-party streaming login shared by several clients.
///
/// Stored in the `app_credentials` collection, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Document ID
    pub id: String,
    /// Service name (catalog entry or free-text label)
    #[serde(default = "unknown_service")]
    pub service: String,
    /// Login email
    #[serde(default)]
    pub email: String,
    /// Login password
    #[serde(default)]
    pub password: String,
    /// Start of the credential's lifecycle; drives its age
    #[serde(default = "Utc::now")]
    pub published_at: DateTime<Utc>,
    /// Eligible for assignment
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

impl Credential {
    /// Create a freshly published, visible credential with a new ID.
    pub fn new(service: &str, email: &str, password: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            service: service.trim().to_string(),
            email: email.trim().to_string(),
            password: password.trim().to_string(),
            published_at: now,
            is_visible: true,
        }
    }

    pub fn roster_key(&self) -> RosterKey {
        RosterKey::from_name(&self.service)
    }

    /// Whether this row is the legacy system-config marker.
    pub fn is_system_config(&self) -> bool {
        self.service == SYSTEM_CONFIG_SERVICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_key_classification() {
        assert_eq!(ServiceKey::from_name("Viki Pass"), ServiceKey::Viki);
        assert_eq!(ServiceKey::from_name("viki"), ServiceKey::Viki);
        assert_eq!(ServiceKey::from_name("Kocowa+"), ServiceKey::Kocowa);
        assert_eq!(ServiceKey::from_name("IQIYI Standard"), ServiceKey::Iqiyi);
        assert_eq!(ServiceKey::from_name("WeTV"), ServiceKey::WeTv);
        assert_eq!(ServiceKey::from_name("DramaBox"), ServiceKey::DramaBox);
        assert_eq!(ServiceKey::from_name("Netflix"), ServiceKey::Other);
    }

    #[test]
    fn test_service_matches_is_loose_one_way() {
        assert!(service_matches("Viki Pass 2", "viki pass"));
        assert!(service_matches("KOCOWA+", "Kocowa+"));
        assert!(!service_matches("Viki", "Viki Pass"));
    }

    #[test]
    fn test_roster_key_groups_drifted_names() {
        assert_eq!(
            RosterKey::from_name("Viki Pass 2"),
            RosterKey::from_name("Viki Pass")
        );
        assert_eq!(RosterKey::from_name("viki"), RosterKey::Catalog(ServiceKey::Viki));
        assert_eq!(
            RosterKey::from_name(" Netflix "),
            RosterKey::Named("netflix".to_string())
        );
        assert_ne!(
            RosterKey::from_name("Netflix"),
            RosterKey::from_name("Netflix Kids")
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let cred: Credential = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "published_at": "2024-11-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(cred.service, "Unknown service");
        assert!(cred.is_visible);
        assert!(cred.email.is_empty());
    }
}
