// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client (subscriber) record as stored in the `clients` collection.
//!
//! A phone number may own several rows, one per purchase. Rows are never
//! hard-deleted; `deleted` frees the phone's assignment slot.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::credential::{service_matches, RosterKey};
use crate::time_utils::parse_loose_datetime;

/// Reserved phone number of the shared free-trial login.
pub const TRIAL_PHONE: &str = "00000000000";

/// Phone prefix of admin-generated demo accounts.
pub const DEMO_PHONE_PREFIX: &str = "99999";

/// Strip formatting from a phone number, keeping digits only.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// One purchased service, optionally with its own purchase date.
///
/// Stored as `"Service"` or `"Service|2024-05-01"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionEntry {
    pub service: String,
    pub purchase_date_override: Option<String>,
}

impl SubscriptionEntry {
    /// Parse a stored entry. Returns `None` for blank entries.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().trim_matches('"').trim();
        if cleaned.is_empty() {
            return None;
        }

        let (service, date) = match cleaned.split_once('|') {
            Some((service, date)) => (service.trim(), Some(date.trim())),
            None => (cleaned, None),
        };

        if service.is_empty() {
            return None;
        }

        Some(Self {
            service: service.to_string(),
            purchase_date_override: date.filter(|d| !d.is_empty()).map(str::to_string),
        })
    }

    fn to_raw(&self) -> String {
        match &self.purchase_date_override {
            Some(date) => format!("{}|{}", self.service, date),
            None => self.service.clone(),
        }
    }
}

/// Ordered set of a row's purchased services.
///
/// Rows written by the current admin panel store a list of strings; older
/// rows store one `+`-delimited string. Both are accepted on read and the
/// list form is always written back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriptions(Vec<SubscriptionEntry>);

impl Subscriptions {
    pub fn from_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut subs = Self::default();
        for item in items {
            if let Some(entry) = SubscriptionEntry::parse(item.as_ref()) {
                subs.push(entry);
            }
        }
        subs
    }

    /// Parse the legacy `+`-delimited form.
    ///
    /// `+` is also part of names like "Kocowa+", so an empty segment after a
    /// name folds the `+` back into that name: `"Viki Pass+Kocowa+"` yields
    /// `["Viki Pass", "Kocowa+"]`.
    pub fn parse_delimited(raw: &str) -> Self {
        let mut names: Vec<String> = Vec::new();
        let mut previous_empty = true;

        for segment in raw.split('+') {
            let segment = segment.trim().trim_matches('"').trim();
            if segment.is_empty() {
                if !previous_empty {
                    if let Some(last) = names.last_mut() {
                        last.push('+');
                    }
                }
                previous_empty = true;
                continue;
            }
            names.push(segment.to_string());
            previous_empty = false;
        }

        Self::from_list(names)
    }

    fn push(&mut self, entry: SubscriptionEntry) {
        if !self.0.iter().any(|e| e.service == entry.service) {
            self.0.push(entry);
        }
    }

    pub fn entries(&self) -> &[SubscriptionEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Service names without purchase-date suffixes.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.service.as_str())
    }

    /// Whether any entry satisfies a request for `requested` (loose match).
    pub fn includes(&self, requested: &str) -> bool {
        self.0.iter().any(|e| service_matches(&e.service, requested))
    }

    /// Whether any entry puts the row on the roster for `key`.
    pub fn serves(&self, key: &RosterKey) -> bool {
        self.0.iter().any(|e| RosterKey::from_name(&e.service) == *key)
    }
}

impl Serialize for Subscriptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(SubscriptionEntry::to_raw))
    }
}

impl<'de> Deserialize<'de> for Subscriptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<String>),
            Delimited(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::List(items)) => Subscriptions::from_list(items),
            Some(Raw::Delimited(raw)) => Subscriptions::parse_delimited(&raw),
            None => Subscriptions::default(),
        })
    }
}

fn default_duration_months() -> u32 {
    1
}

/// Client row stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// Document ID
    pub id: String,
    /// Login identity and roster sort key
    pub phone_number: String,
    /// Display name chosen by the client
    #[serde(default)]
    pub client_name: Option<String>,
    /// Login password (empty until the client registers one)
    #[serde(default)]
    pub client_password: Option<String>,
    /// Purchase date of this row (ISO 8601 or `YYYY-MM-DD`)
    #[serde(default)]
    pub purchase_date: String,
    /// Plan length in months
    #[serde(default = "default_duration_months")]
    pub duration_months: u32,
    /// Purchased services
    #[serde(default)]
    pub subscriptions: Subscriptions,
    /// Payment overdue; blocks access
    #[serde(default)]
    pub is_debtor: bool,
    /// Admin has reached out about renewal
    #[serde(default)]
    pub is_contacted: bool,
    /// Admin lets an expired plan keep working
    #[serde(default)]
    pub override_expiration: bool,
    /// Soft-delete flag
    #[serde(default)]
    pub deleted: bool,
    /// Row creation time (ISO 8601)
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub theme_color: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl ClientRecord {
    /// New active row with a generated ID.
    pub fn new(phone_number: &str, subscriptions: Subscriptions, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            phone_number: phone_number.trim().to_string(),
            client_name: None,
            client_password: None,
            purchase_date: crate::time_utils::format_utc_rfc3339(now),
            duration_months: 1,
            subscriptions,
            is_debtor: false,
            is_contacted: false,
            override_expiration: false,
            deleted: false,
            created_at: Some(crate::time_utils::format_utc_rfc3339(now)),
            theme_color: None,
            background_image: None,
            profile_image: None,
        }
    }

    /// Active for assignment purposes.
    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    pub fn is_trial(&self) -> bool {
        self.phone_number == TRIAL_PHONE
    }

    pub fn is_demo(&self) -> bool {
        self.phone_number.starts_with(DEMO_PHONE_PREFIX)
    }

    pub fn phone_digits(&self) -> String {
        normalize_phone(&self.phone_number)
    }

    /// Stored password, if one has been set.
    pub fn stored_password(&self) -> Option<&str> {
        self.client_password
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn purchased_at(&self) -> Option<DateTime<Utc>> {
        parse_loose_datetime(&self.purchase_date)
    }

    /// Plan expiry of this row: purchase date plus `duration_months`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        add_months(self.purchased_at()?, self.duration_months)
    }
}

/// Calendar-month addition, clamping to the last day of shorter months.
pub fn add_months(start: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    start.checked_add_months(Months::new(months))
}
