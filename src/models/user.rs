// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Merged client profile and per-service subscription status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::client::{add_months, ClientRecord};
use crate::time_utils::parse_loose_datetime;

const DEFAULT_CLIENT_NAME: &str = "Dorameira";
const GRACE_PERIOD_DAYS: i64 = 3;
const SECONDS_PER_DAY: i64 = 86_400;

/// Purchase terms of one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDetail {
    pub purchase_date: String,
    pub duration_months: u32,
    pub is_debtor: bool,
}

/// A client as seen by the app: all active rows of one phone number merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// ID of the row with the latest expiry
    pub id: String,
    pub name: String,
    pub phone_number: String,
    /// Fallback purchase terms (latest-expiring row)
    pub purchase_date: String,
    pub duration_months: u32,
    /// Terms per service name
    pub subscription_details: BTreeMap<String, SubscriptionDetail>,
    /// Purchased services, in first-seen order
    pub services: Vec<String>,
    /// Any row is marked debtor
    pub is_debtor: bool,
    /// Any row carries the admin override
    pub override_expiration: bool,
    pub theme_color: Option<String>,
    pub background_image: Option<String>,
    pub profile_image: Option<String>,
}

impl UserProfile {
    /// Merge the rows of one phone number. Returns `None` if all rows are deleted.
    pub fn from_rows(rows: &[ClientRecord]) -> Option<Self> {
        let active: Vec<&ClientRecord> = rows.iter().filter(|r| r.is_active()).collect();
        let first = *active.first()?;

        let mut primary = first;
        let mut latest_expiry: Option<DateTime<Utc>> = None;
        let mut name = first.client_name.clone().filter(|n| !n.trim().is_empty());
        let mut services: Vec<String> = Vec::new();
        let mut details = BTreeMap::new();
        let mut is_debtor = false;
        let mut override_expiration = false;

        for row in &active {
            if let Some(row_name) = row.client_name.as_ref().filter(|n| !n.trim().is_empty()) {
                name = Some(row_name.clone());
            }

            for entry in row.subscriptions.entries() {
                if !services.contains(&entry.service) {
                    services.push(entry.service.clone());
                }
                let purchase_date = entry
                    .purchase_date_override
                    .clone()
                    .unwrap_or_else(|| row.purchase_date.clone());
                details.insert(
                    entry.service.clone(),
                    SubscriptionDetail {
                        purchase_date,
                        duration_months: row.duration_months,
                        is_debtor: row.is_debtor,
                    },
                );
            }

            is_debtor |= row.is_debtor;
            override_expiration |= row.override_expiration;

            if let Some(expiry) = row.expires_at() {
                if latest_expiry.map_or(true, |best| expiry > best) {
                    latest_expiry = Some(expiry);
                    primary = *row;
                }
            }
        }

        Some(Self {
            id: primary.id.clone(),
            name: name.unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string()),
            phone_number: primary.phone_number.clone(),
            purchase_date: primary.purchase_date.clone(),
            duration_months: primary.duration_months,
            subscription_details: details,
            services,
            is_debtor,
            override_expiration,
            theme_color: primary.theme_color.clone(),
            background_image: primary.background_image.clone(),
            profile_image: primary.profile_image.clone(),
        })
    }

    /// Expiry state of one service at `now`.
    ///
    /// Debt is judged on the rows that sold this service. Unknown services
    /// and unparsable dates fall back to the profile-level terms, then to
    /// `now` as the purchase date.
    pub fn subscription_status(&self, service: &str, now: DateTime<Utc>) -> SubscriptionStatus {
        let (purchase, months, is_debtor) = match self.subscription_details.get(service) {
            Some(detail) => (
                parse_loose_datetime(&detail.purchase_date),
                detail.duration_months,
                detail.is_debtor,
            ),
            None => (
                parse_loose_datetime(&self.purchase_date),
                self.duration_months.max(1),
                self.is_debtor,
            ),
        };
        let purchase = purchase.unwrap_or(now);
        let expires_at = add_months(purchase, months).unwrap_or(purchase);

        SubscriptionStatus::evaluate(expires_at, now, is_debtor, self.override_expiration)
    }
}

/// Expiry state shown on the dashboard for one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscriptionStatus {
    pub expires_at: DateTime<Utc>,
    /// Whole days until expiry, rounded up; negative once expired
    pub days_left: i64,
    pub is_expired: bool,
    /// Expired, but within the grace period
    pub is_grace_period: bool,
    /// Access is paused
    pub is_blocked: bool,
}

impl SubscriptionStatus {
    pub fn evaluate(
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
        is_debtor: bool,
        override_expiration: bool,
    ) -> Self {
        let seconds = (expires_at - now).num_seconds();
        let days_left = seconds.div_euclid(SECONDS_PER_DAY)
            + i64::from(seconds.rem_euclid(SECONDS_PER_DAY) > 0);
        let is_expired = days_left < 0;
        let is_grace_period = is_expired && days_left >= -GRACE_PERIOD_DAYS;
        let is_blocked = is_debtor || (is_expired && !is_grace_period && !override_expiration);

        Self {
            expires_at,
            days_left,
            is_expired,
            is_grace_period,
            is_blocked,
        }
    }
}

/// Admin panel login stored in the `admin_users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client::Subscriptions;
    use chrono::{Duration, TimeZone};

    fn row(id: &str, purchase: &str, months: u32, subs: &[&str]) -> ClientRecord {
        let mut r = ClientRecord::new("11999999999", Subscriptions::from_list(subs), Utc::now());
        r.id = id.to_string();
        r.purchase_date = purchase.to_string();
        r.duration_months = months;
        r
    }

    #[test]
    fn test_merge_unions_services_and_picks_latest_expiry() {
        let mut old = row("a", "2024-01-10", 1, &["Viki Pass"]);
        old.client_name = Some("Ana".to_string());
        let new = row("b", "2024-03-01", 3, &["Kocowa+", "Viki Pass"]);

        let profile = UserProfile::from_rows(&[old, new]).unwrap();

        assert_eq!(profile.id, "b");
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.services, vec!["Viki Pass", "Kocowa+"]);
        assert_eq!(
            profile.subscription_details["Viki Pass"].purchase_date,
            "2024-03-01"
        );
    }

    #[test]
    fn test_merge_skips_deleted_rows() {
        let mut gone = row("a", "2024-01-10", 12, &["IQIYI"]);
        gone.deleted = true;
        let live = row("b", "2024-01-10", 1, &["WeTV"]);

        let profile = UserProfile::from_rows(&[gone.clone(), live]).unwrap();
        assert_eq!(profile.services, vec!["WeTV"]);
        assert!(UserProfile::from_rows(&[gone]).is_none());
    }

    #[test]
    fn test_merge_uses_default_name_and_override_date() {
        let r = row("a", "2024-01-10", 1, &["Viki Pass|2024-06-01"]);
        let profile = UserProfile::from_rows(&[r]).unwrap();

        assert_eq!(profile.name, "Dorameira");
        assert_eq!(
            profile.subscription_details["Viki Pass"].purchase_date,
            "2024-06-01"
        );
    }

    #[test]
    fn test_status_grace_period_and_block() {
        let expiry = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let active = SubscriptionStatus::evaluate(expiry, expiry - Duration::hours(1), false, false);
        assert_eq!(active.days_left, 1);
        assert!(!active.is_expired);

        let grace = SubscriptionStatus::evaluate(expiry, expiry + Duration::days(2), false, false);
        assert_eq!(grace.days_left, -2);
        assert!(grace.is_expired && grace.is_grace_period && !grace.is_blocked);

        let blocked = SubscriptionStatus::evaluate(expiry, expiry + Duration::days(5), false, false);
        assert!(blocked.is_blocked);

        let overridden =
            SubscriptionStatus::evaluate(expiry, expiry + Duration::days(5), false, true);
        assert!(!overridden.is_blocked);

        let debtor = SubscriptionStatus::evaluate(expiry, expiry - Duration::days(20), true, true);
        assert!(debtor.is_blocked);
    }

    #[test]
    fn test_subscription_status_per_service() {
        let r = row("a", "2024-01-10", 1, &["Viki Pass"]);
        let profile = UserProfile::from_rows(&[r]).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 5, 0, 0, 0).unwrap();

        let status = profile.subscription_status("Viki Pass", now);
        assert_eq!(
            status.expires_at,
            Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap()
        );
        assert_eq!(status.days_left, 5);
    }

    #[test]
    fn test_debt_blocks_only_services_of_that_row() {
        let mut owing = row("a", "2024-01-10", 1, &["Kocowa+"]);
        owing.is_debtor = true;
        let paid = row("b", "2024-01-10", 1, &["Viki Pass"]);
        let profile = UserProfile::from_rows(&[owing, paid]).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();

        assert!(profile.is_debtor);
        assert!(profile.subscription_status("Kocowa+", now).is_blocked);
        assert!(!profile.subscription_status("Viki Pass", now).is_blocked);
        // No terms for the service: the profile-wide flag applies.
        assert!(profile.subscription_status("WeTV", now).is_blocked);
    }
}
