// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential assignment engine.
//!
//! Assignments are never stored. Each read partitions the sorted roster of a
//! service across its sorted credential pool, so the forward lookup
//! ([`assign`]) and its inverse ([`assigned_clients`]) must share every step
//! below: pool filter, roster filter, capacity and slot math.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::models::client::{normalize_phone, ClientRecord, TRIAL_PHONE};
use crate::models::credential::{service_matches, Credential, RosterKey, ServiceKey};
use crate::time_utils::utc_calendar_day;

/// Services the free-trial login may use.
pub const TRIAL_ALLOWED_SERVICES: [&str; 3] = ["Viki Pass", "Kocowa+", "WeTV"];

/// Clients per credential unless a service overrides it.
pub const DEFAULT_CAPACITY: usize = 4;

/// Capacity of services where one login serves everyone.
pub const UNLIMITED_CAPACITY: usize = 1000;

/// Age reported for trial credentials regardless of publication date.
const TRIAL_DAYS_ACTIVE: i64 = 1;

/// Message attached to an assignment. Never an error: the caller shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAlert {
    /// Free-trial login asked for a service outside the allow-list
    NotEligible,
    /// Free-trial login found no account for the service
    NoneAvailable,
    /// Free-trial login got a randomly rotated account
    TrialRotating,
    VikiExpired,
    VikiLastDay,
    VikiFinalStretch { day: i64 },
    KocowaExpired,
    KocowaPasswordChanging,
    IqiyiUpdateImminent,
    /// Any other service with a login older than five weeks
    StaleLogin,
}

impl RotationAlert {
    /// Stable identifier for the frontend.
    pub fn kind(&self) -> &'static str {
        match self {
            RotationAlert::NotEligible => "not_eligible",
            RotationAlert::NoneAvailable => "none_available",
            RotationAlert::TrialRotating => "trial_rotating",
            RotationAlert::VikiExpired => "viki_expired",
            RotationAlert::VikiLastDay => "viki_last_day",
            RotationAlert::VikiFinalStretch { .. } => "viki_final_stretch",
            RotationAlert::KocowaExpired => "kocowa_expired",
            RotationAlert::KocowaPasswordChanging => "kocowa_password_changing",
            RotationAlert::IqiyiUpdateImminent => "iqiyi_update_imminent",
            RotationAlert::StaleLogin => "stale_login",
        }
    }
}

impl fmt::Display for RotationAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationAlert::NotEligible => {
                write!(f, "Not eligible: this app is not part of the free trial.")
            }
            RotationAlert::NoneAvailable => write!(f, "No accounts available right now."),
            RotationAlert::TrialRotating => write!(f, "Trial account (rotating hourly)."),
            RotationAlert::VikiExpired => {
                write!(f, "Account expired (14 days). Awaiting a new login!")
            }
            RotationAlert::VikiLastDay => write!(f, "Heads up: last day of this login!"),
            RotationAlert::VikiFinalStretch { day } => {
                write!(f, "Final stretch ({}/14 days). New account soon.", day)
            }
            RotationAlert::KocowaExpired => write!(f, "Account expired. Awaiting a new login!"),
            RotationAlert::KocowaPasswordChanging => {
                write!(f, "Heads up: the password changes soon!")
            }
            RotationAlert::IqiyiUpdateImminent => write!(f, "Account update imminent."),
            RotationAlert::StaleLogin => write!(f, "Very old login. Check that it still works."),
        }
    }
}

impl Serialize for RotationAlert {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RotationAlert", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Outcome of a forward lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentResult {
    pub credential: Option<Credential>,
    pub alert: Option<RotationAlert>,
    /// UTC calendar-day age of the credential, 1 on its publication day
    pub days_active: i64,
}

impl AssignmentResult {
    fn unassigned(alert: Option<RotationAlert>) -> Self {
        Self {
            credential: None,
            alert,
            days_active: 0,
        }
    }

    fn trial(credential: &Credential) -> Self {
        Self {
            credential: Some(credential.clone()),
            alert: Some(RotationAlert::TrialRotating),
            days_active: TRIAL_DAYS_ACTIVE,
        }
    }
}

/// Colour bucket for the admin credential list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    Stable,
    Warning,
    Critical,
}

/// Age of a credential in UTC calendar days (publication day = 1).
pub fn days_active(credential: &Credential, now: DateTime<Utc>) -> i64 {
    utc_calendar_day(credential.published_at, now)
}

/// Rotation alert for a credential of `service` that is `day` days old.
///
/// Only the first matching rule fires.
pub fn rotation_alert(service: &str, day: i64) -> Option<RotationAlert> {
    match ServiceKey::from_name(service) {
        ServiceKey::Viki => {
            if day >= 14 {
                Some(RotationAlert::VikiExpired)
            } else if day == 13 {
                Some(RotationAlert::VikiLastDay)
            } else if day >= 10 {
                Some(RotationAlert::VikiFinalStretch { day })
            } else {
                None
            }
        }
        ServiceKey::Kocowa => {
            if day >= 30 {
                Some(RotationAlert::KocowaExpired)
            } else if day >= 28 {
                Some(RotationAlert::KocowaPasswordChanging)
            } else {
                None
            }
        }
        ServiceKey::Iqiyi => (day >= 29).then_some(RotationAlert::IqiyiUpdateImminent),
        ServiceKey::WeTv | ServiceKey::DramaBox | ServiceKey::Other => {
            (day >= 35).then_some(RotationAlert::StaleLogin)
        }
    }
}

/// Colour bucket for a credential of `service` that is `day` days old.
///
/// Kocowa turns critical at day 23 here while its client alert waits until
/// day 28; both tables are kept as the business runs them.
pub fn status_for_age(service: &str, day: i64) -> CredentialStatus {
    match ServiceKey::from_name(service) {
        ServiceKey::Viki if day >= 14 => CredentialStatus::Critical,
        ServiceKey::Viki if day == 13 => CredentialStatus::Warning,
        ServiceKey::Kocowa if day >= 23 => CredentialStatus::Critical,
        ServiceKey::Kocowa if day >= 20 => CredentialStatus::Warning,
        ServiceKey::Iqiyi if day >= 30 => CredentialStatus::Critical,
        ServiceKey::Iqiyi if day == 29 => CredentialStatus::Warning,
        _ => CredentialStatus::Stable,
    }
}

/// Clients per credential for `service`.
///
/// IQIYI spreads the roster evenly over the pool, WeTV shares one login with
/// everyone, every other service packs four clients per login.
pub fn capacity_for(service: &str, roster_len: usize, credential_count: usize) -> usize {
    let capacity = match ServiceKey::from_name(service) {
        ServiceKey::Iqiyi if credential_count > 0 => roster_len.div_ceil(credential_count),
        ServiceKey::WeTv => UNLIMITED_CAPACITY,
        _ => DEFAULT_CAPACITY,
    };
    capacity.max(1)
}

/// Index into the credential pool for the client at `roster_index`.
///
/// Wraps around once every credential is full, silently over-packing the
/// earliest credentials.
pub fn credential_slot(roster_index: usize, capacity: usize, credential_count: usize) -> usize {
    (roster_index / capacity.max(1)) % credential_count.max(1)
}

/// Visible credentials in the partition of `service`, oldest publication first.
pub fn credential_pool<'a>(credentials: &'a [Credential], service: &str) -> Vec<&'a Credential> {
    let key = RosterKey::from_name(service);
    let mut pool: Vec<&Credential> = credentials
        .iter()
        .filter(|c| c.is_visible && !c.is_system_config() && c.roster_key() == key)
        .collect();
    pool.sort_by_key(|c| c.published_at);
    pool
}

/// Active paying clients in the partition of `service`, sorted by phone number.
///
/// The free-trial and demo phones never take a slot.
pub fn service_roster<'a>(clients: &'a [ClientRecord], service: &str) -> Vec<&'a ClientRecord> {
    let key = RosterKey::from_name(service);
    let mut roster: Vec<&ClientRecord> = clients
        .iter()
        .filter(|c| c.is_active() && !c.is_trial() && !c.is_demo())
        .filter(|c| c.subscriptions.serves(&key))
        .collect();
    roster.sort_by(|a, b| a.phone_number.cmp(&b.phone_number));
    roster
}

/// Visible credentials whose name contains `service`, for the free-trial login.
fn trial_pool<'a>(credentials: &'a [Credential], service: &str) -> Vec<&'a Credential> {
    credentials
        .iter()
        .filter(|c| c.is_visible && !c.is_system_config() && service_matches(&c.service, service))
        .collect()
}

/// Resolve the credential for the client with `phone_number` on `service`.
///
/// The free-trial phone gets a random account from the pool on every call;
/// everyone else gets a deterministic slot. A phone missing from the roster
/// (admin preview, demo account) sees the oldest credential.
pub fn assign<R: Rng + ?Sized>(
    phone_number: &str,
    service: &str,
    credentials: &[Credential],
    clients: &[ClientRecord],
    now: DateTime<Utc>,
    rng: &mut R,
) -> AssignmentResult {
    let phone = normalize_phone(phone_number);

    if phone == TRIAL_PHONE {
        return assign_trial(service, credentials, rng);
    }

    let pool = credential_pool(credentials, service);
    let Some(first) = pool.first() else {
        return AssignmentResult::unassigned(None);
    };

    let roster = service_roster(clients, service);
    let Some(roster_index) = roster.iter().position(|c| c.phone_digits() == phone) else {
        tracing::debug!(
            phone = %phone_number,
            service = %service,
            roster = roster.len(),
            "Client not in roster, showing first credential"
        );
        return with_alert(first, service, now);
    };

    let capacity = capacity_for(service, roster.len(), pool.len());
    let slot = credential_slot(roster_index, capacity, pool.len());

    with_alert(pool[slot], service, now)
}

fn assign_trial<R: Rng + ?Sized>(
    service: &str,
    credentials: &[Credential],
    rng: &mut R,
) -> AssignmentResult {
    let allowed = TRIAL_ALLOWED_SERVICES
        .iter()
        .any(|app| service_matches(service, app));
    if !allowed {
        return AssignmentResult::unassigned(Some(RotationAlert::NotEligible));
    }

    let pool = trial_pool(credentials, service);
    if let Some(credential) = pool.choose(rng) {
        return AssignmentResult::trial(credential);
    }

    // Catalog names drift; retry on the first word only ("Viki Pass" -> "viki").
    let first_word = service.split_whitespace().next().unwrap_or(service);
    let fallback = trial_pool(credentials, first_word);
    match fallback.choose(rng) {
        Some(credential) => AssignmentResult::trial(credential),
        None => AssignmentResult::unassigned(Some(RotationAlert::NoneAvailable)),
    }
}

fn with_alert(credential: &Credential, service: &str, now: DateTime<Utc>) -> AssignmentResult {
    let day = days_active(credential, now);
    AssignmentResult {
        credential: Some(credential.clone()),
        alert: rotation_alert(service, day),
        days_active: day,
    }
}

/// Clients currently assigned to `credential`: the inverse of [`assign`].
///
/// Replays the partition the credential's service name belongs to, which is
/// the same one every request it can be assigned for resolves to. Returns an
/// empty list if the credential is hidden or no longer in the pool.
pub fn assigned_clients<'a>(
    credential: &Credential,
    credentials: &[Credential],
    clients: &'a [ClientRecord],
) -> Vec<&'a ClientRecord> {
    let service = credential.service.as_str();
    let pool = credential_pool(credentials, service);
    let Some(position) = pool.iter().position(|c| c.id == credential.id) else {
        return Vec::new();
    };

    let roster = service_roster(clients, service);
    let capacity = capacity_for(service, roster.len(), pool.len());

    roster
        .into_iter()
        .enumerate()
        .filter(|(index, _)| credential_slot(*index, capacity, pool.len()) == position)
        .map(|(_, client)| client)
        .collect()
}

/// One consistent read of both collections.
///
/// Forward and reverse lookups made against the same snapshot always agree.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub credentials: Vec<Credential>,
    pub clients: Vec<ClientRecord>,
}

impl Snapshot {
    pub fn new(credentials: Vec<Credential>, clients: Vec<ClientRecord>) -> Self {
        Self {
            credentials,
            clients,
        }
    }

    pub fn assign<R: Rng + ?Sized>(
        &self,
        phone_number: &str,
        service: &str,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> AssignmentResult {
        assign(
            phone_number,
            service,
            &self.credentials,
            &self.clients,
            now,
            rng,
        )
    }

    pub fn assigned_clients(&self, credential: &Credential) -> Vec<&ClientRecord> {
        assigned_clients(credential, &self.credentials, &self.clients)
    }
}
