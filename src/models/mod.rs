// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod client;
pub mod credential;
pub mod system_config;
pub mod user;
pub mod watchlist;

pub use client::{ClientRecord, SubscriptionEntry, Subscriptions, DEMO_PHONE_PREFIX, TRIAL_PHONE};
pub use credential::{Credential, RosterKey, ServiceKey, SERVICE_CATALOG};
pub use system_config::{BannerType, ServiceHealth, SystemConfig};
pub use user::{AdminUser, SubscriptionDetail, SubscriptionStatus, UserProfile};
pub use watchlist::{Dorama, ListType, WatchStatus, Watchlists};
