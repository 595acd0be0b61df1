// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! EuDorama: shared streaming logins for a subscription reseller
//!
//! This crate provides the backend API that decides which shared login each
//! client sees, rotates the free-trial password, and serves the admin panel.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{AccountService, AdminService, CredentialService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub credentials: CredentialService,
    pub accounts: AccountService,
    pub admin: AdminService,
}

impl AppState {
    /// Wire every service to the same store.
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        Self {
            credentials: CredentialService::new(store.clone()),
            accounts: AccountService::new(store.clone()),
            admin: AdminService::new(store.clone()),
            config,
            store,
        }
    }
}
