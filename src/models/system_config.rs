// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin-managed banner and per-service health shown on every dashboard.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerType {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceHealth {
    #[default]
    Ok,
    Issues,
    Down,
}

/// Stored as the single document `system_config/current`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub banner_text: String,
    #[serde(default)]
    pub banner_type: BannerType,
    #[serde(default)]
    pub banner_active: bool,
    #[serde(default)]
    pub service_status: BTreeMap<String, ServiceHealth>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let service_status = ["Viki Pass", "Kocowa+", "IQIYI", "WeTV"]
            .into_iter()
            .map(|s| (s.to_string(), ServiceHealth::Ok))
            .collect();

        Self {
            banner_text: String::new(),
            banner_type: BannerType::Info,
            banner_active: false,
            service_status,
        }
    }
}
