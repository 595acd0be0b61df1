// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Personal watch-list items (`user_doramas` collection).

use serde::{Deserialize, Serialize};

/// Which of the three personal lists an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    Watching,
    Favorites,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchStatus {
    Watching,
    #[serde(rename = "Plan to Watch")]
    PlanToWatch,
    Completed,
}

/// A drama on one of a client's lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dorama {
    /// Document ID
    pub id: String,
    /// Owner
    pub phone_number: String,
    pub list_type: ListType,
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub thumbnail: String,
    pub status: WatchStatus,
    #[serde(default)]
    pub episodes_watched: Option<u32>,
    #[serde(default)]
    pub total_episodes: Option<u32>,
    #[serde(default)]
    pub season: Option<u32>,
    /// 1 to 5 hearts (favorites)
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The three lists of one client.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Watchlists {
    pub watching: Vec<Dorama>,
    pub favorites: Vec<Dorama>,
    pub completed: Vec<Dorama>,
}

impl Watchlists {
    pub fn from_items(items: Vec<Dorama>) -> Self {
        let mut lists = Self::default();
        for item in items {
            match item.list_type {
                ListType::Watching => lists.watching.push(item),
                ListType::Favorites => lists.favorites.push(item),
                ListType::Completed => lists.completed.push(item),
            }
        }
        lists
    }
}
