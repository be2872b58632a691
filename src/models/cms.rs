// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User mirror record stored in the CMS JSON store.

use crate::models::{NewsArticle, UserRecord};
use serde::{Deserialize, Deserializer, Serialize};

/// User as seen by the admin dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsUser {
    /// Id assigned by the CMS (string or number on the wire)
    #[serde(
        default,
        deserialize_with = "deserialize_cms_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub coins: i64,
    #[serde(default)]
    pub xp: i64,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub preferred_market: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub last_login_at: Option<String>,
    #[serde(default)]
    pub login_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl CmsUser {
    /// Build the mirror payload for `user`.
    ///
    /// Only identity, stats and preferences are copied; UI flags have no
    /// counterpart here.
    pub fn from_record(user: &UserRecord, previous_login_count: u32, now: &str) -> Self {
        let user = &user.profile;
        let display_name = [user.display_name.as_str(), user.name.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("User")
            .to_string();

        Self {
            id: None,
            uid: user.uid.clone().unwrap_or_default(),
            email: user.email.clone(),
            display_name,
            photo_url: user.photo_url.clone(),
            provider: if user.provider.is_empty() {
                "unknown".to_string()
            } else {
                user.provider.clone()
            },
            level: user.level.max(1),
            coins: user.coins,
            xp: user.xp,
            rank: user.rank,
            status: "active".to_string(),
            role: "user".to_string(),
            is_verified: !user.email.is_empty(),
            preferred_market: if user.preferred_market.is_empty() {
                "SA".to_string()
            } else {
                user.preferred_market.clone()
            },
            language: if user.language.is_empty() {
                "en".to_string()
            } else {
                user.language.clone()
            },
            last_login_at: Some(now.to_string()),
            login_count: previous_login_count + 1,
            created_at: None,
        }
    }
}

/// Partial stats update pushed for leaderboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CmsStats {
    pub level: i64,
    pub coins: i64,
    pub xp: i64,
    pub rank: u32,
}

impl From<&UserRecord> for CmsStats {
    fn from(user: &UserRecord) -> Self {
        Self {
            level: user.profile.level,
            coins: user.profile.coins,
            xp: user.profile.xp,
            rank: user.profile.rank,
        }
    }
}

/// Editorial news item authored in the CMS (`entity=news`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsNewsItem {
    #[serde(default, deserialize_with = "deserialize_cms_id")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Market id, or "all"
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub is_published: bool,
}

impl CmsNewsItem {
    /// Published and targeted at `market` (or every market).
    pub fn is_visible_in(&self, market: &str) -> bool {
        self.is_published && (self.market == market || self.market == "all")
    }

    /// Present the item like a fetched article. CMS news has no external link.
    pub fn to_article(&self) -> NewsArticle {
        NewsArticle {
            id: self.id.clone().unwrap_or_default(),
            title: self.title.clone(),
            publisher: Some(
                self.source
                    .clone()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "Stocks Hero".to_string()),
            ),
            link: Some("#".to_string()),
            time: self.published_at.clone().unwrap_or_default(),
            thumbnail: self.image_url.clone(),
            summary: self.summary.clone(),
            related_tickers: Vec::new(),
        }
    }
}

fn deserialize_cms_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
