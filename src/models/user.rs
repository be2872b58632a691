// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and the in-app session.

use serde::{Deserialize, Serialize};
use serde_json::Value;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Loose JSON object used for partial updates and remote payloads.
pub type FieldMap = serde_json::Map<String, Value>;

/// Fields that only make sense inside the running app.
pub const LOCAL_ONLY_FIELDS: [&str; 3] = ["isAuthenticated", "isGuestMode", "avatar"];

/// Bundled avatar used until a provider photo is known.
pub const DEFAULT_AVATAR: &str = "assets/profile.jpg";

pub const DEFAULT_COINS: i64 = 1250;
pub const DEFAULT_LEVEL: i64 = 1;
pub const DEFAULT_XP: i64 = 0;

/// User document stored in Firestore (`users/{uid}`).
///
/// Field names follow the camelCase layout of the collection. Missing fields
/// fall back to the starting game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserDocument {
    // ─── Identity ────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub email: String,
    pub display_name: String,
    /// Name shown in the UI
    pub name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub provider: String,
    pub email_verified: bool,

    // ─── Game State ──────────────────────────────────────────────
    pub coins: i64,
    pub level: i64,
    pub level_title: String,
    pub streak: u32,
    pub rank: u32,
    pub xp: i64,
    pub xp_to_next_level: i64,
    pub portfolio_value: f64,
    pub portfolio_change: f64,
    pub watchlist_count: u32,
    pub alerts_count: u32,
    /// Tickers locked in for the current contest
    pub picks: Vec<String>,
    /// Unlocked achievement ids
    pub achievements: Vec<String>,
    pub swipe_enabled: bool,
    pub preferred_market: String,
    pub language: String,
    pub notifications: bool,

    // ─── Metadata ────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_at: Option<String>,
    pub login_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
}

impl Default for UserDocument {
    /// Starting game state for a brand-new player.
    fn default() -> Self {
        Self {
            uid: None,
            email: String::new(),
            display_name: String::new(),
            name: String::new(),
            photo_url: None,
            provider: String::new(),
            email_verified: false,
            coins: DEFAULT_COINS,
            level: DEFAULT_LEVEL,
            level_title: "Newcomer".to_string(),
            streak: 0,
            rank: 0,
            xp: DEFAULT_XP,
            xp_to_next_level: 1000,
            portfolio_value: 100_000.0,
            portfolio_change: 0.0,
            watchlist_count: 0,
            alerts_count: 0,
            picks: Vec::new(),
            achievements: Vec::new(),
            swipe_enabled: false,
            preferred_market: "SA".to_string(),
            language: "en".to_string(),
            notifications: true,
            created_at: None,
            last_login_at: None,
            last_active_at: None,
            login_count: 0,
            device_info: None,
            app_version: None,
        }
    }
}

/// Progress values compared when a guest upgrades into an existing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub coins: i64,
    pub xp: i64,
    pub level: i64,
}

impl Progress {
    /// Element-wise maximum: a merge never lowers either side.
    pub fn max(self, other: Progress) -> Progress {
        Progress {
            coins: self.coins.max(other.coins),
            xp: self.xp.max(other.xp),
            level: self.level.max(other.level),
        }
    }
}

impl UserDocument {
    /// Progress with missing/negative values read as 0 coins, 0 xp, level 1.
    pub fn progress(&self) -> Progress {
        Progress {
            coins: self.coins.max(0),
            xp: self.xp.max(0),
            level: self.level.max(DEFAULT_LEVEL),
        }
    }

    pub fn to_fields(&self) -> FieldMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => FieldMap::new(),
        }
    }

    /// Overlay `patch` onto this document. Unknown keys are ignored.
    pub fn apply_fields(&self, patch: &FieldMap) -> Result<UserDocument, serde_json::Error> {
        let mut fields = self.to_fields();
        merge_into(&mut fields, patch);
        serde_json::from_value(Value::Object(fields))
    }
}

/// The session's view of the user: the stored document plus UI-only flags.
///
/// Only `profile` is ever handed to Firestore or the CMS mirror; the flags
/// exist solely in memory and in the guest local-storage copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserRecord {
    #[serde(flatten)]
    pub profile: UserDocument,
    pub is_authenticated: bool,
    pub is_guest_mode: bool,
    pub avatar: String,
}

impl Default for UserRecord {
    /// The logged-out guest shape.
    fn default() -> Self {
        Self {
            profile: UserDocument {
                name: "Guest".to_string(),
                ..Default::default()
            },
            is_authenticated: false,
            is_guest_mode: false,
            avatar: DEFAULT_AVATAR.to_string(),
        }
    }
}

impl UserRecord {
    pub fn uid(&self) -> Option<&str> {
        self.profile.uid.as_deref()
    }

    /// A guest whose local record has moved away from the starting values.
    pub fn has_guest_progress(&self) -> bool {
        self.is_guest_mode && (self.profile.coins != DEFAULT_COINS || self.profile.xp > 0)
    }

    /// Every field as a JSON object, local-only flags included.
    pub fn to_fields(&self) -> FieldMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => FieldMap::new(),
        }
    }

    /// Remote fields whose value differs from `previous`.
    pub fn changed_remote_fields(&self, previous: &UserRecord) -> FieldMap {
        let before = previous.profile.to_fields();
        self.profile
            .to_fields()
            .into_iter()
            .filter(|(key, value)| before.get(key) != Some(value))
            .collect()
    }

    /// Overlay `patch` onto this record, like a shallow object spread.
    pub fn apply_fields(&self, patch: &FieldMap) -> Result<UserRecord, serde_json::Error> {
        let mut fields = self.to_fields();
        merge_into(&mut fields, patch);
        serde_json::from_value(Value::Object(fields))
    }
}

fn merge_into(target: &mut FieldMap, patch: &FieldMap) {
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
}
