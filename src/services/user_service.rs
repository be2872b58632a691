// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User document operations with deadlines.
//!
//! Every remote call goes through [`with_deadline`] so a stalled Firestore
//! connection can never hold the session hostage.

use crate::config::Timings;
use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{FieldMap, UserDocument};
use crate::services::deadline::with_deadline;
use crate::services::identity::AuthPrincipal;
use crate::time_utils::now_rfc3339;
use serde_json::json;
use std::sync::Arc;

const DEVICE_INFO_MAX_CHARS: usize = 200;

/// Provider recorded on documents that were never persisted.
pub const FALLBACK_PROVIDER: &str = "fallback";

pub struct UserService {
    store: Arc<dyn UserStore>,
    timings: Timings,
    app_version: String,
    device_info: String,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, timings: Timings, app_version: &str) -> Self {
        let device_info = format!(
            "stock-hero/{} ({}; {})",
            app_version,
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        Self {
            store,
            timings,
            app_version: app_version.to_string(),
            device_info: truncate_chars(&device_info, DEVICE_INFO_MAX_CHARS),
        }
    }

    /// Fetch a user document.
    ///
    /// `Ok(None)` is a confirmed miss; any error (including a timeout) means
    /// the store could not answer.
    pub async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>, AppError> {
        let doc = with_deadline(
            self.timings.firestore_timeout,
            "get_user",
            self.store.get_user(uid),
        )
        .await?;
        if doc.is_some() {
            tracing::debug!(uid, "User document loaded");
        }
        Ok(doc)
    }

    /// Create the document for a first sign-in, optionally seeded from a
    /// guest's local progress.
    pub async fn create_user(
        &self,
        principal: &AuthPrincipal,
        guest: Option<&UserDocument>,
    ) -> Result<UserDocument, AppError> {
        let now = now_rfc3339();
        let mut doc = identity_document(principal);
        doc.provider = principal.provider.clone();

        if let Some(guest) = guest {
            doc.coins = non_zero_or(guest.coins, doc.coins);
            doc.level = non_zero_or(guest.level, doc.level);
            doc.xp = guest.xp;
            doc.picks = guest.picks.clone();
            doc.achievements = guest.achievements.clone();
        }

        doc.created_at = Some(now.clone());
        doc.last_login_at = Some(now.clone());
        doc.last_active_at = Some(now);
        doc.login_count = 1;
        doc.device_info = Some(self.device_info.clone());
        doc.app_version = Some(self.app_version.clone());

        with_deadline(
            self.timings.firestore_timeout,
            "create_user",
            self.store.create_user(&principal.uid, &doc),
        )
        .await?;

        tracing::info!(uid = %principal.uid, seeded = guest.is_some(), "New user created");
        Ok(doc)
    }

    /// Write changed fields, stamping `lastActiveAt`.
    pub async fn update_user(&self, uid: &str, fields: &FieldMap) -> Result<(), AppError> {
        let mut fields = fields.clone();
        fields.insert("lastActiveAt".to_string(), json!(now_rfc3339()));
        with_deadline(
            self.timings.firestore_timeout,
            "update_user",
            self.store.update_user(uid, &fields),
        )
        .await
    }

    /// Record a login. Failures are logged and swallowed.
    pub async fn record_login(&self, uid: &str) {
        let now = now_rfc3339();
        if let Err(e) = with_deadline(
            self.timings.login_record_timeout,
            "record_login",
            self.store.record_login(uid, &now),
        )
        .await
        {
            tracing::warn!(uid, error = %e, "Failed to record login (non-critical)");
        }
    }

    pub async fn delete_user(&self, uid: &str) -> Result<(), AppError> {
        with_deadline(
            self.timings.firestore_timeout,
            "delete_user",
            self.store.delete_user(uid),
        )
        .await
    }

    /// Carry a guest's progress into an existing account and write the
    /// result. The higher of each progress value wins and the login is
    /// counted.
    pub async fn merge_guest(
        &self,
        uid: &str,
        existing: UserDocument,
        guest: &UserDocument,
    ) -> Result<UserDocument, AppError> {
        let remote = existing.progress();
        let local = guest.progress();
        let merged = remote.max(local);
        tracing::info!(
            uid,
            remote_coins = remote.coins,
            remote_xp = remote.xp,
            remote_level = remote.level,
            guest_coins = local.coins,
            guest_xp = local.xp,
            guest_level = local.level,
            "Merging guest progress into existing account"
        );

        let mut fields = FieldMap::new();
        fields.insert("coins".to_string(), json!(merged.coins));
        fields.insert("xp".to_string(), json!(merged.xp));
        fields.insert("level".to_string(), json!(merged.level));
        fields.insert("lastLoginAt".to_string(), json!(now_rfc3339()));
        fields.insert("loginCount".to_string(), json!(existing.login_count.saturating_add(1)));

        self.update_user(uid, &fields).await?;

        existing
            .apply_fields(&fields)
            .map_err(|e| AppError::Internal(e.into()))
    }

    /// Unpersisted document used when creation failed.
    pub fn fallback_document(principal: &AuthPrincipal) -> UserDocument {
        UserDocument {
            provider: FALLBACK_PROVIDER.to_string(),
            ..identity_document(principal)
        }
    }
}

/// Default game state carrying the principal's identity.
fn identity_document(principal: &AuthPrincipal) -> UserDocument {
    UserDocument {
        uid: Some(principal.uid.clone()),
        email: principal.email.clone().unwrap_or_default(),
        display_name: display_name_for(principal),
        photo_url: principal.photo_url.clone(),
        email_verified: principal.email_verified,
        ..Default::default()
    }
}

/// Provider display name, else email local part, else "Player".
pub fn display_name_for(principal: &AuthPrincipal) -> String {
    player_name(principal, None, "Player")
}

/// Name shown for a signed-in player.
///
/// Order: provider display name, then `stored` (the name on the user
/// document), then the email local part, then `fallback`. Empty names are
/// skipped.
pub fn player_name(principal: &AuthPrincipal, stored: Option<&str>, fallback: &str) -> String {
    principal
        .display_name
        .as_deref()
        .into_iter()
        .chain(stored)
        .find(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| email_local_part(principal.email.as_deref()))
        .unwrap_or_else(|| fallback.to_string())
}

pub fn email_local_part(email: Option<&str>) -> Option<String> {
    email
        .and_then(|e| e.split('@').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn non_zero_or(value: i64, default: i64) -> i64 {
    if value != 0 {
        value
    } else {
        default
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
