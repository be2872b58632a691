// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore user documents).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryUserStore;

use crate::error::AppError;
use crate::models::{FieldMap, UserDocument};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Storage for user documents, keyed by Firebase uid.
///
/// Implementations never see local-only UI flags: callers hand over either a
/// [`UserDocument`] or a field map built from one.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user document. `Ok(None)` means the document does not exist.
    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>, AppError>;

    /// Write a complete document, replacing any existing one.
    async fn create_user(&self, uid: &str, doc: &UserDocument) -> Result<(), AppError>;

    /// Merge `fields` into an existing document.
    async fn update_user(&self, uid: &str, fields: &FieldMap) -> Result<(), AppError>;

    /// Stamp `lastLoginAt` and increment `loginCount` atomically.
    async fn record_login(&self, uid: &str, now: &str) -> Result<(), AppError>;

    async fn delete_user(&self, uid: &str) -> Result<(), AppError>;
}
