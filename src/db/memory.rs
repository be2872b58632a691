// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory user store for offline mode and tests.
//!
//! Besides holding documents it can be told to hang or fail, and it keeps a
//! log of every write so tests can count round trips.

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{FieldMap, UserDocument};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A write observed by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    Create { uid: String, doc: UserDocument },
    Update { uid: String, fields: FieldMap },
    Login { uid: String },
    Delete { uid: String },
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<String, UserDocument>,
    writes: Mutex<Vec<StoreWrite>>,
    hang: AtomicBool,
    fail: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without logging a write.
    pub fn insert(&self, uid: &str, doc: UserDocument) {
        self.users.insert(uid.to_string(), doc);
    }

    pub fn get(&self, uid: &str) -> Option<UserDocument> {
        self.users.get(uid).map(|d| d.clone())
    }

    /// Every call blocks forever while set.
    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// Every call fails with a database error while set.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<StoreWrite> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Update writes only.
    pub fn updates(&self) -> Vec<(String, FieldMap)> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                StoreWrite::Update { uid, fields } => Some((uid, fields)),
                _ => None,
            })
            .collect()
    }

    async fn gate(&self) -> Result<(), AppError> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Database("Store unavailable".to_string()));
        }
        Ok(())
    }

    fn log(&self, write: StoreWrite) {
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(write);
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>, AppError> {
        self.gate().await?;
        Ok(self.get(uid))
    }

    async fn create_user(&self, uid: &str, doc: &UserDocument) -> Result<(), AppError> {
        self.gate().await?;
        self.users.insert(uid.to_string(), doc.clone());
        self.log(StoreWrite::Create {
            uid: uid.to_string(),
            doc: doc.clone(),
        });
        Ok(())
    }

    async fn update_user(&self, uid: &str, fields: &FieldMap) -> Result<(), AppError> {
        self.gate().await?;
        let current = self.get(uid).unwrap_or_default();
        let updated = current
            .apply_fields(fields)
            .map_err(|e| AppError::BadRequest(format!("Invalid user fields: {}", e)))?;
        self.users.insert(uid.to_string(), updated);
        self.log(StoreWrite::Update {
            uid: uid.to_string(),
            fields: fields.clone(),
        });
        Ok(())
    }

    async fn record_login(&self, uid: &str, now: &str) -> Result<(), AppError> {
        self.gate().await?;
        let mut doc = self
            .users
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;
        doc.last_login_at = Some(now.to_string());
        doc.login_count += 1;
        drop(doc);
        self.log(StoreWrite::Login {
            uid: uid.to_string(),
        });
        Ok(())
    }

    async fn delete_user(&self, uid: &str) -> Result<(), AppError> {
        self.gate().await?;
        self.users.remove(uid);
        self.log(StoreWrite::Delete {
            uid: uid.to_string(),
        });
        Ok(())
    }
}
