// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local persistent key/value storage.
//!
//! String keys map to string values, like browser local storage. The file
//! backend keeps one file per key under a directory.

use crate::error::AppError;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// Well-known keys.
pub mod keys {
    /// Guest user record
    pub const APP_USER: &str = "appUser";
    /// Selected market id
    pub const SELECTED_MARKET: &str = "selectedMarket";

    /// Cached news for one market.
    pub fn news_cache(market: &str) -> String {
        format!("news_cache_{}", market)
    }
}

pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Read and decode a JSON value.
///
/// A value that fails to decode is reported as an error; callers decide
/// whether to discard it.
pub fn read_json<T: DeserializeOwned>(
    storage: &dyn LocalStorage,
    key: &str,
) -> Result<Option<T>, AppError> {
    match storage.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::Storage(format!("Corrupt entry {}: {}", key, e))),
        None => Ok(None),
    }
}

pub fn write_json<T: Serialize>(
    storage: &dyn LocalStorage,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let raw = serde_json::to_string(value)
        .map_err(|e| AppError::Storage(format!("Failed to encode {}: {}", key, e)))?;
    storage.set(key, &raw)
}

// ─── File Backend ───────────────────────────────────────────────

pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            AppError::Storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        tracing::debug!(dir = %dir.display(), "Local storage opened");
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("Failed to read {}: {}", key, e))),
        }
    }

    /// Write through a temp file so a crash never leaves half a value.
    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .and_then(|_| std::fs::rename(&tmp, &path))
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", key, e)))
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to remove {}: {}", key, e))),
        }
    }
}

// ─── Memory Backend ─────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.get(key).map(|v| v.clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_cache_key() {
        assert_eq!(keys::news_cache("SA"), "news_cache_SA");
    }

    #[test]
    fn test_memory_json_helpers() {
        let storage = MemoryStorage::new();
        write_json(&storage, "k", &vec![1, 2, 3]).unwrap();
        let back: Option<Vec<i32>> = read_json(&storage, "k").unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));

        storage.set("bad", "{not json").unwrap();
        assert!(read_json::<Vec<i32>>(&storage, "bad").is_err());

        storage.remove("k").unwrap();
        assert!(!storage.contains("k"));
    }
}
