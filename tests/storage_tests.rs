// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed local storage and what survives a restart.

mod common;

use std::path::Path;
use std::sync::Arc;
use stock_hero::db::MemoryUserStore;
use stock_hero::services::local_storage::{keys, read_json, write_json};
use stock_hero::services::{FileStorage, IdentityClient, LocalStorage, MarketContext};
use stock_hero::AppState;
use tempfile::TempDir;

fn start_app(dir: &Path) -> Arc<AppState> {
    let config = common::test_config();
    let identity = Arc::new(
        IdentityClient::with_base_url(&config.firebase_api_key, "http://127.0.0.1:9").unwrap(),
    );
    let storage = Arc::new(FileStorage::open(dir).unwrap());
    let state = AppState::new(config, Arc::new(MemoryUserStore::new()), identity, storage).unwrap();
    state.session.init();
    state
}

#[test]
fn test_set_get_remove() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();

    assert_eq!(storage.get("missing").unwrap(), None);
    storage.set("greeting", "hello").unwrap();
    assert_eq!(storage.get("greeting").unwrap().as_deref(), Some("hello"));

    storage.set("greeting", "bye").unwrap();
    assert_eq!(storage.get("greeting").unwrap().as_deref(), Some("bye"));

    storage.remove("greeting").unwrap();
    assert_eq!(storage.get("greeting").unwrap(), None);
    // Removing twice is fine
    storage.remove("greeting").unwrap();
}

#[test]
fn test_values_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let storage = FileStorage::open(dir.path()).unwrap();
        write_json(&storage, &keys::news_cache("SA"), &vec!["a", "b"]).unwrap();
    }

    let storage = FileStorage::open(dir.path()).unwrap();
    let cached: Option<Vec<String>> = read_json(&storage, &keys::news_cache("SA")).unwrap();
    assert_eq!(cached, Some(vec!["a".to_string(), "b".to_string()]));
}

#[test]
fn test_keys_with_path_characters_stay_inside_dir() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("store");
    let storage = FileStorage::open(&nested).unwrap();

    storage.set("../escape/attempt", "x").unwrap();
    storage.set("with space", "y").unwrap();

    assert_eq!(storage.get("../escape/attempt").unwrap().as_deref(), Some("x"));
    assert_eq!(storage.get("with space").unwrap().as_deref(), Some("y"));
    assert!(!dir.path().join("escape").exists());
    assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 2);
}

#[test]
fn test_market_selection_survives_restart() {
    let dir = TempDir::new().unwrap();
    let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::open(dir.path()).unwrap());

    let market = MarketContext::new(storage.clone());
    assert_eq!(market.current().id, "SA");
    market.select("JP").unwrap();
    drop(market);

    let reopened: Arc<dyn LocalStorage> = Arc::new(FileStorage::open(dir.path()).unwrap());
    assert_eq!(MarketContext::new(reopened).current().id, "JP");
}

#[tokio::test]
async fn test_guest_progress_survives_restart() {
    let dir = TempDir::new().unwrap();

    let first = start_app(dir.path());
    first.session.login_as_guest();
    first.session.update_with(|user| {
        user.profile.coins = 2400;
        user.profile.xp = 75;
    });
    drop(first);

    let second = start_app(dir.path());
    let user = second.session.user();
    assert_eq!(user.profile.coins, 2400);
    assert_eq!(user.profile.xp, 75);
    assert!(!user.is_authenticated);
}
