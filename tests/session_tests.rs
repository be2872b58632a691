// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session reconciliation against the in-memory user store.
//!
//! Nothing here talks to a live endpoint, so time-dependent tests run on a
//! paused clock.

mod common;

use async_trait::async_trait;
use common::{offline_app, offline_app_with, principal, test_config};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use stock_hero::db::memory::StoreWrite;
use stock_hero::db::UserStore;
use stock_hero::error::AppError;
use stock_hero::models::user::{DEFAULT_AVATAR, LOCAL_ONLY_FIELDS};
use stock_hero::models::{FieldMap, UserDocument, UserRecord};
use stock_hero::screens::rewards;
use stock_hero::services::local_storage::keys;
use stock_hero::services::session::PROTECTED_FIELDS;
use stock_hero::services::{IdentityClient, LocalStorage, MemoryStorage, SyncState};
use stock_hero::AppState;

fn fields(value: serde_json::Value) -> FieldMap {
    value.as_object().cloned().unwrap()
}

/// Enter guest mode and play a bit.
fn play_as_guest(app: &common::TestApp, coins: i64, xp: i64, level: i64) {
    app.state.session.login_as_guest();
    app.state
        .session
        .update_fields(&fields(json!({ "coins": coins, "xp": xp, "level": level })))
        .unwrap();
}

#[tokio::test]
async fn test_guest_first_sign_in_creates_seeded_document() {
    let app = offline_app();
    play_as_guest(&app, 1800, 300, 2);
    assert!(app.storage.contains(keys::APP_USER));

    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;

    let doc = app.store.get("u1").expect("document created");
    assert_eq!((doc.coins, doc.xp, doc.level), (1800, 300, 2));
    assert_eq!(doc.login_count, 1);

    let session = app.state.session.snapshot();
    assert!(session.user.is_authenticated);
    assert!(!session.user.is_guest_mode);
    assert!(!session.loading);
    assert_eq!(session.sync, SyncState::Synced);
    assert_eq!(session.user.profile.name, "hero");
    assert_eq!(session.user.uid(), Some("u1"));
    assert!(!app.storage.contains(keys::APP_USER));
}

#[tokio::test]
async fn test_fresh_sign_in_without_guest_progress_uses_defaults() {
    let app = offline_app();
    app.state.session.login_as_guest();

    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;

    let doc = app.store.get("u1").unwrap();
    assert_eq!((doc.coins, doc.xp, doc.level), (1250, 0, 1));
}

#[tokio::test]
async fn test_guest_merge_takes_elementwise_max() {
    let app = offline_app();
    app.store.insert(
        "u1",
        UserDocument {
            coins: 5000,
            xp: 100,
            level: 1,
            login_count: 3,
            display_name: "Stored Name".into(),
            ..Default::default()
        },
    );
    play_as_guest(&app, 1800, 300, 2);

    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;

    let user = app.state.session.user();
    assert_eq!(
        (user.profile.coins, user.profile.xp, user.profile.level),
        (5000, 300, 2)
    );
    assert_eq!(user.profile.login_count, 4);
    // No provider display name, so the stored one wins over the email
    assert_eq!(user.profile.name, "Stored Name");

    let doc = app.store.get("u1").unwrap();
    assert_eq!((doc.coins, doc.xp, doc.level), (5000, 300, 2));
    assert!(!app
        .store
        .writes()
        .iter()
        .any(|w| matches!(w, StoreWrite::Create { .. })));
}

#[tokio::test]
async fn test_returning_user_records_login() {
    let app = offline_app();
    app.store.insert(
        "u1",
        UserDocument {
            coins: 4200,
            picks: vec!["2222".into()],
            ..Default::default()
        },
    );

    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;

    assert_eq!(
        app.store.writes(),
        vec![StoreWrite::Login { uid: "u1".into() }]
    );
    let user = app.state.session.user();
    assert_eq!(user.profile.coins, 4200);
    assert_eq!(user.profile.picks, vec!["2222"]);
    assert_eq!(user.avatar, DEFAULT_AVATAR);
}

#[tokio::test]
async fn test_local_only_fields_never_reach_the_store() {
    let app = offline_app();
    play_as_guest(&app, 1800, 0, 1);
    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;

    // UI-only change: nothing to persist
    app.state
        .session
        .update_fields(&fields(json!({ "avatar": "assets/other.jpg" })))
        .unwrap();
    app.state
        .session
        .update_fields(&fields(json!({ "coins": 1900 })))
        .unwrap();
    app.state.session.teardown().await;

    let updates = app.store.updates();
    assert_eq!(updates.len(), 1);
    for write in app.store.writes() {
        let payload = match write {
            StoreWrite::Create { doc, .. } => doc.to_fields(),
            StoreWrite::Update { fields, .. } => fields,
            _ => continue,
        };
        for key in LOCAL_ONLY_FIELDS {
            assert!(!payload.contains_key(key), "{} leaked into the store", key);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_loading_clears_at_ceiling_while_store_hangs() {
    let app = offline_app();
    app.store.set_hang(true);
    app.state.session.init();
    assert!(app.state.session.snapshot().loading);

    let session = app.state.session.clone();
    let reconcile = tokio::spawn(async move {
        session
            .handle_auth_change(Some(principal("u1", "hero@example.com")))
            .await;
    });

    tokio::time::sleep(Duration::from_millis(2001)).await;
    let snapshot = app.state.session.snapshot();
    assert!(!snapshot.loading);
    assert!(!snapshot.user.is_authenticated);

    // The lookup deadline gives up and the session continues locally
    reconcile.await.unwrap();
    let snapshot = app.state.session.snapshot();
    assert!(snapshot.user.is_authenticated);
    assert_eq!(snapshot.sync, SyncState::LocalOnly);
    assert!(app.store.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_lookup_failure_keeps_local_progress_without_autosave() {
    let app = offline_app();
    play_as_guest(&app, 1800, 300, 2);
    app.store.set_fail(true);

    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;

    let session = app.state.session.snapshot();
    assert_eq!(session.sync, SyncState::LocalOnly);
    assert!(session.user.is_authenticated);
    assert!(!session.user.is_guest_mode);
    assert_eq!(session.user.profile.coins, 1800);
    assert_eq!(session.user.uid(), Some("u1"));
    // No provider display name, so the email local part replaces "Guest"
    assert_eq!(session.user.profile.name, "hero");

    app.store.set_fail(false);
    app.state
        .session
        .update_fields(&fields(json!({ "coins": 2500 })))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(app.store.writes().is_empty());
    assert!(app.store.get("u1").is_none());
}

/// Reads succeed (always empty); every write fails.
struct ReadOnlyStore;

#[async_trait]
impl UserStore for ReadOnlyStore {
    async fn get_user(&self, _uid: &str) -> Result<Option<UserDocument>, AppError> {
        Ok(None)
    }

    async fn create_user(&self, _uid: &str, _doc: &UserDocument) -> Result<(), AppError> {
        Err(AppError::Database("permission denied".into()))
    }

    async fn update_user(&self, _uid: &str, _fields: &FieldMap) -> Result<(), AppError> {
        Err(AppError::Database("permission denied".into()))
    }

    async fn record_login(&self, _uid: &str, _now: &str) -> Result<(), AppError> {
        Err(AppError::Database("permission denied".into()))
    }

    async fn delete_user(&self, _uid: &str) -> Result<(), AppError> {
        Err(AppError::Database("permission denied".into()))
    }
}

#[tokio::test]
async fn test_create_failure_falls_back_to_local_defaults() {
    let config = test_config();
    let identity = Arc::new(IdentityClient::with_base_url("k", "http://127.0.0.1:9").unwrap());
    let state = AppState::new(
        config,
        Arc::new(ReadOnlyStore),
        identity,
        Arc::new(MemoryStorage::new()),
    )
    .unwrap();

    state
        .session
        .handle_auth_change(Some(principal("u7", "seven@example.com")))
        .await;

    let session = state.session.snapshot();
    assert_eq!(session.sync, SyncState::LocalOnly);
    assert!(session.user.is_authenticated);
    assert_eq!(session.user.profile.provider, "fallback");
    assert_eq!(session.user.profile.coins, 1250);
    assert_eq!(session.user.profile.name, "seven");
}

#[tokio::test(start_paused = true)]
async fn test_changes_within_debounce_become_one_write() {
    let app = offline_app();
    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;

    app.state
        .session
        .update_fields(&fields(json!({ "coins": 1300 })))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    app.state
        .session
        .update_fields(&fields(json!({ "xp": 40 })))
        .unwrap();

    // Each change pushes the flush out again
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(app.store.updates().is_empty());

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let updates = app.store.updates();
    assert_eq!(updates.len(), 1);
    let (uid, written) = &updates[0];
    assert_eq!(uid, "u1");
    assert_eq!(written.get("coins"), Some(&json!(1300)));
    assert_eq!(written.get("xp"), Some(&json!(40)));

    let doc = app.store.get("u1").unwrap();
    assert_eq!((doc.coins, doc.xp), (1300, 40));
}

#[tokio::test]
async fn test_reconciliation_itself_never_autosaves() {
    let app = offline_app();
    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;
    app.state.session.teardown().await;

    assert!(app.store.updates().is_empty());
}

#[tokio::test]
async fn test_same_uid_refresh_only_updates_identity_fields() {
    let app = offline_app();
    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;
    app.state
        .session
        .update_fields(&fields(json!({ "coins": 2000 })))
        .unwrap();
    let non_update_writes = || {
        app.store
            .writes()
            .into_iter()
            .filter(|w| !matches!(w, StoreWrite::Update { .. }))
            .count()
    };
    let writes_before = non_update_writes();

    let mut renamed = principal("u1", "hero@example.com");
    renamed.display_name = Some("Hero".into());
    renamed.photo_url = Some("https://example.com/me.png".into());
    app.state.session.handle_auth_change(Some(renamed)).await;

    let user = app.state.session.user();
    assert_eq!(user.profile.name, "Hero");
    assert_eq!(user.profile.coins, 2000);
    assert_eq!(user.avatar, "https://example.com/me.png");
    assert_eq!(non_update_writes(), writes_before);
}

#[tokio::test]
async fn test_sign_out_keeps_guest_record_in_guest_mode() {
    let app = offline_app();
    play_as_guest(&app, 1400, 20, 1);

    app.state.session.handle_auth_change(None).await;

    let user = app.state.session.user();
    assert!(user.is_guest_mode);
    assert!(!user.is_authenticated);
    assert_eq!(user.profile.coins, 1400);
}

#[tokio::test]
async fn test_sign_out_resets_signed_in_user() {
    let app = offline_app();
    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;

    app.state.session.handle_auth_change(None).await;

    assert_eq!(app.state.session.user(), UserRecord::default());
}

#[tokio::test]
async fn test_logout_clears_guest_storage() {
    let app = offline_app();
    play_as_guest(&app, 1800, 300, 2);
    assert!(app.storage.contains(keys::APP_USER));

    app.state.session.logout().await;

    assert!(!app.storage.contains(keys::APP_USER));
    assert_eq!(app.state.session.user(), UserRecord::default());
}

#[tokio::test]
async fn test_init_recovers_saved_guest() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set(
            keys::APP_USER,
            r#"{"coins": 1800, "xp": 300, "isGuestMode": true, "isAuthenticated": true, "avatar": "x.png"}"#,
        )
        .unwrap();
    let app = offline_app_with(test_config(), storage);

    app.state.session.init();

    let session = app.state.session.snapshot();
    assert!(session.loading);
    assert_eq!(session.user.profile.coins, 1800);
    assert_eq!(session.user.profile.xp, 300);
    assert!(session.user.is_guest_mode);
    assert!(!session.user.is_authenticated);
    assert_eq!(session.user.avatar, DEFAULT_AVATAR);
}

#[tokio::test]
async fn test_init_ignores_corrupt_guest_entry() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(keys::APP_USER, "{not json").unwrap();
    let app = offline_app_with(test_config(), storage);

    app.state.session.init();

    assert_eq!(app.state.session.user(), UserRecord::default());
}

#[tokio::test]
async fn test_attach_follows_identity_changes() {
    let app = offline_app();
    app.state.session.init();
    let mut rx = app.state.session.subscribe();
    app.state.session.attach();

    app.state
        .identity
        .publish(Some(principal("u1", "hero@example.com")));

    let session = rx
        .wait_for(|s| s.user.is_authenticated)
        .await
        .unwrap()
        .clone();
    assert_eq!(session.user.uid(), Some("u1"));
    assert!(app.store.get("u1").is_some());

    app.state.session.teardown().await;
}

// ─── Record Integrity ────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_guest_patch_cannot_claim_another_account() {
    let app = offline_app();
    app.store.insert(
        "victim",
        UserDocument {
            coins: 300,
            ..Default::default()
        },
    );
    play_as_guest(&app, 1800, 0, 1);

    let result = app.state.session.update_fields(&fields(json!({
        "isAuthenticated": true,
        "uid": "victim",
        "coins": 999999,
    })));
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let user = app.state.session.user();
    assert!(!user.is_authenticated);
    assert!(user.is_guest_mode);
    assert_eq!(user.uid(), None);
    assert_eq!(user.profile.coins, 1800);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(app.store.updates().is_empty());
    assert_eq!(app.store.get("victim").unwrap().coins, 300);
}

#[tokio::test]
async fn test_patch_refuses_each_protected_field() {
    let app = offline_app();
    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;
    let before = app.state.session.user();

    for key in PROTECTED_FIELDS {
        let mut patch = FieldMap::new();
        patch.insert(key.to_string(), json!("x"));
        patch.insert("coins".to_string(), json!(1));
        let result = app.state.session.update_fields(&patch);
        assert!(
            matches!(result, Err(AppError::BadRequest(ref m)) if m.contains(key)),
            "{} was accepted",
            key
        );
    }

    assert_eq!(app.state.session.user(), before);
    app.state.session.teardown().await;
    assert!(app.store.updates().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_typed_identity_change_never_autosaves() {
    let app = offline_app();
    app.store.insert("victim", UserDocument::default());
    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;

    // Moving the record to another uid writes to neither document
    app.state.session.update_with(|user| {
        user.profile.uid = Some("victim".into());
        user.profile.coins = 5;
    });
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(app.store.updates().is_empty());
    assert_eq!(app.store.get("victim").unwrap().coins, 1250);

    // A guest flipping its own flag is not signed in either
    app.state.session.logout().await;
    app.state.session.login_as_guest();
    app.state.session.update_with(|user| {
        user.is_authenticated = true;
        user.profile.uid = Some("victim".into());
        user.profile.coins = 7;
    });
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(app.store.updates().is_empty());
}

#[tokio::test]
async fn test_concurrent_updates_are_not_lost() {
    let app = offline_app();
    app.state
        .session
        .handle_auth_change(Some(principal("u1", "hero@example.com")))
        .await;
    let session = &app.state.session;

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(move || {
                for _ in 0..500 {
                    session.update_with(|user| user.profile.coins += 1);
                    session.update_with(|user| user.profile.xp += 2);
                }
            });
        }
    });

    let user = session.user();
    assert_eq!(user.profile.coins, 1250 + 8 * 500);
    assert_eq!(user.profile.xp, 8 * 500 * 2);

    session.teardown().await;
    let doc = app.store.get("u1").unwrap();
    assert_eq!((doc.coins, doc.xp), (1250 + 8 * 500, 8 * 500 * 2));
}

#[tokio::test]
async fn test_concurrent_redeems_never_overdraw() {
    let app = offline_app();
    app.state.session.login_as_guest();
    // Exactly five of the 1000-coin rewards fit
    app.state
        .session
        .update_fields(&fields(json!({ "coins": 5500 })))
        .unwrap();
    let session = &app.state.session;

    let redeemed: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(move || rewards::redeem(session, 4).is_ok()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum()
    });

    assert_eq!(redeemed, 5);
    assert_eq!(session.user().profile.coins, 500);
}

#[tokio::test]
async fn test_refused_change_publishes_nothing() {
    let app = offline_app();
    play_as_guest(&app, 1800, 0, 1);
    let rx = app.state.session.subscribe();

    let result = app.state.session.try_update_with(|user| {
        user.profile.coins = 0;
        Err(AppError::BadRequest("no".into()))
    });

    assert!(result.is_err());
    assert!(!rx.has_changed().unwrap());
    assert_eq!(app.state.session.user().profile.coins, 1800);
}
