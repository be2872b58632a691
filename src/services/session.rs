// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-wide user session.
//!
//! Lifecycle:
//! 1. [`SessionStore::init`] recovers a guest record and arms the loading ceiling
//! 2. [`SessionStore::attach`] follows identity changes (or call
//!    [`SessionStore::handle_auth_change`] directly)
//! 3. [`SessionStore::teardown`] stops listeners and flushes pending writes
//!
//! Observers subscribe to a `watch` channel and always see the latest
//! [`Session`].

use crate::error::{AppError, AuthError};
use crate::models::user::DEFAULT_AVATAR;
use crate::models::{CmsStats, FieldMap, UserDocument, UserRecord};
use crate::services::autosave::Autosave;
use crate::services::cms::{MirrorJob, MirrorSync};
use crate::services::identity::{AuthPrincipal, IdentityClient};
use crate::services::local_storage::{keys, read_json, write_json, LocalStorage};
use crate::services::user_service::{display_name_for, player_name, UserService, FALLBACK_PROVIDER};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Keys `update_fields` refuses: identity, account metadata and session flags.
pub const PROTECTED_FIELDS: [&str; 13] = [
    "uid",
    "email",
    "emailVerified",
    "provider",
    "isAuthenticated",
    "isGuestMode",
    "loginCount",
    "createdAt",
    "lastLoginAt",
    "lastActiveAt",
    "deviceInfo",
    "appVersion",
    "displayName",
];

/// Whether the session record is backed by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Loaded from or written to Firestore; edits are autosaved.
    Synced,
    /// Built from identity data alone; edits stay in memory.
    LocalOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: UserRecord,
    pub loading: bool,
    pub sync: SyncState,
}

/// Shared collaborators of the session store.
pub struct SessionDeps {
    pub users: Arc<UserService>,
    pub identity: Arc<IdentityClient>,
    pub mirror: MirrorSync,
    pub autosave: Autosave,
    pub storage: Arc<dyn LocalStorage>,
}

pub struct SessionStore {
    state: watch::Sender<Session>,
    users: Arc<UserService>,
    identity: Arc<IdentityClient>,
    mirror: MirrorSync,
    autosave: Autosave,
    storage: Arc<dyn LocalStorage>,
    loading_ceiling: Duration,
    /// Stats last pushed to the CMS for the signed-in user
    mirrored_stats: Mutex<Option<CmsStats>>,
    /// Serializes auth-state handling
    reconcile: tokio::sync::Mutex<()>,
    /// Serializes record changes. Holds the uid autosave may write to, set
    /// only when reconciliation loads that user's document.
    writer: Mutex<Option<String>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionStore {
    pub fn new(deps: SessionDeps, loading_ceiling: Duration) -> Arc<Self> {
        let (state, _) = watch::channel(Session {
            user: UserRecord::default(),
            loading: true,
            sync: SyncState::Synced,
        });

        Arc::new(Self {
            state,
            users: deps.users,
            identity: deps.identity,
            mirror: deps.mirror,
            autosave: deps.autosave,
            storage: deps.storage,
            loading_ceiling,
            mirrored_stats: Mutex::new(None),
            reconcile: tokio::sync::Mutex::new(()),
            writer: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        })
    }

    // ─── Observation ─────────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> UserRecord {
        self.state.borrow().user.clone()
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Recover the guest record and start the loading ceiling.
    pub fn init(self: &Arc<Self>) {
        let user = self.recover_guest().unwrap_or_default();
        let mut owner = self.lock_writer();
        *owner = None;
        self.state.send_modify(|s| {
            s.user = user;
            s.loading = true;
            s.sync = SyncState::Synced;
        });
        drop(owner);

        let weak: Weak<Self> = Arc::downgrade(self);
        let ceiling = self.loading_ceiling;
        self.track(tokio::spawn(async move {
            tokio::time::sleep(ceiling).await;
            if let Some(store) = weak.upgrade() {
                store.state.send_if_modified(|s| {
                    if s.loading {
                        tracing::warn!(
                            ceiling_ms = ceiling.as_millis() as u64,
                            "Session still loading at ceiling, forcing ready"
                        );
                        s.loading = false;
                        true
                    } else {
                        false
                    }
                });
            }
        }));
    }

    fn recover_guest(&self) -> Option<UserRecord> {
        let saved: FieldMap = match read_json(self.storage.as_ref(), keys::APP_USER) {
            Ok(saved) => saved?,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring saved guest record");
                return None;
            }
        };

        match UserRecord::default().apply_fields(&saved) {
            Ok(mut user) => {
                user.is_authenticated = false;
                user.avatar = DEFAULT_AVATAR.to_string();
                tracing::info!(coins = user.profile.coins, xp = user.profile.xp, "Recovered guest record");
                Some(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring saved guest record");
                None
            }
        }
    }

    /// Follow auth-state changes from the identity client.
    ///
    /// The current state is handled first, then every change in order.
    pub fn attach(self: &Arc<Self>) {
        let mut rx = self.identity.subscribe();
        let weak = Arc::downgrade(self);
        self.track(tokio::spawn(async move {
            loop {
                let principal = rx.borrow_and_update().clone();
                match weak.upgrade() {
                    Some(store) => store.handle_auth_change(principal).await,
                    None => return,
                }
                if rx.changed().await.is_err() {
                    return;
                }
            }
        }));
    }

    /// Stop listeners and timers, then flush pending writes and mirror jobs.
    pub async fn teardown(&self) {
        let tasks: Vec<JoinHandle<()>> = match self.tasks.lock() {
            Ok(mut tasks) => tasks.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for task in tasks {
            task.abort();
        }

        self.push_stats();
        self.autosave.flush().await;
        self.mirror.drain().await;
        tracing::info!("Session torn down");
    }

    fn track(&self, handle: JoinHandle<()>) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|t| !t.is_finished());
            tasks.push(handle);
        }
    }

    // ─── Reconciliation ──────────────────────────────────────────

    /// Bring the session in line with the signed-in identity (or its absence).
    pub async fn handle_auth_change(&self, principal: Option<AuthPrincipal>) {
        let _guard = self.reconcile.lock().await;

        match principal {
            Some(principal) => self.reconcile_signed_in(&principal).await,
            None => {
                let previous = self.user();
                let user = if previous.is_guest_mode {
                    UserRecord {
                        is_authenticated: false,
                        ..previous
                    }
                } else {
                    UserRecord::default()
                };
                tracing::debug!(guest = user.is_guest_mode, "No identity, staying logged out");
                self.set_user(user, SyncState::Synced);
            }
        }

        self.state.send_if_modified(|s| std::mem::replace(&mut s.loading, false));
    }

    async fn reconcile_signed_in(&self, principal: &AuthPrincipal) {
        let uid = principal.uid.as_str();
        let current = self.snapshot();
        let previous = current.user;

        if previous.is_authenticated
            && previous.uid() == Some(uid)
            && current.sync == SyncState::Synced
        {
            let mut user = previous;
            user.profile.name = display_name_for(principal);
            user.profile.email = principal.email.clone().unwrap_or_default();
            user.profile.email_verified = principal.email_verified;
            if principal.photo_url.is_some() {
                user.profile.photo_url = principal.photo_url.clone();
            }
            user.avatar = avatar_for(principal);
            self.set_user(user, SyncState::Synced);
            return;
        }

        let was_guest = previous.has_guest_progress();
        tracing::info!(uid, was_guest, "Reconciling session with signed-in identity");

        let existing = match self.users.get_user(uid).await {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(uid, error = %e, "User store unreachable, continuing with local data");
                let mut user = previous;
                user.profile.name = player_name(principal, None, &user.profile.name);
                user.profile.email = principal.email.clone().unwrap_or_default();
                user.profile.photo_url = principal.photo_url.clone();
                user.profile.uid = Some(principal.uid.clone());
                user.is_authenticated = true;
                user.is_guest_mode = false;
                user.avatar = avatar_for(principal);
                self.set_user(user, SyncState::LocalOnly);
                return;
            }
        };

        let loaded = match existing {
            Some(existing) if was_guest => self
                .users
                .merge_guest(uid, existing.clone(), &previous.profile)
                .await
                .map_err(|e| (e, merge_preview(&existing, &previous.profile))),
            Some(existing) => {
                self.users.record_login(uid).await;
                Ok(existing)
            }
            None => {
                let seed = was_guest.then_some(&previous.profile);
                self.users
                    .create_user(principal, seed)
                    .await
                    .map_err(|e| (e, UserService::fallback_document(principal)))
            }
        };

        match loaded {
            Ok(doc) => {
                let user = authenticated_record(doc, principal);
                self.remember_mirrored(&user);
                self.mirror.enqueue(MirrorJob::Upsert(Box::new(user.clone())));
                self.set_user(user, SyncState::Synced);
                if let Err(e) = self.storage.remove(keys::APP_USER) {
                    tracing::warn!(error = %e, "Failed to clear saved guest record");
                }
            }
            Err((e, doc)) => {
                tracing::error!(uid, error = %e, "Failed to persist user, session is local only");
                let provider_fallback = doc.provider == FALLBACK_PROVIDER;
                let mut user = authenticated_record(doc, principal);
                if provider_fallback {
                    user.profile.provider = FALLBACK_PROVIDER.to_string();
                }
                self.set_user(user, SyncState::LocalOnly);
            }
        }
    }

    // ─── Mutations ───────────────────────────────────────────────

    /// Enter guest mode, keeping whatever progress the record already has.
    pub fn login_as_guest(&self) -> UserRecord {
        let mut user = self.user();
        user.profile.name = "Guest".to_string();
        user.is_authenticated = false;
        user.is_guest_mode = true;
        user.avatar = DEFAULT_AVATAR.to_string();
        self.set_user(user.clone(), SyncState::Synced);
        user
    }

    /// Merge `patch` into the record, like a game action would.
    ///
    /// Identity, account metadata and session flags are owned by sign-in and
    /// are refused here.
    pub fn update_fields(&self, patch: &FieldMap) -> Result<UserRecord, AppError> {
        if let Some(key) = patch.keys().find(|k| PROTECTED_FIELDS.contains(&k.as_str())) {
            tracing::warn!(key = %key, "Refused patch of protected user field");
            return Err(AppError::BadRequest(format!("{} cannot be changed", key)));
        }
        self.try_update_with(|user| {
            *user = user
                .apply_fields(patch)
                .map_err(|e| AppError::BadRequest(format!("Invalid user fields: {}", e)))?;
            Ok(())
        })
    }

    /// Apply a typed change and return the resulting record.
    pub fn update_with(&self, change: impl FnOnce(&mut UserRecord)) -> UserRecord {
        let committed = self.commit(|user| {
            change(user);
            Ok::<(), Infallible>(())
        });
        match committed {
            Ok(user) => user,
            Err(never) => match never {},
        }
    }

    /// Apply a change that may refuse. Nothing is published or saved when
    /// `change` returns an error.
    ///
    /// The read, the change, the publish and the autosave all happen under
    /// one lock, so concurrent callers never lose each other's updates.
    /// `change` must not call back into the session.
    pub fn try_update_with(
        &self,
        change: impl FnOnce(&mut UserRecord) -> Result<(), AppError>,
    ) -> Result<UserRecord, AppError> {
        self.commit(change)
    }

    fn commit<E>(
        &self,
        change: impl FnOnce(&mut UserRecord) -> Result<(), E>,
    ) -> Result<UserRecord, E> {
        let owner = self.lock_writer();
        let (before, sync) = {
            let session = self.state.borrow();
            (session.user.clone(), session.sync)
        };
        let mut after = before.clone();
        change(&mut after)?;

        let saves_to = owner
            .as_deref()
            .filter(|uid| before.uid() == Some(*uid) && after.uid() == Some(*uid));
        match saves_to {
            Some(uid) if after.is_authenticated => {
                self.autosave.enqueue(uid, after.changed_remote_fields(&before));
            }
            _ => {}
        }
        self.publish(after.clone(), sync);
        Ok(after)
    }

    /// Sign out and return to the default guest shape.
    pub async fn logout(&self) {
        self.push_stats();
        self.end_session();
    }

    fn end_session(&self) {
        let previous = self.user();
        if let Some(uid) = previous.uid() {
            self.autosave.discard(uid);
        }

        self.identity.sign_out();
        self.set_user(UserRecord::default(), SyncState::Synced);
        if let Err(e) = self.storage.remove(keys::APP_USER) {
            tracing::warn!(error = %e, "Failed to clear saved guest record");
        }
        if let Ok(mut mirrored) = self.mirrored_stats.lock() {
            *mirrored = None;
        }
        tracing::info!(uid = previous.uid(), "Logged out");
    }

    /// Delete the account everywhere, then log out.
    ///
    /// Store and mirror failures are logged; identity failures are returned
    /// (a stale sign-in comes back as "requires recent login").
    pub async fn delete_account(&self) -> Result<(), AppError> {
        let principal = self
            .identity
            .current()
            .ok_or_else(AuthError::no_current_user)?;
        let uid = principal.uid.as_str();

        if let Err(e) = self.users.delete_user(uid).await {
            tracing::warn!(uid, error = %e, "User document deletion failed (may not exist)");
        }
        self.mirror.enqueue(MirrorJob::Delete(uid.to_string()));

        self.identity.delete_account().await?;
        self.end_session();
        tracing::info!(uid, "Account deleted");
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────

    /// Replace the record from sign-in state, deciding whose document
    /// autosave may write.
    fn set_user(&self, user: UserRecord, sync: SyncState) {
        let mut owner = self.lock_writer();
        *owner = match sync {
            SyncState::Synced if user.is_authenticated => user.uid().map(str::to_string),
            _ => None,
        };
        self.publish(user, sync);
    }

    fn lock_writer(&self) -> MutexGuard<'_, Option<String>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, user: UserRecord, sync: SyncState) {
        if user.is_guest_mode {
            if let Err(e) = write_json(self.storage.as_ref(), keys::APP_USER, &user) {
                tracing::warn!(error = %e, "Failed to save guest record");
            }
        }
        self.state.send_modify(|s| {
            s.user = user;
            s.sync = sync;
        });
    }

    fn remember_mirrored(&self, user: &UserRecord) {
        if let Ok(mut mirrored) = self.mirrored_stats.lock() {
            *mirrored = Some(CmsStats::from(user));
        }
    }

    /// Queue a leaderboard stats update if they moved since the last mirror.
    fn push_stats(&self) {
        let session = self.snapshot();
        let user = &session.user;
        let Some(uid) = user.uid() else {
            return;
        };
        if !user.is_authenticated || session.sync != SyncState::Synced {
            return;
        }

        let stats = CmsStats::from(user);
        let Ok(mut mirrored) = self.mirrored_stats.lock() else {
            return;
        };
        if mirrored.as_ref() == Some(&stats) {
            return;
        }
        *mirrored = Some(stats.clone());
        self.mirror.enqueue(MirrorJob::UpdateStats {
            uid: uid.to_string(),
            stats,
        });
    }
}

/// The document a guest upgrade would produce, without writing it.
fn merge_preview(existing: &UserDocument, guest: &UserDocument) -> UserDocument {
    let merged = existing.progress().max(guest.progress());
    UserDocument {
        coins: merged.coins,
        xp: merged.xp,
        level: merged.level,
        ..existing.clone()
    }
}

/// Final session record: stored document plus the latest identity fields.
fn authenticated_record(doc: UserDocument, principal: &AuthPrincipal) -> UserRecord {
    let name = player_name(principal, Some(doc.display_name.as_str()), "Player");

    let mut profile = doc;
    profile.name = name;
    profile.email = principal.email.clone().unwrap_or_default();
    profile.email_verified = principal.email_verified;
    profile.photo_url = principal.photo_url.clone().or(profile.photo_url);
    profile.uid = Some(principal.uid.clone());
    profile.provider = principal.provider.clone();

    UserRecord {
        profile,
        is_authenticated: true,
        is_guest_mode: false,
        avatar: avatar_for(principal),
    }
}

fn avatar_for(principal: &AuthPrincipal) -> String {
    principal
        .photo_url
        .clone()
        .unwrap_or_else(|| DEFAULT_AVATAR.to_string())
}
