// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Stock Hero: client core of a gamified stock-market education app.
//!
//! This crate keeps the player's session (guest or signed in) consistent
//! with Firebase Auth and the Firestore user document, mirrors profiles to
//! the CMS, and serves screen view-models to the app's web view over a
//! local HTTP API.

pub mod config;
pub mod db;
pub mod error;
pub mod feeds;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod screens;
pub mod services;
pub mod time_utils;

use config::Config;
use db::UserStore;
use error::AppError;
use feeds::LiveFeeds;
use screens::{clans::ClanMembership, community::PostLikes};
use services::{
    Autosave, CmsClient, IdentityClient, LocalStorage, MarketContext, MarketDataClient,
    MirrorSync, SessionDeps, SessionStore, UserService,
};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub identity: Arc<IdentityClient>,
    pub users: Arc<UserService>,
    pub market: MarketContext,
    pub market_data: MarketDataClient,
    pub cms: CmsClient,
    pub storage: Arc<dyn LocalStorage>,
    pub clans: ClanMembership,
    pub likes: PostLikes,
    /// Symbol whose AI insight is kept fresh
    pub insight_symbol: watch::Sender<Option<String>>,
    feeds: OnceLock<LiveFeeds>,
}

impl AppState {
    /// Wire up the services. Must be called inside a Tokio runtime.
    ///
    /// The session is created but not started; call
    /// [`SessionStore::init`] and [`SessionStore::attach`] afterwards.
    pub fn new(
        config: Config,
        store: Arc<dyn UserStore>,
        identity: Arc<IdentityClient>,
        storage: Arc<dyn LocalStorage>,
    ) -> Result<Arc<Self>, AppError> {
        let timings = config.timings.clone();
        let users = Arc::new(UserService::new(store, timings.clone(), &config.app_version));
        let cms = CmsClient::new(&config.cms_api_url)?;

        let session = SessionStore::new(
            SessionDeps {
                users: users.clone(),
                identity: identity.clone(),
                mirror: MirrorSync::spawn(cms.clone(), &timings),
                autosave: Autosave::spawn(users.clone(), timings.autosave_debounce),
                storage: storage.clone(),
            },
            timings.loading_ceiling,
        );

        Ok(Arc::new(Self {
            market: MarketContext::new(storage.clone()),
            market_data: MarketDataClient::new(&config.api_base_url)?,
            config,
            session,
            identity,
            users,
            cms,
            storage,
            clans: ClanMembership::new(),
            likes: PostLikes::new(),
            insight_symbol: watch::channel(None).0,
            feeds: OnceLock::new(),
        }))
    }

    /// Start background refresh of news, index and insight feeds.
    pub fn start_feeds(self: &Arc<Self>) {
        if self.feeds.set(LiveFeeds::spawn(self)).is_err() {
            tracing::debug!("Live feeds already running");
        }
    }

    pub fn feeds(&self) -> Option<&LiveFeeds> {
        self.feeds.get()
    }
}
