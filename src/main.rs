// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stock Hero app shell
//!
//! Runs the session core and screen API locally for the web view: Firebase
//! identity, the Firestore user document, the CMS mirror and market feeds.

use stock_hero::{
    config::Config,
    db::{FirestoreDb, MemoryUserStore, UserStore},
    services::{FileStorage, IdentityClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(port = config.port, offline = config.offline_mode, "Starting Stock Hero");

    let store: Arc<dyn UserStore> = if config.offline_mode {
        tracing::warn!("Offline mode: user documents are kept in memory");
        Arc::new(MemoryUserStore::new())
    } else {
        Arc::new(FirestoreDb::new(&config.firebase_project_id).await?)
    };

    if config.firebase_api_key.is_empty() {
        tracing::warn!("FIREBASE_API_KEY not set, sign-in will fail");
    }
    let identity = Arc::new(IdentityClient::new(&config.firebase_api_key)?);

    let storage = Arc::new(FileStorage::open(&config.local_storage_dir)?);
    tracing::info!(dir = %config.local_storage_dir.display(), "Local storage ready");

    let state = AppState::new(config.clone(), store, identity, storage)?;
    state.session.init();
    state.session.attach();
    state.start_feeds();

    let app = stock_hero::routes::create_router(state.clone());

    // The shell only serves the local web view
    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.session.teardown().await;
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stock_hero=debug"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
