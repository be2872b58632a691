// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Currently selected market, persisted across restarts.

use crate::error::AppError;
use crate::models::Market;
use crate::services::local_storage::{keys, read_json, write_json, LocalStorage};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

pub struct MarketContext {
    current: watch::Sender<&'static Market>,
    storage: Arc<dyn LocalStorage>,
}

impl MarketContext {
    /// Restore the saved selection, falling back to the default market.
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        let market = restore(storage.as_ref()).unwrap_or_else(Market::default_market);
        let (current, _) = watch::channel(market);
        Self { current, storage }
    }

    pub fn current(&self) -> &'static Market {
        *self.current.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<&'static Market> {
        self.current.subscribe()
    }

    /// Switch markets and persist the choice.
    pub fn select(&self, id: &str) -> Result<&'static Market, AppError> {
        let market =
            Market::find(id).ok_or_else(|| AppError::BadRequest(format!("Unknown market: {}", id)))?;

        if let Err(e) = write_json(self.storage.as_ref(), keys::SELECTED_MARKET, market) {
            tracing::warn!(market = market.id, error = %e, "Failed to save market selection");
        }
        self.current.send_replace(market);
        tracing::info!(market = market.id, "Market selected");
        Ok(market)
    }

    /// Whether `id` is trading at `now`. Unknown ids are closed.
    pub fn is_open(&self, id: &str, now: DateTime<Utc>) -> bool {
        Market::find(id).is_some_and(|m| m.is_open_at(now))
    }
}

/// The saved value is the whole market object; only its id matters.
fn restore(storage: &dyn LocalStorage) -> Option<&'static Market> {
    let saved: serde_json::Value = match read_json(storage, keys::SELECTED_MARKET) {
        Ok(saved) => saved?,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring saved market selection");
            return None;
        }
    };

    let id = saved
        .get("id")
        .and_then(|v| v.as_str())
        .or_else(|| saved.as_str())?;
    let market = Market::find(id);
    if market.is_none() {
        tracing::warn!(market = id, "Saved market no longer exists");
    }
    market
}
