// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the serverless stock/news endpoints plus a fixed-interval
//! refresher.
//!
//! All feeds are display-only. Callers that render a screen treat an error
//! as "show a placeholder", so [`MarketDataClient::stock_profile`] folds its
//! failures into [`StockProfile::placeholder`] itself.

use crate::error::AppError;
use crate::models::{AiInsight, NewsArticle, StockProfile, StockQuote};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct MarketDataClient {
    http: reqwest::Client,
    base_url: String,
}

impl MarketDataClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Quotes for a market's tracked stocks.
    pub async fn stocks(&self, market: &str) -> Result<Vec<StockQuote>, AppError> {
        self.get_json("/api/stocks", &[("market", market)]).await
    }

    /// Company profile. Never fails: any error becomes the placeholder.
    pub async fn stock_profile(&self, symbol: &str) -> StockProfile {
        match self
            .get_json::<StockProfile>("/api/stock-profile", &[("symbol", symbol)])
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Stock profile unavailable");
                StockProfile::placeholder(symbol)
            }
        }
    }

    /// Headlines for a market. A body that is not a list reads as empty.
    pub async fn news(&self, market: &str) -> Result<Vec<NewsArticle>, AppError> {
        let body: serde_json::Value = self.get_json("/api/news", &[("market", market)]).await?;
        let serde_json::Value::Array(items) = body else {
            tracing::warn!(market, "News endpoint returned a non-list body");
            return Ok(Vec::new());
        };

        // Skip malformed rows rather than dropping the whole feed
        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(article) => Some(article),
                Err(e) => {
                    tracing::debug!(market, error = %e, "Skipping malformed news item");
                    None
                }
            })
            .collect())
    }

    pub async fn ai_insight(&self, symbol: &str) -> Result<AiInsight, AppError> {
        self.get_json("/api/ai-insight", &[("symbol", symbol)]).await
    }

    /// Route remote thumbnails through the image proxy. Relative and data
    /// URLs are returned unchanged.
    pub fn image_proxy_url(&self, thumbnail: &str) -> String {
        if thumbnail.starts_with("http://") || thumbnail.starts_with("https://") {
            format!(
                "{}/api/proxy-image?url={}",
                self.base_url,
                urlencoding::encode(thumbnail)
            )
        } else {
            thumbnail.to_string()
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("{} request failed: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("{} HTTP {}: {}", path, status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("{} JSON parse error: {}", path, e)))
    }
}

// ─── Polling ────────────────────────────────────────────────────

/// Re-runs a fetch on a fixed interval and publishes the latest result.
///
/// The first fetch starts immediately. A fetch that yields `None` keeps the
/// previous value. The task is aborted when the poller is dropped.
pub struct Poller<T> {
    latest: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T: Clone + Send + Sync + 'static> Poller<T> {
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut fetch: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Option<T>> + Send,
    {
        let (tx, latest) = watch::channel(None);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match fetch().await {
                    Some(value) => {
                        tx.send_replace(Some(value));
                        tracing::debug!(poller = name, "Feed refreshed");
                    }
                    None => tracing::debug!(poller = name, "Refresh yielded nothing, keeping previous"),
                }
            }
        });
        Self { latest, task }
    }

    pub fn latest(&self) -> Option<T> {
        self.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.latest.clone()
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
