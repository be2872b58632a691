// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Market news: CMS-authored items merged with fetched headlines.
//!
//! Loading and filtering are separate steps. [`load`] does the network work
//! and is what the news poller runs; [`filter`] turns a loaded feed into the
//! view for the current time and source toggles.

use super::widgets::time_ago;
use crate::models::NewsArticle;
use crate::services::local_storage::{keys, read_json, write_json, LocalStorage};
use crate::services::{CmsClient, MarketDataClient};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Fetched headlines kept per market for offline use.
pub const CACHE_LIMIT: usize = 100;

pub const ALL_SOURCES: &str = "All";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFilter {
    #[serde(rename = "1D")]
    Day,
    #[serde(rename = "7D")]
    Week,
    #[serde(rename = "30D")]
    Month,
    #[default]
    All,
}

impl TimeFilter {
    fn window(self) -> Option<Duration> {
        match self {
            TimeFilter::Day => Some(Duration::hours(24)),
            TimeFilter::Week => Some(Duration::days(7)),
            TimeFilter::Month => Some(Duration::days(30)),
            TimeFilter::All => None,
        }
    }

    /// Undated or unparseable items are never filtered out.
    pub fn admits(self, time: &str, now: DateTime<Utc>) -> bool {
        let Some(window) = self.window() else {
            return true;
        };
        match DateTime::parse_from_rfc3339(time) {
            Ok(t) => now.signed_duration_since(t.with_timezone(&Utc)) <= window,
            Err(_) => true,
        }
    }
}

/// Merged feed for one market, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketNews {
    pub market: String,
    pub articles: Vec<NewsArticle>,
    /// Fetched headlines came from the local cache
    pub from_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsCard {
    #[serde(flatten)]
    pub article: NewsArticle,
    pub time_ago: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFeedView {
    pub market: String,
    pub time_filter: TimeFilter,
    pub source: String,
    /// "All" first, then by article count, then by name
    pub sources: Vec<SourceCount>,
    pub items: Vec<NewsCard>,
    pub from_cache: bool,
}

/// Fetch and merge the feed for `market`.
///
/// A successful non-empty fetch refreshes the cache; a failed or empty one
/// falls back to it. CMS failures just leave the editorial items out.
pub async fn load(
    market_data: &MarketDataClient,
    cms: &CmsClient,
    storage: &dyn LocalStorage,
    market: &str,
) -> MarketNews {
    let editorial: Vec<NewsArticle> = match cms.list_news().await {
        Ok(items) => items
            .iter()
            .filter(|item| item.is_visible_in(market))
            .map(|item| item.to_article())
            .collect(),
        Err(e) => {
            tracing::warn!(market, error = %e, "CMS news unavailable");
            Vec::new()
        }
    };

    let cache_key = keys::news_cache(market);
    let (fetched, from_cache) = match market_data.news(market).await {
        Ok(fresh) if !fresh.is_empty() => {
            let head = &fresh[..fresh.len().min(CACHE_LIMIT)];
            if let Err(e) = write_json(storage, &cache_key, &head) {
                tracing::warn!(market, error = %e, "Failed to cache news");
            }
            (fresh, false)
        }
        Ok(_) => (read_cache(storage, &cache_key), true),
        Err(e) => {
            tracing::warn!(market, error = %e, "News fetch failed, using cache");
            (read_cache(storage, &cache_key), true)
        }
    };

    tracing::debug!(
        market,
        editorial = editorial.len(),
        fetched = fetched.len(),
        from_cache,
        "News loaded"
    );
    MarketNews {
        market: market.to_string(),
        articles: merge(editorial, fetched),
        from_cache,
    }
}

fn read_cache(storage: &dyn LocalStorage, key: &str) -> Vec<NewsArticle> {
    match read_json(storage, key) {
        Ok(cached) => cached.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring news cache");
            Vec::new()
        }
    }
}

/// Concatenate and sort newest first. Undated items sink to the bottom.
pub fn merge(editorial: Vec<NewsArticle>, fetched: Vec<NewsArticle>) -> Vec<NewsArticle> {
    let mut all: Vec<NewsArticle> = editorial.into_iter().chain(fetched).collect();
    all.sort_by_key(|a| {
        Reverse(
            DateTime::parse_from_rfc3339(&a.time)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
        )
    });
    all
}

/// Apply the time and source toggles.
pub fn filter(
    news: &MarketNews,
    time_filter: TimeFilter,
    source: Option<&str>,
    now: DateTime<Utc>,
) -> NewsFeedView {
    let in_window: Vec<&NewsArticle> = news
        .articles
        .iter()
        .filter(|a| time_filter.admits(&a.time, now))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for article in &in_window {
        if let Some(publisher) = article.publisher.as_deref().filter(|p| !p.is_empty()) {
            *counts.entry(publisher).or_default() += 1;
        }
    }
    let mut sources: Vec<SourceCount> = counts
        .into_iter()
        .map(|(name, count)| SourceCount {
            name: name.to_string(),
            count,
        })
        .collect();
    sources.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    sources.insert(
        0,
        SourceCount {
            name: ALL_SOURCES.to_string(),
            count: in_window.len(),
        },
    );

    let source = source.unwrap_or(ALL_SOURCES);
    let items = in_window
        .into_iter()
        .filter(|a| source == ALL_SOURCES || a.publisher.as_deref() == Some(source))
        .map(|a| NewsCard {
            article: a.clone(),
            time_ago: time_ago(&a.time, now),
        })
        .collect();

    NewsFeedView {
        market: news.market.clone(),
        time_filter,
        source: source.to_string(),
        sources,
        items,
        from_cache: news.from_cache,
    }
}
