// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background refresh of the display feeds for the selected market.
//!
//! Pollers hold only a weak reference to the app state and stop producing
//! values once it is gone. A poller result for another market (the player
//! switched since the last tick) is ignored by the screens, which then fetch
//! directly.

use crate::models::{AiInsight, StockProfile};
use crate::screens::news_feed::{self, MarketNews};
use crate::services::Poller;
use crate::AppState;
use std::sync::{Arc, Weak};

/// Index profile tagged with the market it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSnapshot {
    pub market: &'static str,
    pub profile: StockProfile,
}

pub struct LiveFeeds {
    pub news: Poller<MarketNews>,
    pub index: Poller<IndexSnapshot>,
    pub insight: Poller<AiInsight>,
}

impl LiveFeeds {
    pub fn spawn(state: &Arc<AppState>) -> Self {
        let timings = &state.config.timings;

        let weak = Arc::downgrade(state);
        let news = Poller::spawn("news", timings.news_refresh, move || {
            let weak: Weak<AppState> = weak.clone();
            async move {
                let state = weak.upgrade()?;
                let market = state.market.current();
                Some(
                    news_feed::load(
                        &state.market_data,
                        &state.cms,
                        state.storage.as_ref(),
                        market.id,
                    )
                    .await,
                )
            }
        });

        let weak = Arc::downgrade(state);
        let index = Poller::spawn("index", timings.indices_refresh, move || {
            let weak: Weak<AppState> = weak.clone();
            async move {
                let state = weak.upgrade()?;
                let market = state.market.current();
                let profile = state.market_data.stock_profile(market.index).await;
                Some(IndexSnapshot {
                    market: market.id,
                    profile,
                })
            }
        });

        let weak = Arc::downgrade(state);
        let insight = Poller::spawn("insight", timings.insight_refresh, move || {
            let weak: Weak<AppState> = weak.clone();
            async move {
                let state = weak.upgrade()?;
                let symbol = state.insight_symbol.borrow().clone()?;
                match state.market_data.ai_insight(&symbol).await {
                    Ok(insight) => Some(insight),
                    Err(e) => {
                        tracing::warn!(symbol = %symbol, error = %e, "AI insight refresh failed");
                        None
                    }
                }
            }
        });

        tracing::info!(
            news_secs = timings.news_refresh.as_secs(),
            index_secs = timings.indices_refresh.as_secs(),
            insight_secs = timings.insight_refresh.as_secs(),
            "Live feeds started"
        );
        Self {
            news,
            index,
            insight,
        }
    }

    /// Cached news if it belongs to `market`.
    pub fn news_for(&self, market: &str) -> Option<MarketNews> {
        self.news.latest().filter(|n| n.market == market)
    }

    pub fn index_for(&self, market: &str) -> Option<StockProfile> {
        self.index
            .latest()
            .filter(|s| s.market == market)
            .map(|s| s.profile)
    }

    pub fn insight_for(&self, symbol: &str) -> Option<AiInsight> {
        self.insight.latest().filter(|i| i.symbol == symbol)
    }
}
