// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Market dashboard: benchmark index and the day's top movers.

use super::widgets::{compact_number, sparkline};
use crate::models::{Market, StockProfile, StockQuote};
use crate::services::MarketDataClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Rows shown per movers list.
pub const MOVERS_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoversTab {
    #[default]
    Gainers,
    Losers,
}

/// Benchmark index tile. Values are absent while the profile is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexCard {
    pub symbol: String,
    pub name: String,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
}

impl IndexCard {
    pub fn from_profile(profile: &StockProfile) -> Self {
        let available = !profile.is_placeholder();
        Self {
            symbol: profile.symbol.clone(),
            name: profile.name.clone().unwrap_or_else(|| profile.symbol.clone()),
            price: available.then_some(profile.price),
            change: profile.change.filter(|_| available),
            change_percent: profile.change_percent.filter(|_| available),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoverRow {
    pub rank: usize,
    pub symbol: String,
    /// Symbol without the exchange suffix
    pub ticker: String,
    pub name: String,
    pub logo: Option<String>,
    pub price: f64,
    pub change_percent: f64,
    pub market_cap: Option<String>,
    pub sparkline: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummaryView {
    pub market: &'static Market,
    pub is_open: bool,
    pub index: IndexCard,
    pub tab: MoversTab,
    pub movers: Vec<MoverRow>,
}

/// Fetch the index profile and quotes. Both degrade to placeholders.
pub async fn load(
    market_data: &MarketDataClient,
    market: &'static Market,
) -> (StockProfile, Vec<StockQuote>) {
    let index = market_data.stock_profile(market.index).await;
    let quotes = match market_data.stocks(market.id).await {
        Ok(quotes) => quotes,
        Err(e) => {
            tracing::warn!(market = market.id, error = %e, "Stock list unavailable");
            Vec::new()
        }
    };
    (index, quotes)
}

pub fn build(
    market: &'static Market,
    index: &StockProfile,
    quotes: &[StockQuote],
    tab: MoversTab,
    now: DateTime<Utc>,
) -> MarketSummaryView {
    MarketSummaryView {
        market,
        is_open: market.is_open_at(now),
        index: IndexCard::from_profile(index),
        tab,
        movers: movers(quotes, tab),
    }
}

/// Top gainers (rising, biggest first) or losers (falling, biggest drop first).
pub fn movers(quotes: &[StockQuote], tab: MoversTab) -> Vec<MoverRow> {
    let mut picked: Vec<&StockQuote> = quotes
        .iter()
        .filter(|q| match tab {
            MoversTab::Gainers => q.change_percent > 0.0,
            MoversTab::Losers => q.change_percent < 0.0,
        })
        .collect();
    picked.sort_by(|a, b| {
        let order = a
            .change_percent
            .partial_cmp(&b.change_percent)
            .unwrap_or(Ordering::Equal);
        match tab {
            MoversTab::Gainers => order.reverse(),
            MoversTab::Losers => order,
        }
    });

    picked
        .into_iter()
        .take(MOVERS_LIMIT)
        .enumerate()
        .map(|(i, q)| MoverRow {
            rank: i + 1,
            symbol: q.symbol.clone(),
            ticker: q.symbol.split('.').next().unwrap_or(&q.symbol).to_string(),
            name: q.name.clone().unwrap_or_else(|| q.symbol.clone()),
            logo: q.logo.clone(),
            price: q.price,
            change_percent: q.change_percent,
            market_cap: q.market_cap.map(compact_number),
            sparkline: sparkline(&q.history),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(symbol: &str, change_percent: f64) -> StockQuote {
        StockQuote {
            symbol: symbol.to_string(),
            name: None,
            sector: None,
            logo: None,
            price: 10.0,
            change: 0.0,
            change_percent,
            prev_close: None,
            market_cap: Some(2_400_000.0),
            history: vec![9.0, 10.0],
        }
    }

    #[test]
    fn test_movers_split_and_order() {
        let quotes: Vec<StockQuote> = [
            ("2222.SR", 1.2),
            ("1120.SR", -0.4),
            ("2010.SR", -3.1),
            ("7010.SR", 2.4),
            ("4061.SR", 0.0),
        ]
        .iter()
        .map(|(s, c)| quote(s, *c))
        .collect();

        let gainers = movers(&quotes, MoversTab::Gainers);
        let tickers: Vec<&str> = gainers.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["7010", "2222"]);
        assert_eq!(gainers[0].market_cap.as_deref(), Some("2.4M"));
        assert_eq!(gainers[0].sparkline, vec![0.0, 1.0]);

        let losers = movers(&quotes, MoversTab::Losers);
        let tickers: Vec<&str> = losers.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["2010", "1120"]);
        assert_eq!(losers[1].rank, 2);
    }

    #[test]
    fn test_index_card_hides_placeholder_values() {
        let card = IndexCard::from_profile(&StockProfile::placeholder("^TASI.SR"));
        assert_eq!(card.price, None);
        assert_eq!(card.name, "^TASI.SR");
    }
}
