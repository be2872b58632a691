// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-models returned by the serverless stock/news endpoints.

use serde::{Deserialize, Serialize};

/// News item (scraped or CMS-authored).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    /// Publication time (ISO 8601)
    pub time: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub related_tickers: Vec<String>,
}

/// Company profile from `/api/stock-profile`.
///
/// The endpoint answers a data-lake miss with a placeholder body that carries
/// an `error` field rather than an HTTP error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockProfile {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StockProfile {
    /// Placeholder shown while a profile is unavailable.
    pub fn placeholder(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: Some(symbol.to_string()),
            description: Some(
                "Profile data currently updating. Please try again shortly.".to_string(),
            ),
            sector: Some("N/A".to_string()),
            price: 0.0,
            change: None,
            change_percent: None,
            error: Some("unavailable".to_string()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }
}

/// Source headline backing an AI insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSource {
    pub title: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// "Why is this stock moving" answer from `/api/ai-insight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiInsight {
    pub symbol: String,
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<InsightSource>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Row from `/api/stocks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_percent: f64,
    #[serde(default)]
    pub prev_close: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// Recent closes for the sparkline, when the endpoint includes them
    #[serde(default)]
    pub history: Vec<f64>,
}
