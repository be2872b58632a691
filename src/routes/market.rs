// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Market selection routes.

use crate::error::Result;
use crate::models::{Market, MARKETS};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/market", get(get_market).put(select_market))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatus {
    pub market: &'static Market,
    pub is_open: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketResponse {
    pub current: MarketStatus,
    pub markets: Vec<MarketStatus>,
}

#[derive(Deserialize)]
pub struct SelectMarketRequest {
    pub id: String,
}

fn status(market: &'static Market) -> MarketStatus {
    MarketStatus {
        market,
        is_open: market.is_open_at(Utc::now()),
    }
}

/// Current selection plus the whole catalogue with open/closed flags.
async fn get_market(State(state): State<Arc<AppState>>) -> Json<MarketResponse> {
    Json(MarketResponse {
        current: status(state.market.current()),
        markets: MARKETS.iter().map(status).collect(),
    })
}

async fn select_market(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectMarketRequest>,
) -> Result<Json<MarketStatus>> {
    let market = state.market.select(&body.id)?;
    Ok(Json(status(market)))
}
