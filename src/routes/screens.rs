// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Screen view-model routes.
//!
//! Feed-backed screens prefer the live pollers' latest result for the
//! selected market and fetch directly when there is none yet.

use crate::error::Result;
use crate::models::{AiInsight, StockProfile, UserRecord};
use crate::screens::academy::{self, AcademyView, Category};
use crate::screens::clans::{self, Clan, ClanTab, ClansView};
use crate::screens::community::{self, CommunityTab, CommunityView};
use crate::screens::home::{self, HomeView};
use crate::screens::leaderboard::{self, LeaderboardView, Period};
use crate::screens::market_summary::{self, MarketSummaryView, MoversTab};
use crate::screens::news_feed::{self, NewsFeedView, TimeFilter};
use crate::screens::rewards::{self, RewardsTab, RewardsView, SpinResult};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/screens/home", get(home_screen))
        .route("/screens/leaderboard", get(leaderboard_screen))
        .route("/screens/clans", get(clans_screen))
        .route("/screens/clans/join", post(join_clan))
        .route("/screens/clans/leave", post(leave_clan))
        .route("/screens/academy", get(academy_screen))
        .route("/screens/academy/lessons/{id}/complete", post(complete_lesson))
        .route("/screens/community", get(community_screen))
        .route("/screens/community/posts/{id}/like", post(like_post))
        .route("/screens/news", get(news_screen))
        .route("/screens/market", get(market_screen))
        .route("/screens/stocks/{symbol}", get(stock_profile))
        .route("/screens/stocks/{symbol}/insight", get(stock_insight))
        .route("/screens/rewards", get(rewards_screen))
        .route("/screens/rewards/{id}/redeem", post(redeem_reward))
        .route("/screens/rewards/spin", post(daily_spin))
}

// ─── Home & Rankings ─────────────────────────────────────────

async fn home_screen(State(state): State<Arc<AppState>>) -> Json<HomeView> {
    let market = state.market.current();
    let index = match state.feeds().and_then(|f| f.index_for(market.id)) {
        Some(profile) => profile,
        None => state.market_data.stock_profile(market.index).await,
    };
    Json(home::build(&state.session.user(), market, &[index], Utc::now()))
}

#[derive(Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub period: Period,
}

async fn leaderboard_screen(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Json<LeaderboardView> {
    Json(leaderboard::build(query.period, &state.session.user()))
}

// ─── Clans ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ClanQuery {
    #[serde(default)]
    pub tab: ClanTab,
}

#[derive(Deserialize)]
pub struct JoinClanRequest {
    pub name: String,
}

async fn clans_screen(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClanQuery>,
) -> Json<ClansView> {
    Json(clans::build(query.tab, &state.clans))
}

async fn join_clan(
    State(state): State<Arc<AppState>>,
    Json(body): Json<JoinClanRequest>,
) -> Result<Json<Clan>> {
    Ok(Json(state.clans.join(&body.name)?))
}

async fn leave_clan(State(state): State<Arc<AppState>>) -> Json<ClansView> {
    state.clans.leave();
    Json(clans::build(ClanTab::MyClan, &state.clans))
}

// ─── Academy ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub category: Category,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompleted {
    pub xp_awarded: i64,
    pub user: UserRecord,
}

async fn academy_screen(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryQuery>,
) -> Json<AcademyView> {
    let user = state.session.user();
    Json(academy::build(query.category, &user.profile.achievements))
}

async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<LessonCompleted>> {
    let xp_awarded = academy::complete_lesson(&state.session, id)?;
    Ok(Json(LessonCompleted {
        xp_awarded,
        user: state.session.user(),
    }))
}

// ─── Community ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CommunityQuery {
    #[serde(default)]
    pub tab: CommunityTab,
}

#[derive(Serialize)]
pub struct LikeResponse {
    pub liked: bool,
}

async fn community_screen(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommunityQuery>,
) -> Json<CommunityView> {
    let user = state.session.user();
    Json(community::build(query.tab, &state.likes, &user.profile.picks))
}

async fn like_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<LikeResponse>> {
    Ok(Json(LikeResponse {
        liked: state.likes.toggle(id)?,
    }))
}

// ─── News & Markets ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct NewsQuery {
    #[serde(default)]
    pub filter: TimeFilter,
    #[serde(default)]
    pub source: Option<String>,
}

async fn news_screen(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> Json<NewsFeedView> {
    let market = state.market.current();
    let news = match state.feeds().and_then(|f| f.news_for(market.id)) {
        Some(news) => news,
        None => {
            news_feed::load(
                &state.market_data,
                &state.cms,
                state.storage.as_ref(),
                market.id,
            )
            .await
        }
    };
    Json(news_feed::filter(
        &news,
        query.filter,
        query.source.as_deref(),
        Utc::now(),
    ))
}

#[derive(Deserialize)]
pub struct MoversQuery {
    #[serde(default)]
    pub tab: MoversTab,
}

async fn market_screen(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MoversQuery>,
) -> Json<MarketSummaryView> {
    let market = state.market.current();
    let (index, quotes) = market_summary::load(&state.market_data, market).await;
    Json(market_summary::build(
        market,
        &index,
        &quotes,
        query.tab,
        Utc::now(),
    ))
}

/// Company profile; a placeholder when the data lake has nothing.
async fn stock_profile(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Json<StockProfile> {
    let symbol = state.market.current().symbol_for(&symbol);
    Json(state.market_data.stock_profile(&symbol).await)
}

/// "Why is it moving". The symbol becomes the one the insight poller refreshes.
async fn stock_insight(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<AiInsight>> {
    let symbol = state.market.current().symbol_for(&symbol);
    state.insight_symbol.send_replace(Some(symbol.clone()));

    if let Some(insight) = state.feeds().and_then(|f| f.insight_for(&symbol)) {
        return Ok(Json(insight));
    }
    Ok(Json(state.market_data.ai_insight(&symbol).await?))
}

// ─── Rewards ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RewardsQuery {
    #[serde(default)]
    pub tab: RewardsTab,
}

async fn rewards_screen(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RewardsQuery>,
) -> Json<RewardsView> {
    Json(rewards::build(query.tab, &state.session.user()))
}

async fn redeem_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<RewardsView>> {
    let user = rewards::redeem(&state.session, id)?;
    Ok(Json(rewards::build(RewardsTab::Shop, &user)))
}

async fn daily_spin(State(state): State<Arc<AppState>>) -> Json<SpinResult> {
    Json(rewards::spin(&state.session))
}
