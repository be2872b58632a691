// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Home dashboard.

use super::market_summary::IndexCard;
use super::widgets::{compact_number, xp_percent};
use crate::models::{Market, StockProfile, UserRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    pub title: &'static str,
    pub description: &'static str,
    pub reward_coins: i64,
}

pub static DAILY_CHALLENGE: DailyChallenge = DailyChallenge {
    title: "Daily Challenge",
    description: "Pick a stock that gains +5% today to earn 100 coins!",
    reward_coins: 100,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketHeader {
    pub id: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
    pub currency: &'static str,
    pub exchange: &'static str,
    pub is_open: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub greeting: &'static str,
    pub name: String,
    pub avatar: String,
    pub is_guest: bool,
    pub coins: i64,
    pub coins_display: String,
    pub level: i64,
    pub level_title: String,
    pub xp: i64,
    pub xp_to_next_level: i64,
    pub xp_percent: u8,
    pub streak: u32,
    pub best_rank: u32,
    pub picks: Vec<String>,
    pub market: MarketHeader,
    pub indices: Vec<IndexCard>,
    pub daily_challenge: &'static DailyChallenge,
}

pub fn build(
    user: &UserRecord,
    market: &'static Market,
    indices: &[StockProfile],
    now: DateTime<Utc>,
) -> HomeView {
    let profile = &user.profile;
    HomeView {
        greeting: "Welcome back,",
        name: profile.name.clone(),
        avatar: user.avatar.clone(),
        is_guest: !user.is_authenticated,
        coins: profile.coins,
        coins_display: compact_number(profile.coins as f64),
        level: profile.level,
        level_title: profile.level_title.clone(),
        xp: profile.xp,
        xp_to_next_level: profile.xp_to_next_level,
        xp_percent: xp_percent(profile.xp, profile.xp_to_next_level),
        streak: profile.streak,
        best_rank: profile.rank,
        picks: profile.picks.clone(),
        market: MarketHeader {
            id: market.id,
            name: market.name,
            flag: market.flag,
            currency: market.currency,
            exchange: market.exchange,
            is_open: market.is_open_at(now),
        },
        indices: indices.iter().map(IndexCard::from_profile).collect(),
        daily_challenge: &DAILY_CHALLENGE,
    }
}
