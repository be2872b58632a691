// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rewards: badges, the coin shop and the daily spin wheel.

use crate::error::AppError;
use crate::models::UserRecord;
use crate::services::SessionStore;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardsTab {
    #[default]
    Achievements,
    Shop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Badge {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub unlocked: bool,
}

pub static BADGES: [Badge; 6] = [
    Badge { id: 1, name: "Sniper", description: "Top 1% gain in a day", rarity: Rarity::Epic, unlocked: true },
    Badge { id: 2, name: "Hot Start", description: "Win your first contest", rarity: Rarity::Common, unlocked: true },
    Badge { id: 3, name: "Diamond Hands", description: "Hold volatile stock to +10%", rarity: Rarity::Rare, unlocked: false },
    Badge { id: 4, name: "Moon Shot", description: "Pick a stock that gains +20%", rarity: Rarity::Legendary, unlocked: false },
    Badge { id: 5, name: "Streak Master", description: "7-day win streak", rarity: Rarity::Epic, unlocked: false },
    Badge { id: 6, name: "Market Guru", description: "Reach level 10", rarity: Rarity::Rare, unlocked: false },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Subscription,
    Feature,
    Cosmetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShopReward {
    pub id: u32,
    pub name: &'static str,
    pub cost: i64,
    pub kind: RewardKind,
}

pub static SHOP: [ShopReward; 4] = [
    ShopReward { id: 1, name: "Mubasher Info Plus Subscription", cost: 5000, kind: RewardKind::Subscription },
    ShopReward { id: 2, name: "TradingView Analysis Subscription", cost: 2000, kind: RewardKind::Feature },
    ShopReward { id: 3, name: "No Ads (1 Month)", cost: 1500, kind: RewardKind::Feature },
    ShopReward { id: 4, name: "Exclusive Avatar Frame", cost: 1000, kind: RewardKind::Cosmetic },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "amount", rename_all = "camelCase")]
pub enum PrizeValue {
    Coins(i64),
    XpBoost,
    Mystery,
    StreakFreeze,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpinPrize {
    pub label: &'static str,
    pub value: PrizeValue,
}

/// Wheel segments in clockwise order.
pub static SPIN_PRIZES: [SpinPrize; 6] = [
    SpinPrize { label: "50 Coins", value: PrizeValue::Coins(50) },
    SpinPrize { label: "100 Coins", value: PrizeValue::Coins(100) },
    SpinPrize { label: "XP Boost", value: PrizeValue::XpBoost },
    SpinPrize { label: "Mystery", value: PrizeValue::Mystery },
    SpinPrize { label: "Freeze", value: PrizeValue::StreakFreeze },
    SpinPrize { label: "25 Coins", value: PrizeValue::Coins(25) },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopRow {
    #[serde(flatten)]
    pub reward: ShopReward,
    pub affordable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsView {
    pub tab: RewardsTab,
    pub balance: i64,
    pub level: i64,
    pub streak: u32,
    pub badges: &'static [Badge],
    pub shop: Vec<ShopRow>,
    pub spin_prizes: &'static [SpinPrize],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinResult {
    pub segment: usize,
    pub prize: SpinPrize,
    pub balance: i64,
}

pub fn build(tab: RewardsTab, user: &UserRecord) -> RewardsView {
    let balance = user.profile.coins;
    RewardsView {
        tab,
        balance,
        level: user.profile.level,
        streak: user.profile.streak,
        badges: &BADGES,
        shop: SHOP
            .iter()
            .map(|reward| ShopRow {
                reward: *reward,
                affordable: balance >= reward.cost,
            })
            .collect(),
        spin_prizes: &SPIN_PRIZES,
    }
}

/// Spend coins on a shop reward. Refused when the balance is short.
pub fn redeem(session: &SessionStore, reward_id: u32) -> Result<UserRecord, AppError> {
    let reward = SHOP
        .iter()
        .find(|r| r.id == reward_id)
        .ok_or_else(|| AppError::NotFound(format!("Reward {}", reward_id)))?;

    let user = session.try_update_with(|user| {
        let balance = user.profile.coins;
        if balance < reward.cost {
            tracing::debug!(reward = reward.id, balance, cost = reward.cost, "Redeem refused");
            return Err(AppError::BadRequest(format!(
                "Not enough coins for {} ({} needed, {} available)",
                reward.name, reward.cost, balance
            )));
        }
        user.profile.coins = balance.saturating_sub(reward.cost);
        Ok(())
    })?;
    tracing::info!(reward = reward.id, cost = reward.cost, "Reward redeemed");
    Ok(user)
}

/// Spin the wheel with the thread RNG.
pub fn spin(session: &SessionStore) -> SpinResult {
    spin_with(session, &mut rand::thread_rng())
}

pub fn spin_with(session: &SessionStore, rng: &mut impl Rng) -> SpinResult {
    let segment = rng.gen_range(0..SPIN_PRIZES.len());
    let prize = SPIN_PRIZES[segment];

    let user = match prize.value {
        PrizeValue::Coins(amount) => session.update_with(|user| {
            user.profile.coins = user.profile.coins.saturating_add(amount)
        }),
        _ => session.user(),
    };
    tracing::info!(prize = prize.label, "Daily spin");

    SpinResult {
        segment,
        prize,
        balance: user.profile.coins,
    }
}
