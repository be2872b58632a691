// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clans: the weekly war banner, top clans and the player's own clan.
//!
//! Membership is local state only; nothing is persisted.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub const CLAN_CAPACITY: u32 = 50;
pub const WAR_PRIZE_POOL: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClanTab {
    #[default]
    Explore,
    MyClan,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Clan {
    pub rank: u32,
    pub name: &'static str,
    pub members: u32,
    pub capacity: u32,
    pub score: &'static str,
    pub trend: &'static str,
}

impl Clan {
    pub fn is_full(&self) -> bool {
        self.members >= self.capacity
    }
}

const fn clan(rank: u32, name: &'static str, members: u32, score: &'static str, trend: &'static str) -> Clan {
    Clan {
        rank,
        name,
        members,
        capacity: CLAN_CAPACITY,
        score,
        trend,
    }
}

pub static TOP_CLANS: [Clan; 5] = [
    clan(1, "Wall Street Wolves", 48, "2.4M", "+12%"),
    clan(2, "Diamond Hands", 50, "2.1M", "+8%"),
    clan(3, "The Bull Run", 42, "1.9M", "+15%"),
    clan(4, "Crypto Kings", 35, "1.5M", "-2%"),
    clan(5, "Alpha Squad", 28, "1.2M", "+5%"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClansView {
    pub tab: ClanTab,
    pub prize_pool: u64,
    pub top_clans: &'static [Clan],
    pub my_clan: Option<Clan>,
}

/// The clan the player has joined during this run.
#[derive(Debug, Default)]
pub struct ClanMembership {
    joined: Mutex<Option<&'static str>>,
}

impl ClanMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Clan> {
        let joined = self.joined.lock().ok().and_then(|j| *j)?;
        TOP_CLANS.iter().find(|c| c.name == joined).copied()
    }

    /// Join a clan by name. A full clan refuses new members.
    pub fn join(&self, name: &str) -> Result<Clan, AppError> {
        let clan = TOP_CLANS
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("Clan {}", name)))?;
        if clan.is_full() {
            return Err(AppError::BadRequest(format!("{} is full", clan.name)));
        }

        let mut joined = self
            .joined
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("clan membership lock poisoned")))?;
        *joined = Some(clan.name);
        tracing::info!(clan = clan.name, "Joined clan");
        Ok(clan)
    }

    pub fn leave(&self) {
        if let Ok(mut joined) = self.joined.lock() {
            if let Some(name) = joined.take() {
                tracing::info!(clan = name, "Left clan");
            }
        }
    }
}

pub fn build(tab: ClanTab, membership: &ClanMembership) -> ClansView {
    ClansView {
        tab,
        prize_pool: WAR_PRIZE_POOL,
        top_clans: &TOP_CLANS,
        my_clan: membership.current(),
    }
}
