// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Global rankings for today's and yesterday's contest.

use super::Trend;
use crate::models::UserRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[default]
    Today,
    Yesterday,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    pub rank: u32,
    pub name: &'static str,
    /// Percentage gain of the player's picks
    pub gain: f64,
    pub avatar: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

/// The current user's own row, pinned under the list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YourRank {
    pub name: String,
    pub avatar: String,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardView {
    pub period: Period,
    /// Ranks 1, 2, 3 in order
    pub podium: Vec<RankedPlayer>,
    /// Ranks 4 through 23
    pub entries: Vec<RankedPlayer>,
    pub you: YourRank,
}

const NAMES: [&str; 20] = [
    "Faisal", "Noura", "Salem", "Abdullah", "Khalid", "Mohammed", "Sara", "Fatima", "Sultan",
    "Bandar", "Turki", "Hassan", "Ali", "Ibrahim", "Yousef", "Huda", "Layla", "Maha", "Reem",
    "Zaid",
];

const AVATARS: [&str; 5] = ["🎯", "⭐", "🔥", "💪", "🎮"];

fn podium(period: Period) -> Vec<RankedPlayer> {
    let top: [(&'static str, f64, &'static str); 3] = match period {
        Period::Today => [
            ("Yasser Al-Qahtani", 5.4, "👑"),
            ("Saad Al-Harbi", 4.8, "💎"),
            ("Majed Abdullah", 4.2, "🚀"),
        ],
        Period::Yesterday => [
            ("Ahmed Ali", 15.2, "🐺"),
            ("Fahad Al-Saud", 12.5, "🦁"),
            ("Omar Khalid", 10.8, "🐂"),
        ],
    };
    top.into_iter()
        .zip(1..)
        .map(|((name, gain, avatar), rank)| RankedPlayer {
            rank,
            name,
            gain,
            avatar,
            trend: None,
        })
        .collect()
}

fn entries(period: Period) -> Vec<RankedPlayer> {
    let (start, step, phase) = match period {
        Period::Today => (4.0, 0.1, 0),
        Period::Yesterday => (8.5, 0.2, 1),
    };
    NAMES
        .iter()
        .enumerate()
        .map(|(i, &name)| RankedPlayer {
            rank: i as u32 + 4,
            name,
            gain: round1(start - i as f64 * step),
            avatar: AVATARS[i % AVATARS.len()],
            trend: Some(if (i + phase) % 3 == 0 {
                Trend::Up
            } else {
                Trend::Down
            }),
        })
        .collect()
}

pub fn build(period: Period, user: &UserRecord) -> LeaderboardView {
    LeaderboardView {
        period,
        podium: podium(period),
        entries: entries(period),
        you: YourRank {
            name: user.profile.name.clone(),
            avatar: user.avatar.clone(),
            rank: user.profile.rank,
        },
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
