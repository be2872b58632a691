// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Screen view-models.
//!
//! Each screen reads the session and market state, optionally fetches
//! display data, and returns a serializable view. UI toggles (tabs,
//! periods, filters) are plain enums passed in by the caller.

pub mod academy;
pub mod clans;
pub mod community;
pub mod home;
pub mod leaderboard;
pub mod market_summary;
pub mod news_feed;
pub mod rewards;
pub mod widgets;

use serde::Serialize;

/// Direction arrow next to a ranking or quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}
