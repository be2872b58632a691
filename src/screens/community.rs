// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community: feed posts, most-picked tickers and discussion threads.

use super::Trend;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunityTab {
    #[default]
    Feed,
    #[serde(rename = "Top Picks", alias = "TopPicks")]
    TopPicks,
    Discussions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Post {
    pub id: u32,
    pub author: &'static str,
    pub avatar: &'static str,
    pub time: &'static str,
    pub content: &'static str,
    pub likes: u32,
    pub comments: u32,
    pub picks: &'static [&'static str],
    pub badge: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TopPick {
    pub ticker: &'static str,
    pub picks: u32,
    pub change: f64,
    pub trend: Trend,
    pub logo: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Discussion {
    pub id: u32,
    pub title: &'static str,
    pub author: &'static str,
    pub replies: u32,
    pub time: &'static str,
    pub category: &'static str,
}

static POSTS: [Post; 3] = [
    Post {
        id: 1,
        author: "StockMaster",
        avatar: "👑",
        time: "2h ago",
        content: "Just locked in 2222, 1120, and 2010 for today. Feeling bullish! 🚀",
        likes: 124,
        comments: 18,
        picks: &["2222", "1120", "2010"],
        badge: "Top 1%",
    },
    Post {
        id: 2,
        author: "DiamondHands",
        avatar: "💎",
        time: "4h ago",
        content: "My 7-day streak strategy: Always pick one safe stock, one volatile, and one trending. Works like magic! ✨",
        likes: 89,
        comments: 12,
        picks: &[],
        badge: "Streak Master",
    },
    Post {
        id: 3,
        author: "MoonShot",
        avatar: "🚀",
        time: "6h ago",
        content: "ACWA Power is looking spicy today! Who else is riding the wave? 🌊",
        likes: 156,
        comments: 34,
        picks: &["4061"],
        badge: "Risk Taker",
    },
];

static TOP_PICKS: [TopPick; 5] = [
    TopPick { ticker: "2222", picks: 4291, change: 1.2, trend: Trend::Up, logo: "https://logo.clearbit.com/aramco.com" },
    TopPick { ticker: "1120", picks: 3847, change: 0.8, trend: Trend::Up, logo: "https://logo.clearbit.com/alrajhibank.com.sa" },
    TopPick { ticker: "2010", picks: 3562, change: -1.5, trend: Trend::Down, logo: "https://logo.clearbit.com/sabic.com" },
    TopPick { ticker: "7010", picks: 2934, change: 2.4, trend: Trend::Up, logo: "https://logo.clearbit.com/stc.com.sa" },
    TopPick { ticker: "4061", picks: 2456, change: 5.6, trend: Trend::Up, logo: "https://logo.clearbit.com/acwapower.com" },
];

static DISCUSSIONS: [Discussion; 3] = [
    Discussion { id: 1, title: "Best stocks for beginners?", author: "NewTrader", replies: 23, time: "1h ago", category: "Strategy" },
    Discussion { id: 2, title: "How to maintain a winning streak?", author: "ProPlayer", replies: 45, time: "3h ago", category: "Tips" },
    Discussion { id: 3, title: "Tech stocks vs. Blue chips - Debate", author: "Analyst99", replies: 67, time: "5h ago", category: "Discussion" },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub liked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickRow {
    #[serde(flatten)]
    pub pick: TopPick,
    /// The player has this ticker among their own picks
    pub picked_by_you: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tab", content = "items")]
pub enum CommunityView {
    Feed(Vec<FeedPost>),
    #[serde(rename = "Top Picks")]
    TopPicks(Vec<PickRow>),
    Discussions(&'static [Discussion]),
}

/// Posts the player has liked this run.
#[derive(Debug, Default)]
pub struct PostLikes {
    liked: Mutex<HashSet<u32>>,
}

impl PostLikes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_liked(&self, id: u32) -> bool {
        self.liked.lock().map(|l| l.contains(&id)).unwrap_or(false)
    }

    /// Flip the like on a post. Returns whether it is now liked.
    pub fn toggle(&self, id: u32) -> Result<bool, AppError> {
        if !POSTS.iter().any(|p| p.id == id) {
            return Err(AppError::NotFound(format!("Post {}", id)));
        }
        let mut liked = self
            .liked
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("post likes lock poisoned")))?;
        if liked.remove(&id) {
            Ok(false)
        } else {
            liked.insert(id);
            Ok(true)
        }
    }
}

pub fn build(tab: CommunityTab, likes: &PostLikes, your_picks: &[String]) -> CommunityView {
    match tab {
        CommunityTab::Feed => CommunityView::Feed(
            POSTS
                .iter()
                .map(|post| {
                    let liked = likes.is_liked(post.id);
                    FeedPost {
                        post: Post {
                            likes: post.likes + u32::from(liked),
                            ..*post
                        },
                        liked,
                    }
                })
                .collect(),
        ),
        CommunityTab::TopPicks => CommunityView::TopPicks(
            TOP_PICKS
                .iter()
                .map(|pick| PickRow {
                    pick: *pick,
                    picked_by_you: your_picks.iter().any(|p| p == pick.ticker),
                })
                .collect(),
        ),
        CommunityTab::Discussions => CommunityView::Discussions(&DISCUSSIONS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_adds_one() {
        let likes = PostLikes::new();
        assert!(likes.toggle(3).unwrap());

        let CommunityView::Feed(posts) = build(CommunityTab::Feed, &likes, &[]) else {
            panic!("expected feed");
        };
        assert_eq!(posts[2].post.likes, 157);
        assert!(posts[2].liked);
        assert_eq!(posts[0].post.likes, 124);

        assert!(!likes.toggle(3).unwrap());
        assert!(likes.toggle(99).is_err());
    }

    #[test]
    fn test_top_picks_mark_yours() {
        let picks = vec!["7010".to_string()];
        let CommunityView::TopPicks(rows) = build(CommunityTab::TopPicks, &PostLikes::new(), &picks)
        else {
            panic!("expected top picks");
        };
        let tickers: Vec<&str> = rows.iter().map(|r| r.pick.ticker).collect();
        assert_eq!(tickers, vec!["2222", "1120", "2010", "7010", "4061"]);
        assert!(rows[3].picked_by_you);
        assert!(!rows[0].picked_by_you);
    }
}
