// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod cms;
pub mod feed;
pub mod market;
pub mod user;

pub use cms::{CmsNewsItem, CmsStats, CmsUser};
pub use feed::{AiInsight, NewsArticle, StockProfile, StockQuote};
pub use market::{Market, MARKETS};
pub use user::{FieldMap, Progress, UserDocument, UserRecord};
