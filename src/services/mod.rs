// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod autosave;
pub mod cms;
pub mod deadline;
pub mod identity;
pub mod local_storage;
pub mod market;
pub mod market_data;
pub mod session;
pub mod user_service;

pub use autosave::Autosave;
pub use cms::{CmsClient, MirrorJob, MirrorSync};
pub use deadline::with_deadline;
pub use identity::{AuthPrincipal, IdentityClient};
pub use local_storage::{FileStorage, LocalStorage, MemoryStorage};
pub use market::MarketContext;
pub use market_data::{MarketDataClient, Poller};
pub use session::{Session, SessionDeps, SessionStore, SyncState};
pub use user_service::UserService;
