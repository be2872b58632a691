// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Timing constants for the session core live here too so tests can shrink
//! or stretch them without touching the services.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Ceiling on the splash/loading state after session init.
pub const SESSION_LOADING_CEILING: Duration = Duration::from_secs(2);
/// Default deadline for a single Firestore call.
pub const FIRESTORE_TIMEOUT: Duration = Duration::from_secs(8);
/// Deadline for login bookkeeping, which is non-critical.
pub const LOGIN_RECORD_TIMEOUT: Duration = Duration::from_secs(5);
/// Quiet period before coalesced profile changes are written.
pub const AUTOSAVE_DEBOUNCE: Duration = Duration::from_secs(2);
/// Attempts per CMS mirror job before it is dropped.
pub const MIRROR_MAX_ATTEMPTS: u32 = 3;
/// Fixed pause between CMS mirror attempts.
pub const MIRROR_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Timing knobs for the session core.
#[derive(Debug, Clone)]
pub struct Timings {
    pub loading_ceiling: Duration,
    pub firestore_timeout: Duration,
    pub login_record_timeout: Duration,
    pub autosave_debounce: Duration,
    pub mirror_max_attempts: u32,
    pub mirror_retry_delay: Duration,
    pub news_refresh: Duration,
    pub indices_refresh: Duration,
    pub insight_refresh: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            loading_ceiling: SESSION_LOADING_CEILING,
            firestore_timeout: FIRESTORE_TIMEOUT,
            login_record_timeout: LOGIN_RECORD_TIMEOUT,
            autosave_debounce: AUTOSAVE_DEBOUNCE,
            mirror_max_attempts: MIRROR_MAX_ATTEMPTS,
            mirror_retry_delay: MIRROR_RETRY_DELAY,
            news_refresh: Duration::from_secs(60),
            indices_refresh: Duration::from_secs(60),
            insight_refresh: Duration::from_secs(300),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase / GCP project ID
    pub firebase_project_id: String,
    /// Firebase web API key (Auth REST)
    pub firebase_api_key: String,
    /// Base URL of the serverless stock/news endpoints
    pub api_base_url: String,
    /// CMS JSON store endpoint
    pub cms_api_url: String,
    /// Directory backing local persistent storage
    pub local_storage_dir: PathBuf,
    /// Web view origin allowed by CORS
    pub frontend_url: String,
    /// App-shell port
    pub port: u16,
    /// Version stamped on new user documents
    pub app_version: String,
    /// Run without Firestore (in-memory user store)
    pub offline_mode: bool,
    pub timings: Timings,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            firebase_project_id: "test-project".to_string(),
            firebase_api_key: "test_api_key".to_string(),
            api_base_url: "http://127.0.0.1:9".to_string(),
            cms_api_url: "http://127.0.0.1:9/api/cms".to_string(),
            local_storage_dir: env::temp_dir().join("stock-hero-test"),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8787,
            app_version: "1.0.0".to_string(),
            offline_mode: true,
            timings: Timings::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let offline_mode = env::var("OFFLINE_MODE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let firebase_project_id = match env::var("FIREBASE_PROJECT_ID") {
            Ok(v) => v,
            Err(_) if offline_mode => "local-dev".to_string(),
            Err(_) => return Err(ConfigError::Missing("FIREBASE_PROJECT_ID")),
        };

        let api_base_url = env::var("API_BASE_URL")
            .unwrap_or_else(|_| "https://bhidy-app.pages.dev".to_string())
            .trim_end_matches('/')
            .to_string();

        let cms_api_url =
            env::var("CMS_API_URL").unwrap_or_else(|_| format!("{}/api/cms", api_base_url));

        Ok(Self {
            firebase_project_id,
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            api_base_url,
            cms_api_url,
            local_storage_dir: env::var("LOCAL_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".stock-hero")),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8787".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            app_version: env::var("APP_VERSION").unwrap_or_else(|_| "1.0.0".to_string()),
            offline_mode,
            timings: Timings::default(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
