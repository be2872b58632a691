// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stock_hero::config::Config;
use stock_hero::db::MemoryUserStore;
use stock_hero::routes::create_router;
use stock_hero::services::identity::AuthPrincipal;
use stock_hero::services::{IdentityClient, MemoryStorage};
use stock_hero::AppState;
use tokio::task::JoinHandle;

/// Check if emulator is available via environment variable.
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// A principal as Firebase would report it after sign-in.
pub fn principal(uid: &str, email: &str) -> AuthPrincipal {
    AuthPrincipal {
        uid: uid.to_string(),
        email: Some(email.to_string()),
        display_name: None,
        photo_url: None,
        email_verified: true,
        provider: "password".to_string(),
        linked_providers: vec!["password".to_string()],
        id_token: format!("token-{}", uid),
    }
}

// ─── Mock Backend ───────────────────────────────────────────────

/// Account known to the mock identity provider.
#[derive(Debug, Clone)]
pub struct MockAccount {
    pub uid: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
    pub provider: String,
    /// Deletion answers CREDENTIAL_TOO_OLD_LOGIN_AGAIN while set
    pub stale_login: bool,
}

/// Shared state of the mock identity, CMS and market endpoints.
#[derive(Default)]
pub struct MockState {
    pub accounts: Mutex<HashMap<String, MockAccount>>,
    pub identity_calls: Mutex<Vec<String>>,
    pub cms_users: Mutex<Vec<Value>>,
    pub cms_news: Mutex<Vec<Value>>,
    /// Fail this many upcoming CMS requests with 503
    pub cms_failures: AtomicU32,
    pub cms_requests: Mutex<Vec<String>>,
    next_cms_id: AtomicU32,
    next_uid: AtomicU32,
    pub stocks: Mutex<Vec<Value>>,
    pub profiles: Mutex<HashMap<String, Value>>,
    /// Body returned by `/api/news`; `None` answers 500
    pub news: Mutex<Option<Value>>,
}

impl MockState {
    pub fn add_account(&self, email: &str, password: &str) -> String {
        let uid = format!("uid-{}", self.next_uid.fetch_add(1, Ordering::SeqCst) + 1);
        self.accounts.lock().unwrap().insert(
            uid.clone(),
            MockAccount {
                uid: uid.clone(),
                email: email.to_string(),
                password: password.to_string(),
                display_name: None,
                email_verified: false,
                provider: "password".to_string(),
                stale_login: false,
            },
        );
        uid
    }

    pub fn account(&self, uid: &str) -> Option<MockAccount> {
        self.accounts.lock().unwrap().get(uid).cloned()
    }

    pub fn set_stale_login(&self, uid: &str) {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(uid) {
            account.stale_login = true;
        }
    }

    /// Seed a CMS user record, returning its numeric id.
    pub fn add_cms_user(&self, mut record: Value) -> u32 {
        let id = self.next_cms_id.fetch_add(1, Ordering::SeqCst) + 1;
        record["id"] = json!(id);
        self.cms_users.lock().unwrap().push(record);
        id
    }

    pub fn cms_user(&self, uid: &str) -> Option<Value> {
        self.cms_users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u["uid"] == uid)
            .cloned()
    }

    pub fn cms_requests(&self) -> Vec<String> {
        self.cms_requests.lock().unwrap().clone()
    }

    pub fn identity_calls(&self) -> Vec<String> {
        self.identity_calls.lock().unwrap().clone()
    }
}

pub struct MockBackend {
    pub url: String,
    pub state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let router = Router::new()
            .route("/identity/{action}", post(identity))
            .route("/api/cms", any(cms))
            .route("/api/stocks", get(stocks))
            .route("/api/stock-profile", get(stock_profile))
            .route("/api/news", get(news))
            .route("/api/ai-insight", get(ai_insight))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
            task,
        }
    }

    pub fn cms_url(&self) -> String {
        format!("{}/api/cms", self.url)
    }

    pub fn identity_url(&self) -> String {
        format!("{}/identity", self.url)
    }
}

fn identity_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": { "code": 400, "message": message } })),
    )
        .into_response()
}

fn uid_for_token(token: &str) -> Option<&str> {
    token.strip_prefix("token-")
}

async fn identity(
    State(state): State<Arc<MockState>>,
    Path(action): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let action = action.trim_start_matches("accounts:").to_string();
    state.identity_calls.lock().unwrap().push(action.clone());
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let token = body["idToken"].as_str().unwrap_or_default().to_string();

    match action.as_str() {
        "signInWithPassword" => {
            let accounts = state.accounts.lock().unwrap();
            match accounts.values().find(|a| a.email == email) {
                None => identity_error("EMAIL_NOT_FOUND"),
                Some(a) if a.password != body["password"].as_str().unwrap_or_default() => {
                    identity_error("INVALID_LOGIN_CREDENTIALS")
                }
                Some(a) => Json(json!({ "idToken": format!("token-{}", a.uid) })).into_response(),
            }
        }
        "signUp" => {
            let password = body["password"].as_str().unwrap_or_default();
            if state.accounts.lock().unwrap().values().any(|a| a.email == email) {
                return identity_error("EMAIL_EXISTS");
            }
            if password.len() < 6 {
                return identity_error("WEAK_PASSWORD : Password should be at least 6 characters");
            }
            let uid = state.add_account(&email, password);
            Json(json!({ "idToken": format!("token-{}", uid) })).into_response()
        }
        "signInWithIdp" => {
            let post_body = body["postBody"].as_str().unwrap_or_default();
            let provider = post_body
                .split('&')
                .find_map(|kv| kv.strip_prefix("providerId="))
                .unwrap_or_default()
                .replace("%2E", ".");
            if provider.is_empty() {
                return identity_error("INVALID_IDP_RESPONSE");
            }
            let uid = format!("idp-{}", provider.replace('.', "-"));
            state
                .accounts
                .lock()
                .unwrap()
                .entry(uid.clone())
                .or_insert_with(|| MockAccount {
                    uid: uid.clone(),
                    email: "player@gmail.com".to_string(),
                    password: String::new(),
                    display_name: Some("Idp Player".to_string()),
                    email_verified: true,
                    provider: provider.clone(),
                    stale_login: false,
                });
            Json(json!({ "idToken": format!("token-{}", uid) })).into_response()
        }
        "lookup" => {
            let Some(account) = uid_for_token(&token).and_then(|uid| state.account(uid)) else {
                return identity_error("INVALID_ID_TOKEN");
            };
            Json(json!({
                "users": [{
                    "localId": account.uid,
                    "email": account.email,
                    "displayName": account.display_name,
                    "emailVerified": account.email_verified,
                    "providerUserInfo": [{ "providerId": account.provider }],
                }]
            }))
            .into_response()
        }
        "update" => {
            let mut accounts = state.accounts.lock().unwrap();
            let Some(account) = uid_for_token(&token).and_then(|uid| accounts.get_mut(uid)) else {
                return identity_error("INVALID_ID_TOKEN");
            };
            if let Some(name) = body["displayName"].as_str() {
                account.display_name = Some(name.to_string());
            }
            Json(json!({ "localId": account.uid })).into_response()
        }
        "sendOobCode" => Json(json!({ "email": email })).into_response(),
        "delete" => {
            let mut accounts = state.accounts.lock().unwrap();
            let Some(uid) = uid_for_token(&token).map(str::to_string) else {
                return identity_error("INVALID_ID_TOKEN");
            };
            match accounts.get(&uid) {
                Some(a) if a.stale_login => identity_error("CREDENTIAL_TOO_OLD_LOGIN_AGAIN"),
                Some(_) => {
                    accounts.remove(&uid);
                    Json(json!({})).into_response()
                }
                None => identity_error("USER_NOT_FOUND"),
            }
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn cms(
    State(state): State<Arc<MockState>>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let entity = query.get("entity").cloned().unwrap_or_default();
    let id = query.get("id").cloned();
    let line = match &id {
        Some(id) => format!("{} {} {}", method, entity, id),
        None => format!("{} {}", method, entity),
    };
    state.cms_requests.lock().unwrap().push(line);

    let failing = state
        .cms_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return (StatusCode::SERVICE_UNAVAILABLE, "unavailable").into_response();
    }

    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let same_id = |u: &Value| id.as_deref().is_some_and(|id| u["id"].to_string() == id);

    match (method, entity.as_str()) {
        (Method::GET, "users") => Json(state.cms_users.lock().unwrap().clone()).into_response(),
        (Method::GET, "news") => Json(state.cms_news.lock().unwrap().clone()).into_response(),
        (Method::POST, "users") => {
            let id = state.add_cms_user(payload);
            (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
        }
        (Method::PUT, "users") => {
            let mut users = state.cms_users.lock().unwrap();
            let Some(user) = users.iter_mut().find(|u| same_id(u)) else {
                return StatusCode::NOT_FOUND.into_response();
            };
            if let (Some(target), Value::Object(patch)) = (user.as_object_mut(), payload) {
                for (k, v) in patch {
                    target.insert(k, v);
                }
            }
            Json(user.clone()).into_response()
        }
        (Method::DELETE, "users") => {
            let mut users = state.cms_users.lock().unwrap();
            let before = users.len();
            users.retain(|u| !same_id(u));
            if users.len() == before {
                StatusCode::NOT_FOUND.into_response()
            } else {
                Json(json!({ "success": true })).into_response()
            }
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn stocks(State(state): State<Arc<MockState>>) -> Json<Vec<Value>> {
    Json(state.stocks.lock().unwrap().clone())
}

async fn stock_profile(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let symbol = query.get("symbol").cloned().unwrap_or_default();
    match state.profiles.lock().unwrap().get(&symbol) {
        Some(profile) => Json(profile.clone()).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "no data").into_response(),
    }
}

async fn news(State(state): State<Arc<MockState>>) -> Response {
    match state.news.lock().unwrap().clone() {
        Some(body) => Json(body).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "scraper down").into_response(),
    }
}

async fn ai_insight(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let symbol = query.get("symbol").cloned().unwrap_or_default();
    Json(json!({
        "symbol": symbol,
        "answer": format!("{} is moving on earnings", symbol),
        "sources": [{ "title": "Quarterly results", "publisher": "Argaam" }],
    }))
}

// ─── Test App ───────────────────────────────────────────────────

/// App state wired to in-memory stores and, optionally, a mock backend.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryUserStore>,
    pub storage: Arc<MemoryStorage>,
    pub backend: Option<MockBackend>,
}

impl TestApp {
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub fn backend(&self) -> &MockState {
        &self.backend.as_ref().expect("test app has no backend").state
    }
}

/// Config with short mirror retries; remote endpoints point nowhere.
pub fn test_config() -> Config {
    let mut config = Config::test_default();
    config.timings.mirror_retry_delay = Duration::from_millis(10);
    config
}

/// Offline app: no reachable identity, CMS or market endpoints.
///
/// Safe under a paused clock since nothing waits on a live socket.
pub fn offline_app() -> TestApp {
    offline_app_with(test_config(), Arc::new(MemoryStorage::new()))
}

pub fn offline_app_with(config: Config, storage: Arc<MemoryStorage>) -> TestApp {
    let store = Arc::new(MemoryUserStore::new());
    let identity = Arc::new(
        IdentityClient::with_base_url(&config.firebase_api_key, "http://127.0.0.1:9").unwrap(),
    );
    let state = AppState::new(config, store.clone(), identity, storage.clone()).unwrap();
    TestApp {
        state,
        store,
        storage,
        backend: None,
    }
}

/// App backed by a live mock server for identity, CMS and market data.
pub async fn connected_app() -> TestApp {
    let backend = MockBackend::start().await;
    let mut config = test_config();
    config.api_base_url = backend.url.clone();
    config.cms_api_url = backend.cms_url();

    let store = Arc::new(MemoryUserStore::new());
    let storage = Arc::new(MemoryStorage::new());
    let identity = Arc::new(
        IdentityClient::with_base_url(&config.firebase_api_key, &backend.identity_url()).unwrap(),
    );
    let state = AppState::new(config, store.clone(), identity, storage.clone()).unwrap();
    TestApp {
        state,
        store,
        storage,
        backend: Some(backend),
    }
}

/// Poll `check` until it holds, failing after a couple of seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
