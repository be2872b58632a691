// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Auth client (Identity Toolkit REST API).
//!
//! Handles:
//! - Email/password sign-in and sign-up
//! - OAuth credential sign-in (Google, Apple) handed over by the web view
//! - Password reset and email verification mails
//! - Display name updates and account deletion
//!
//! The signed-in principal is published on a `watch` channel; the session
//! store listens to it for auth-state changes.

use crate::error::{AppError, AuthError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// The signed-in identity as reported by Firebase Auth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPrincipal {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub email_verified: bool,
    /// First linked provider ("password", "google.com", ...)
    pub provider: String,
    #[serde(default)]
    pub linked_providers: Vec<String>,
    #[serde(skip_serializing, default)]
    pub id_token: String,
}

impl AuthPrincipal {
    /// Whether the account can sign in with a password.
    pub fn has_password_auth(&self) -> bool {
        self.linked_providers.iter().any(|p| p == "password")
    }
}

/// OAuth credential obtained by the host (popup or redirect flow).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdpCredential {
    /// "google.com" or "apple.com"
    pub provider_id: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Outcome of a verification mail request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Sent,
    AlreadyVerified,
}

// ─── Wire Types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    provider_user_info: Vec<ProviderInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderInfo {
    provider_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Firebase Auth REST client.
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    current: watch::Sender<Option<AuthPrincipal>>,
}

impl IdentityClient {
    pub fn new(api_key: &str) -> Result<Self, AppError> {
        Self::with_base_url(api_key, IDENTITY_TOOLKIT_URL)
    }

    /// Point the client at another endpoint (emulator or test server).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;
        let (current, _) = watch::channel(None);

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            current,
        })
    }

    // ─── Auth State ──────────────────────────────────────────────

    pub fn current(&self) -> Option<AuthPrincipal> {
        self.current.borrow().clone()
    }

    /// Receiver that sees every auth-state change.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthPrincipal>> {
        self.current.subscribe()
    }

    /// Publish an auth-state change.
    pub fn publish(&self, principal: Option<AuthPrincipal>) {
        tracing::debug!(
            uid = principal.as_ref().map(|p| p.uid.as_str()),
            "Auth state changed"
        );
        self.current.send_replace(principal);
    }

    pub fn sign_out(&self) {
        self.publish(None);
    }

    fn current_token(&self) -> Result<String, AppError> {
        self.current
            .borrow()
            .as_ref()
            .map(|p| p.id_token.clone())
            .ok_or_else(|| AuthError::no_current_user().into())
    }

    // ─── Sign-in Flows ───────────────────────────────────────────

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthPrincipal, AppError> {
        let token: TokenResponse = self
            .post(
                "signInWithPassword",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        self.finish_sign_in(token.id_token).await
    }

    /// Create an email/password account, optionally setting a display name.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthPrincipal, AppError> {
        let token: TokenResponse = self
            .post(
                "signUp",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        if let Some(name) = display_name.filter(|n| !n.trim().is_empty()) {
            let _: serde_json::Value = self
                .post(
                    "update",
                    &json!({ "idToken": token.id_token, "displayName": name, "returnSecureToken": false }),
                )
                .await?;
        }

        self.finish_sign_in(token.id_token).await
    }

    /// Exchange a provider credential for a Firebase session.
    pub async fn sign_in_with_idp(
        &self,
        credential: &IdpCredential,
    ) -> Result<AuthPrincipal, AppError> {
        let mut post_body = format!("providerId={}", urlencoding::encode(&credential.provider_id));
        if let Some(id_token) = &credential.id_token {
            post_body.push_str(&format!("&id_token={}", urlencoding::encode(id_token)));
        }
        if let Some(access_token) = &credential.access_token {
            post_body.push_str(&format!("&access_token={}", urlencoding::encode(access_token)));
        }

        let token: TokenResponse = self
            .post(
                "signInWithIdp",
                &json!({
                    "postBody": post_body,
                    "requestUri": "http://localhost",
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                }),
            )
            .await?;
        self.finish_sign_in(token.id_token).await
    }

    async fn finish_sign_in(&self, id_token: String) -> Result<AuthPrincipal, AppError> {
        let principal = self.lookup(&id_token).await?;
        tracing::info!(uid = %principal.uid, provider = %principal.provider, "Signed in");
        self.publish(Some(principal.clone()));
        Ok(principal)
    }

    async fn lookup(&self, id_token: &str) -> Result<AuthPrincipal, AppError> {
        let response: LookupResponse = self
            .post("lookup", &json!({ "idToken": id_token }))
            .await?;
        let account = response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Auth(AuthError::from_provider("USER_NOT_FOUND")))?;

        let linked_providers: Vec<String> = account
            .provider_user_info
            .into_iter()
            .map(|p| p.provider_id)
            .collect();

        Ok(AuthPrincipal {
            uid: account.local_id,
            email: account.email,
            display_name: account.display_name,
            photo_url: account.photo_url,
            email_verified: account.email_verified,
            provider: linked_providers
                .first()
                .cloned()
                .unwrap_or_else(|| "password".to_string()),
            linked_providers,
            id_token: id_token.to_string(),
        })
    }

    // ─── Account Actions ─────────────────────────────────────────

    pub async fn send_password_reset(&self, email: &str) -> Result<(), AppError> {
        let _: serde_json::Value = self
            .post(
                "sendOobCode",
                &json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        tracing::info!("Password reset email sent");
        Ok(())
    }

    pub async fn send_email_verification(&self) -> Result<VerificationStatus, AppError> {
        let principal = self.current().ok_or_else(AuthError::no_current_user)?;
        if principal.email_verified {
            return Ok(VerificationStatus::AlreadyVerified);
        }

        let _: serde_json::Value = self
            .post(
                "sendOobCode",
                &json!({ "requestType": "VERIFY_EMAIL", "idToken": principal.id_token }),
            )
            .await?;
        tracing::info!(uid = %principal.uid, "Verification email sent");
        Ok(VerificationStatus::Sent)
    }

    pub async fn update_display_name(&self, display_name: &str) -> Result<AuthPrincipal, AppError> {
        let id_token = self.current_token()?;
        let _: serde_json::Value = self
            .post(
                "update",
                &json!({ "idToken": id_token, "displayName": display_name, "returnSecureToken": false }),
            )
            .await?;
        self.finish_sign_in(id_token).await
    }

    /// Re-read the account (e.g. after the player verified their email).
    pub async fn reload(&self) -> Result<AuthPrincipal, AppError> {
        let id_token = self.current_token()?;
        self.finish_sign_in(id_token).await
    }

    /// Delete the identity account. The caller signs out afterwards.
    pub async fn delete_account(&self) -> Result<(), AppError> {
        let id_token = self.current_token()?;
        let _: serde_json::Value = self
            .post("delete", &json!({ "idToken": id_token }))
            .await?;
        tracing::info!("Identity account deleted");
        Ok(())
    }

    // ─── HTTP ────────────────────────────────────────────────────

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, AppError> {
        let url = format!("{}/accounts:{}", self.base_url, endpoint);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Identity request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => AuthError::from_provider(envelope.error.message).into(),
                Err(_) => AppError::Upstream(format!("HTTP {}: {}", status, text)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("JSON parse error: {}", e)))
    }
}
