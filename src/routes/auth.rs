// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth screen actions: sign-in, sign-up, provider credentials, password
//! reset, email verification and profile name.
//!
//! Every successful sign-in is reconciled into the session before the
//! response goes out, so the caller sees the final record.

use crate::error::{AuthError, Result};
use crate::services::identity::{IdpCredential, VerificationStatus};
use crate::services::{AuthPrincipal, Session};
use crate::AppState;
use axum::{
    extract::State,
    routing::{post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/idp", post(sign_in_with_idp))
        .route("/auth/password-reset", post(password_reset))
}

/// Routes applied behind the signed-in guard.
pub fn signed_in_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/profile", put(update_profile))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(code = "auth/invalid-email"))]
    pub email: String,
    #[validate(length(min = 1, code = "auth/wrong-password"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[validate(email(code = "auth/invalid-email"))]
    pub email: String,
    #[validate(length(min = 6, code = "auth/weak-password"))]
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email(code = "auth/invalid-email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Reject a request body before it reaches the identity provider.
///
/// Failures reuse the provider's error codes so the auth screen shows the
/// same message either way. When several fields fail, the alphabetically
/// first code wins, which puts email problems ahead of password ones.
fn check<T: Validate>(body: &T) -> Result<()> {
    body.validate().map_err(|errors| {
        let mut codes: Vec<String> = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter().map(|e| e.code.to_string()))
            .collect();
        codes.sort();
        let code = codes.into_iter().next().unwrap_or_default();
        AuthError::from_provider(code).into()
    })
}

async fn signed_in(state: &AppState, principal: AuthPrincipal) -> Json<Session> {
    tracing::info!(uid = %principal.uid, provider = %principal.provider, "Signed in");
    state.session.handle_auth_change(Some(principal)).await;
    Json(state.session.snapshot())
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignInRequest>,
) -> Result<Json<Session>> {
    check(&body)?;
    let principal = state
        .identity
        .sign_in_with_password(body.email.trim(), &body.password)
        .await?;
    Ok(signed_in(&state, principal).await)
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignUpRequest>,
) -> Result<Json<Session>> {
    check(&body)?;
    let principal = state
        .identity
        .sign_up(body.email.trim(), &body.password, body.display_name.as_deref())
        .await?;
    Ok(signed_in(&state, principal).await)
}

/// Finish an OAuth flow the web view ran (Google or Apple).
async fn sign_in_with_idp(
    State(state): State<Arc<AppState>>,
    Json(credential): Json<IdpCredential>,
) -> Result<Json<Session>> {
    let principal = state.identity.sign_in_with_idp(&credential).await?;
    Ok(signed_in(&state, principal).await)
}

async fn password_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>> {
    check(&body)?;
    state.identity.send_password_reset(body.email.trim()).await?;
    Ok(Json(MessageResponse {
        message: "Password reset email sent".to_string(),
    }))
}

async fn verify_email(State(state): State<Arc<AppState>>) -> Result<Json<VerificationStatus>> {
    Ok(Json(state.identity.send_email_verification().await?))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProfileRequest>,
) -> Result<Json<Session>> {
    body.validate()
        .map_err(|e| crate::error::AppError::BadRequest(e.to_string()))?;
    let principal = state
        .identity
        .update_display_name(body.display_name.trim())
        .await?;
    Ok(signed_in(&state, principal).await)
}
