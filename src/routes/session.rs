// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes: read the current player and apply game-state changes.

use crate::error::Result;
use crate::middleware::SignedIn;
use crate::models::{FieldMap, UserRecord};
use crate::services::Session;
use crate::AppState;
use axum::{
    extract::State,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/guest", post(enter_guest_mode))
        .route("/session/user", patch(update_user))
        .route("/session/logout", post(logout))
}

/// Routes applied behind the signed-in guard.
pub fn signed_in_routes() -> Router<Arc<AppState>> {
    Router::new().route("/session/account", delete(delete_account))
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<Session> {
    Json(state.session.snapshot())
}

async fn enter_guest_mode(State(state): State<Arc<AppState>>) -> Json<UserRecord> {
    Json(state.session.login_as_guest())
}

/// Merge a JSON object into the user record, like any in-game action.
async fn update_user(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<FieldMap>,
) -> Result<Json<UserRecord>> {
    Ok(Json(state.session.update_fields(&patch)?))
}

async fn logout(State(state): State<Arc<AppState>>) -> Json<Session> {
    state.session.logout().await;
    Json(state.session.snapshot())
}

#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: String,
}

/// Delete the player's account everywhere and log out.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SignedIn>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(uid = %user.uid, "User-initiated account deletion");
    state.session.delete_account().await?;
    Ok(Json(DeleteAccountResponse {
        success: true,
        message: "Account deleted".to_string(),
    }))
}
