// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in session guard.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Signed-in player, inserted into request extensions by [`require_signed_in`].
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub uid: String,
}

/// Middleware that rejects requests unless an identity is signed in and the
/// session has caught up with it.
pub async fn require_signed_in(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = state.identity.current().ok_or(AppError::Unauthorized)?;

    let user = state.session.user();
    if !user.is_authenticated || user.uid() != Some(principal.uid.as_str()) {
        tracing::debug!(uid = %principal.uid, "Session not yet reconciled with identity");
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(SignedIn { uid: principal.uid });
    Ok(next.run(request).await)
}
