// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Operation timed out: {0}")]
    Timeout(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("Local storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when a remote call was abandoned because its deadline passed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout(_))
    }

    /// True when the identity provider wants a fresh sign-in first.
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            AppError::Auth(AuthError {
                code: AuthErrorCode::RequiresRecentLogin,
                ..
            })
        )
    }
}

/// Identity-provider failure codes we know how to explain to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    EmailAlreadyInUse,
    InvalidEmail,
    UserNotFound,
    WrongPassword,
    PopupClosedByUser,
    UnauthorizedDomain,
    OperationNotAllowed,
    TooManyRequests,
    RequiresRecentLogin,
    WeakPassword,
    NoCurrentUser,
    Unknown,
}

impl AuthErrorCode {
    /// Map either a Firebase Auth REST error message (`EMAIL_EXISTS`,
    /// `WEAK_PASSWORD : Password should be ...`) or a web SDK code
    /// (`auth/email-already-in-use`) onto a known code.
    pub fn from_code(raw: &str) -> Self {
        let code = raw.split(':').next().unwrap_or("").trim();
        match code {
            "EMAIL_EXISTS" | "auth/email-already-in-use" => Self::EmailAlreadyInUse,
            "INVALID_EMAIL" | "auth/invalid-email" => Self::InvalidEmail,
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" | "auth/user-not-found" => Self::UserNotFound,
            "INVALID_PASSWORD"
            | "INVALID_LOGIN_CREDENTIALS"
            | "auth/wrong-password"
            | "auth/invalid-credential" => Self::WrongPassword,
            "auth/popup-closed-by-user" | "auth/cancelled-popup-request" => {
                Self::PopupClosedByUser
            }
            "UNAUTHORIZED_DOMAIN" | "auth/unauthorized-domain" => Self::UnauthorizedDomain,
            "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" | "auth/operation-not-allowed" => {
                Self::OperationNotAllowed
            }
            "TOO_MANY_ATTEMPTS_TRY_LATER" | "auth/too-many-requests" => Self::TooManyRequests,
            "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" | "auth/requires-recent-login" => {
                Self::RequiresRecentLogin
            }
            "WEAK_PASSWORD" | "auth/weak-password" => Self::WeakPassword,
            _ => Self::Unknown,
        }
    }

    /// Short message shown inline on the auth screen.
    pub fn message(self) -> &'static str {
        match self {
            Self::EmailAlreadyInUse => "Email already registered",
            Self::InvalidEmail => "Invalid email",
            Self::UserNotFound => "Account not found",
            Self::WrongPassword => "Incorrect password",
            Self::PopupClosedByUser => "Cancelled",
            Self::UnauthorizedDomain => "Domain not authorized",
            Self::OperationNotAllowed => "Method not enabled",
            Self::TooManyRequests => "Too many requests. Please try again later.",
            Self::RequiresRecentLogin => {
                "Please log out and log back in before deleting your account."
            }
            Self::WeakPassword => "Password should be at least 6 characters",
            Self::NoCurrentUser => "No user logged in.",
            Self::Unknown => "An error occurred",
        }
    }
}

/// Identity-provider error with its player-facing message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .code.message())]
pub struct AuthError {
    pub code: AuthErrorCode,
    /// Raw provider code, kept for logs only.
    pub raw: String,
}

impl AuthError {
    pub fn from_provider(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            code: AuthErrorCode::from_code(&raw),
            raw,
        }
    }

    pub fn no_current_user() -> Self {
        Self {
            code: AuthErrorCode::NoCurrentUser,
            raw: String::new(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    requires_reauth: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let requires_reauth = self.requires_reauth();
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Auth(err) => {
                tracing::info!(code = %err.raw, "Auth action rejected");
                let status = match err.code {
                    AuthErrorCode::NoCurrentUser | AuthErrorCode::RequiresRecentLogin => {
                        StatusCode::UNAUTHORIZED
                    }
                    AuthErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, "auth_error", Some(err.to_string()))
            }
            AppError::Timeout(op) => {
                tracing::warn!(operation = op, "Timed out");
                (StatusCode::GATEWAY_TIMEOUT, "timeout", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream API error");
                (StatusCode::BAD_GATEWAY, "upstream_error", None)
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Local storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            requires_reauth,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
