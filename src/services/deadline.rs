// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Deadlines for remote calls.

use crate::error::AppError;
use std::future::Future;
use std::time::Duration;

/// Run `fut` with a deadline.
///
/// On expiry the inner future is dropped, so the remote call is cancelled
/// rather than left running in the background.
pub async fn with_deadline<T, F>(
    limit: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                limit_ms = limit.as_millis() as u64,
                "Deadline exceeded"
            );
            Err(AppError::Timeout(operation))
        }
    }
}
