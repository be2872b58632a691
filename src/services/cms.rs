// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CMS mirror of authenticated users.
//!
//! The CMS is a JSON-blob store addressed as `<cms>?entity=users[&id=<id>]`.
//! Mirroring is best effort: jobs go through [`MirrorSync`], a background
//! queue that retries a bounded number of times and then gives up.

use crate::config::Timings;
use crate::error::AppError;
use crate::models::{CmsNewsItem, CmsStats, CmsUser, UserRecord};
use crate::time_utils::now_rfc3339;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const ENTITY: &str = "users";
const NEWS_ENTITY: &str = "news";

/// Whether an upsert created or replaced the mirror record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// HTTP client for the CMS users entity.
#[derive(Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    base_url: String,
}

impl CmsClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    pub async fn list_users(&self) -> Result<Vec<CmsUser>, AppError> {
        self.list(ENTITY).await
    }

    /// Editorial news items (all markets, drafts included).
    pub async fn list_news(&self) -> Result<Vec<CmsNewsItem>, AppError> {
        self.list(NEWS_ENTITY).await
    }

    async fn list<T: DeserializeOwned>(&self, entity: &str) -> Result<Vec<T>, AppError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("entity", entity)])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("CMS request failed: {}", e)))?;

        check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("CMS JSON parse error: {}", e)))
    }

    /// Look a user up by Firebase uid.
    ///
    /// A failed listing is an error, never "not found", so a flaky CMS
    /// cannot cause duplicate records.
    pub async fn find_user(&self, uid: &str) -> Result<Option<CmsUser>, AppError> {
        Ok(self.list_users().await?.into_iter().find(|u| u.uid == uid))
    }

    /// Create or replace the mirror record for `user`.
    pub async fn upsert_user(&self, user: &UserRecord) -> Result<UpsertOutcome, AppError> {
        let uid = user
            .uid()
            .ok_or_else(|| AppError::BadRequest("Cannot mirror a user without uid".into()))?;
        let now = now_rfc3339();
        let existing = self.find_user(uid).await?;
        let previous_logins = existing.as_ref().map(|u| u.login_count).unwrap_or(0);
        let mut payload = CmsUser::from_record(user, previous_logins, &now);

        match existing.and_then(|u| u.id) {
            Some(id) => {
                self.put(&id, &payload).await?;
                tracing::info!(uid, cms_id = %id, "User mirrored to CMS (updated)");
                Ok(UpsertOutcome::Updated)
            }
            None => {
                payload.created_at = Some(now);
                self.send(self.http.post(&self.base_url).query(&[("entity", ENTITY)]).json(&payload))
                    .await?;
                tracing::info!(uid, "User mirrored to CMS (created)");
                Ok(UpsertOutcome::Created)
            }
        }
    }

    /// Remove the mirror record. Returns false if there was none.
    pub async fn delete_user(&self, uid: &str) -> Result<bool, AppError> {
        let Some(id) = self.find_user(uid).await?.and_then(|u| u.id) else {
            return Ok(false);
        };
        self.send(
            self.http
                .delete(&self.base_url)
                .query(&[("entity", ENTITY), ("id", id.as_str())]),
        )
        .await?;
        tracing::info!(uid, cms_id = %id, "User removed from CMS");
        Ok(true)
    }

    /// Push leaderboard stats. Returns false if the user is not mirrored.
    pub async fn update_stats(&self, uid: &str, stats: &CmsStats) -> Result<bool, AppError> {
        let Some(id) = self.find_user(uid).await?.and_then(|u| u.id) else {
            return Ok(false);
        };
        self.put(&id, stats).await?;
        Ok(true)
    }

    async fn put<T: Serialize + ?Sized>(&self, id: &str, body: &T) -> Result<(), AppError> {
        self.send(
            self.http
                .put(&self.base_url)
                .query(&[("entity", ENTITY), ("id", id)])
                .json(body),
        )
        .await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(), AppError> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("CMS request failed: {}", e)))?;
        check_response(response).await?;
        Ok(())
    }
}

async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Upstream(format!("CMS HTTP {}: {}", status, body)))
}

// ─── Mirror Queue ───────────────────────────────────────────────

/// Work item for the mirror queue.
#[derive(Debug, Clone)]
pub enum MirrorJob {
    Upsert(Box<UserRecord>),
    Delete(String),
    UpdateStats { uid: String, stats: CmsStats },
}

impl MirrorJob {
    fn name(&self) -> &'static str {
        match self {
            MirrorJob::Upsert(_) => "upsert",
            MirrorJob::Delete(_) => "delete",
            MirrorJob::UpdateStats { .. } => "update_stats",
        }
    }

    fn uid(&self) -> &str {
        match self {
            MirrorJob::Upsert(user) => user.uid().unwrap_or(""),
            MirrorJob::Delete(uid) => uid,
            MirrorJob::UpdateStats { uid, .. } => uid,
        }
    }
}

enum Command {
    Job(MirrorJob),
    Drain(oneshot::Sender<()>),
}

/// Fire-and-forget mirror queue.
///
/// Jobs run one at a time in submission order on a background task.
pub struct MirrorSync {
    tx: mpsc::UnboundedSender<Command>,
    worker: JoinHandle<()>,
}

impl MirrorSync {
    /// Start the worker. Must be called inside a Tokio runtime.
    pub fn spawn(client: CmsClient, timings: &Timings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(
            client,
            rx,
            timings.mirror_max_attempts.max(1),
            timings.mirror_retry_delay,
        ));
        Self { tx, worker }
    }

    /// Queue a job. Never blocks.
    pub fn enqueue(&self, job: MirrorJob) {
        if self.tx.send(Command::Job(job)).is_err() {
            tracing::warn!("Mirror queue closed, job dropped");
        }
    }

    /// Wait until every job queued so far has finished or been dropped.
    pub async fn drain(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Drain(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

impl Drop for MirrorSync {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker(
    client: CmsClient,
    mut rx: mpsc::UnboundedReceiver<Command>,
    max_attempts: u32,
    retry_delay: Duration,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Job(job) => run_job(&client, &job, max_attempts, retry_delay).await,
            Command::Drain(done) => {
                let _ = done.send(());
            }
        }
    }
}

async fn run_job(client: &CmsClient, job: &MirrorJob, max_attempts: u32, retry_delay: Duration) {
    for attempt in 1..=max_attempts {
        let result = match job {
            MirrorJob::Upsert(user) => client.upsert_user(user).await.map(|_| ()),
            MirrorJob::Delete(uid) => client.delete_user(uid).await.map(|_| ()),
            MirrorJob::UpdateStats { uid, stats } => client.update_stats(uid, stats).await.map(|_| ()),
        };

        match result {
            Ok(()) => return,
            Err(e) if attempt < max_attempts => {
                tracing::warn!(
                    job = job.name(),
                    uid = job.uid(),
                    attempt,
                    error = %e,
                    "CMS mirror attempt failed, retrying"
                );
                tokio::time::sleep(retry_delay).await;
            }
            Err(e) => {
                tracing::error!(
                    job = job.name(),
                    uid = job.uid(),
                    attempts = max_attempts,
                    error = %e,
                    "CMS mirror job dropped"
                );
            }
        }
    }
}
