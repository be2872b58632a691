// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coalescing write queue for profile changes.
//!
//! Changes are keyed by uid. Each change merges into the pending field set
//! for that uid and pushes its flush deadline out by the debounce delay, so a
//! burst of edits becomes one Firestore write carrying the union of fields.
//! The worker task owns the pending map; callers only send messages.

use crate::models::FieldMap;
use crate::services::user_service::UserService;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

enum Command {
    Change { uid: String, fields: FieldMap },
    Discard(String),
    Flush(oneshot::Sender<()>),
}

struct Pending {
    fields: FieldMap,
    due: Instant,
}

pub struct Autosave {
    tx: mpsc::UnboundedSender<Command>,
    worker: JoinHandle<()>,
}

impl Autosave {
    /// Start the worker. Must be called inside a Tokio runtime.
    pub fn spawn(users: Arc<UserService>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(users, rx, debounce));
        Self { tx, worker }
    }

    /// Queue changed fields for `uid`.
    pub fn enqueue(&self, uid: &str, fields: FieldMap) {
        if fields.is_empty() {
            return;
        }
        let command = Command::Change {
            uid: uid.to_string(),
            fields,
        };
        if self.tx.send(command).is_err() {
            tracing::warn!(uid, "Autosave queue closed, change dropped");
        }
    }

    /// Forget unwritten changes for `uid` (after logout).
    pub fn discard(&self, uid: &str) {
        let _ = self.tx.send(Command::Discard(uid.to_string()));
    }

    /// Write everything pending now and wait for it.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

impl Drop for Autosave {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker(
    users: Arc<UserService>,
    mut rx: mpsc::UnboundedReceiver<Command>,
    debounce: Duration,
) {
    let mut pending: HashMap<String, Pending> = HashMap::new();

    loop {
        let next_due = pending.values().map(|p| p.due).min();

        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Change { uid, fields }) => {
                    let entry = pending.entry(uid).or_insert_with(|| Pending {
                        fields: FieldMap::new(),
                        due: Instant::now(),
                    });
                    entry.fields.extend(fields);
                    entry.due = Instant::now() + debounce;
                }
                Some(Command::Discard(uid)) => {
                    if pending.remove(&uid).is_some() {
                        tracing::debug!(uid = %uid, "Discarded pending autosave");
                    }
                }
                Some(Command::Flush(done)) => {
                    for (uid, entry) in pending.drain() {
                        write(&users, &uid, entry.fields).await;
                    }
                    let _ = done.send(());
                }
                None => {
                    for (uid, entry) in pending.drain() {
                        write(&users, &uid, entry.fields).await;
                    }
                    break;
                }
            },
            _ = tokio::time::sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                let now = Instant::now();
                let due: Vec<String> = pending
                    .iter()
                    .filter(|(_, p)| p.due <= now)
                    .map(|(uid, _)| uid.clone())
                    .collect();
                for uid in due {
                    if let Some(entry) = pending.remove(&uid) {
                        write(&users, &uid, entry.fields).await;
                    }
                }
            }
        }
    }
}

async fn write(users: &UserService, uid: &str, fields: FieldMap) {
    let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
    tracing::debug!(uid, fields = ?keys, "Autosaving profile");
    if let Err(e) = users.update_user(uid, &fields).await {
        tracing::error!(uid, error = %e, "Autosave failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timings;
    use crate::db::MemoryUserStore;
    use crate::models::UserDocument;
    use serde_json::json;

    fn setup() -> (Arc<MemoryUserStore>, Autosave) {
        let store = Arc::new(MemoryUserStore::new());
        store.insert("u1", UserDocument::default());
        let users = Arc::new(UserService::new(store.clone(), Timings::default(), "test"));
        (store, Autosave::spawn(users, Duration::from_secs(2)))
    }

    fn field(key: &str, value: serde_json::Value) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(key.to_string(), value);
        map
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_becomes_one_write_with_union() {
        let (store, autosave) = setup();

        autosave.enqueue("u1", field("coins", json!(1300)));
        tokio::time::sleep(Duration::from_millis(500)).await;
        autosave.enqueue("u1", field("xp", json!(50)));
        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert!(store.updates().is_empty(), "debounce restarted on second change");

        tokio::time::sleep(Duration::from_secs(1)).await;
        let updates = store.updates();
        assert_eq!(updates.len(), 1);
        let (uid, fields) = &updates[0];
        assert_eq!(uid, "u1");
        assert_eq!(fields.get("coins"), Some(&json!(1300)));
        assert_eq!(fields.get("xp"), Some(&json!(50)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_value_wins_within_window() {
        let (store, autosave) = setup();

        autosave.enqueue("u1", field("coins", json!(1)));
        autosave.enqueue("u1", field("coins", json!(2)));
        tokio::time::sleep(Duration::from_secs(3)).await;

        let updates = store.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1.get("coins"), Some(&json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let (store, autosave) = setup();

        autosave.enqueue("u1", field("streak", json!(4)));
        autosave.flush().await;
        assert_eq!(store.updates().len(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.updates().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_drops_pending() {
        let (store, autosave) = setup();

        autosave.enqueue("u1", field("coins", json!(9)));
        autosave.discard("u1");
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(store.updates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_uids_are_independent() {
        let (store, autosave) = setup();
        store.insert("u2", UserDocument::default());

        autosave.enqueue("u1", field("coins", json!(1)));
        autosave.enqueue("u2", field("coins", json!(2)));
        tokio::time::sleep(Duration::from_secs(3)).await;

        let mut uids: Vec<String> = store.updates().into_iter().map(|(uid, _)| uid).collect();
        uids.sort();
        assert_eq!(uids, vec!["u1", "u2"]);
    }
}
