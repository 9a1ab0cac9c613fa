// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message store for deterministic testing.
//!
//! `MockBackend` implements `MessageBackend` over a vector of messages. Tests
//! insert messages, toggle failures, and inspect the calls that were made.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Mutex;

use immo_core::ImmoError;
use immo_core::traits::{MessageBackend, PluginAdapter};
use immo_core::types::{ContextId, HealthStatus, MessageId, UnreadMessage, UserId};

/// A recorded bulk mark-read call: `(context, sender, receiver)`.
pub type MarkReadCall = (ContextId, UserId, UserId);

#[derive(Default)]
struct Store {
    messages: Vec<UnreadMessage>,
    names: HashMap<UserId, String>,
    titles: HashMap<ContextId, String>,
    mark_read_calls: Vec<MarkReadCall>,
    query_delay: Option<Duration>,
}

/// A mock message store for testing.
///
/// Message ids are `m1`, `m2`, ... in insertion order, and creation times
/// increase by one second per insert so ordering is deterministic.
#[derive(Clone, Default)]
pub struct MockBackend {
    store: Arc<Mutex<Store>>,
    next_id: Arc<AtomicUsize>,
    queries: Arc<AtomicUsize>,
    fail_queries: Arc<AtomicBool>,
    fail_mark_read: Arc<AtomicBool>,
    fail_lookups: Arc<AtomicBool>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an unread message from `sender` to `receiver` and return its id.
    pub async fn insert_unread(
        &self,
        context: &str,
        sender: &str,
        receiver: &str,
        content: &str,
    ) -> MessageId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = MessageId(format!("m{n}"));
        let message = UnreadMessage {
            id: id.clone(),
            sender_id: sender.into(),
            receiver_id: receiver.into(),
            context_id: context.into(),
            content: content.to_string(),
            read: false,
            created_at: timestamp(n),
            deleted_at: None,
        };
        self.store.lock().await.messages.push(message);
        id
    }

    /// Soft-delete a message; deleted messages are never counted.
    pub async fn delete_message(&self, id: &MessageId) {
        let mut store = self.store.lock().await;
        if let Some(m) = store.messages.iter_mut().find(|m| &m.id == id) {
            m.deleted_at = Some(Utc::now());
        }
    }

    pub async fn set_display_name(&self, user: &str, name: &str) {
        self.store
            .lock()
            .await
            .names
            .insert(user.into(), name.to_string());
    }

    pub async fn set_context_title(&self, context: &str, title: &str) {
        self.store
            .lock()
            .await
            .titles
            .insert(context.into(), title.to_string());
    }

    /// Make every subsequent unread query take `delay` before answering.
    pub async fn set_query_delay(&self, delay: Duration) {
        self.store.lock().await.query_delay = Some(delay);
    }

    pub async fn clear_query_delay(&self) {
        self.store.lock().await.query_delay = None;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// When set, mark-read calls are recorded but return an error and change nothing.
    pub fn fail_mark_read(&self, fail: bool) {
        self.fail_mark_read.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Number of unread queries issued so far, including failed ones.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub async fn mark_read_calls(&self) -> Vec<MarkReadCall> {
        self.store.lock().await.mark_read_calls.clone()
    }

    fn lookup_failure(&self) -> Option<ImmoError> {
        self.fail_lookups
            .load(Ordering::SeqCst)
            .then(|| ImmoError::backend("mock lookup failure"))
    }
}

fn timestamp(n: usize) -> DateTime<Utc> {
    let base = Utc
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    base + chrono::Duration::seconds(n as i64)
}

fn is_unread_for(m: &UnreadMessage, receiver: &UserId) -> bool {
    &m.receiver_id == receiver && !m.read && m.deleted_at.is_none()
}

#[async_trait]
impl PluginAdapter for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    async fn health_check(&self) -> Result<HealthStatus, ImmoError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            Ok(HealthStatus::Unhealthy("queries failing".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }
}

#[async_trait]
impl MessageBackend for MockBackend {
    async fn query_unread_messages(
        &self,
        receiver: &UserId,
    ) -> Result<Vec<UnreadMessage>, ImmoError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        // The answer reflects the store when the query arrived, even if delayed.
        let (mut unread, delay) = {
            let store = self.store.lock().await;
            let unread: Vec<UnreadMessage> = store
                .messages
                .iter()
                .filter(|m| is_unread_for(m, receiver))
                .cloned()
                .collect();
            (unread, store.query_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(ImmoError::Backend {
                message: "mock query failure".into(),
                status: Some(503),
                source: None,
            });
        }

        unread.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(unread)
    }

    async fn mark_messages_read(
        &self,
        context: &ContextId,
        sender: &UserId,
        receiver: &UserId,
    ) -> Result<(), ImmoError> {
        let mut store = self.store.lock().await;
        store
            .mark_read_calls
            .push((context.clone(), sender.clone(), receiver.clone()));
        if self.fail_mark_read.load(Ordering::SeqCst) {
            return Err(ImmoError::Backend {
                message: "mock mark-read failure".into(),
                status: Some(500),
                source: None,
            });
        }
        for m in store.messages.iter_mut() {
            if &m.context_id == context && &m.sender_id == sender && &m.receiver_id == receiver {
                m.read = true;
            }
        }
        Ok(())
    }

    async fn lookup_display_name(&self, user: &UserId) -> Result<String, ImmoError> {
        if let Some(err) = self.lookup_failure() {
            return Err(err);
        }
        self.store
            .lock()
            .await
            .names
            .get(user)
            .cloned()
            .ok_or_else(|| ImmoError::NotFound {
                entity: "profile".into(),
                id: user.to_string(),
            })
    }

    async fn lookup_context_title(&self, context: &ContextId) -> Result<String, ImmoError> {
        if let Some(err) = self.lookup_failure() {
            return Err(err);
        }
        self.store
            .lock()
            .await
            .titles
            .get(context)
            .cloned()
            .ok_or_else(|| ImmoError::NotFound {
                entity: "property".into(),
                id: context.to_string(),
            })
    }

    async fn count_unread(
        &self,
        context: &ContextId,
        sender: &UserId,
        receiver: &UserId,
    ) -> Result<usize, ImmoError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(ImmoError::backend("mock count failure"));
        }
        let store = self.store.lock().await;
        Ok(store
            .messages
            .iter()
            .filter(|m| {
                is_unread_for(m, receiver) && &m.context_id == context && &m.sender_id == sender
            })
            .count())
    }

    async fn recent_messages(
        &self,
        context: &ContextId,
        user_a: &UserId,
        user_b: &UserId,
        limit: usize,
    ) -> Result<Vec<UnreadMessage>, ImmoError> {
        let store = self.store.lock().await;
        let mut thread: Vec<UnreadMessage> = store
            .messages
            .iter()
            .filter(|m| {
                &m.context_id == context
                    && ((&m.sender_id == user_a && &m.receiver_id == user_b)
                        || (&m.sender_id == user_b && &m.receiver_id == user_a))
            })
            .cloned()
            .collect();
        thread.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        thread.truncate(limit);
        Ok(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn query_returns_only_unread_for_receiver_newest_first() {
        let backend = MockBackend::new();
        let first = backend.insert_unread("42", "u7", "me", "hello").await;
        let second = backend.insert_unread("42", "u7", "me", "still there?").await;
        backend.insert_unread("42", "me", "u7", "reply").await;
        let deleted = backend.insert_unread("9", "u8", "me", "spam").await;
        backend.delete_message(&deleted).await;

        let unread = backend.query_unread_messages(&"me".into()).await.unwrap();
        let ids: Vec<_> = unread.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(backend.query_count(), 1);
    }

    #[tokio::test]
    async fn mark_read_flips_only_the_conversation() {
        let backend = MockBackend::new();
        backend.insert_unread("42", "u7", "me", "a").await;
        backend.insert_unread("43", "u7", "me", "b").await;

        backend
            .mark_messages_read(&"42".into(), &"u7".into(), &"me".into())
            .await
            .unwrap();

        let unread = backend.query_unread_messages(&"me".into()).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].context_id.as_str(), "43");
        assert_eq!(backend.mark_read_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn failing_mark_read_is_recorded_but_changes_nothing() {
        let backend = MockBackend::new();
        backend.insert_unread("42", "u7", "me", "a").await;
        backend.fail_mark_read(true);

        let result = backend
            .mark_messages_read(&"42".into(), &"u7".into(), &"me".into())
            .await;
        assert!(result.is_err());
        assert_eq!(backend.mark_read_calls().await.len(), 1);
        assert_eq!(
            backend
                .count_unread(&"42".into(), &"u7".into(), &"me".into())
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn lookups_report_not_found_for_unknown_ids() {
        let backend = MockBackend::new();
        backend.set_display_name("u7", "Alice").await;
        assert_eq!(
            backend.lookup_display_name(&"u7".into()).await.unwrap(),
            "Alice"
        );
        assert!(matches!(
            backend.lookup_context_title(&"42".into()).await,
            Err(ImmoError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn recent_messages_include_both_directions() {
        let backend = MockBackend::new();
        backend.insert_unread("42", "u7", "me", "q").await;
        backend.insert_unread("42", "me", "u7", "a").await;
        backend.insert_unread("42", "u8", "me", "other").await;

        let thread = backend
            .recent_messages(&"42".into(), &"me".into(), &"u7".into(), 5)
            .await
            .unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].content, "a");
    }
}
