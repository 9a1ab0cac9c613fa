// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the composed client: aggregator, notification store
//! and permission bridge wired together over mock adapters.

use std::sync::Arc;
use std::time::Duration;

use immo_config::{ImmoConfig, NotificationsConfig};
use immo_core::types::{
    BrowserNotificationOptions, ConversationKey, NewNotification, PermissionState, UnreadCount,
    UserId,
};
use immo_counter::CountAggregator;
use immo_notify::NotificationStore;
use immo_test_utils::{MockBackend, MockHost, Recorder};

struct Harness {
    backend: MockBackend,
    host: MockHost,
    aggregator: Arc<CountAggregator>,
    store: Arc<NotificationStore>,
}

impl Harness {
    fn new(host: MockHost) -> Self {
        let config = ImmoConfig::default();
        let backend = MockBackend::new();
        let store = Arc::new(NotificationStore::new(
            &config.notifications,
            Arc::new(host.clone()),
        ));
        let aggregator = Arc::new(
            CountAggregator::new(&config.counter, Arc::new(backend.clone()))
                .with_router(store.clone()),
        );
        Self {
            backend,
            host,
            aggregator,
            store,
        }
    }

    async fn sign_in(&self, user: &str) {
        self.store.begin_session(&UserId::from(user)).await;
        self.aggregator.start_for_user(user).await;
    }

    fn message_notifications(&self) -> usize {
        self.store
            .records()
            .iter()
            .filter(|r| r.title.starts_with("New message from"))
            .count()
    }
}

fn count_of(snapshot: &[UnreadCount], context: &str, sender: &str) -> usize {
    let key = ConversationKey::new(context, sender);
    snapshot
        .iter()
        .find(|c| c.conversation_key == key)
        .map_or(0, |c| c.count)
}

async fn next_tick() {
    tokio::time::sleep(Duration::from_millis(5_100)).await;
}

// ---- Scenario A: burst of two messages between polls ----

#[tokio::test(start_paused = true)]
async fn burst_of_two_messages_yields_count_two_and_one_notification() {
    let h = Harness::new(MockHost::new());
    h.backend.set_display_name("u7", "Alice").await;
    h.backend.set_context_title("42", "Loft near the harbour").await;
    h.sign_in("me").await;

    h.backend.insert_unread("42", "u7", "me", "Is it available?").await;
    h.backend.insert_unread("42", "u7", "me", "Can I visit?").await;
    next_tick().await;

    assert_eq!(h.aggregator.count_for_conversation("42", "u7").await, 2);
    assert_eq!(h.message_notifications(), 1);

    let newest = &h.store.records()[0];
    assert_eq!(newest.title, "New message from Alice");
    assert_eq!(newest.body, "Loft near the harbour: Can I visit?");
    assert_eq!(newest.link.as_deref(), Some("/chat/42/u7"));

    let conversation_banners = h
        .host
        .shown()
        .into_iter()
        .filter(|n| n.options.tag.as_deref() == Some("42-u7"))
        .count();
    assert_eq!(conversation_banners, 1);
}

// ---- Scenario B: mark a conversation read ----

#[tokio::test(start_paused = true)]
async fn mark_read_zeroes_immediately_and_poll_confirms() {
    let h = Harness::new(MockHost::new());
    h.backend.insert_unread("42", "u7", "me", "a").await;
    h.backend.insert_unread("42", "u7", "me", "b").await;
    h.sign_in("me").await;

    let counts: Recorder<Vec<UnreadCount>> = Recorder::new();
    let _sub = h.aggregator.subscribe("conversation", counts.callback());
    assert_eq!(count_of(&counts.last().unwrap(), "42", "u7"), 2);

    h.aggregator.mark_conversation_read("42", "u7").await.unwrap();

    let values = counts.values();
    assert_eq!(count_of(&values[1], "42", "u7"), 0);
    assert_eq!(h.backend.mark_read_calls().await.len(), 1);

    next_tick().await;
    assert_eq!(count_of(&counts.last().unwrap(), "42", "u7"), 0);
    assert_eq!(h.aggregator.total_unread(), 0);
    assert_eq!(h.aggregator.count_for_conversation("42", "u7").await, 0);
}

// ---- Scenario C: host without native notifications ----

#[tokio::test(start_paused = true)]
async fn unsupported_host_keeps_in_app_notifications_working() {
    let h = Harness::new(MockHost::unsupported());
    h.sign_in("me").await;

    assert!(!h.store.request_permission().await);
    assert_eq!(h.store.permission_status(), PermissionState::Denied);
    assert!(
        h.store
            .show_browser_notification("hi", &BrowserNotificationOptions::default())
            .await
            .is_none()
    );
    assert_eq!(h.host.request_count(), 0);

    h.backend.insert_unread("42", "u7", "me", "hello").await;
    next_tick().await;
    assert_eq!(h.message_notifications(), 1);
    assert!(h.host.shown().is_empty());
}

// ---- Scenario D: eviction at capacity ----

#[tokio::test]
async fn fifty_first_notification_evicts_the_first() {
    let config = NotificationsConfig::default();
    assert_eq!(config.capacity, 50);
    let store = NotificationStore::new(&config, Arc::new(MockHost::new()));

    let first = store.add(NewNotification::new("n1", "first"));
    for i in 2..=51 {
        store.add(NewNotification::new(format!("n{i}"), "body"));
    }

    let records = store.records();
    assert_eq!(records.len(), 50);
    assert!(records.iter().all(|r| r.id != first));
    assert_eq!(records[0].title, "n51");
}

// ---- Session lifecycle ----

#[tokio::test(start_paused = true)]
async fn grant_on_sign_in_adds_single_welcome() {
    let h = Harness::new(MockHost::new());
    h.sign_in("me").await;
    h.sign_in("me").await;

    assert_eq!(h.host.prompt_count(), 1);
    assert_eq!(h.store.len(), 1);
    assert_eq!(h.store.records()[0].title, "Notifications enabled");
}

#[tokio::test(start_paused = true)]
async fn denied_permission_still_counts_and_records() {
    let h = Harness::new(MockHost::new().answering(PermissionState::Denied));
    h.sign_in("me").await;
    assert!(h.store.is_empty());

    h.backend.insert_unread("42", "u7", "me", "hello").await;
    next_tick().await;

    assert_eq!(h.aggregator.total_unread(), 1);
    assert_eq!(h.message_notifications(), 1);
    assert!(h.host.shown().is_empty());

    // Denied is terminal: no second prompt.
    assert!(!h.store.request_permission().await);
    assert_eq!(h.host.prompt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn sign_out_stops_polling_and_clears_counts() {
    let h = Harness::new(MockHost::new());
    h.backend.insert_unread("42", "u7", "me", "hello").await;
    h.sign_in("me").await;
    assert_eq!(h.aggregator.total_unread(), 1);

    h.aggregator.stop();
    h.store.end_session();
    let queries = h.backend.query_count();
    next_tick().await;

    assert_eq!(h.backend.query_count(), queries);
    assert!(h.aggregator.counts().is_empty());
    // In-app records survive the session.
    assert_eq!(h.message_notifications(), 1);
}
