// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for notification sessions and the permission flow.

use std::sync::Arc;

use immo_config::NotificationsConfig;
use immo_core::types::{BrowserNotificationOptions, PermissionState, UserId};
use immo_notify::NotificationStore;
use immo_test_utils::MockHost;

fn store(host: &MockHost, config: NotificationsConfig) -> NotificationStore {
    NotificationStore::new(&config, Arc::new(host.clone()))
}

fn user(id: &str) -> UserId {
    UserId::from(id)
}

#[tokio::test]
async fn first_session_prompts_and_welcomes_once() {
    let host = MockHost::new();
    let store = store(&host, NotificationsConfig::default());

    let status = store.begin_session(&user("me")).await;
    assert_eq!(status, PermissionState::Granted);
    assert_eq!(host.prompt_count(), 1);

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Notifications enabled");
    assert_eq!(host.shown().len(), 1);

    // Same user again: no new prompt, no second welcome.
    store.begin_session(&user("me")).await;
    assert!(store.request_permission().await);
    assert_eq!(host.prompt_count(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn switching_user_rearms_welcome_on_next_grant() {
    let host = MockHost::new();
    let store = store(&host, NotificationsConfig::default());
    store.begin_session(&user("alice")).await;

    store.begin_session(&user("bob")).await;
    // Already granted: no auto prompt, welcome waits for an explicit request.
    assert_eq!(store.len(), 1);
    assert!(store.request_permission().await);
    assert_eq!(store.len(), 2);
    assert_eq!(host.prompt_count(), 1);
}

#[tokio::test]
async fn auto_prompt_can_be_disabled() {
    let host = MockHost::new();
    let config = NotificationsConfig {
        auto_prompt: false,
        ..Default::default()
    };
    let store = store(&host, config);

    let status = store.begin_session(&user("me")).await;
    assert_eq!(status, PermissionState::Default);
    assert_eq!(host.request_count(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn denied_permission_is_not_re_prompted() {
    let host = MockHost::new().answering(PermissionState::Denied);
    let store = store(&host, NotificationsConfig::default());

    assert_eq!(
        store.begin_session(&user("me")).await,
        PermissionState::Denied
    );
    assert!(!store.request_permission().await);
    assert!(!store.request_permission().await);

    assert_eq!(host.prompt_count(), 1);
    assert_eq!(store.permission_status(), PermissionState::Denied);
    assert!(store.is_empty(), "no welcome without a grant");
}

#[tokio::test]
async fn unsupported_environment_degrades_to_no_ops() {
    let host = MockHost::unsupported();
    let store = store(&host, NotificationsConfig::default());

    assert!(!store.is_supported());
    assert_eq!(store.permission_status(), PermissionState::Denied);
    assert!(!store.request_permission().await);
    assert_eq!(
        store.begin_session(&user("me")).await,
        PermissionState::Denied
    );
    assert!(
        store
            .show_browser_notification("hello", &BrowserNotificationOptions::default())
            .await
            .is_none()
    );

    assert_eq!(host.request_count(), 0);
    assert!(host.shown().is_empty());
}

#[tokio::test]
async fn ended_session_gets_no_welcome() {
    let host = MockHost::new();
    let config = NotificationsConfig {
        auto_prompt: false,
        ..Default::default()
    };
    let store = store(&host, config);
    store.begin_session(&user("me")).await;
    store.end_session();

    assert!(store.request_permission().await);
    assert!(store.is_empty());
}
