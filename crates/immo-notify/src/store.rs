// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observable list of in-app notification records.
//!
//! Records are kept newest first and capped; adding past the cap evicts the
//! oldest. Every mutation notifies subscribers synchronously with the full
//! list, after the store lock has been released.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use immo_config::NotificationsConfig;
use immo_core::traits::NotificationHost;
use immo_core::types::{
    BrowserNotificationOptions, HostNotificationId, NewNotification, NotificationId,
    NotificationRecord, PermissionState, UserId,
};
use immo_core::{SubscriberRegistry, Subscription};
use tracing::{debug, info};

use crate::permission::PermissionBridge;

#[derive(Debug)]
struct Session {
    user: UserId,
    welcomed: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    records: VecDeque<NotificationRecord>,
    version: u64,
    session: Option<Session>,
}

impl StoreState {
    fn snapshot(&self) -> Vec<NotificationRecord> {
        self.records.iter().cloned().collect()
    }
}

/// In-app notification list plus the native notification permission bridge.
pub struct NotificationStore {
    capacity: usize,
    auto_prompt: bool,
    welcome: NewNotification,
    bridge: PermissionBridge,
    state: Mutex<StoreState>,
    subscribers: SubscriberRegistry<Vec<NotificationRecord>>,
}

impl NotificationStore {
    pub fn new(config: &NotificationsConfig, host: Arc<dyn NotificationHost>) -> Self {
        Self {
            capacity: config.capacity.max(1),
            auto_prompt: config.auto_prompt,
            welcome: NewNotification::new(&config.welcome_title, &config.welcome_body),
            bridge: PermissionBridge::new(host, config.auto_dismiss()),
            state: Mutex::new(StoreState::default()),
            subscribers: SubscriberRegistry::new(),
        }
    }

    /// Store with default settings, mostly for tests and tools.
    pub fn with_host(host: Arc<dyn NotificationHost>) -> Self {
        Self::new(&NotificationsConfig::default(), host)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Prepends a new unread record and returns its id.
    pub fn add(&self, notification: NewNotification) -> NotificationId {
        let record = NotificationRecord {
            id: NotificationId(uuid::Uuid::new_v4().to_string()),
            title: notification.title,
            body: notification.body,
            icon: notification.icon,
            created_at: Utc::now(),
            read: false,
            link: notification.link,
        };
        let id = record.id.clone();
        let capacity = self.capacity;

        self.mutate(|records| {
            records.push_front(record);
            while records.len() > capacity {
                if let Some(evicted) = records.pop_back() {
                    debug!(notification = %evicted.id, "evicted oldest notification");
                }
            }
        });
        id
    }

    /// Marks one record read. Unknown ids change nothing but still notify.
    pub fn mark_read(&self, id: &NotificationId) {
        self.mutate(|records| {
            if let Some(record) = records.iter_mut().find(|r| &r.id == id) {
                record.read = true;
            }
        });
    }

    /// Marks every record read. Subscribers are notified even when nothing changed.
    pub fn mark_all_read(&self) {
        self.mutate(|records| records.iter_mut().for_each(|r| r.read = true));
    }

    pub fn remove(&self, id: &NotificationId) {
        self.mutate(|records| records.retain(|r| &r.id != id));
    }

    /// Current records, newest first.
    pub fn records(&self) -> Vec<NotificationRecord> {
        self.lock().snapshot()
    }

    pub fn unread_count(&self) -> usize {
        self.lock().records.iter().filter(|r| !r.read).count()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers `callback` for the full list and delivers the current list at once.
    ///
    /// Subscribing again with the same label replaces the earlier callback.
    pub fn subscribe<F>(&self, label: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&Vec<NotificationRecord>) + Send + Sync + 'static,
    {
        let (subscription, version, snapshot) = {
            let state = self.lock();
            let subscription = self.subscribers.subscribe(label, callback);
            (subscription, state.version, state.snapshot())
        };
        self.subscribers.replay(&subscription, version, &snapshot);
        subscription
    }

    pub fn is_supported(&self) -> bool {
        self.bridge.is_supported()
    }

    pub fn permission_status(&self) -> PermissionState {
        self.bridge.status()
    }

    /// Asks the host for permission if the user has not decided yet.
    ///
    /// Returns whether permission is granted. The first grant within a user
    /// session adds the welcome notification.
    pub async fn request_permission(&self) -> bool {
        let granted = self.bridge.request().await;
        if granted {
            self.welcome_once().await;
        }
        granted
    }

    /// Shows a native notification if permission is granted; a no-op otherwise.
    pub async fn show_browser_notification(
        &self,
        title: &str,
        options: &BrowserNotificationOptions,
    ) -> Option<HostNotificationId> {
        self.bridge.show(title, options).await
    }

    /// Starts a signed-in session for `user`.
    ///
    /// Switching users re-arms the welcome notification. When auto-prompting is
    /// enabled and the user has not decided yet, permission is requested.
    pub async fn begin_session(&self, user: &UserId) -> PermissionState {
        {
            let mut state = self.lock();
            let same_user = state.session.as_ref().is_some_and(|s| &s.user == user);
            if !same_user {
                info!(user = %user, "notification session started");
                state.session = Some(Session {
                    user: user.clone(),
                    welcomed: false,
                });
            }
        }

        if self.auto_prompt && self.permission_status() == PermissionState::Default {
            self.request_permission().await;
        }
        self.permission_status()
    }

    pub fn end_session(&self) {
        if let Some(session) = self.lock().session.take() {
            info!(user = %session.user, "notification session ended");
        }
    }

    async fn welcome_once(&self) {
        let first_grant = match self.lock().session.as_mut() {
            Some(session) if !session.welcomed => {
                session.welcomed = true;
                true
            }
            _ => false,
        };
        if !first_grant {
            return;
        }

        self.add(self.welcome.clone());
        let options = BrowserNotificationOptions {
            body: Some(self.welcome.body.clone()),
            ..Default::default()
        };
        self.bridge.show(&self.welcome.title, &options).await;
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut VecDeque<NotificationRecord>) -> R) -> R {
        let (result, version, snapshot) = {
            let mut state = self.lock();
            let result = apply(&mut state.records);
            state.version += 1;
            (result, state.version, state.snapshot())
        };
        self.subscribers.publish(version, &snapshot);
        result
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
