// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable native notification host.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use immo_core::ImmoError;
use immo_core::traits::NotificationHost;
use immo_core::types::{BrowserNotificationOptions, HostNotificationId, PermissionState};

/// A notification shown through [`MockHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShownNotification {
    pub id: HostNotificationId,
    pub title: String,
    pub options: BrowserNotificationOptions,
}

#[derive(Debug)]
struct HostState {
    permission: PermissionState,
    prompt_answer: PermissionState,
    shown: Vec<ShownNotification>,
    closed: Vec<HostNotificationId>,
}

/// A mock host that behaves like a browser's notification API.
///
/// Prompting only happens while the permission is `Default`; afterwards the
/// host answers with the stored state, as browsers do.
#[derive(Debug, Clone)]
pub struct MockHost {
    supported: bool,
    auto_dismisses: bool,
    state: Arc<Mutex<HostState>>,
    prompts: Arc<AtomicUsize>,
    requests: Arc<AtomicUsize>,
}

impl MockHost {
    /// A supported host whose user has not been asked yet and will grant.
    pub fn new() -> Self {
        Self {
            supported: true,
            auto_dismisses: false,
            state: Arc::new(Mutex::new(HostState {
                permission: PermissionState::Default,
                prompt_answer: PermissionState::Granted,
                shown: Vec::new(),
                closed: Vec::new(),
            })),
            prompts: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A host without native notification support.
    pub fn unsupported() -> Self {
        let host = Self::new();
        host.set_permission(PermissionState::Denied);
        Self {
            supported: false,
            ..host
        }
    }

    /// Start from an already-decided permission.
    pub fn with_permission(self, permission: PermissionState) -> Self {
        self.set_permission(permission);
        self
    }

    /// What the user answers when prompted.
    pub fn answering(self, answer: PermissionState) -> Self {
        self.state().prompt_answer = answer;
        self
    }

    pub fn with_auto_dismiss(mut self, auto_dismisses: bool) -> Self {
        self.auto_dismisses = auto_dismisses;
        self
    }

    /// Simulates the user changing the permission in the host's own settings.
    pub fn set_permission(&self, permission: PermissionState) {
        self.state().permission = permission;
    }

    /// Number of consent prompts actually displayed.
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    /// Number of `request_permission` calls, prompted or not.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn shown(&self) -> Vec<ShownNotification> {
        self.state().shown.clone()
    }

    pub fn closed(&self) -> Vec<HostNotificationId> {
        self.state().closed.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationHost for MockHost {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn permission(&self) -> PermissionState {
        self.state().permission
    }

    async fn request_permission(&self) -> Result<PermissionState, ImmoError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        if state.permission == PermissionState::Default {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            state.permission = state.prompt_answer;
        }
        Ok(state.permission)
    }

    async fn show(
        &self,
        title: &str,
        options: &BrowserNotificationOptions,
    ) -> Result<HostNotificationId, ImmoError> {
        if !self.supported {
            return Err(ImmoError::Host {
                message: "mock host has no notification support".into(),
            });
        }
        let mut state = self.state();
        let id = HostNotificationId(format!("host-{}", state.shown.len() + 1));
        state.shown.push(ShownNotification {
            id: id.clone(),
            title: title.to_string(),
            options: options.clone(),
        });
        Ok(id)
    }

    async fn close(&self, id: &HostNotificationId) -> Result<(), ImmoError> {
        self.state().closed.push(id.clone());
        Ok(())
    }

    fn auto_dismisses(&self) -> bool {
        self.auto_dismisses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prompt_happens_once_then_answer_sticks() {
        let host = MockHost::new().answering(PermissionState::Denied);
        assert_eq!(
            host.request_permission().await.unwrap(),
            PermissionState::Denied
        );
        assert_eq!(
            host.request_permission().await.unwrap(),
            PermissionState::Denied
        );
        assert_eq!(host.prompt_count(), 1);
        assert_eq!(host.request_count(), 2);
    }

    #[tokio::test]
    async fn shown_notifications_are_captured() {
        let host = MockHost::new().with_permission(PermissionState::Granted);
        let id = host
            .show("Hello", &BrowserNotificationOptions::default())
            .await
            .unwrap();
        host.close(&id).await.unwrap();
        assert_eq!(host.shown()[0].title, "Hello");
        assert_eq!(host.closed(), vec![id]);
    }

    #[test]
    fn unsupported_host_reports_denied() {
        let host = MockHost::unsupported();
        assert!(!host.is_supported());
        assert_eq!(host.permission(), PermissionState::Denied);
    }
}
