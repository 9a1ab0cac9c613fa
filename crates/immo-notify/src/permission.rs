// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bridge between the notification store and the host's native notifications.
//!
//! Permission moves out of `Default` only through [`PermissionBridge::request`];
//! `Granted` and `Denied` are never left from here. The state is read from the
//! host on every call.

use std::sync::Arc;
use std::time::Duration;

use immo_core::traits::NotificationHost;
use immo_core::types::{BrowserNotificationOptions, HostNotificationId, PermissionState};
use tracing::{debug, info, warn};

pub struct PermissionBridge {
    host: Arc<dyn NotificationHost>,
    auto_dismiss: Duration,
}

impl PermissionBridge {
    pub fn new(host: Arc<dyn NotificationHost>, auto_dismiss: Duration) -> Self {
        Self { host, auto_dismiss }
    }

    pub fn is_supported(&self) -> bool {
        self.host.is_supported()
    }

    /// Current permission. Unsupported hosts report `Denied`.
    pub fn status(&self) -> PermissionState {
        if !self.host.is_supported() {
            return PermissionState::Denied;
        }
        self.host.permission()
    }

    /// Prompts the user if they have not decided yet. Returns whether
    /// permission is granted afterwards.
    pub async fn request(&self) -> bool {
        if !self.host.is_supported() {
            debug!("native notifications unsupported, not prompting");
            return false;
        }

        match self.host.permission() {
            PermissionState::Default => match self.host.request_permission().await {
                Ok(state) => {
                    info!(permission = %state, "notification permission answered");
                    state == PermissionState::Granted
                }
                Err(e) => {
                    warn!(error = %e, "notification permission request failed");
                    false
                }
            },
            decided => {
                debug!(permission = %decided, "permission already decided, not prompting");
                decided == PermissionState::Granted
            }
        }
    }

    /// Shows a native notification when permission is granted; otherwise does nothing.
    ///
    /// Hosts that keep notifications on screen get them closed after the
    /// configured auto-dismiss delay.
    pub async fn show(
        &self,
        title: &str,
        options: &BrowserNotificationOptions,
    ) -> Option<HostNotificationId> {
        let status = self.status();
        if status != PermissionState::Granted {
            debug!(permission = %status, title, "notification permission not granted, skipping");
            return None;
        }

        match self.host.show(title, options).await {
            Ok(id) => {
                if !self.host.auto_dismisses() {
                    schedule_dismiss(Arc::clone(&self.host), id.clone(), self.auto_dismiss);
                }
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, title, "failed to show native notification");
                None
            }
        }
    }
}

fn schedule_dismiss(host: Arc<dyn NotificationHost>, id: HostNotificationId, after: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        if let Err(e) = host.close(&id).await {
            debug!(error = %e, notification = %id, "failed to dismiss native notification");
        }
    });
}
