// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Native notification host trait.

use async_trait::async_trait;

use crate::error::ImmoError;
use crate::types::{BrowserNotificationOptions, HostNotificationId, PermissionState};

/// Bridge to the host environment's native notification capability.
///
/// Implementations report the host's current permission on every call; callers
/// must not cache it, since the user can change it from the host's own settings.
#[async_trait]
pub trait NotificationHost: Send + Sync + 'static {
    /// Whether the host can display native notifications at all.
    fn is_supported(&self) -> bool;

    /// The host's current permission state.
    fn permission(&self) -> PermissionState;

    /// Shows the host's consent prompt and returns the resulting state.
    async fn request_permission(&self) -> Result<PermissionState, ImmoError>;

    /// Displays a native notification.
    async fn show(
        &self,
        title: &str,
        options: &BrowserNotificationOptions,
    ) -> Result<HostNotificationId, ImmoError>;

    /// Dismisses a previously shown notification. Unknown ids are ignored.
    async fn close(&self, id: &HostNotificationId) -> Result<(), ImmoError>;

    /// Whether the host dismisses notifications on its own.
    fn auto_dismisses(&self) -> bool {
        false
    }
}

/// Host used where no native notification capability exists.
///
/// Reports `Denied` and refuses every operation, so callers degrade to no-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedHost;

#[async_trait]
impl NotificationHost for UnsupportedHost {
    fn is_supported(&self) -> bool {
        false
    }

    fn permission(&self) -> PermissionState {
        PermissionState::Denied
    }

    async fn request_permission(&self) -> Result<PermissionState, ImmoError> {
        Ok(PermissionState::Denied)
    }

    async fn show(
        &self,
        _title: &str,
        _options: &BrowserNotificationOptions,
    ) -> Result<HostNotificationId, ImmoError> {
        Err(ImmoError::Host {
            message: "native notifications are not supported".into(),
        })
    }

    async fn close(&self, _id: &HostNotificationId) -> Result<(), ImmoError> {
        Ok(())
    }
}
