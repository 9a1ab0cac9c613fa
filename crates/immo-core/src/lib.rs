// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Immo messaging client.
//!
//! This crate provides the error type, the shared domain types, the adapter
//! traits that the counter and the notification store are built against, and
//! the observer registry both use to fan out updates.

pub mod error;
pub mod observer;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ImmoError;
pub use observer::{SubscriberRegistry, Subscription};
pub use traits::host::UnsupportedHost;
pub use traits::{MessageBackend, NewMessageRouter, NotificationHost, PluginAdapter};
pub use types::{
    BrowserNotificationOptions, ContextId, ConversationKey, HealthStatus, HostNotificationId,
    MessageId, NewMessageEvent, NewNotification, NotificationId, NotificationRecord,
    PermissionState, UnreadCount, UnreadMessage, UserId,
};
