// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the counter, the notification store, and adapters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identity of a user (message sender, receiver, or the signed-in user).
    UserId
);
string_id!(
    /// Identifier of a message record in the remote store.
    MessageId
);
string_id!(
    /// The listing a conversation is about.
    ContextId
);
string_id!(
    /// Identifier of an in-app notification record.
    NotificationId
);
string_id!(
    /// Handle of a native notification currently shown by the host.
    HostNotificationId
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// One message thread between the current user and one other user about one listing.
///
/// Not stored anywhere: derived from `(context_id, sender_id)` when the current
/// user is the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationKey {
    pub context_id: ContextId,
    pub counterparty_id: UserId,
}

impl ConversationKey {
    pub fn new(context_id: impl Into<ContextId>, counterparty_id: impl Into<UserId>) -> Self {
        Self {
            context_id: context_id.into(),
            counterparty_id: counterparty_id.into(),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.context_id, self.counterparty_id)
    }
}

/// A message record as returned by the remote store. Read-only from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreadMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    #[serde(rename = "property_id")]
    pub context_id: ContextId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UnreadMessage {
    /// The conversation this message belongs to, seen from its receiver.
    pub fn conversation_key(&self) -> ConversationKey {
        ConversationKey {
            context_id: self.context_id.clone(),
            counterparty_id: self.sender_id.clone(),
        }
    }
}

/// Unread count of one conversation, as published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub conversation_key: ConversationKey,
    pub count: usize,
}

/// A newly arrived unread message, enriched for display.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessageEvent {
    pub message: UnreadMessage,
    pub sender_name: String,
    pub context_title: String,
}

/// An in-app notification record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub link: Option<String>,
}

/// Input for a new in-app notification; id, timestamp and read flag are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub link: Option<String>,
}

impl NewNotification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: None,
            link: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Native notification permission, mirroring the host environment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PermissionState {
    /// The user has not been asked yet.
    #[default]
    Default,
    Granted,
    Denied,
}

/// Options for a native notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowserNotificationOptions {
    pub body: Option<String>,
    pub icon: Option<String>,
    /// Notifications sharing a tag replace each other on hosts that support it.
    pub tag: Option<String>,
}
