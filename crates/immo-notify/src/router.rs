// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns newly arrived messages into in-app and native notifications.

use async_trait::async_trait;
use immo_core::traits::NewMessageRouter;
use immo_core::types::{BrowserNotificationOptions, ContextId, NewMessageEvent, NewNotification, UserId};
use tracing::debug;

use crate::store::NotificationStore;

/// Longest message preview shown in a notification body, in characters.
const PREVIEW_CHARS: usize = 120;

/// In-app route of the chat screen for one conversation.
pub fn chat_link(context: &ContextId, counterparty: &UserId) -> String {
    format!("/chat/{context}/{counterparty}")
}

/// Notification announcing `event`.
pub fn new_message_notification(event: &NewMessageEvent) -> NewNotification {
    let message = &event.message;
    NewNotification::new(
        format!("New message from {}", event.sender_name),
        format!("{}: {}", event.context_title, preview(&message.content)),
    )
    .with_link(chat_link(&message.context_id, &message.sender_id))
}

fn preview(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

#[async_trait]
impl NewMessageRouter for NotificationStore {
    async fn route(&self, event: NewMessageEvent) {
        let notification = new_message_notification(&event);
        let options = BrowserNotificationOptions {
            body: Some(notification.body.clone()),
            icon: notification.icon.clone(),
            // One native notification per conversation; later ones replace it.
            tag: Some(event.message.conversation_key().to_string()),
        };
        let title = notification.title.clone();

        let id = self.add(notification);
        debug!(notification = %id, message = %event.message.id, "routed new message");
        self.show_browser_notification(&title, &options).await;
    }
}
