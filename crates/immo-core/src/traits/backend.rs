// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store adapter trait for the hosted backend.

use async_trait::async_trait;

use crate::error::ImmoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ContextId, UnreadMessage, UserId};

/// Adapter for the remote message store.
///
/// The store is owned by the backend service; the client only reads unread
/// messages, flips their read flag in bulk, and resolves display strings.
#[async_trait]
pub trait MessageBackend: PluginAdapter {
    /// All unread, non-deleted messages addressed to `receiver`, newest first.
    async fn query_unread_messages(
        &self,
        receiver: &UserId,
    ) -> Result<Vec<UnreadMessage>, ImmoError>;

    /// Marks every unread message from `sender` to `receiver` about `context` as read.
    async fn mark_messages_read(
        &self,
        context: &ContextId,
        sender: &UserId,
        receiver: &UserId,
    ) -> Result<(), ImmoError>;

    /// Display name of a user profile.
    async fn lookup_display_name(&self, user: &UserId) -> Result<String, ImmoError>;

    /// Title of the listing a conversation is about.
    async fn lookup_context_title(&self, context: &ContextId) -> Result<String, ImmoError>;

    /// Exact number of unread messages in one conversation.
    async fn count_unread(
        &self,
        context: &ContextId,
        sender: &UserId,
        receiver: &UserId,
    ) -> Result<usize, ImmoError>;

    /// The latest `limit` messages exchanged between two users about `context`,
    /// in either direction, newest first.
    async fn recent_messages(
        &self,
        context: &ContextId,
        user_a: &UserId,
        user_b: &UserId,
        limit: usize,
    ) -> Result<Vec<UnreadMessage>, ImmoError>;
}
