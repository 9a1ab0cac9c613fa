// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hosted backend adapter for the Immo messaging client.
//!
//! This crate implements [`MessageBackend`] on top of the backend's PostgREST
//! interface: unread messages are read from the `messages` table, display
//! strings from `profiles` and `properties`.

pub mod client;
pub mod types;

use async_trait::async_trait;
use immo_config::BackendConfig;
use immo_core::error::ImmoError;
use immo_core::traits::{MessageBackend, PluginAdapter};
use immo_core::types::{ContextId, HealthStatus, UnreadMessage, UserId};
use tracing::{debug, info, warn};

use crate::client::RestClient;
use crate::types::{
    MESSAGE_COLUMNS, MESSAGES_TABLE, MarkReadArgs, PROFILES_TABLE, PROPERTIES_TABLE, ProfileRow,
    PropertyRow, ReadPatch,
};

/// [`MessageBackend`] backed by the hosted PostgREST API.
///
/// Bulk mark-read uses a table update by default, or the configured stored
/// procedure when `backend.mark_read_rpc` is set.
#[derive(Debug, Clone)]
pub struct SupabaseBackend {
    client: RestClient,
    mark_read_rpc: Option<String>,
}

impl SupabaseBackend {
    /// Creates a backend adapter from the `[backend]` configuration section.
    pub fn from_config(config: &BackendConfig) -> Result<Self, ImmoError> {
        let client = RestClient::new(
            &config.url,
            config.anon_key.as_deref(),
            config.access_token.as_deref(),
            config.timeout(),
        )?;
        info!(
            url = %config.url,
            mark_read_rpc = config.mark_read_rpc.as_deref().unwrap_or("-"),
            "backend adapter initialized"
        );
        Ok(Self::with_client(client, config.mark_read_rpc.clone()))
    }

    pub fn with_client(client: RestClient, mark_read_rpc: Option<String>) -> Self {
        Self {
            client,
            mark_read_rpc,
        }
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn conversation_filters<'a>(
    context: &ContextId,
    sender: &UserId,
    receiver: &UserId,
) -> Vec<(&'a str, String)> {
    vec![
        ("property_id", eq(context)),
        ("sender_id", eq(sender)),
        ("receiver_id", eq(receiver)),
        ("read", "eq.false".to_string()),
        ("deleted_at", "is.null".to_string()),
    ]
}

/// Picks the single non-empty string out of a lookup result.
fn first_non_empty(
    values: impl IntoIterator<Item = Option<String>>,
    entity: &str,
    id: &str,
) -> Result<String, ImmoError> {
    values
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
        .ok_or_else(|| ImmoError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        })
}

#[async_trait]
impl PluginAdapter for SupabaseBackend {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn health_check(&self) -> Result<HealthStatus, ImmoError> {
        match self.client.ping().await {
            Ok(status) if status.is_success() => Ok(HealthStatus::Healthy),
            Ok(status) if status.as_u16() == 401 || status.as_u16() == 403 => Ok(
                HealthStatus::Degraded(format!("backend reachable but rejected credentials ({status})")),
            ),
            Ok(status) => Ok(HealthStatus::Unhealthy(format!("backend returned {status}"))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl MessageBackend for SupabaseBackend {
    async fn query_unread_messages(
        &self,
        receiver: &UserId,
    ) -> Result<Vec<UnreadMessage>, ImmoError> {
        let params = [
            ("select", MESSAGE_COLUMNS.to_string()),
            ("receiver_id", eq(receiver)),
            ("read", "eq.false".to_string()),
            ("deleted_at", "is.null".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        let rows: Vec<serde_json::Value> = self.client.select(MESSAGES_TABLE, &params).await?;
        let messages = decode_messages(rows);
        debug!(receiver = %receiver, unread = messages.len(), "fetched unread messages");
        Ok(messages)
    }

    async fn mark_messages_read(
        &self,
        context: &ContextId,
        sender: &UserId,
        receiver: &UserId,
    ) -> Result<(), ImmoError> {
        match &self.mark_read_rpc {
            Some(function) => {
                let args = MarkReadArgs {
                    p_property_id: context.as_str(),
                    p_sender_id: sender.as_str(),
                    p_receiver_id: receiver.as_str(),
                };
                self.client.rpc(function, &args).await
            }
            None => {
                let filters = conversation_filters(context, sender, receiver);
                self.client
                    .update(MESSAGES_TABLE, &filters, &ReadPatch { read: true })
                    .await
            }
        }
    }

    async fn lookup_display_name(&self, user: &UserId) -> Result<String, ImmoError> {
        let params = [
            ("select", "full_name".to_string()),
            ("id", eq(user)),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<ProfileRow> = self.client.select(PROFILES_TABLE, &params).await?;
        first_non_empty(rows.into_iter().map(|r| r.full_name), "profile", user.as_str())
    }

    async fn lookup_context_title(&self, context: &ContextId) -> Result<String, ImmoError> {
        let params = [
            ("select", "title".to_string()),
            ("id", eq(context)),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<PropertyRow> = self.client.select(PROPERTIES_TABLE, &params).await?;
        first_non_empty(rows.into_iter().map(|r| r.title), "property", context.as_str())
    }

    async fn count_unread(
        &self,
        context: &ContextId,
        sender: &UserId,
        receiver: &UserId,
    ) -> Result<usize, ImmoError> {
        let filters = conversation_filters(context, sender, receiver);
        self.client.count(MESSAGES_TABLE, &filters).await
    }

    async fn recent_messages(
        &self,
        context: &ContextId,
        user_a: &UserId,
        user_b: &UserId,
        limit: usize,
    ) -> Result<Vec<UnreadMessage>, ImmoError> {
        let either_direction = format!(
            "(and(sender_id.eq.{user_a},receiver_id.eq.{user_b}),and(sender_id.eq.{user_b},receiver_id.eq.{user_a}))"
        );
        let params = [
            ("select", MESSAGE_COLUMNS.to_string()),
            ("property_id", eq(context)),
            ("or", either_direction),
            ("deleted_at", "is.null".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<serde_json::Value> = self.client.select(MESSAGES_TABLE, &params).await?;
        Ok(decode_messages(rows))
    }
}

/// Decodes message rows one at a time. A row that does not decode, such as
/// one without a `property_id`, is logged and skipped instead of failing the
/// whole batch.
fn decode_messages(rows: Vec<serde_json::Value>) -> Vec<UnreadMessage> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or("<no id>")
                .to_string();
            match serde_json::from_value::<UnreadMessage>(row) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!(message = %id, error = %e, "skipping malformed message row");
                    None
                }
            }
        })
        .collect()
}
