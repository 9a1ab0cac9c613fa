// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Immo messaging client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Immo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImmoConfig {
    /// Application identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Hosted backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Unread-count polling settings.
    #[serde(default)]
    pub counter: CounterConfig,

    /// In-app and native notification settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Application identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in log lines and the terminal host banner.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "immo".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Hosted backend (PostgREST over HTTP) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Project base URL, without the `/rest/v1` suffix.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Public anonymous API key, sent as the `apikey` header.
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Signed-in user's access token. Falls back to the anon key when unset.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Stored procedure to call for bulk mark-read instead of a table update.
    /// It receives `p_property_id`, `p_sender_id` and `p_receiver_id`.
    #[serde(default)]
    pub mark_read_rpc: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            anon_key: None,
            access_token: None,
            timeout_secs: default_timeout_secs(),
            mark_read_rpc: None,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:54321".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

/// Unread-count polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CounterConfig {
    /// Seconds between two polls of the message store.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Shown in place of a sender name that cannot be resolved.
    #[serde(default = "default_unknown_sender_label")]
    pub unknown_sender_label: String,

    /// Shown in place of a listing title that cannot be resolved.
    #[serde(default = "default_unknown_context_label")]
    pub unknown_context_label: String,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            unknown_sender_label: default_unknown_sender_label(),
            unknown_context_label: default_unknown_context_label(),
        }
    }
}

impl CounterConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_unknown_sender_label() -> String {
    "Unknown user".to_string()
}

fn default_unknown_context_label() -> String {
    "Unknown listing".to_string()
}

/// In-app and native notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Maximum number of in-app records retained; the oldest is evicted first.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Seconds before a native notification is dismissed, for hosts that keep them.
    #[serde(default = "default_auto_dismiss_secs")]
    pub auto_dismiss_secs: u64,

    /// Ask for native notification permission when a session begins and the
    /// user has not been asked yet.
    #[serde(default = "default_true")]
    pub auto_prompt: bool,

    /// Title of the one-time notification added after permission is granted.
    #[serde(default = "default_welcome_title")]
    pub welcome_title: String,

    /// Body of the one-time notification added after permission is granted.
    #[serde(default = "default_welcome_body")]
    pub welcome_body: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            auto_dismiss_secs: default_auto_dismiss_secs(),
            auto_prompt: true,
            welcome_title: default_welcome_title(),
            welcome_body: default_welcome_body(),
        }
    }
}

impl NotificationsConfig {
    pub fn auto_dismiss(&self) -> Duration {
        Duration::from_secs(self.auto_dismiss_secs)
    }
}

fn default_capacity() -> usize {
    50
}

fn default_auto_dismiss_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_welcome_title() -> String {
    "Notifications enabled".to_string()
}

fn default_welcome_body() -> String {
    "You will now be notified about new messages".to_string()
}
