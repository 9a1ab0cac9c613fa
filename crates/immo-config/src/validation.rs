// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as a usable backend URL and non-zero intervals.

use crate::diagnostic::ConfigError;
use crate::model::ImmoConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every error instead of failing on the first one.
pub fn validate_config(config: &ImmoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let level = config.app.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "app.log_level `{}` is not one of {}",
            config.app.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    let url = config.backend.url.trim();
    if url.is_empty() {
        fail("backend.url must not be empty".to_string());
    } else if !(url.starts_with("http://") || url.starts_with("https://")) {
        fail(format!("backend.url `{url}` must start with http:// or https://"));
    }

    if config.backend.timeout_secs == 0 {
        fail("backend.timeout_secs must be at least 1".to_string());
    }

    if let Some(rpc) = &config.backend.mark_read_rpc
        && rpc.trim().is_empty()
    {
        fail("backend.mark_read_rpc must not be empty when set".to_string());
    }

    if config.counter.poll_interval_secs == 0 {
        fail("counter.poll_interval_secs must be at least 1".to_string());
    }

    if config.notifications.capacity == 0 {
        fail("notifications.capacity must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
