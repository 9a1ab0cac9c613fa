// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that remote-facing adapters implement.

use async_trait::async_trait;

use crate::error::ImmoError;
use crate::types::HealthStatus;

/// The base trait for Immo adapters.
///
/// Provides identity and health check capabilities so the binary can report
/// which backend it is talking to and whether it is reachable.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, ImmoError>;
}
