// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sink for newly arrived messages detected by the counter.

use async_trait::async_trait;

use crate::types::NewMessageEvent;

/// Receives messages the counter classified as genuinely new.
///
/// Routing is best-effort: implementations log their own failures instead of
/// returning them, so a broken sink never stalls count delivery.
#[async_trait]
pub trait NewMessageRouter: Send + Sync + 'static {
    async fn route(&self, event: NewMessageEvent);
}
