// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the collaborators injected into Immo services.
//!
//! Remote-facing adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod backend;
pub mod host;
pub mod router;

pub use adapter::PluginAdapter;
pub use backend::MessageBackend;
pub use host::NotificationHost;
pub use router::NewMessageRouter;
