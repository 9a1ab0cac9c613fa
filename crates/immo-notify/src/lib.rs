// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-app notifications for the Immo messaging client.
//!
//! [`NotificationStore`] keeps the capped, newest-first list of notification
//! records shown in the notification center, owns the native notification
//! [`PermissionBridge`], and routes newly arrived messages into both.

pub mod permission;
pub mod router;
pub mod store;

pub use permission::PermissionBridge;
pub use router::{chat_link, new_message_notification};
pub use store::NotificationStore;
