// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unread-message counting for the Immo messaging client.
//!
//! [`CountAggregator`] polls the backend, keeps per-conversation unread
//! counts, and detects genuinely new messages; the pure cycle logic lives in
//! [`diff`].

pub mod aggregator;
pub mod diff;

pub use aggregator::{CountAggregator, PollOutcome};
pub use diff::{CountMap, classify_new, group_counts, has_counts_changed, to_snapshot};
