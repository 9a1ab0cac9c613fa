// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Immo integration tests.
//!
//! Provides in-memory adapters so the counter and the notification store can
//! be exercised deterministically, without a backend or a desktop session.
//!
//! # Components
//!
//! - [`MockBackend`] - In-memory message store with failure injection
//! - [`MockHost`] - Scriptable native notification host
//! - [`RecordingRouter`] - Captures routed new-message events
//! - [`Recorder`] - Captures every value delivered to a subscriber callback

pub mod mock_backend;
pub mod mock_host;
pub mod recording;

pub use mock_backend::MockBackend;
pub use mock_host::MockHost;
pub use recording::{Recorder, RecordingRouter};
