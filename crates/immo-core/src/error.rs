// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Immo messaging client.

use thiserror::Error;

/// The primary error type used across all Immo adapter traits and services.
#[derive(Debug, Error)]
pub enum ImmoError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote backend errors (network failure, non-success status, bad payload).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        /// HTTP status returned by the backend, when one was received.
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A looked-up entity does not exist on the backend.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The operation requires a started polling session.
    #[error("no active user session")]
    NoActiveSession,

    /// Native notification host failures.
    #[error("notification host error: {message}")]
    Host { message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ImmoError {
    /// Shorthand for a backend error without a status or source.
    pub fn backend(message: impl Into<String>) -> Self {
        ImmoError::Backend {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Returns the backend HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ImmoError::Backend { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_shorthand_has_no_status() {
        let err = ImmoError::backend("connection refused");
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "backend error: connection refused");
    }

    #[test]
    fn status_is_exposed_for_backend_errors_only() {
        let err = ImmoError::Backend {
            message: "unauthorized".into(),
            status: Some(401),
            source: None,
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(ImmoError::NoActiveSession.status(), None);
    }

    #[test]
    fn not_found_display_names_entity() {
        let err = ImmoError::NotFound {
            entity: "profile".into(),
            id: "u7".into(),
        };
        assert_eq!(err.to_string(), "profile not found: u7");
    }
}
