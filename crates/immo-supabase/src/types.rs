// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row and payload types exchanged with the PostgREST endpoints.

use serde::{Deserialize, Serialize};

/// Columns selected for every message query.
pub const MESSAGE_COLUMNS: &str =
    "id,property_id,sender_id,receiver_id,content,read,created_at,deleted_at";

/// Table holding chat messages.
pub const MESSAGES_TABLE: &str = "messages";

/// Table holding user profiles.
pub const PROFILES_TABLE: &str = "profiles";

/// Table holding listings.
pub const PROPERTIES_TABLE: &str = "properties";

/// `profiles` row projected to the display name.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRow {
    pub full_name: Option<String>,
}

/// `properties` row projected to the title.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyRow {
    pub title: Option<String>,
}

/// Body of the bulk update flipping the read flag.
#[derive(Debug, Clone, Serialize)]
pub struct ReadPatch {
    pub read: bool,
}

/// Named arguments of the bulk mark-read stored procedure.
#[derive(Debug, Clone, Serialize)]
pub struct MarkReadArgs<'a> {
    pub p_property_id: &'a str,
    pub p_sender_id: &'a str,
    pub p_receiver_id: &'a str,
}

/// Error payload returned by PostgREST on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ApiErrorResponse {
    /// One-line description including the error code when present.
    pub fn describe(&self) -> String {
        match &self.code {
            Some(code) => format!("{} ({code})", self.message),
            None => self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_read_args_use_procedure_parameter_names() {
        let args = MarkReadArgs {
            p_property_id: "42",
            p_sender_id: "u7",
            p_receiver_id: "me",
        };
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"p_property_id": "42", "p_sender_id": "u7", "p_receiver_id": "me"})
        );
    }

    #[test]
    fn api_error_description_includes_code() {
        let err: ApiErrorResponse = serde_json::from_str(
            r#"{"message":"permission denied for table messages","code":"42501","details":null,"hint":null}"#,
        )
        .unwrap();
        assert_eq!(
            err.describe(),
            "permission denied for table messages (42501)"
        );
    }
}
