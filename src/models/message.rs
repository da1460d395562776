// src/models/message.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'messages' table. No sender is recorded.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: i64,

    #[serde(skip)]
    pub account_id: i64,

    pub content: String,

    pub created_at: DateTime<Utc>,
}

/// DTO for the public send-message form.
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub username: String,

    #[validate(custom(function = validate_not_blank))]
    pub content: String,
}

fn validate_not_blank(content: &str) -> Result<(), validator::ValidationError> {
    if content.trim().is_empty() {
        return Err(validator::ValidationError::new("blank_content")
            .with_message("Message content is required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_content_is_rejected() {
        for content in ["", "   ", "\n\t"] {
            let req = SendMessageRequest {
                username: "alice".into(),
                content: content.into(),
            };
            assert!(req.validate().is_err());
        }
    }

    #[test]
    fn long_content_is_accepted() {
        let req = SendMessageRequest {
            username: "alice".into(),
            content: "a".repeat(100_000),
        };
        assert!(req.validate().is_ok());
    }
}
