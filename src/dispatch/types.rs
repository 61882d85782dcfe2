//! Send request types and destination validation

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{AppError, Result};

/// Content of an outbound send - template-based or free text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OutboundContent {
    /// Rendered from a stored template
    Template {
        template_name: String,
        /// Requested language; the store's default language when absent
        language: Option<String>,
        #[serde(default)]
        variables: HashMap<String, String>,
    },
    /// Free-text body, sent as-is
    Raw { body: String },
}

impl OutboundContent {
    /// Metric/log label for this content kind
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundContent::Template { .. } => "template",
            OutboundContent::Raw { .. } => "raw",
        }
    }
}

/// A validated-at-the-boundary send request
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub destination: String,
    pub content: OutboundContent,
}

/// One entry of a bulk send
#[derive(Debug, Clone, Deserialize)]
pub struct BulkSendEntry {
    pub destination: String,
    #[serde(flatten)]
    pub content: OutboundContent,
}

impl From<BulkSendEntry> for SendRequest {
    fn from(entry: BulkSendEntry) -> Self {
        SendRequest {
            destination: entry.destination,
            content: entry.content,
        }
    }
}

/// Validate an international-format destination number.
///
/// Accepts an optional leading `+` followed by 9 to 15 digits.
pub fn validate_destination(destination: &str) -> Result<()> {
    let digits = destination.strip_prefix('+').unwrap_or(destination);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidDestination(format!(
            "'{}' is not an international phone number",
            destination
        )));
    }

    if !(9..=15).contains(&digits.len()) {
        return Err(AppError::InvalidDestination(format!(
            "'{}' must contain 9-15 digits",
            destination
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_destinations() {
        assert!(validate_destination("+15551234567").is_ok());
        assert!(validate_destination("5215551234567").is_ok());
        assert!(validate_destination("+525512345678").is_ok());
    }

    #[test]
    fn test_invalid_destinations() {
        assert!(validate_destination("").is_err());
        assert!(validate_destination("+").is_err());
        assert!(validate_destination("12345678").is_err()); // too short
        assert!(validate_destination("+1234567890123456").is_err()); // too long
        assert!(validate_destination("+1555-123-4567").is_err());
        assert!(validate_destination("not-a-number").is_err());
    }

    #[test]
    fn test_content_deserializes_untagged() {
        let template: OutboundContent = serde_json::from_str(
            r#"{"template_name": "order_confirmation", "variables": {"order_id": "1"}}"#,
        )
        .unwrap();
        assert!(matches!(template, OutboundContent::Template { .. }));

        let raw: OutboundContent = serde_json::from_str(r#"{"body": "hello"}"#).unwrap();
        assert!(matches!(raw, OutboundContent::Raw { .. }));
    }
}
