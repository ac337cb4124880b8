//! The uniform result shape returned for every tool call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::locale::{Locale, Message};

/// Result of a tool call as seen by callers of the bridge.
///
/// A failed envelope always carries a non-empty `message`. A successful one
/// carries `data` whenever the tool produced a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Successful result with a payload.
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    /// Failed result with a human-readable message only.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            message: if message.trim().is_empty() {
                "Request failed".to_string()
            } else {
                message
            },
            data: None,
            error: None,
        }
    }

    /// Attach a machine-oriented diagnostic.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Convert an adapter error into a failed envelope.
    ///
    /// Missing configuration, invalid input and invalid actions render their
    /// own message; everything else is wrapped by `context`, which names the
    /// operation that failed.
    pub fn from_error(
        err: &Error,
        locale: Locale,
        context: impl FnOnce(String) -> Message<'static>,
    ) -> Self {
        let message = match err {
            Error::MissingConfig { service, keys } => Message::NotConfigured {
                service: *service,
                keys: keys.as_slice(),
            }
            .render(locale),
            Error::InvalidInput(detail) => Message::InvalidInput(detail).render(locale),
            Error::InvalidAction(detail) => Message::InvalidAction(detail).render(locale),
            Error::UnknownTool(name) => Message::UnknownTool(name).render(locale),
            other => context(other.to_string()).render(locale),
        };

        Self::failure(message).with_error(err.diagnostic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_serialization_omits_error() {
        let envelope = ResponseEnvelope::ok("done", json!({"id": 1}));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_never_has_empty_message() {
        let envelope = ResponseEnvelope::failure("  ");
        assert!(!envelope.success);
        assert!(!envelope.message.is_empty());

        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_from_error_uses_context_for_backend_failures() {
        let err = Error::Api {
            status: 500,
            message: "boom".to_string(),
        };
        let envelope =
            ResponseEnvelope::from_error(&err, Locale::En, Message::IssueCreateFailed);

        assert!(!envelope.success);
        assert!(envelope.message.contains("500"));
        assert!(envelope.message.contains("boom"));
        assert_eq!(envelope.error.as_deref(), Some("api: API error: 500 - boom"));
    }

    #[test]
    fn test_from_error_missing_config_names_keys() {
        let err = Error::MissingConfig {
            service: "GitLab",
            keys: vec!["GITLAB_TOKEN"],
        };
        let envelope = ResponseEnvelope::from_error(&err, Locale::En, Message::GitLabFailed);

        assert!(envelope.message.contains("GITLAB_TOKEN"));
        assert!(envelope.error.unwrap().starts_with("config:"));
    }

    #[test]
    fn test_from_error_invalid_input_and_action_in_vietnamese() {
        let input = Error::InvalidInput("issue subject must not be empty".to_string());
        let envelope = ResponseEnvelope::from_error(&input, Locale::Vi, Message::RequestFailed);
        assert!(envelope.message.starts_with("Dữ liệu không hợp lệ"));

        let action = Error::InvalidAction("blink".to_string());
        let envelope = ResponseEnvelope::from_error(&action, Locale::Vi, Message::RequestFailed);
        assert_eq!(envelope.message, "Hành động không hợp lệ: blink");
        assert_eq!(envelope.error.as_deref(), Some("invalid_input: Invalid action: blink"));
    }
}
