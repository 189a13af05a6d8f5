//! Response envelope shared by every service reply.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error block of an [`Envelope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code for categorization
    #[serde(default)]
    pub code: String,
    /// Human-readable error message
    #[serde(default)]
    pub message: String,
    /// Additional error details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, ": {}", Value::Object(details.clone()))?;
        }
        Ok(())
    }
}

/// Uniform wrapper every service response is expected to conform to.
///
/// `data` carries the payload (an entity, a list, or nothing) and `error`
/// is populated iff `status` is "error" - though either may be absent, and
/// the pipeline tolerates both cases.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// "ok" or "error"
    #[serde(default)]
    pub status: String,
    /// Response payload
    #[serde(default)]
    pub data: Option<Value>,
    /// Error details, present on error responses
    #[serde(default)]
    pub error: Option<ErrorBody>,
    /// Response metadata such as pagination
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    /// Optional human-readable message from the server
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope {
    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.status == "ok"
    }

    /// Check if the response indicates an error.
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope() {
        let envelope: Envelope =
            serde_json::from_value(json!({"status": "ok", "data": {"id": "1"}})).unwrap();
        assert!(envelope.is_success());
        assert!(!envelope.is_error());
        assert!(envelope.data.is_some());
        assert!(envelope.error.is_none());
    }

    #[test]
    fn error_envelope_with_details() {
        let envelope: Envelope = serde_json::from_value(json!({
            "status": "error",
            "error": {"code": "NOT_FOUND", "message": "Task not found", "details": {"id": "9"}},
        }))
        .unwrap();
        assert!(envelope.is_error());
        let error = envelope.error.unwrap();
        assert_eq!(error.code, "NOT_FOUND");
        assert_eq!(
            error.to_string(),
            r#"[NOT_FOUND] Task not found: {"id":"9"}"#
        );
    }

    #[test]
    fn tolerates_absent_data_and_error() {
        let envelope: Envelope = serde_json::from_value(json!({"status": "ok"})).unwrap();
        assert!(envelope.is_success());
        assert!(envelope.data.is_none());
        assert!(envelope.error.is_none());

        // Even a bare object parses; it just reports neither success nor error.
        let envelope: Envelope = serde_json::from_value(json!({})).unwrap();
        assert!(!envelope.is_success());
        assert!(!envelope.is_error());
    }

    #[test]
    fn metadata_and_message_pass_through() {
        let envelope: Envelope = serde_json::from_value(json!({
            "status": "ok",
            "data": [],
            "metadata": {"limit": 50, "offset": 0, "total": 1},
            "message": "Tasks retrieved successfully",
        }))
        .unwrap();
        let metadata = envelope.metadata.unwrap();
        assert_eq!(metadata.get("total"), Some(&json!(1)));
        assert_eq!(envelope.message.as_deref(), Some("Tasks retrieved successfully"));
    }
}
