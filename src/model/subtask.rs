//! SubTask entity and request payloads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{optional_map, optional_string, required_string, required_timestamp, validated_title};
use crate::error::ClientError;

/// A subtask parsed and validated from server data.
///
/// Unlike [`super::Task`], `status` is an open string: the service does not
/// constrain subtask states to a closed set, so unknown values are kept
/// as-is rather than rejected. "pending", "in-progress", and "done" are the
/// values the derived predicates give meaning to.
#[derive(Debug, Clone, Serialize)]
pub struct SubTask {
    /// Unique subtask identifier
    pub id: String,
    /// ID of the owning task
    pub parent_id: String,
    /// Subtask title (1-255 characters)
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form status string, "pending" by default
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl SubTask {
    /// Build a subtask from a server payload.
    ///
    /// Unknown fields are ignored for forward compatibility; missing or
    /// out-of-range required fields fail with a `Validation`-kind error
    /// listing every offending field.
    pub fn from_api_response(data: &Value) -> Result<Self, ClientError> {
        let mut errors = Vec::new();
        let Some(obj) = data.as_object() else {
            return Err(ClientError::validation(
                "SubTask payload must be an object",
                vec![crate::error::FieldError::new(
                    "",
                    "expected an object",
                    "type",
                    Some(data.clone()),
                )],
            ));
        };

        let id = required_string(obj, "id", &mut errors);
        let parent_id = required_string(obj, "parent_id", &mut errors);
        let title = validated_title(obj, &mut errors);
        let description = optional_string(obj, "description", &mut errors);
        let status =
            optional_string(obj, "status", &mut errors).unwrap_or_else(|| "pending".to_string());
        let created_at = required_timestamp(obj, "created_at", &mut errors);
        let updated_at = required_timestamp(obj, "updated_at", &mut errors);
        let metadata = optional_map(obj, "metadata", &mut errors);

        if !errors.is_empty() {
            return Err(ClientError::validation("SubTask validation failed", errors));
        }

        Ok(Self {
            id,
            parent_id,
            title,
            description,
            status,
            created_at,
            updated_at,
            metadata,
        })
    }

    /// Project the entity to an outbound request body, dropping unset fields.
    pub fn to_api_request(&self) -> Result<Value, ClientError> {
        serde_json::to_value(self).map_err(|e| {
            ClientError::validation(format!("failed to serialize subtask: {e}"), Vec::new())
        })
    }

    /// Check if the subtask is completed.
    pub fn is_completed(&self) -> bool {
        self.status == "done"
    }

    /// Active subtasks are those that are pending or in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.status.as_str(), "pending" | "in-progress")
    }
}

impl std::fmt::Display for SubTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SubTask({}: {})", self.id, self.title)
    }
}

/// Payload for creating a subtask. Only `title` is required; unset fields
/// are omitted from the wire body.
#[derive(Debug, Clone, Serialize)]
pub struct NewSubTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl NewSubTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: None,
            metadata: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Partial subtask update; unset fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubTaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl SubTaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}
