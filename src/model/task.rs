//! Task entity, status/priority enumerations, and request payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::subtask::SubTask;
use super::{optional_map, optional_string, required_string, required_timestamp, validated_title};
use crate::error::{ClientError, FieldError};

/// Task status. A closed set; unknown wire values are rejected at parse
/// time, never coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    Deferred,
    Cancelled,
    Blocked,
}

impl TaskStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
            TaskStatus::Deferred => "deferred",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Blocked => "blocked",
        }
    }

    /// Parse a wire name. `None` for anything outside the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TaskStatus::Pending),
            "in-progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            "deferred" => Some(TaskStatus::Deferred),
            "cancelled" => Some(TaskStatus::Cancelled),
            "blocked" => Some(TaskStatus::Blocked),
            _ => None,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority. A closed set; unknown wire values are rejected at parse
/// time, never coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    /// Wire name of the priority.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }

    /// Parse a wire name. `None` for anything outside the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            "critical" => Some(TaskPriority::Critical),
            _ => None,
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task parsed and validated from server data.
///
/// Constructed exclusively by [`Task::from_api_response`]; outbound
/// mutations use [`NewTask`] and [`TaskPatch`] instead. The task owns its
/// subtask sequence by value.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Unique task identifier, assigned by the server
    pub id: String,
    /// Task title (1-255 characters)
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub subtasks: Vec<SubTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Task {
    /// Build a task from a server payload.
    ///
    /// Unknown fields are ignored for forward compatibility; missing or
    /// out-of-range required fields fail with a `Validation`-kind error
    /// listing every offending field. Subtask failures are reported with
    /// `subtasks[i].` field prefixes.
    pub fn from_api_response(data: &Value) -> Result<Self, ClientError> {
        let mut errors = Vec::new();
        let Some(obj) = data.as_object() else {
            return Err(ClientError::validation(
                "Task payload must be an object",
                vec![FieldError::new(
                    "",
                    "expected an object",
                    "type",
                    Some(data.clone()),
                )],
            ));
        };

        let id = required_string(obj, "id", &mut errors);
        let title = validated_title(obj, &mut errors);
        let description = optional_string(obj, "description", &mut errors);
        let status = parse_enum(obj, "status", TaskStatus::parse, &mut errors);
        let priority = parse_enum(obj, "priority", TaskPriority::parse, &mut errors);
        let created_at = required_timestamp(obj, "created_at", &mut errors);
        let updated_at = required_timestamp(obj, "updated_at", &mut errors);
        let subtasks = parse_subtasks(obj, &mut errors);
        let project_id = optional_string(obj, "project_id", &mut errors);
        let account_id = optional_string(obj, "account_id", &mut errors);
        let metadata = optional_map(obj, "metadata", &mut errors);

        if !errors.is_empty() {
            return Err(ClientError::validation("Task validation failed", errors));
        }

        Ok(Self {
            id,
            title,
            description,
            status,
            priority,
            created_at,
            updated_at,
            subtasks,
            project_id,
            account_id,
            metadata,
        })
    }

    /// Project the entity to an outbound request body, dropping unset fields.
    pub fn to_api_request(&self) -> Result<Value, ClientError> {
        serde_json::to_value(self).map_err(|e| {
            ClientError::validation(format!("failed to serialize task: {e}"), Vec::new())
        })
    }

    /// Check if the task is completed.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Active tasks are those that are pending or in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::InProgress)
    }

    /// Check if the task is blocked.
    pub fn is_blocked(&self) -> bool {
        self.status == TaskStatus::Blocked
    }

    /// Total number of subtasks.
    pub fn subtask_count(&self) -> usize {
        self.subtasks.len()
    }

    /// Number of subtasks with "done" status.
    pub fn completed_subtask_count(&self) -> usize {
        self.subtasks.iter().filter(|s| s.is_completed()).count()
    }

    /// Percentage of completed subtasks, unrounded.
    ///
    /// With no subtasks this reports on the task itself: 100.0 when done,
    /// 0.0 otherwise. Task-level completion never interpolates from an
    /// absent subtask list.
    pub fn completion_percentage(&self) -> f64 {
        if self.subtasks.is_empty() {
            return if self.is_completed() { 100.0 } else { 0.0 };
        }
        (self.completed_subtask_count() as f64 / self.subtasks.len() as f64) * 100.0
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task({}: {})", self.id, self.title)
    }
}

fn parse_enum<T: Default>(
    obj: &Map<String, Value>,
    field: &str,
    parse: fn(&str) -> Option<T>,
    errors: &mut Vec<FieldError>,
) -> T {
    match obj.get(field) {
        None | Some(Value::Null) => T::default(),
        Some(Value::String(s)) => match parse(s) {
            Some(value) => value,
            None => {
                errors.push(FieldError::new(
                    field,
                    format!("unknown {field} '{s}'"),
                    "enum",
                    Some(Value::from(s.clone())),
                ));
                T::default()
            }
        },
        Some(other) => {
            errors.push(FieldError::new(
                field,
                "expected a string",
                "type",
                Some(other.clone()),
            ));
            T::default()
        }
    }
}

fn parse_subtasks(obj: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Vec<SubTask> {
    match obj.get("subtasks") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut subtasks = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match SubTask::from_api_response(item) {
                    Ok(subtask) => subtasks.push(subtask),
                    Err(err) => errors.extend(err.errors.into_iter().map(|e| {
                        FieldError::new(
                            format!("subtasks[{index}].{}", e.field),
                            e.message,
                            e.code,
                            e.value,
                        )
                    })),
                }
            }
            subtasks
        }
        Some(other) => {
            errors.push(FieldError::new(
                "subtasks",
                "expected an array",
                "type",
                Some(other.clone()),
            ));
            Vec::new()
        }
    }
}

/// Payload for creating a task. Only `title` is required; unset fields are
/// omitted from the wire body.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: None,
            priority: None,
            project_id: None,
            account_id: None,
            metadata: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Partial task update; unset fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Listing filters. `limit` and `offset` are always sent; status and
/// priority only when set.
#[derive(Debug, Clone, Serialize)]
pub struct TaskQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            limit: 50,
            offset: 0,
        }
    }
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }
}
