//! Domain entities parsed from service responses.
//!
//! Entities are constructed by `from_api_response` and never mutated by the
//! client. Outbound mutations use the partial payload types (`NewTask`,
//! `TaskPatch`, ...) which omit unset fields on the wire.

mod envelope;
mod subtask;
mod task;

pub use envelope::{Envelope, ErrorBody};
pub use subtask::{NewSubTask, SubTask, SubTaskPatch};
pub use task::{NewTask, Task, TaskPatch, TaskPriority, TaskQuery, TaskStatus};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::FieldError;

// Field validators shared by the entity parsers. Each records failures in
// `errors` and returns a placeholder; callers must reject the entity when
// `errors` is non-empty, so placeholders never escape.

pub(crate) fn required_string(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> String {
    match obj.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => {
            errors.push(FieldError::new(field, "field is required", "required", None));
            String::new()
        }
        Some(other) => {
            errors.push(FieldError::new(
                field,
                "expected a string",
                "type",
                Some(other.clone()),
            ));
            String::new()
        }
    }
}

pub(crate) fn validated_title(obj: &Map<String, Value>, errors: &mut Vec<FieldError>) -> String {
    match obj.get("title") {
        Some(Value::String(s)) => {
            let length = s.chars().count();
            if !(1..=255).contains(&length) {
                errors.push(FieldError::new(
                    "title",
                    "title must be between 1 and 255 characters",
                    "length",
                    Some(Value::from(s.clone())),
                ));
            }
            s.clone()
        }
        Some(Value::Null) | None => {
            errors.push(FieldError::new(
                "title",
                "field is required",
                "required",
                None,
            ));
            String::new()
        }
        Some(other) => {
            errors.push(FieldError::new(
                "title",
                "expected a string",
                "type",
                Some(other.clone()),
            ));
            String::new()
        }
    }
}

pub(crate) fn optional_string(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(FieldError::new(
                field,
                "expected a string",
                "type",
                Some(other.clone()),
            ));
            None
        }
    }
}

pub(crate) fn required_timestamp(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> DateTime<Utc> {
    match obj.get(field) {
        Some(Value::String(s)) => match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(err) => {
                errors.push(FieldError::new(
                    field,
                    format!("invalid timestamp: {err}"),
                    "format",
                    Some(Value::from(s.clone())),
                ));
                DateTime::<Utc>::UNIX_EPOCH
            }
        },
        Some(Value::Null) | None => {
            errors.push(FieldError::new(field, "field is required", "required", None));
            DateTime::<Utc>::UNIX_EPOCH
        }
        Some(other) => {
            errors.push(FieldError::new(
                field,
                "expected an RFC 3339 string",
                "type",
                Some(other.clone()),
            ));
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

pub(crate) fn optional_map(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Map<String, Value>> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(other) => {
            errors.push(FieldError::new(
                field,
                "expected an object",
                "type",
                Some(other.clone()),
            ));
            None
        }
    }
}
