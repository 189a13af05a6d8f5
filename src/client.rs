//! HTTP request pipeline for the task service.
//!
//! # Design
//! `TaskClient` holds only construction-time state: base URL, pre-built
//! auth headers, per-attempt timeout, retry policy, and the reqwest
//! connection pool. Every operation is a single stateless request/response
//! exchange; nothing is cached between calls and no background work is
//! spawned. Two concurrent calls against the same resource race at the
//! server, not in the client.

use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::auth::auth_headers;
use crate::config::{ClientConfig, ConfigError};
use crate::error::{ClientError, Error};
use crate::model::{Envelope, NewSubTask, NewTask, SubTask, SubTaskPatch, Task, TaskPatch, TaskQuery};
use crate::retry::RetryPolicy;

/// Client for the task-management service.
///
/// Cheap to clone; clones share the underlying connection pool and may be
/// used concurrently from multiple tasks or threads.
///
/// # Example
///
/// ```no_run
/// use taskwire::{ClientConfig, TaskClient, TaskQuery};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TaskClient::new(
///     ClientConfig::new("http://localhost:3000/api/v1").with_token("jwt-token"),
/// )?;
/// let tasks = client.list_tasks(&TaskQuery::new()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TaskClient {
    http: reqwest::Client,
    base_url: String,
    headers: reqwest::header::HeaderMap,
    retry: RetryPolicy,
}

impl TaskClient {
    /// Build a client from `config`.
    ///
    /// The base URL is validated and its trailing slash stripped here, once;
    /// the credential headers and per-attempt timeout are fixed for the
    /// client's lifetime.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the base URL is empty or unparseable, the token
    /// is not a valid header value, or the transport cannot be initialized.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        if config.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        let base_url = config.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)?;

        let headers = auth_headers(config.token.as_deref())?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url,
            headers,
            retry: RetryPolicy::new(config.max_retries, config.retry_backoff),
        })
    }

    /// The configured base URL, trailing slash stripped.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Release this handle's hold on the connection pool.
    ///
    /// Dropping the client has the same effect on every exit path; pooled
    /// connections are torn down once the last clone is gone.
    pub fn close(self) {}

    // Task operations

    /// List tasks matching `query`.
    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, Error> {
        let envelope = self
            .request_envelope(Method::GET, "/tasks", Some(query), None)
            .await?;
        unwrap_list(envelope, Task::from_api_response)
    }

    /// Fetch a single task by ID.
    pub async fn get_task(&self, task_id: &str) -> Result<Task, Error> {
        let envelope = self
            .request_envelope(Method::GET, &format!("/tasks/{task_id}"), None, None)
            .await?;
        unwrap_entity(envelope, Task::from_api_response)
    }

    /// Create a task. The service requires at least a title.
    pub async fn create_task(&self, task: &NewTask) -> Result<Task, Error> {
        let body = to_body(task)?;
        let envelope = self
            .request_envelope(Method::POST, "/tasks", None, Some(body))
            .await?;
        unwrap_entity(envelope, Task::from_api_response)
    }

    /// Apply a partial update to a task.
    pub async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<Task, Error> {
        let body = to_body(patch)?;
        let envelope = self
            .request_envelope(Method::PATCH, &format!("/tasks/{task_id}"), None, Some(body))
            .await?;
        unwrap_entity(envelope, Task::from_api_response)
    }

    /// Delete a task. Success is defined purely by a terminal status below
    /// 400; the response body is not required to carry meaningful data.
    pub async fn delete_task(&self, task_id: &str) -> Result<bool, Error> {
        self.send(Method::DELETE, &format!("/tasks/{task_id}"), None, None)
            .await?;
        Ok(true)
    }

    // SubTask operations

    /// List all subtasks of a task.
    pub async fn list_subtasks(&self, task_id: &str) -> Result<Vec<SubTask>, Error> {
        let envelope = self
            .request_envelope(Method::GET, &format!("/tasks/{task_id}/subtasks"), None, None)
            .await?;
        unwrap_list(envelope, SubTask::from_api_response)
    }

    /// Fetch a single subtask.
    pub async fn get_subtask(&self, task_id: &str, subtask_id: &str) -> Result<SubTask, Error> {
        let envelope = self
            .request_envelope(
                Method::GET,
                &format!("/tasks/{task_id}/subtasks/{subtask_id}"),
                None,
                None,
            )
            .await?;
        unwrap_entity(envelope, SubTask::from_api_response)
    }

    /// Create a subtask under a task.
    pub async fn create_subtask(
        &self,
        task_id: &str,
        subtask: &NewSubTask,
    ) -> Result<SubTask, Error> {
        let body = to_body(subtask)?;
        let envelope = self
            .request_envelope(
                Method::POST,
                &format!("/tasks/{task_id}/subtasks"),
                None,
                Some(body),
            )
            .await?;
        unwrap_entity(envelope, SubTask::from_api_response)
    }

    /// Apply a partial update to a subtask.
    pub async fn update_subtask(
        &self,
        task_id: &str,
        subtask_id: &str,
        patch: &SubTaskPatch,
    ) -> Result<SubTask, Error> {
        let body = to_body(patch)?;
        let envelope = self
            .request_envelope(
                Method::PATCH,
                &format!("/tasks/{task_id}/subtasks/{subtask_id}"),
                None,
                Some(body),
            )
            .await?;
        unwrap_entity(envelope, SubTask::from_api_response)
    }

    /// Delete a subtask. Same success contract as [`TaskClient::delete_task`].
    pub async fn delete_subtask(&self, task_id: &str, subtask_id: &str) -> Result<bool, Error> {
        self.send(
            Method::DELETE,
            &format!("/tasks/{task_id}/subtasks/{subtask_id}"),
            None,
            None,
        )
        .await?;
        Ok(true)
    }

    /// Execute an operation and parse the success body as an [`Envelope`].
    async fn request_envelope(
        &self,
        method: Method,
        path: &str,
        query: Option<&TaskQuery>,
        body: Option<Value>,
    ) -> Result<Envelope, Error> {
        let response = self.send(method, path, query, body).await?;
        let status = response.status();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|err| {
            ClientError::invalid_response(
                status.as_u16(),
                format!("failed to parse response body: {err}"),
            )
            .into()
        })
    }

    /// Send one logical request: execute with the retry policy until a
    /// terminal outcome, then return the success response or dispatch the
    /// failure to the error taxonomy.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&TaskQuery>,
        body: Option<Value>,
    ) -> Result<reqwest::Response, Error> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            tracing::debug!(%method, %url, attempt, "sending request");

            let mut request = self
                .http
                .request(method.clone(), &url)
                .headers(self.headers.clone());
            if let Some(query) = query {
                request = request.query(query);
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => {
                    if RetryPolicy::is_transient_transport(&err)
                        && self.retry.allows(attempt)
                        && RetryPolicy::is_retryable_method(&method)
                    {
                        attempt += 1;
                        let delay = self.retry.backoff_delay(attempt);
                        tracing::warn!(
                            %method, %url, attempt, ?delay, error = %err,
                            "transport failure, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    tracing::error!(%method, %url, error = %err, "request failed");
                    return Err(Error::Transport(err));
                }
            };

            let status = response.status();
            if status.as_u16() < 400 {
                return Ok(response);
            }

            if RetryPolicy::is_transient_status(status.as_u16())
                && self.retry.allows(attempt)
                && RetryPolicy::is_retryable_method(&method)
            {
                attempt += 1;
                let delay = self.retry.backoff_delay(attempt);
                tracing::warn!(
                    %method, %url, status = status.as_u16(), attempt, ?delay,
                    "transient status, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            tracing::error!(%method, %url, status = status.as_u16(), "request rejected");
            return Err(map_error_response(response, status).await.into());
        }
    }
}

/// Translate a terminal non-2xx response into the taxonomy, best-effort
/// parsing the body and degrading to the HTTP reason phrase.
async fn map_error_response(response: reqwest::Response, status: StatusCode) -> ClientError {
    let body: Value = match response.text().await {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|_| Value::Object(Default::default())),
        Err(_) => Value::Object(Default::default()),
    };
    let reason = status.canonical_reason().unwrap_or("Unknown Error");
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(reason)
        .to_string();
    let code = body
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_string();
    ClientError::from_status(status.as_u16(), &message, &code, body)
}

/// Unwrap the envelope `data` as a single entity. Absent data degrades to
/// an empty object, which the entity parser rejects field by field.
fn unwrap_entity<T>(
    envelope: Envelope,
    parse: impl FnOnce(&Value) -> Result<T, ClientError>,
) -> Result<T, Error> {
    let data = envelope
        .data
        .unwrap_or_else(|| Value::Object(Default::default()));
    parse(&data).map_err(Error::from)
}

/// Unwrap the envelope `data` as an entity sequence; absent or non-array
/// data degrades to an empty list rather than failing.
fn unwrap_list<T>(
    envelope: Envelope,
    parse: impl Fn(&Value) -> Result<T, ClientError>,
) -> Result<Vec<T>, Error> {
    match envelope.data {
        Some(Value::Array(items)) => items
            .iter()
            .map(parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Error::from),
        _ => Ok(Vec::new()),
    }
}

fn to_body<T: serde::Serialize>(payload: &T) -> Result<Value, Error> {
    serde_json::to_value(payload).map_err(|e| {
        Error::from(ClientError::validation(
            format!("failed to serialize request body: {e}"),
            Vec::new(),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn envelope(data: Value) -> Envelope {
        serde_json::from_value(json!({"status": "ok", "data": data})).unwrap()
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(
            TaskClient::new(ClientConfig::new("")),
            Err(ConfigError::MissingBaseUrl)
        ));
        assert!(matches!(
            TaskClient::new(ClientConfig::new("   ")),
            Err(ConfigError::MissingBaseUrl)
        ));
    }

    #[test]
    fn unparseable_base_url_is_rejected() {
        assert!(matches!(
            TaskClient::new(ClientConfig::new("not a url")),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn trailing_slashes_are_stripped_once_at_construction() {
        let client = TaskClient::new(ClientConfig::new("http://localhost:3000/api/v1/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api/v1");
    }

    #[test]
    fn unwrap_list_tolerates_absent_or_non_array_data() {
        let bare: Envelope = serde_json::from_value(json!({"status": "ok"})).unwrap();
        let tasks = unwrap_list(bare, Task::from_api_response).unwrap();
        assert!(tasks.is_empty());

        let tasks = unwrap_list(envelope(json!("unexpected")), Task::from_api_response).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn unwrap_entity_reports_validation_for_absent_data() {
        let bare: Envelope = serde_json::from_value(json!({"status": "ok"})).unwrap();
        let err = unwrap_entity(bare, Task::from_api_response).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
    }
}
