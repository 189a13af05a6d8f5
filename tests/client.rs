//! Integration tests driving `TaskClient` against an in-process mock
//! service, covering the retry policy, status-to-error mapping, envelope
//! unwrapping, and the wire shape of outbound requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use taskwire::{
    ClientConfig, Error, ErrorKind, NewTask, TaskClient, TaskPriority, TaskQuery, TaskStatus,
};

/// Scripted responses returned in order; the last one repeats.
type Script = Arc<(Vec<(u16, String)>, AtomicUsize)>;

async fn scripted_handler(State(script): State<Script>) -> (StatusCode, String) {
    let index = script.1.fetch_add(1, Ordering::SeqCst);
    let (status, body) = script.0[index.min(script.0.len() - 1)].clone();
    (StatusCode::from_u16(status).unwrap(), body)
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Spawn a mock service replaying `responses` for any path, and return its
/// base URL along with the script handle for hit-count assertions.
async fn serve_script(responses: Vec<(u16, Value)>) -> (String, Script) {
    let script: Script = Arc::new((
        responses
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect(),
        AtomicUsize::new(0),
    ));
    let app = Router::new()
        .fallback(scripted_handler)
        .with_state(script.clone());
    (serve(app).await, script)
}

fn client(base_url: &str, max_retries: u32) -> TaskClient {
    TaskClient::new(
        ClientConfig::new(base_url)
            .with_max_retries(max_retries)
            .with_retry_backoff(0.0),
    )
    .unwrap()
}

fn task_json(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "status": "pending",
        "priority": "high",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "subtasks": [],
    })
}

fn ok_envelope(data: Value) -> Value {
    json!({"status": "ok", "data": data})
}

fn service_error(err: Error) -> taskwire::ClientError {
    match err {
        Error::Client(err) => err,
        Error::Transport(err) => panic!("expected service error, got transport: {err}"),
    }
}

#[tokio::test]
async fn transient_server_error_is_retried_until_success() {
    let (base_url, script) = serve_script(vec![
        (500, json!({"message": "boom"})),
        (200, ok_envelope(task_json("1", "Recovered"))),
    ])
    .await;

    let task = client(&base_url, 3).get_task("1").await.unwrap();
    assert_eq!(task.title, "Recovered");
    assert_eq!(script.1.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unauthorized_is_terminal_on_first_attempt() {
    let (base_url, script) =
        serve_script(vec![(401, json!({"message": "Invalid or expired token"}))]).await;

    let err = service_error(client(&base_url, 3).get_task("1").await.unwrap_err());
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(err.status, Some(401));
    assert_eq!(err.message, "Invalid or expired token");
    assert_eq!(script.1.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn status_codes_map_to_most_specific_kind() {
    let cases = [
        (400, ErrorKind::BadRequest),
        (404, ErrorKind::NotFound),
        (409, ErrorKind::Conflict),
        (429, ErrorKind::RateLimited),
        (500, ErrorKind::Server),
        (503, ErrorKind::ServiceUnavailable),
    ];

    for (status, kind) in cases {
        let (base_url, _) = serve_script(vec![(status, json!({"message": "nope"}))]).await;
        let err = service_error(
            client(&base_url, 0)
                .list_tasks(&TaskQuery::new())
                .await
                .unwrap_err(),
        );
        assert_eq!(err.kind, kind, "status {status}");
        assert_eq!(err.status, Some(status));
    }
}

#[tokio::test]
async fn retry_exhaustion_surfaces_the_final_status() {
    let (base_url, script) = serve_script(vec![(503, json!({"message": "maintenance"}))]).await;

    let err = service_error(client(&base_url, 2).get_task("1").await.unwrap_err());
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    // Initial attempt plus two retries.
    assert_eq!(script.1.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn delete_succeeds_without_a_meaningful_body() {
    let script: Script = Arc::new((vec![(200, String::new())], AtomicUsize::new(0)));
    let app = Router::new()
        .fallback(scripted_handler)
        .with_state(script.clone());
    let base_url = serve(app).await;

    assert!(client(&base_url, 0).delete_task("1").await.unwrap());
    assert!(client(&base_url, 0).delete_subtask("1", "1.1").await.unwrap());
}

#[tokio::test]
async fn list_tolerates_absent_data() {
    let (base_url, _) = serve_script(vec![(200, json!({"status": "ok"}))]).await;
    let tasks = client(&base_url, 0).list_tasks(&TaskQuery::new()).await.unwrap();
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn list_unwraps_entity_sequence() {
    let (base_url, _) = serve_script(vec![(
        200,
        ok_envelope(json!([task_json("1", "First"), task_json("2", "Second")])),
    )])
    .await;

    let tasks = client(&base_url, 0).list_tasks(&TaskQuery::new()).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, "1");
    assert_eq!(tasks[1].title, "Second");
}

#[tokio::test]
async fn malformed_success_body_reports_invalid_response() {
    let script: Script = Arc::new((vec![(200, "not json".to_string())], AtomicUsize::new(0)));
    let app = Router::new()
        .fallback(scripted_handler)
        .with_state(script.clone());
    let base_url = serve(app).await;

    let err = service_error(client(&base_url, 0).get_task("1").await.unwrap_err());
    assert_eq!(err.kind, ErrorKind::Api);
    assert_eq!(err.code, "INVALID_RESPONSE");
}

#[tokio::test]
async fn non_json_error_body_degrades_to_reason_phrase() {
    let script: Script = Arc::new((vec![(404, "<html>gone</html>".to_string())], AtomicUsize::new(0)));
    let app = Router::new()
        .fallback(scripted_handler)
        .with_state(script.clone());
    let base_url = serve(app).await;

    let err = service_error(client(&base_url, 0).get_task("9").await.unwrap_err());
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "Not Found");
    assert_eq!(err.code, "NOT_FOUND");
}

#[tokio::test]
async fn unmapped_status_falls_back_to_api_kind_with_reported_code() {
    let (base_url, _) = serve_script(vec![(
        418,
        json!({"message": "short and stout", "code": "TEAPOT"}),
    )])
    .await;

    let err = service_error(client(&base_url, 0).get_task("1").await.unwrap_err());
    assert_eq!(err.kind, ErrorKind::Api);
    assert_eq!(err.code, "TEAPOT");
    assert_eq!(err.message, "short and stout");
    assert_eq!(err.status, Some(418));
}

#[tokio::test]
async fn error_response_body_is_kept_for_diagnostics() {
    let body = json!({"message": "Task not found", "code": "NOT_FOUND", "details": {"id": "9"}});
    let (base_url, _) = serve_script(vec![(404, body.clone())]).await;

    let err = service_error(client(&base_url, 0).get_task("9").await.unwrap_err());
    assert_eq!(err.message, "Task not found");
    assert_eq!(err.response_data, Some(body));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    // Bind and immediately drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"), 0)
        .get_task("1")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

/// Captures the last request's headers, URI, and body.
#[derive(Clone, Default)]
struct Capture {
    headers: Arc<Mutex<Option<HeaderMap>>>,
    uri: Arc<Mutex<Option<String>>>,
    body: Arc<Mutex<Option<String>>>,
}

async fn capturing_handler(
    State(capture): State<Capture>,
    headers: HeaderMap,
    uri: Uri,
    body: String,
) -> (StatusCode, String) {
    *capture.headers.lock().unwrap() = Some(headers);
    *capture.uri.lock().unwrap() = Some(uri.to_string());
    *capture.body.lock().unwrap() = Some(body);
    (
        StatusCode::OK,
        ok_envelope(task_json("1", "Captured")).to_string(),
    )
}

async fn serve_capture() -> (String, Capture) {
    let capture = Capture::default();
    let app = Router::new()
        .fallback(capturing_handler)
        .with_state(capture.clone());
    (serve(app).await, capture)
}

#[tokio::test]
async fn bearer_and_content_type_headers_are_attached() {
    let (base_url, capture) = serve_capture().await;
    let client =
        TaskClient::new(ClientConfig::new(base_url.as_str()).with_token("test-token")).unwrap();

    client.get_task("1").await.unwrap();

    let headers = capture.headers.lock().unwrap().clone().unwrap();
    assert_eq!(headers.get("authorization").unwrap(), "Bearer test-token");
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
}

#[tokio::test]
async fn no_authorization_header_without_token() {
    let (base_url, capture) = serve_capture().await;

    client(&base_url, 0).get_task("1").await.unwrap();

    let headers = capture.headers.lock().unwrap().clone().unwrap();
    assert!(headers.get("authorization").is_none());
}

#[tokio::test]
async fn list_query_parameters_are_forwarded() {
    let (base_url, capture) = serve_capture().await;

    let query = TaskQuery::new()
        .with_status(TaskStatus::InProgress)
        .with_priority(TaskPriority::Critical);
    client(&base_url, 0).list_tasks(&query).await.unwrap();

    let uri = capture.uri.lock().unwrap().clone().unwrap();
    assert!(uri.starts_with("/tasks?"), "unexpected uri: {uri}");
    assert!(uri.contains("status=in-progress"));
    assert!(uri.contains("priority=critical"));
    assert!(uri.contains("limit=50"));
    assert!(uri.contains("offset=0"));
}

#[tokio::test]
async fn create_body_carries_only_set_fields() {
    let (base_url, capture) = serve_capture().await;

    let task = NewTask::new("Write docs").with_priority(TaskPriority::Low);
    client(&base_url, 0).create_task(&task).await.unwrap();

    let body = capture.body.lock().unwrap().clone().unwrap();
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["title"], "Write docs");
    assert_eq!(body["priority"], "low");
    assert!(body.get("description").is_none());
    assert!(body.get("status").is_none());

    let uri = capture.uri.lock().unwrap().clone().unwrap();
    assert_eq!(uri, "/tasks");
}

#[tokio::test]
async fn subtask_paths_nest_under_the_parent_task() {
    let (base_url, capture) = serve_capture().await;

    // The capture handler answers with a task payload, which subtask
    // parsing rejects; only the request path matters here.
    let _ = client(&base_url, 0).get_subtask("7", "7.2").await;

    let uri = capture.uri.lock().unwrap().clone().unwrap();
    assert_eq!(uri, "/tasks/7/subtasks/7.2");
}
