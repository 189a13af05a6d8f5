//! # Taskwire
//!
//! Typed Rust client for the Taskwire task-management service.
//!
//! The client turns HTTP calls into validated domain objects and maps
//! transport and service failures into a structured error taxonomy.
//!
//! ```no_run
//! use taskwire::{ClientConfig, NewTask, TaskClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TaskClient::new(
//!     ClientConfig::new("http://localhost:3000/api/v1").with_token("jwt-token"),
//! )?;
//! let task = client.create_task(&NewTask::new("Ship the release")).await?;
//! println!("created {task}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//! - `client`: request pipeline (build, retry/backoff, unwrap, error dispatch)
//! - `model`: Task/SubTask entities, request payloads, and the response envelope
//! - `error`: the error taxonomy
//! - `jwt`: token inspection, consumed independently of the pipeline
//!
//! Transport failures (unreachable host, timeout exhaustion) are reported
//! separately from service rejections; see [`Error`].

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod jwt;
pub mod model;
pub mod retry;

pub use client::TaskClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, Error, ErrorKind, FieldError};
pub use jwt::{Claims, TokenInspector};
pub use model::{
    Envelope, ErrorBody, NewSubTask, NewTask, SubTask, SubTaskPatch, Task, TaskPatch,
    TaskPriority, TaskQuery, TaskStatus,
};
pub use retry::RetryPolicy;
