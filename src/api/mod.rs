//! Backend Access Layer
//!
//! Every component reaches the server through the [`Backend`] trait.
//! [`HttpBackend`] is the production implementation; tests substitute an
//! in-memory one.

mod error;
mod envelope;
mod http;
mod routes;

pub use error::{ApiError, ApiResult};
pub use envelope::{Ack, Envelope};
pub use http::HttpBackend;
pub use routes::{download_task_files_path, item_path, routes, submit_task_path, BodyEncoding, Routes};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::{EntityKind, RecordId};

/// JSON object sent as a request body
pub type Payload = Map<String, Value>;

/// One file attached to a task submission
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Work handed in for a task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSubmission {
    pub description: String,
    pub files: Vec<Attachment>,
}

/// Remote source of truth for all records
///
/// Implementations must treat a missing or false `isSuccess` as failure.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Read a whole collection
    async fn list(&self, kind: EntityKind) -> ApiResult<Vec<Value>>;

    /// Read one record
    async fn get(&self, kind: EntityKind, id: &RecordId) -> ApiResult<Value>;

    async fn create(&self, kind: EntityKind, body: &Payload) -> ApiResult<Ack>;

    /// Partial update of one record
    async fn update(&self, kind: EntityKind, id: &RecordId, body: &Payload) -> ApiResult<Ack>;

    async fn delete(&self, kind: EntityKind, id: &RecordId) -> ApiResult<Ack>;

    /// Upload work for the task with the given unique identifier
    async fn submit_task_work(&self, task_uid: &RecordId, submission: &TaskSubmission) -> ApiResult<Ack>;

    /// Fetch the archive of files submitted for a task
    async fn download_task_files(&self, task_uid: &RecordId) -> ApiResult<Vec<u8>>;
}
