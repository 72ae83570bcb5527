//! In-memory backend for tests
//!
//! Applies writes to its own collections so that a refetch sees them, and
//! records every call in order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::api::{Ack, ApiError, ApiResult, Backend, Payload, TaskSubmission};
use crate::domain::{EntityKind, RecordId};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(EntityKind),
    Get(EntityKind, RecordId),
    Create { kind: EntityKind, body: Payload },
    Update { kind: EntityKind, id: RecordId, body: Payload },
    Delete(EntityKind, RecordId),
    SubmitWork { task_uid: RecordId, description: String, files: Vec<String> },
    Download(RecordId),
}

#[derive(Default)]
struct State {
    records: HashMap<EntityKind, Vec<Value>>,
    archives: HashMap<RecordId, Vec<u8>>,
    calls: Vec<Call>,
    failing_lists: HashMap<EntityKind, ApiError>,
    reject_writes: Option<Option<String>>,
    write_delay: Option<Duration>,
    list_gate: Option<Arc<Notify>>,
    next_id: i64,
}

pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1000,
                ..State::default()
            }),
        }
    }

    pub fn with_records(self, kind: EntityKind, records: Vec<Value>) -> Self {
        self.state.lock().unwrap().records.insert(kind, records);
        self
    }

    pub fn with_archive(self, task_uid: RecordId, bytes: &[u8]) -> Self {
        self.state.lock().unwrap().archives.insert(task_uid, bytes.to_vec());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn records(&self, kind: EntityKind) -> Vec<Value> {
        self.state.lock().unwrap().records.get(&kind).cloned().unwrap_or_default()
    }

    pub fn fail_list(&self, kind: EntityKind, error: ApiError) {
        self.state.lock().unwrap().failing_lists.insert(kind, error);
    }

    pub fn heal_list(&self, kind: EntityKind) {
        self.state.lock().unwrap().failing_lists.remove(&kind);
    }

    /// Every write answers `isSuccess: false` with this message
    pub fn reject_writes(&self, message: Option<&str>) {
        self.state.lock().unwrap().reject_writes = Some(message.map(str::to_string));
    }

    pub fn accept_writes(&self) {
        self.state.lock().unwrap().reject_writes = None;
    }

    pub fn delay_writes(&self, delay: Duration) {
        self.state.lock().unwrap().write_delay = Some(delay);
    }

    /// The next `list` call blocks until the returned handle is notified
    pub fn gate_next_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().list_gate = Some(gate.clone());
        gate
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    async fn write_gate(&self) -> ApiResult<()> {
        let (delay, reject) = {
            let state = self.state.lock().unwrap();
            (state.write_delay, state.reject_writes.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match reject {
            Some(message) => Err(ApiError::Rejected { message }),
            None => Ok(()),
        }
    }
}

fn matches_id(record: &Value, id: &RecordId) -> bool {
    record
        .get("id")
        .and_then(|value| id.kind().canonicalize(value).ok())
        .map(|found| &found == id)
        .unwrap_or(false)
}

fn ack(message: &str) -> Ack {
    Ack {
        data: None,
        message: Some(message.to_string()),
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list(&self, kind: EntityKind) -> ApiResult<Vec<Value>> {
        self.record(Call::List(kind));
        let gate = self.state.lock().unwrap().list_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let state = self.state.lock().unwrap();
        if let Some(error) = state.failing_lists.get(&kind) {
            return Err(error.clone());
        }
        Ok(state.records.get(&kind).cloned().unwrap_or_default())
    }

    async fn get(&self, kind: EntityKind, id: &RecordId) -> ApiResult<Value> {
        self.record(Call::Get(kind, id.clone()));
        let state = self.state.lock().unwrap();
        state
            .records
            .get(&kind)
            .and_then(|records| records.iter().find(|r| matches_id(r, id)))
            .cloned()
            .ok_or(ApiError::Status {
                code: 404,
                message: Some(format!("{} {} not found", kind, id)),
            })
    }

    async fn create(&self, kind: EntityKind, body: &Payload) -> ApiResult<Ack> {
        self.record(Call::Create { kind, body: body.clone() });
        self.write_gate().await?;

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let mut record = body.clone();
        record.insert("id".to_string(), Value::from(state.next_id));
        if kind == EntityKind::Task {
            record
                .entry("taskUniqueIdentifier")
                .or_insert_with(|| Value::from(format!("uid-{}", state.next_id)));
        }
        let record = Value::Object(record);
        state.records.entry(kind).or_default().push(record.clone());
        Ok(Ack {
            data: Some(record),
            message: None,
        })
    }

    async fn update(&self, kind: EntityKind, id: &RecordId, body: &Payload) -> ApiResult<Ack> {
        self.record(Call::Update {
            kind,
            id: id.clone(),
            body: body.clone(),
        });
        self.write_gate().await?;

        let mut state = self.state.lock().unwrap();
        let record = state
            .records
            .get_mut(&kind)
            .and_then(|records| records.iter_mut().find(|r| matches_id(r, id)))
            .and_then(Value::as_object_mut)
            .ok_or(ApiError::Rejected {
                message: Some(format!("{} {} not found", kind, id)),
            })?;
        for (key, value) in body {
            record.insert(key.clone(), value.clone());
        }
        Ok(ack("Updated"))
    }

    async fn delete(&self, kind: EntityKind, id: &RecordId) -> ApiResult<Ack> {
        self.record(Call::Delete(kind, id.clone()));
        self.write_gate().await?;

        let mut state = self.state.lock().unwrap();
        if let Some(records) = state.records.get_mut(&kind) {
            records.retain(|r| !matches_id(r, id));
        }
        Ok(ack("Deleted"))
    }

    async fn submit_task_work(&self, task_uid: &RecordId, submission: &TaskSubmission) -> ApiResult<Ack> {
        self.record(Call::SubmitWork {
            task_uid: task_uid.clone(),
            description: submission.description.clone(),
            files: submission.files.iter().map(|f| f.file_name.clone()).collect(),
        });
        self.write_gate().await?;

        let mut state = self.state.lock().unwrap();
        let uid = task_uid.to_string();
        if let Some(task) = state.records.get_mut(&EntityKind::Task).and_then(|tasks| {
            tasks
                .iter_mut()
                .find(|t| t.get("taskUniqueIdentifier").and_then(Value::as_str) == Some(uid.as_str()))
        }) {
            task["status"] = Value::from("Submitted");
        }
        Ok(ack("Submitted"))
    }

    async fn download_task_files(&self, task_uid: &RecordId) -> ApiResult<Vec<u8>> {
        self.record(Call::Download(task_uid.clone()));
        self.state
            .lock()
            .unwrap()
            .archives
            .get(task_uid)
            .cloned()
            .ok_or(ApiError::Status {
                code: 404,
                message: Some("No files found".to_string()),
            })
    }
}
