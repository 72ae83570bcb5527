//! Task Record
//!
//! Tasks carry two identities: the numeric `id` used by update/delete routes
//! and the `taskUniqueIdentifier` token used by projects, submissions and
//! downloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{Entity, EntityKind, RecordId};
use super::{nullable, numeric_id, optional_numeric_id, token_id};

/// Review state reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Submitted,
    Other,
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => TaskStatus::Pending,
            "submitted" => TaskStatus::Submitted,
            _ => TaskStatus::Other,
        }
    }
}

/// A task as listed by `/api/Task`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "numeric_id")]
    pub id: RecordId,
    #[serde(deserialize_with = "token_id")]
    pub task_unique_identifier: RecordId,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub priority: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub dead_line: Option<String>,
    #[serde(default)]
    pub points_value: Option<i64>,
    #[serde(default, deserialize_with = "optional_numeric_id")]
    pub assigned_to_employee_id: Option<RecordId>,
    #[serde(default, deserialize_with = "optional_numeric_id")]
    pub created_by_employee_id: Option<RecordId>,
    /// Owning projects keyed by project ID
    #[serde(default, deserialize_with = "nullable")]
    pub project_id_names: BTreeMap<String, Value>,
}

impl Task {
    pub fn status(&self) -> TaskStatus {
        TaskStatus::from(self.status.as_str())
    }

    pub fn belongs_to_project(&self, project_id: &RecordId) -> bool {
        self.project_id_names.contains_key(&project_id.to_string())
    }
}

impl Entity for Task {
    fn kind() -> EntityKind {
        EntityKind::Task
    }

    fn id(&self) -> RecordId {
        self.id.clone()
    }
}
