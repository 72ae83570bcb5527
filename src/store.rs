//! List Store
//!
//! Last server copy of each list view. Lists are only ever replaced by a
//! fresh read, never patched locally. Each list has a version counter that
//! moves on every replacement so views know to redraw.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::{Department, Employee, Entity, EntityKind, Project, RecordId, Task};

/// Store shared between the dashboard and its editors
pub type SharedStore = Arc<RwLock<ListStore>>;

#[derive(Debug, Clone, Default)]
pub struct ListStore {
    pub employees: Vec<Employee>,
    pub departments: Vec<Department>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    /// Raw records as listed, for opening edit dialogs
    raw: BTreeMap<EntityKind, Vec<Value>>,
    versions: BTreeMap<EntityKind, u64>,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Bumped on every replacement; 0 until first loaded
    pub fn version(&self, kind: EntityKind) -> u64 {
        self.versions.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_loaded(&self, kind: EntityKind) -> bool {
        self.version(kind) > 0
    }

    /// Replace one list with a fresh read. Returns the number of typed records.
    pub fn replace(&mut self, kind: EntityKind, records: Vec<Value>) -> usize {
        let count = match kind {
            EntityKind::Employee => store_typed(&mut self.employees, &records),
            EntityKind::Department => store_typed(&mut self.departments, &records),
            EntityKind::Project => store_typed(&mut self.projects, &records),
            EntityKind::Task => store_typed(&mut self.tasks, &records),
        };
        self.raw.insert(kind, records);
        *self.versions.entry(kind).or_insert(0) += 1;
        count
    }

    pub fn records(&self, kind: EntityKind) -> &[Value] {
        self.raw.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Raw record by its `id`
    pub fn find_record(&self, kind: EntityKind, id: &RecordId) -> Option<&Value> {
        self.records(kind).iter().find(|record| {
            record
                .get("id")
                .and_then(|value| id.kind().canonicalize(value).ok())
                .map(|found| &found == id)
                .unwrap_or(false)
        })
    }

    pub fn employee(&self, id: &RecordId) -> Option<&Employee> {
        find(&self.employees, id)
    }

    pub fn department(&self, id: &RecordId) -> Option<&Department> {
        find(&self.departments, id)
    }

    pub fn project(&self, id: &RecordId) -> Option<&Project> {
        find(&self.projects, id)
    }

    /// Task by numeric `id` or by `taskUniqueIdentifier`
    pub fn task(&self, id: &RecordId) -> Option<&Task> {
        match id {
            RecordId::Num(_) => find(&self.tasks, id),
            RecordId::Token(_) => self.tasks.iter().find(|t| &t.task_unique_identifier == id),
        }
    }
}

fn find<'a, T: Entity>(items: &'a [T], id: &RecordId) -> Option<&'a T> {
    items.iter().find(|item| &item.id() == id)
}

/// Records that do not decode are logged and left out
fn store_typed<T: DeserializeOwned>(target: &mut Vec<T>, records: &[Value]) -> usize {
    let mut typed = Vec::with_capacity(records.len());
    for record in records {
        match serde_json::from_value::<T>(record.clone()) {
            Ok(item) => typed.push(item),
            Err(e) => warn!("Skipping malformed record: {}", e),
        }
    }
    *target = typed;
    target.len()
}
