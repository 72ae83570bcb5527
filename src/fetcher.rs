//! Remote Collection Fetcher
//!
//! Loads the reference collections a dialog needs, one task per collection.
//! A collection that fails to load is replaced by an empty one and reported
//! as a warning; the others are unaffected.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;
use tokio::task::JoinSet;

use crate::api::{ApiError, Backend};
use crate::domain::{EntityKind, RecordId};
use crate::editor::bounded;
use crate::error::FetchError;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// One selectable entry
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceItem {
    pub id: RecordId,
    pub label: String,
    pub record: Value,
}

/// A read-only collection in server order
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCollection {
    kind: EntityKind,
    items: Vec<ReferenceItem>,
}

impl ReferenceCollection {
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    /// Records without a usable reference ID are skipped
    pub fn from_records(kind: EntityKind, records: Vec<Value>) -> Self {
        let id_kind = kind.reference_id_kind();
        let items = records
            .into_iter()
            .filter_map(|record| {
                let id = match record.get(kind.reference_key()).map(|v| id_kind.canonicalize(v)) {
                    Some(Ok(id)) => id,
                    _ => {
                        debug!("Skipping {} record without {}", kind, kind.reference_key());
                        return None;
                    }
                };
                let label = match record.get(kind.label_key()) {
                    Some(Value::String(s)) => s.clone(),
                    _ => id.to_string(),
                };
                Some(ReferenceItem { id, label, record })
            })
            .collect();
        Self { kind, items }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn get(&self, id: &RecordId) -> Option<&ReferenceItem> {
        let id_kind = self.kind.reference_id_kind();
        let id = if id.kind() == id_kind {
            id.clone()
        } else {
            id_kind.parse(&id.to_string()).ok()?
        };
        self.items.iter().find(|item| item.id == id)
    }

    pub fn label(&self, id: &RecordId) -> Option<&str> {
        self.get(id).map(|item| item.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Everything fetched for one dialog opening
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    collections: BTreeMap<EntityKind, ReferenceCollection>,
    warnings: Vec<FetchError>,
}

impl ReferenceData {
    pub fn collection(&self, kind: EntityKind) -> Option<&ReferenceCollection> {
        self.collections.get(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.collections.keys().copied()
    }

    /// Collections that degraded to empty
    pub fn warnings(&self) -> &[FetchError] {
        &self.warnings
    }
}

/// Raw lists from one round of reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedLists {
    /// Lists that loaded, unfiltered
    pub lists: BTreeMap<EntityKind, Vec<Value>>,
    /// Lists that did not, ordered by kind
    pub failures: Vec<FetchError>,
}

pub struct CollectionFetcher {
    backend: Arc<dyn Backend>,
    timeout: Duration,
}

impl CollectionFetcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read every requested list in parallel and wait for all of them.
    /// Lists come back exactly as the server sent them.
    pub async fn fetch_lists(&self, kinds: &[EntityKind]) -> FetchedLists {
        let mut tasks = JoinSet::new();
        let mut requested: Vec<EntityKind> = Vec::new();
        for &kind in kinds {
            if requested.contains(&kind) {
                continue;
            }
            requested.push(kind);

            let backend = self.backend.clone();
            let timeout = self.timeout;
            tasks.spawn(async move { (kind, bounded(timeout, backend.list(kind)).await) });
        }

        let mut fetched = FetchedLists::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, Ok(records))) => {
                    debug!("Loaded {} {}", records.len(), kind);
                    fetched.lists.insert(kind, records);
                }
                Ok((kind, Err(cause))) => {
                    warn!("Failed to load {}: {}", kind, cause);
                    fetched.failures.push(FetchError { kind, cause });
                }
                Err(e) => warn!("Fetch task ended abnormally: {}", e),
            }
        }

        // a task that panicked never reported its kind
        for kind in requested {
            let reported = fetched.lists.contains_key(&kind) || fetched.failures.iter().any(|f| f.kind == kind);
            if !reported {
                fetched.failures.push(FetchError {
                    kind,
                    cause: ApiError::Network("fetch task aborted".to_string()),
                });
            }
        }

        fetched.failures.sort_by_key(|f| f.kind);
        fetched
    }

    /// Reference collections for a dialog; failed lists degrade to empty
    pub async fn fetch(&self, kinds: &[EntityKind]) -> ReferenceData {
        let FetchedLists { lists, failures } = self.fetch_lists(kinds).await;

        let mut data = ReferenceData::default();
        for (kind, records) in lists {
            data.collections
                .insert(kind, ReferenceCollection::from_records(kind, records));
        }
        for failure in &failures {
            data.collections
                .insert(failure.kind, ReferenceCollection::empty(failure.kind));
        }
        data.warnings = failures;
        data
    }
}
