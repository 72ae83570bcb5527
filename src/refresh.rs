//! Refresh and Reconciliation
//!
//! After a successful write every list the write could have changed is read
//! again. A list whose refetch fails keeps its previous contents.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::api::Backend;
use crate::domain::EntityKind;
use crate::error::FetchError;
use crate::fetcher::{CollectionFetcher, DEFAULT_FETCH_TIMEOUT};
use crate::store::SharedStore;

/// Lists that show data changed by a write to `kind`
///
/// Departments show employee names and employees show their departments;
/// projects show their tasks.
pub fn affected_by(kind: EntityKind) -> &'static [EntityKind] {
    match kind {
        EntityKind::Employee => &[EntityKind::Employee, EntityKind::Department],
        EntityKind::Department => &[EntityKind::Department, EntityKind::Employee],
        EntityKind::Project => &[EntityKind::Project],
        EntityKind::Task => &[EntityKind::Task, EntityKind::Project],
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub refreshed: Vec<EntityKind>,
    pub failures: Vec<FetchError>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct RefreshController {
    backend: Arc<dyn Backend>,
    store: SharedStore,
    timeout: Duration,
}

impl RefreshController {
    pub fn new(backend: Arc<dyn Backend>, store: SharedStore) -> Self {
        Self {
            backend,
            store,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Re-read the given lists
    pub async fn refresh(&self, kinds: &[EntityKind]) -> RefreshReport {
        let fetched = CollectionFetcher::new(self.backend.clone())
            .with_timeout(self.timeout)
            .fetch_lists(kinds)
            .await;

        let mut report = RefreshReport {
            refreshed: Vec::new(),
            failures: fetched.failures,
        };

        let mut store = self.store.write().await;
        for (kind, records) in fetched.lists {
            let count = store.replace(kind, records);
            info!("Refreshed {} ({} records, version {})", kind, count, store.version(kind));
            report.refreshed.push(kind);
        }
        report
    }

    /// Reconcile after a successful write to `kind`
    pub async fn after_write(&self, kind: EntityKind) -> RefreshReport {
        self.refresh(affected_by(kind)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::domain::RecordId;
    use crate::store::ListStore;
    use crate::testing::MemoryBackend;
    use serde_json::json;

    #[test]
    fn test_every_write_refreshes_its_own_list() {
        for kind in EntityKind::ALL {
            assert!(affected_by(kind).contains(&kind));
        }
        assert!(affected_by(EntityKind::Employee).contains(&EntityKind::Department));
    }

    #[tokio::test]
    async fn test_employee_write_refreshes_departments() {
        let backend = Arc::new(
            MemoryBackend::new()
                .with_records(EntityKind::Employee, vec![json!({"id": 1, "fullName": "A B"})])
                .with_records(EntityKind::Department, vec![json!({"id": 2, "name": "Ops"})]),
        );
        let store = ListStore::shared();
        let controller = RefreshController::new(backend.clone(), store.clone());

        let report = controller.after_write(EntityKind::Employee).await;
        assert!(report.is_complete());

        let store = store.read().await;
        assert_eq!(store.version(EntityKind::Employee), 1);
        assert_eq!(store.version(EntityKind::Department), 1);
        assert_eq!(store.version(EntityKind::Project), 0);
        assert_eq!(store.departments[0].name, "Ops");
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_previous_list() {
        let backend = Arc::new(
            MemoryBackend::new().with_records(EntityKind::Project, vec![json!({"id": 1, "name": "Old"})]),
        );
        let store = ListStore::shared();
        let controller = RefreshController::new(backend.clone(), store.clone());
        controller.refresh(&[EntityKind::Project]).await;

        backend.fail_list(EntityKind::Project, ApiError::Network("down".into()));
        let report = controller.refresh(&[EntityKind::Project]).await;

        assert_eq!(report.failures.len(), 1);
        assert!(report.refreshed.is_empty());
        let store = store.read().await;
        assert_eq!(store.version(EntityKind::Project), 1);
        assert_eq!(store.projects[0].name, "Old");
    }

    #[tokio::test]
    async fn test_list_recovers_after_failure() {
        let backend = Arc::new(
            MemoryBackend::new().with_records(EntityKind::Department, vec![json!({"id": 4, "name": "Ops"})]),
        );
        let store = ListStore::shared();
        let controller = RefreshController::new(backend.clone(), store.clone());

        backend.fail_list(EntityKind::Department, ApiError::Timeout);
        assert!(!controller.refresh(&[EntityKind::Department]).await.is_complete());
        assert!(!store.read().await.is_loaded(EntityKind::Department));

        backend.heal_list(EntityKind::Department);
        let report = controller.refresh(&[EntityKind::Department]).await;
        assert!(report.is_complete());
        assert_eq!(report.refreshed, vec![EntityKind::Department]);
        assert_eq!(store.read().await.departments[0].name, "Ops");
    }

    #[tokio::test]
    async fn test_records_without_reference_key_are_kept() {
        let backend = Arc::new(MemoryBackend::new().with_records(
            EntityKind::Task,
            vec![
                json!({"id": 1, "taskUniqueIdentifier": "t-1", "title": "Audit"}),
                json!({"id": 2, "title": "Draft, no uid yet"}),
            ],
        ));
        let store = ListStore::shared();
        RefreshController::new(backend.clone(), store.clone())
            .refresh(&[EntityKind::Task])
            .await;

        let store = store.read().await;
        assert_eq!(store.records(EntityKind::Task).len(), 2);
        assert!(store.find_record(EntityKind::Task, &RecordId::Num(2)).is_some());
    }
}
