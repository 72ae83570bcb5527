//! Editor Controller
//!
//! One editor per entity kind. It owns the dialog state machine and drives
//! fetch, submit and reconciliation through it. The dialog lock is released
//! before every network await and taken again to apply the result.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::api::Backend;
use crate::dialog::{Dialog, Phase};
use crate::domain::{EntityKind, IdKind, RecordId};
use crate::editor::{
    bounded, schema_for, EntitySchema, FieldValue, FormDraft, PayloadContext, SubmitEngine, SubmitOutcome,
    Target,
};
use crate::error::{DialogError, EditorError, FetchError, FormError, SubmitError};
use crate::fetcher::{CollectionFetcher, ReferenceCollection, DEFAULT_FETCH_TIMEOUT};
use crate::refresh::{RefreshController, RefreshReport};
use crate::store::SharedStore;

/// Result of a submit that went through
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReport {
    pub outcome: SubmitOutcome,
    /// Present when a write happened
    pub refresh: Option<RefreshReport>,
}

pub struct Editor {
    schema: &'static EntitySchema,
    backend: Arc<dyn Backend>,
    store: SharedStore,
    fetcher: CollectionFetcher,
    engine: SubmitEngine,
    refresh: RefreshController,
    timeout: Duration,
    dialog: Mutex<Dialog>,
}

impl Editor {
    pub fn new(kind: EntityKind, backend: Arc<dyn Backend>, store: SharedStore, context: PayloadContext) -> Self {
        Self {
            schema: schema_for(kind),
            fetcher: CollectionFetcher::new(backend.clone()),
            engine: SubmitEngine::new(backend.clone(), context),
            refresh: RefreshController::new(backend.clone(), store.clone()),
            backend,
            store,
            timeout: DEFAULT_FETCH_TIMEOUT,
            dialog: Mutex::new(Dialog::new()),
        }
    }

    /// Bound for every network call made by this editor
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            fetcher: self.fetcher.with_timeout(timeout),
            engine: self.engine.with_timeout(timeout),
            refresh: self.refresh.with_timeout(timeout),
            timeout,
            ..self
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.schema.kind
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    // ========================
    // Opening and closing
    // ========================

    /// Open a blank "Add" dialog and load its reference collections
    pub async fn open_new(&self) -> Result<Vec<FetchError>, EditorError> {
        self.open(Target::New, FormDraft::blank(self.schema)).await
    }

    /// Open an "Edit" dialog on a record as listed by the server
    pub async fn open_edit(&self, record: &Value) -> Result<Vec<FetchError>, EditorError> {
        let id = record
            .get("id")
            .and_then(|value| IdKind::Numeric.canonicalize(value).ok())
            .ok_or_else(|| FormError::InvalidValue {
                field: "id".to_string(),
                reason: "record has no id".to_string(),
            })?;
        let draft = FormDraft::from_record(self.schema, record)?;
        self.open(Target::Existing(id), draft).await
    }

    /// Open an "Edit" dialog by ID, from the list store or the server
    pub async fn open_edit_by_id(&self, id: &RecordId) -> Result<Vec<FetchError>, EditorError> {
        let cached = self.store.read().await.find_record(self.kind(), id).cloned();
        let record = match cached {
            Some(record) => record,
            None => bounded(self.timeout, self.backend.get(self.kind(), id))
                .await
                .map_err(EditorError::Load)?,
        };
        self.open_edit(&record).await
    }

    async fn open(&self, target: Target, draft: FormDraft) -> Result<Vec<FetchError>, EditorError> {
        let ticket = self.dialog.lock().await.open(target, draft);

        let references = self.fetcher.fetch(self.schema.references).await;
        let warnings = references.warnings().to_vec();

        if !self.dialog.lock().await.finish_loading(ticket, references) {
            return Err(DialogError::Stale.into());
        }
        for warning in &warnings {
            warn!("{}", warning);
        }
        Ok(warnings)
    }

    /// Discard the open instance and anything still in flight for it
    pub async fn close(&self) {
        self.dialog.lock().await.close();
    }

    pub async fn phase(&self) -> Phase {
        self.dialog.lock().await.phase()
    }

    // ========================
    // Editing
    // ========================

    pub async fn set_text(&self, field: &str, raw: &str) -> Result<(), EditorError> {
        let mut dialog = self.dialog.lock().await;
        dialog.draft_mut()?.set_text(field, raw)?;
        Ok(())
    }

    pub async fn set_field(&self, field: &str, value: FieldValue) -> Result<(), EditorError> {
        let mut dialog = self.dialog.lock().await;
        dialog.draft_mut()?.set_field(field, value)?;
        Ok(())
    }

    /// Returns whether the ID is checked afterwards
    pub async fn toggle(&self, field: &str, raw_id: &str) -> Result<bool, EditorError> {
        let mut dialog = self.dialog.lock().await;
        Ok(dialog.draft_mut()?.toggle(field, raw_id)?)
    }

    pub async fn reset(&self) -> Result<(), EditorError> {
        let mut dialog = self.dialog.lock().await;
        dialog.draft_mut()?.reset();
        Ok(())
    }

    /// Snapshot of the draft in any open phase
    pub async fn draft(&self) -> Result<FormDraft, EditorError> {
        Ok(self.dialog.lock().await.draft()?.clone())
    }

    pub async fn references(&self, kind: EntityKind) -> Option<ReferenceCollection> {
        self.dialog
            .lock()
            .await
            .references()
            .and_then(|data| data.collection(kind).cloned())
    }

    pub async fn last_error(&self) -> Option<SubmitError> {
        self.dialog.lock().await.last_error().cloned()
    }

    // ========================
    // Submitting
    // ========================

    /// Validate and write the draft, then reconcile the affected lists
    pub async fn submit(&self) -> Result<SubmitReport, EditorError> {
        let (ticket, draft, target) = self.dialog.lock().await.begin_submit()?;

        let result = self.engine.submit(&draft, &target).await;
        let current = self.dialog.lock().await.complete_submit(ticket, &result);

        let outcome = result?;
        let refresh = match outcome {
            SubmitOutcome::Created(_) | SubmitOutcome::Updated => {
                // the write happened even if the dialog has moved on
                Some(self.refresh.after_write(self.kind()).await)
            }
            SubmitOutcome::NothingToUpdate => None,
        };

        if !current {
            info!("{} dialog closed while saving; result not applied", self.kind());
        }
        Ok(SubmitReport { outcome, refresh })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::store::ListStore;
    use crate::testing::{Call, MemoryBackend};
    use serde_json::json;

    fn project_backend() -> Arc<MemoryBackend> {
        Arc::new(
            MemoryBackend::new()
                .with_records(
                    EntityKind::Project,
                    vec![
                        json!({"id": 1, "name": "Apollo", "enrolledMembersIds": [2], "guidTasks": []}),
                        json!({"id": 2, "name": "Gemini", "enrolledMembersIds": [], "guidTasks": ["t-1"]}),
                    ],
                )
                .with_records(EntityKind::Employee, vec![json!({"id": 2, "fullName": "Ana Ruiz"})])
                .with_records(EntityKind::Department, vec![json!({"id": 3, "name": "Ops"})])
                .with_records(
                    EntityKind::Task,
                    vec![json!({"id": 9, "taskUniqueIdentifier": "t-1", "title": "Audit"})],
                ),
        )
    }

    fn editor(backend: &Arc<MemoryBackend>, kind: EntityKind) -> Arc<Editor> {
        Arc::new(Editor::new(kind, backend.clone(), ListStore::shared(), PayloadContext::default()))
    }

    async fn wait_for_list_call(backend: &MemoryBackend) {
        while !backend.calls().iter().any(|c| matches!(c, Call::List(_))) {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_open_edit_loads_references() {
        let backend = project_backend();
        let editor = editor(&backend, EntityKind::Project);

        let warnings = editor.open_edit(&backend.records(EntityKind::Project)[0]).await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(editor.phase().await, Phase::Editing);

        let employees = editor.references(EntityKind::Employee).await.unwrap();
        assert_eq!(employees.label(&RecordId::Num(2)), Some("Ana Ruiz"));
        assert_eq!(editor.references(EntityKind::Task).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_late_fetch_does_not_touch_reopened_dialog() {
        let backend = project_backend();
        let editor = editor(&backend, EntityKind::Project);
        let records = backend.records(EntityKind::Project);

        let gate = backend.gate_next_list();
        let first = tokio::spawn({
            let editor = editor.clone();
            let record = records[0].clone();
            async move { editor.open_edit(&record).await }
        });
        wait_for_list_call(&backend).await;

        editor.close().await;
        editor.open_edit(&records[1]).await.unwrap();
        editor.set_text("description", "second dialog").await.unwrap();
        let live = editor.draft().await.unwrap();

        gate.notify_one();
        let late = first.await.unwrap();
        assert_eq!(late, Err(EditorError::Dialog(DialogError::Stale)));

        let after = editor.draft().await.unwrap();
        assert_eq!(after.values(), live.values());
        assert_eq!(after.value("name"), Some(&FieldValue::Text("Gemini".into())));
        assert_eq!(editor.phase().await, Phase::Editing);
    }

    #[tokio::test]
    async fn test_successful_update_closes_and_refreshes() {
        let backend = project_backend();
        let editor = editor(&backend, EntityKind::Project);
        editor.open_edit(&backend.records(EntityKind::Project)[0]).await.unwrap();
        editor.toggle("guidTasks", "t-1").await.unwrap();
        backend.clear_calls();

        let report = editor.submit().await.unwrap();
        assert_eq!(report.outcome, SubmitOutcome::Updated);
        assert_eq!(editor.phase().await, Phase::Closed);

        let calls = backend.calls();
        assert!(matches!(calls[0], Call::Update { .. }));
        assert!(calls.contains(&Call::List(EntityKind::Project)));

        let store = editor.store.read().await;
        assert_eq!(store.version(EntityKind::Project), 1);
        assert_eq!(store.project(&RecordId::Num(1)).unwrap().guid_tasks, vec![RecordId::Token("t-1".into())]);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_dialog_and_draft() {
        let backend = project_backend();
        backend.reject_writes(Some("Project locked"));
        let editor = editor(&backend, EntityKind::Project);
        editor.open_edit(&backend.records(EntityKind::Project)[0]).await.unwrap();
        editor.set_text("name", "Apollo II").await.unwrap();
        let before = editor.draft().await.unwrap();
        backend.clear_calls();

        let err = editor.submit().await.unwrap_err();
        match err {
            EditorError::Submit(e) => assert_eq!(e.server_message(), Some("Project locked")),
            other => panic!("unexpected error {:?}", other),
        }

        assert_eq!(editor.phase().await, Phase::Editing);
        assert_eq!(editor.draft().await.unwrap().values(), before.values());
        assert!(editor.last_error().await.is_some());
        // no refetch after a failed write
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_submit_stays_open_without_requests() {
        let backend = project_backend();
        let editor = editor(&backend, EntityKind::Project);
        editor.open_edit(&backend.records(EntityKind::Project)[1]).await.unwrap();
        backend.clear_calls();

        let report = editor.submit().await.unwrap();
        assert_eq!(report.outcome, SubmitOutcome::NothingToUpdate);
        assert!(report.refresh.is_none());
        assert!(backend.calls().is_empty());
        assert_eq!(editor.phase().await, Phase::Editing);
    }

    #[tokio::test]
    async fn test_missing_reference_collection_is_a_warning() {
        let backend = project_backend();
        backend.fail_list(EntityKind::Department, ApiError::Network("refused".into()));
        let editor = editor(&backend, EntityKind::Project);

        let warnings = editor.open_new().await.unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, EntityKind::Department);
        assert!(editor.references(EntityKind::Department).await.unwrap().is_empty());
        assert_eq!(editor.phase().await, Phase::Editing);
    }

    #[tokio::test]
    async fn test_edits_refused_when_closed() {
        let backend = project_backend();
        let editor = editor(&backend, EntityKind::Department);
        let err = editor.set_text("name", "x").await.unwrap_err();
        assert_eq!(err, EditorError::Dialog(DialogError::NotOpen));
        assert_eq!(editor.submit().await.unwrap_err(), EditorError::Dialog(DialogError::NotOpen));
    }
}
