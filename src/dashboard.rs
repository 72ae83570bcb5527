//! Dashboard
//!
//! Entry point for a signed-in session: owns the backend handle and the list
//! store, hands out editors, and runs the actions that are not dialogs
//! (delete, work submission, archive download, the signed-in views).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::api::{ApiError, Attachment, Backend, TaskSubmission};
use crate::controller::Editor;
use crate::credential::Credential;
use crate::domain::{Employee, EntityKind, Project, RecordId};
use crate::editor::{bounded, PayloadContext};
use crate::error::{DownloadError, LookupError, SubmitError};
use crate::fetcher::DEFAULT_FETCH_TIMEOUT;
use crate::refresh::{affected_by, RefreshController, RefreshReport};
use crate::store::{ListStore, SharedStore};
use crate::views::{project_progress, projects_for_employee, Progress, ProjectDetails};

/// A downloaded task archive
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn for_task(task_uid: &RecordId, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("files-{}.zip", task_uid),
            bytes,
        }
    }

    /// Write under `dir` using the archive's own file name
    pub async fn save_into(&self, dir: &Path) -> Result<PathBuf, DownloadError> {
        let safe_name = self.file_name.replace(['/', '\\'], "_");
        let path = dir.join(safe_name);
        tokio::fs::write(&path, &self.bytes)
            .await
            .map_err(|e| DownloadError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(path)
    }
}

pub struct Dashboard {
    backend: Arc<dyn Backend>,
    store: SharedStore,
    context: PayloadContext,
    /// Login name from the credential, used when the token has no employee ID
    user_name: Option<String>,
    refresh: RefreshController,
    timeout: Duration,
}

impl Dashboard {
    /// The acting employee is read from the credential's claims
    pub fn new(backend: Arc<dyn Backend>, credential: &Credential) -> Self {
        let acting_employee = match credential.employee_id() {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("No acting employee in credential: {}", e);
                None
            }
        };
        Self {
            user_name: credential.user_name(),
            ..Self::with_context(backend, PayloadContext { acting_employee })
        }
    }

    pub fn with_context(backend: Arc<dyn Backend>, context: PayloadContext) -> Self {
        let store = ListStore::shared();
        Self {
            refresh: RefreshController::new(backend.clone(), store.clone()),
            backend,
            store,
            context,
            user_name: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            refresh: self.refresh.with_timeout(timeout),
            timeout,
            ..self
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn acting_employee(&self) -> Option<&RecordId> {
        self.context.acting_employee.as_ref()
    }

    /// A fresh editor sharing this dashboard's backend and store
    pub fn editor(&self, kind: EntityKind) -> Editor {
        Editor::new(kind, self.backend.clone(), self.store.clone(), self.context.clone()).with_timeout(self.timeout)
    }

    pub async fn refresh(&self, kinds: &[EntityKind]) -> RefreshReport {
        self.refresh.refresh(kinds).await
    }

    pub async fn refresh_all(&self) -> RefreshReport {
        self.refresh.refresh(&EntityKind::ALL).await
    }

    /// Delete one record, then re-read every list it could appear in
    pub async fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<RefreshReport, SubmitError> {
        bounded(self.timeout, self.backend.delete(kind, id))
            .await
            .map_err(|e| {
                warn!("Delete of {} {} failed: {}", kind, id, e);
                SubmitError::from(e)
            })?;
        info!("Deleted {} {}", kind, id);
        Ok(self.refresh.refresh(affected_by(kind)).await)
    }

    /// Hand in work for a task. Files are read before anything is sent.
    pub async fn submit_task_work(
        &self,
        task_uid: &RecordId,
        description: &str,
        files: &[PathBuf],
    ) -> Result<RefreshReport, SubmitError> {
        let mut submission = TaskSubmission {
            description: description.to_string(),
            files: Vec::with_capacity(files.len()),
        };
        for path in files {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| SubmitError::Transport(ApiError::Io(format!("{}: {}", path.display(), e))))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".to_string());
            submission.files.push(Attachment { file_name, bytes });
        }

        bounded(self.timeout, self.backend.submit_task_work(task_uid, &submission))
            .await
            .map_err(|e| {
                warn!("Submission for task {} failed: {}", task_uid, e);
                SubmitError::from(e)
            })?;
        info!("Submitted {} files for task {}", submission.files.len(), task_uid);
        Ok(self.refresh.refresh(affected_by(EntityKind::Task)).await)
    }

    // ========================
    // Signed-in views
    // ========================

    /// The signed-in employee, read from a fresh employee list
    pub async fn profile(&self) -> Result<Employee, LookupError> {
        let report = self.refresh.refresh(&[EntityKind::Employee]).await;
        if let Some(failure) = report.failures.into_iter().next() {
            return Err(LookupError::List(failure));
        }
        let store = self.store.read().await;
        let employee = self.find_profile(&store)?.clone();
        Ok(employee)
    }

    /// By employee ID, else by login name against the first name
    fn find_profile<'a>(&self, store: &'a ListStore) -> Result<&'a Employee, LookupError> {
        if let Some(id) = self.acting_employee() {
            return store.employee(id).ok_or_else(|| LookupError::Missing {
                kind: EntityKind::Employee,
                key: id.to_string(),
            });
        }
        let login = self
            .user_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(LookupError::Anonymous)?;
        store
            .employees
            .iter()
            .find(|e| {
                e.display_name()
                    .split_whitespace()
                    .next()
                    .map(|first| first.eq_ignore_ascii_case(login))
                    .unwrap_or(false)
            })
            .ok_or_else(|| LookupError::Missing {
                kind: EntityKind::Employee,
                key: login.to_string(),
            })
    }

    /// Projects the signed-in employee works on, with their progress.
    ///
    /// Membership is by enrolled ID or by the employee's full name in
    /// `teamMembers`.
    pub async fn my_projects(&self) -> Result<Vec<(Project, Progress)>, LookupError> {
        let me = self.acting_employee().ok_or(LookupError::Anonymous)?;
        let report = self
            .refresh
            .refresh(&[EntityKind::Project, EntityKind::Task, EntityKind::Employee])
            .await;
        for failure in report.failures {
            if failure.kind == EntityKind::Employee {
                warn!("Matching projects by ID only: {}", failure);
                continue;
            }
            return Err(LookupError::List(failure));
        }

        let store = self.store.read().await;
        let full_name = match self.find_profile(&store) {
            Ok(employee) => Some(employee.display_name()),
            Err(e) => {
                warn!("Matching projects by ID only: {}", e);
                None
            }
        };
        let mine: Vec<(Project, Progress)> = projects_for_employee(&store.projects, Some(me), full_name.as_deref())
            .into_iter()
            .map(|project| (project.clone(), project_progress(&project.id, &store.tasks)))
            .collect();
        Ok(mine)
    }

    /// One project as read from its own endpoint, with task titles and
    /// department resolved from fresh lists
    pub async fn project_details(&self, id: &RecordId) -> Result<ProjectDetails, LookupError> {
        let record = bounded(self.timeout, self.backend.get(EntityKind::Project, id))
            .await
            .map_err(|cause| LookupError::Transport {
                kind: EntityKind::Project,
                id: id.clone(),
                cause,
            })?;
        let project: Project = serde_json::from_value(record).map_err(|e| LookupError::Malformed {
            kind: EntityKind::Project,
            id: id.clone(),
            reason: e.to_string(),
        })?;

        let report = self.refresh.refresh(&[EntityKind::Task, EntityKind::Department]).await;
        for failure in &report.failures {
            warn!("Project {} details incomplete: {}", id, failure);
        }
        let store = self.store.read().await;
        let details = ProjectDetails::resolve(project, &store);
        Ok(details)
    }

    /// Fetch the archive of files handed in for a task
    pub async fn download_task_files(&self, task_uid: &RecordId) -> Result<Artifact, DownloadError> {
        let bytes = bounded(self.timeout, self.backend.download_task_files(task_uid))
            .await
            .map_err(|cause| {
                warn!("Download for task {} failed: {}", task_uid, cause);
                DownloadError::Transport {
                    task_uid: task_uid.clone(),
                    cause,
                }
            })?;
        if bytes.is_empty() {
            return Err(DownloadError::Empty {
                task_uid: task_uid.clone(),
            });
        }
        Ok(Artifact::for_task(task_uid, bytes))
    }
}
