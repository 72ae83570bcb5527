//! Read-only views over the list store

use crate::domain::{Project, RecordId, Task, TaskStatus};
use crate::store::ListStore;

/// An employee's tasks split by review state
#[derive(Debug, Clone, PartialEq)]
pub struct TaskBoard<'a> {
    pub pending: Vec<&'a Task>,
    pub submitted: Vec<&'a Task>,
}

impl<'a> TaskBoard<'a> {
    /// Tasks in any other state appear in neither column
    pub fn for_employee(tasks: &'a [Task], employee: &RecordId) -> Self {
        let mine = tasks
            .iter()
            .filter(|t| t.assigned_to_employee_id.as_ref() == Some(employee));
        let mut board = Self {
            pending: Vec::new(),
            submitted: Vec::new(),
        };
        for task in mine {
            match task.status() {
                TaskStatus::Pending => board.pending.push(task),
                TaskStatus::Submitted => board.submitted.push(task),
                TaskStatus::Other => {}
            }
        }
        board
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub submitted: usize,
    pub pending: usize,
}

impl Progress {
    /// 0 when the project has no counted tasks
    pub fn percent(&self) -> f64 {
        let total = self.submitted + self.pending;
        if total == 0 {
            return 0.0;
        }
        self.submitted as f64 * 100.0 / total as f64
    }
}

/// Completion of a project, counting tasks linked through `projectIdNames`
pub fn project_progress(project_id: &RecordId, tasks: &[Task]) -> Progress {
    tasks
        .iter()
        .filter(|t| t.belongs_to_project(project_id))
        .fold(Progress::default(), |mut progress, task| {
            match task.status() {
                TaskStatus::Submitted => progress.submitted += 1,
                TaskStatus::Pending => progress.pending += 1,
                TaskStatus::Other => {}
            }
            progress
        })
}

/// Projects the employee works on: enrolled by ID, or listed by name
pub fn projects_for_employee<'a>(
    projects: &'a [Project],
    employee: Option<&RecordId>,
    name: Option<&str>,
) -> Vec<&'a Project> {
    projects
        .iter()
        .filter(|p| {
            let enrolled = employee
                .map(|id| p.enrolled_members_ids.contains(id))
                .unwrap_or(false);
            let named = name
                .filter(|n| !n.trim().is_empty())
                .map(|n| p.team_members.iter().any(|member| member == n))
                .unwrap_or(false);
            enrolled || named
        })
        .collect()
}

/// One linked task as shown in a project's details
#[derive(Debug, Clone, PartialEq)]
pub struct TaskLine {
    pub task_uid: RecordId,
    /// `None` when the task is not in the task list
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskLine {
    /// Submitted tasks have files to download
    pub fn has_files(&self) -> bool {
        self.status == Some(TaskStatus::Submitted)
    }
}

/// A project with its department and task titles resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDetails {
    pub project: Project,
    pub department_name: Option<String>,
    pub tasks: Vec<TaskLine>,
}

impl ProjectDetails {
    /// Task titles and the department name come from the store; the
    /// record's own `departmentName` is used when the department is not listed
    pub fn resolve(project: Project, store: &ListStore) -> Self {
        let department_name = project
            .department_id
            .as_ref()
            .and_then(|id| store.department(id))
            .map(|d| d.name.clone())
            .or_else(|| project.department_name.clone().filter(|n| !n.trim().is_empty()));

        let tasks = project
            .task_ids()
            .into_iter()
            .map(|uid| {
                let task = store.task(&uid);
                TaskLine {
                    title: task.map(|t| t.title.trim().to_string()),
                    status: task.map(Task::status),
                    task_uid: uid,
                }
            })
            .collect();

        Self {
            project,
            department_name,
            tasks,
        }
    }
}
