//! Route Table
//!
//! Paths of the reference server, kept verbatim for compatibility.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::domain::{EntityKind, RecordId};

/// Characters escaped inside a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// How a create body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
}

#[derive(Debug, Clone, Copy)]
pub struct Routes {
    pub list: &'static str,
    /// Prefix for `GET {get}/{id}`
    pub get: Option<&'static str>,
    pub create: &'static str,
    pub create_body: BodyEncoding,
    /// Prefix for `PUT {update}/{id}`
    pub update: Option<&'static str>,
    /// Prefix for `DELETE {delete}/{id}`
    pub delete: Option<&'static str>,
}

const EMPLOYEE_ROUTES: Routes = Routes {
    list: "/api/Employees",
    get: Some("/api/Employees"),
    create: "/User/register",
    create_body: BodyEncoding::Form,
    update: Some("/api/Employees"),
    delete: Some("/api/Employees"),
};

const DEPARTMENT_ROUTES: Routes = Routes {
    list: "/Departments",
    get: None,
    create: "/Departments/create-department",
    create_body: BodyEncoding::Json,
    update: Some("/Departments"),
    delete: Some("/Departments"),
};

const PROJECT_ROUTES: Routes = Routes {
    list: "/api/Projects",
    get: Some("/api/Projects"),
    create: "/api/Projects",
    create_body: BodyEncoding::Json,
    update: Some("/api/Projects"),
    delete: Some("/api/Projects"),
};

const TASK_ROUTES: Routes = Routes {
    list: "/api/Task",
    get: None,
    create: "/api/Task",
    create_body: BodyEncoding::Json,
    update: Some("/api/Task"),
    delete: Some("/api/Task"),
};

pub fn routes(kind: EntityKind) -> &'static Routes {
    match kind {
        EntityKind::Employee => &EMPLOYEE_ROUTES,
        EntityKind::Department => &DEPARTMENT_ROUTES,
        EntityKind::Project => &PROJECT_ROUTES,
        EntityKind::Task => &TASK_ROUTES,
    }
}

fn segment(id: &RecordId) -> String {
    utf8_percent_encode(&id.to_string(), PATH_SEGMENT).to_string()
}

/// `{prefix}/{id}`
pub fn item_path(prefix: &str, id: &RecordId) -> String {
    format!("{}/{}", prefix, segment(id))
}

pub fn submit_task_path(task_uid: &RecordId) -> String {
    format!("/api/Task/submit-task/{}", segment(task_uid))
}

pub fn download_task_files_path(task_uid: &RecordId) -> String {
    format!("/api/Task/download-all-files/{}/download", segment(task_uid))
}
